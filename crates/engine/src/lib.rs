//! Ledger consistency engine for a personal finance tracker.
//!
//! Owners keep wallets and record incomes and expenses against them. Every
//! wallet caches `balance`, `income_total` and `expense_total`; the engine
//! keeps that aggregate in step with the transaction log:
//!
//! - [`Engine::record`], [`Engine::amend`] and [`Engine::retire`] change the
//!   log and the affected wallets in one unit of work, so the wallet identity
//!   `balance == initial_balance + income_total - expense_total` holds after
//!   every commit.
//! - [`Engine::recompute`] rebuilds a wallet aggregate from the log.
//! - [`Engine::feed`] pages through both kinds of transactions merged,
//!   newest first.
//! - [`Engine::subscribe_wallets`] and [`Engine::subscribe_feed`] hand out live
//!   snapshots refreshed after every committed change.

pub use categories::Category;
pub use changes::{Change, ChangeScope};
pub use commands::{Amendment, DeletePolicy, FeedFilter, FeedQuery, RecordCmd};
pub use config::{EngineConfig, RetryPolicy};
pub use error::EngineError;
pub use money::Money;
pub use ops::{Engine, EngineBuilder, FeedPage, Totals};
pub use subscriptions::{
    FeedSubscription, FeedWatch, LiveQuery, Snapshot, Subscription, WalletSubscription,
    WalletsQuery,
};
pub use transactions::{Transaction, TransactionFields, TransactionKind};
pub use wallets::{Wallet, WalletDelta};

mod categories;
mod changes;
mod commands;
mod config;
mod error;
mod money;
mod ops;
mod retry;
mod store;
mod subscriptions;
mod transactions;
mod util;
mod wallets;

pub type ResultEngine<T> = Result<T, EngineError>;
