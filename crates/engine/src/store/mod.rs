//! Persistence adapters used by the engine.
//!
//! Every function is generic over [`sea_orm::ConnectionTrait`], so it runs the
//! same on a plain connection or inside a `DatabaseTransaction`. Ownership is
//! part of every filter: a row that belongs to another owner is reported as
//! missing.

pub(crate) mod transactions;
pub(crate) mod wallets;
