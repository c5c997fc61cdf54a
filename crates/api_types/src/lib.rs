//! Request and response bodies of the HTTP API.
//!
//! Amounts travel as decimal strings (`"12.50"`) and dates as `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletNew {
        pub name: String,
        /// Decimal string; zero when absent.
        pub initial_balance: Option<String>,
    }

    /// Rename and, optionally, correct the balance by hand.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletUpdate {
        pub name: String,
        pub balance: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: Uuid,
        pub name: String,
        pub initial_balance: String,
        pub balance: String,
        pub income_total: String,
        pub expense_total: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletList {
        pub wallets: Vec<WalletView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WalletDelete {
        /// Delete the wallet's transactions too (default: refuse).
        pub cascade: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletDeleted {
        pub transactions_deleted: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Totals {
        pub balance: String,
        pub income: String,
        pub expense: String,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryFilter {
        pub kind: Option<TransactionKind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub kind: TransactionKind,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryList {
        pub categories: Vec<CategoryView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub kind: TransactionKind,
        pub category: String,
        pub wallet_id: Uuid,
        /// Decimal string, must be > 0.
        pub amount: String,
        pub date: NaiveDate,
        pub description: Option<String>,
        /// Optional idempotency key for safely retrying the same create request.
        pub idempotency_key: Option<String>,
    }

    /// Partial update; absent fields keep their value. Changing `kind`
    /// returns a transaction with a new id.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub kind: Option<TransactionKind>,
        pub category: Option<String>,
        pub amount: Option<String>,
        pub wallet_id: Option<Uuid>,
        pub description: Option<String>,
        pub date: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub category: String,
        pub amount: String,
        pub wallet_id: Uuid,
        pub wallet_name: String,
        pub description: String,
        pub date: NaiveDate,
        pub created_at: DateTime<Utc>,
    }

    /// Query string of `GET /transactions`. `from` and `to` are inclusive.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct FeedParams {
        pub limit: Option<u64>,
        /// Opaque pagination cursor, from `next_cursor`.
        pub cursor: Option<String>,
        pub wallet_id: Option<Uuid>,
        pub kind: Option<TransactionKind>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeedResponse {
        pub transactions: Vec<TransactionView>,
        /// Cursor of the next (older) page.
        pub next_cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionRetired {
        /// `false` when the transaction was already gone.
        pub retired: bool,
    }
}
