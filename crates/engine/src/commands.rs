//! Command structs for engine operations.
//!
//! These types group parameters for ledger writes and feed queries, keeping
//! call sites readable and avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Money, TransactionKind};

/// Record a new income or expense.
#[derive(Clone, Debug)]
pub struct RecordCmd {
    pub owner_id: String,
    pub kind: TransactionKind,
    pub category: String,
    pub wallet_id: Uuid,
    pub amount: Money,
    pub date: NaiveDate,
    pub description: String,
    /// Replaying a command with the same key returns the first record.
    pub idempotency_key: Option<String>,
}

impl RecordCmd {
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        kind: TransactionKind,
        wallet_id: Uuid,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            kind,
            category: String::new(),
            wallet_id,
            amount,
            date,
            description: String::new(),
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn income(
        owner_id: impl Into<String>,
        wallet_id: Uuid,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self::new(owner_id, TransactionKind::Income, wallet_id, amount, date)
    }

    #[must_use]
    pub fn expense(
        owner_id: impl Into<String>,
        wallet_id: Uuid,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self::new(owner_id, TransactionKind::Expense, wallet_id, amount, date)
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Partial update of a recorded transaction. `None` keeps the current value.
///
/// Changing `kind` moves the record to the other partition: it gets a new id.
#[derive(Clone, Debug, Default)]
pub struct Amendment {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub amount: Option<Money>,
    pub wallet_id: Option<Uuid>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

impl Amendment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn wallet_id(mut self, wallet_id: Uuid) -> Self {
        self.wallet_id = Some(wallet_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// What `delete_wallet` does with the transactions of the wallet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Refuse with a conflict while the wallet still has transactions.
    #[default]
    Reject,
    /// Delete the transactions together with the wallet.
    Cascade,
}

/// Filters shared by the paginated feed, `feed_all` and feed subscriptions.
///
/// `from` and `to` are inclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedFilter {
    pub wallet_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl FeedFilter {
    #[must_use]
    pub fn wallet_id(mut self, wallet_id: Uuid) -> Self {
        self.wallet_id = Some(wallet_id);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn from(mut self, from: NaiveDate) -> Self {
        self.from = Some(from);
        self
    }

    #[must_use]
    pub fn to(mut self, to: NaiveDate) -> Self {
        self.to = Some(to);
        self
    }
}

/// One page request of the transaction feed.
#[derive(Clone, Debug, Default)]
pub struct FeedQuery {
    pub filter: FeedFilter,
    /// Page size; the configured default when `None`.
    pub limit: Option<u64>,
    /// Opaque cursor from the previous page.
    pub cursor: Option<String>,
}
