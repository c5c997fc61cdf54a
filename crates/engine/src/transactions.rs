//! Transaction primitives.
//!
//! A `Transaction` is a dated, categorized income or expense recorded against
//! one wallet. The amount is always positive; the kind decides the sign of
//! its effect on the wallet.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, WalletDelta};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Effect of a transaction of this kind on its wallet aggregate.
    pub fn effect(self, amount: Money) -> WalletDelta {
        match self {
            Self::Income => WalletDelta {
                balance: amount,
                income: amount,
                expense: Money::ZERO,
            },
            Self::Expense => WalletDelta {
                balance: -amount,
                income: Money::ZERO,
                expense: amount,
            },
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: String,
    pub kind: TransactionKind,
    /// Category name copied at write time.
    pub category: String,
    pub amount: Money,
    pub wallet_id: Uuid,
    /// Wallet name copied at write time.
    pub wallet_name: String,
    pub description: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
}

impl Transaction {
    pub fn new(
        owner_id: String,
        kind: TransactionKind,
        fields: TransactionFields,
        idempotency_key: Option<String>,
    ) -> ResultEngine<Self> {
        if !fields.amount.is_positive() {
            return Err(EngineError::Validation("amount must be > 0".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            owner_id,
            kind,
            category: fields.category,
            amount: fields.amount,
            wallet_id: fields.wallet_id,
            wallet_name: fields.wallet_name,
            description: fields.description,
            date: fields.date,
            created_at: Utc::now(),
            idempotency_key,
        })
    }

    /// Effect of this transaction on its wallet.
    pub fn effect(&self) -> WalletDelta {
        self.kind.effect(self.amount)
    }

    /// The mutable part of the record.
    pub fn fields(&self) -> TransactionFields {
        TransactionFields {
            category: self.category.clone(),
            amount: self.amount,
            wallet_id: self.wallet_id,
            wallet_name: self.wallet_name.clone(),
            description: self.description.clone(),
            date: self.date,
        }
    }
}

/// Fields of a transaction that an amendment may overwrite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionFields {
    pub category: String,
    pub amount: Money,
    pub wallet_id: Uuid,
    pub wallet_name: String,
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: String,
    pub kind: String,
    pub category: String,
    pub amount_minor: i64,
    pub wallet_id: Uuid,
    pub wallet_name: String,
    pub description: String,
    pub date: NaiveDate,
    pub created_at: DateTimeUtc,
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            owner_id: ActiveValue::Set(tx.owner_id.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            category: ActiveValue::Set(tx.category.clone()),
            amount_minor: ActiveValue::Set(tx.amount.cents()),
            wallet_id: ActiveValue::Set(tx.wallet_id),
            wallet_name: ActiveValue::Set(tx.wallet_name.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            date: ActiveValue::Set(tx.date),
            created_at: ActiveValue::Set(tx.created_at),
            idempotency_key: ActiveValue::Set(tx.idempotency_key.clone()),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            category: model.category,
            amount: Money::new(model.amount_minor),
            wallet_id: model.wallet_id,
            wallet_name: model.wallet_name,
            description: model.description,
            date: model.date,
            created_at: model.created_at,
            idempotency_key: model.idempotency_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(amount: i64) -> TransactionFields {
        TransactionFields {
            category: "Food".to_string(),
            amount: Money::new(amount),
            wallet_id: Uuid::new_v4(),
            wallet_name: "Cash".to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn income_raises_balance_and_income_total() {
        let delta = TransactionKind::Income.effect(Money::new(500));
        assert_eq!(delta.balance, Money::new(500));
        assert_eq!(delta.income, Money::new(500));
        assert_eq!(delta.expense, Money::ZERO);
    }

    #[test]
    fn expense_lowers_balance_and_raises_expense_total() {
        let delta = TransactionKind::Expense.effect(Money::new(200));
        assert_eq!(delta.balance, Money::new(-200));
        assert_eq!(delta.income, Money::ZERO);
        assert_eq!(delta.expense, Money::new(200));
    }

    #[test]
    fn rejects_non_positive_amounts() {
        for amount in [0, -10] {
            let err = Transaction::new(
                "alice".to_string(),
                TransactionKind::Expense,
                fields(amount),
                None,
            )
            .unwrap_err();
            assert_eq!(err, EngineError::Validation("amount must be > 0".to_string()));
        }
    }

    #[test]
    fn kind_round_trips_through_storage_string() {
        for kind in [TransactionKind::Income, TransactionKind::Expense] {
            assert_eq!(TransactionKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(TransactionKind::try_from("transfer").is_err());
    }
}
