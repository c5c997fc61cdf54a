//! The module contains `Wallet` struct, the aggregate deltas applied to it
//! and its storage model.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Money, ResultEngine, money::amount_too_large};

fn checked_money(value: i128) -> ResultEngine<Money> {
    i64::try_from(value)
        .map(Money::new)
        .map_err(|_| amount_too_large())
}

/// A wallet.
///
/// A wallet is a representation of a real wallet, a bank account or anything
/// else where money are kept. Besides the running `balance` it caches the
/// income and expense totals of the transactions recorded against it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Stable identifier for this wallet.
    ///
    /// Transactions reference the wallet by id, so renaming a wallet never
    /// breaks the ledger.
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    /// Starting value chosen by the owner (or re-derived by a manual balance
    /// correction).
    pub initial_balance: Money,
    pub balance: Money,
    pub income_total: Money,
    pub expense_total: Money,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(owner_id: String, name: String, initial_balance: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            initial_balance,
            balance: initial_balance,
            income_total: Money::ZERO,
            expense_total: Money::ZERO,
            created_at: Utc::now(),
        }
    }

    /// Balance implied by the ledger identity
    /// `initial_balance + income_total - expense_total`.
    ///
    /// Fails when the result does not fit in `Money`.
    pub fn expected_balance(&self) -> ResultEngine<Money> {
        checked_money(
            i128::from(self.initial_balance.cents()) + i128::from(self.income_total.cents())
                - i128::from(self.expense_total.cents()),
        )
    }

    pub fn is_consistent(&self) -> bool {
        self.expected_balance()
            .is_ok_and(|expected| expected == self.balance)
    }

    /// The aggregate after `delta`, or a validation error if any field would
    /// overflow.
    pub fn applied(&self, delta: WalletDelta) -> ResultEngine<Wallet> {
        Ok(Wallet {
            balance: self.balance.try_add(delta.balance)?,
            income_total: self.income_total.try_add(delta.income)?,
            expense_total: self.expense_total.try_add(delta.expense)?,
            ..self.clone()
        })
    }

    /// The wallet after a manual balance correction: `initial_balance` is
    /// re-derived as `balance - income_total + expense_total`.
    pub fn corrected(&self, balance: Money) -> ResultEngine<Wallet> {
        let initial_balance = checked_money(
            i128::from(balance.cents()) - i128::from(self.income_total.cents())
                + i128::from(self.expense_total.cents()),
        )?;
        Ok(Wallet {
            initial_balance,
            balance,
            ..self.clone()
        })
    }
}

/// Change to the three aggregate fields of a wallet.
///
/// The store applies all three fields in a single atomic increment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalletDelta {
    pub balance: Money,
    pub income: Money,
    pub expense: Money,
}

impl WalletDelta {
    pub fn is_zero(&self) -> bool {
        self.balance.is_zero() && self.income.is_zero() && self.expense.is_zero()
    }

    /// The delta that undoes `self`.
    pub fn reversed(self) -> Self {
        Self {
            balance: -self.balance,
            income: -self.income,
            expense: -self.expense,
        }
    }

    /// Field-wise sum of two deltas.
    pub fn try_add(self, rhs: WalletDelta) -> ResultEngine<WalletDelta> {
        Ok(Self {
            balance: self.balance.try_add(rhs.balance)?,
            income: self.income.try_add(rhs.income)?,
            expense: self.expense.try_add(rhs.expense)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub initial_balance: i64,
    pub balance: i64,
    pub income_total: i64,
    pub expense_total: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            owner_id: ActiveValue::Set(value.owner_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            initial_balance: ActiveValue::Set(value.initial_balance.cents()),
            balance: ActiveValue::Set(value.balance.cents()),
            income_total: ActiveValue::Set(value.income_total.cents()),
            expense_total: ActiveValue::Set(value.expense_total.cents()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl From<Model> for Wallet {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            initial_balance: Money::new(model.initial_balance),
            balance: Money::new(model.balance),
            income_total: Money::new(model.income_total),
            expense_total: Money::new(model.expense_total),
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> Wallet {
        Wallet::new("alice".to_string(), "Cash".to_string(), Money::new(1000))
    }

    #[test]
    fn new_wallet_starts_from_initial_balance() {
        let wallet = wallet();
        assert_eq!(wallet.balance, Money::new(1000));
        assert_eq!(wallet.income_total, Money::ZERO);
        assert_eq!(wallet.expense_total, Money::ZERO);
        assert!(wallet.is_consistent());
    }

    #[test]
    fn reversed_delta_cancels_out() {
        let delta = WalletDelta {
            balance: Money::new(-200),
            income: Money::ZERO,
            expense: Money::new(200),
        };
        let spent = wallet().applied(delta).unwrap();
        assert_eq!(spent.balance, Money::new(800));
        assert!(spent.is_consistent());

        let restored = spent.applied(delta.reversed()).unwrap();
        assert_eq!(restored.balance, Money::new(1000));
        assert_eq!(restored.expense_total, Money::ZERO);
        assert!(delta.try_add(delta.reversed()).unwrap().is_zero());
    }

    #[test]
    fn drift_is_detected() {
        let mut wallet = wallet();
        wallet.balance = Money::new(999);
        assert!(!wallet.is_consistent());
        assert_eq!(wallet.expected_balance().unwrap(), Money::new(1000));
    }

    #[test]
    fn overflowing_aggregates_are_rejected() {
        let mut rich = wallet();
        rich.balance = Money::new(i64::MAX);
        rich.initial_balance = Money::new(i64::MAX);
        let income = WalletDelta {
            balance: Money::new(1),
            income: Money::new(1),
            expense: Money::ZERO,
        };
        assert!(matches!(
            rich.applied(income),
            Err(crate::EngineError::Validation(_))
        ));

        // Intermediate sums may exceed i64 as long as the result fits.
        rich.income_total = Money::new(10);
        rich.expense_total = Money::new(10);
        assert!(rich.is_consistent());

        rich.expense_total = Money::new(-10);
        assert!(rich.expected_balance().is_err());
        assert!(!rich.is_consistent());
    }

    #[test]
    fn correction_rederives_the_initial_balance() {
        let mut wallet = wallet();
        wallet.income_total = Money::new(500);
        wallet.expense_total = Money::new(200);
        wallet.balance = Money::new(1300);

        let corrected = wallet.corrected(Money::new(50)).unwrap();
        assert_eq!(corrected.initial_balance, Money::new(-250));
        assert!(corrected.is_consistent());

        wallet.income_total = Money::new(i64::MAX);
        assert!(wallet.corrected(Money::new(i64::MIN)).is_err());
    }
}
