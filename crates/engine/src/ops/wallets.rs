use sea_orm::TransactionTrait;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    ChangeScope, DeletePolicy, EngineError, Money, ResultEngine, Wallet,
    retry::with_retry,
    store,
    util::{normalize_required_name, require_name_key, require_owner},
};

use super::{Engine, with_tx};

/// Sums over every wallet of an owner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub balance: Money,
    pub income: Money,
    pub expense: Money,
}

fn wallet_scopes(transactions_touched: u64) -> &'static [ChangeScope] {
    if transactions_touched > 0 {
        &[ChangeScope::Wallets, ChangeScope::Transactions]
    } else {
        &[ChangeScope::Wallets]
    }
}

impl Engine {
    /// Return a wallet snapshot from DB.
    pub async fn wallet(&self, owner_id: &str, wallet_id: Uuid) -> ResultEngine<Wallet> {
        let owner_id = require_owner(owner_id)?;
        store::wallets::find(&self.database, owner_id, wallet_id).await
    }

    /// Wallets of the owner, oldest first.
    pub async fn list_wallets(&self, owner_id: &str) -> ResultEngine<Vec<Wallet>> {
        let owner_id = require_owner(owner_id)?;
        store::wallets::list(&self.database, owner_id).await
    }

    /// Add a new wallet with zero totals.
    ///
    /// Names are unique per owner, compared case and accent insensitively.
    pub async fn create_wallet(
        &self,
        owner_id: &str,
        name: &str,
        initial_balance: Money,
    ) -> ResultEngine<Wallet> {
        let owner_id = require_owner(owner_id)?;
        let name = normalize_required_name(name, "wallet")?;
        let name_key = require_name_key(&name, "wallet")?;

        let wallet = with_retry(&self.config.retry, "create_wallet", || {
            self.create_wallet_unit(owner_id, &name, &name_key, initial_balance)
        })
        .await?;

        tracing::info!(owner_id, wallet_id = %wallet.id, "created wallet {}", wallet.name);
        self.publish(owner_id, &[ChangeScope::Wallets]);
        Ok(wallet)
    }

    async fn create_wallet_unit(
        &self,
        owner_id: &str,
        name: &str,
        name_key: &str,
        initial_balance: Money,
    ) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            if store::wallets::name_taken(&db_tx, owner_id, name_key, None).await? {
                return Err(EngineError::ExistingKey(name.to_string()));
            }
            let wallet = Wallet::new(owner_id.to_string(), name.to_string(), initial_balance);
            store::wallets::insert(&db_tx, &wallet).await?;
            Ok(wallet)
        })
    }

    /// Rename a wallet and optionally override its balance.
    ///
    /// A balance override is a manual correction: `initial_balance` is
    /// re-derived so that `balance == initial + income - expense` still holds.
    /// The new name is copied onto every transaction of the wallet.
    pub async fn rename_wallet(
        &self,
        owner_id: &str,
        wallet_id: Uuid,
        name: &str,
        balance: Option<Money>,
    ) -> ResultEngine<Wallet> {
        let owner_id = require_owner(owner_id)?;
        let name = normalize_required_name(name, "wallet")?;
        let name_key = require_name_key(&name, "wallet")?;

        let (wallet, touched) = with_retry(&self.config.retry, "rename_wallet", || {
            self.rename_wallet_unit(owner_id, wallet_id, &name, &name_key, balance)
        })
        .await?;

        tracing::info!(
            owner_id,
            wallet_id = %wallet.id,
            transactions = touched,
            "renamed wallet to {}, balance {}",
            wallet.name,
            wallet.balance
        );
        self.publish(owner_id, wallet_scopes(touched));
        Ok(wallet)
    }

    async fn rename_wallet_unit(
        &self,
        owner_id: &str,
        wallet_id: Uuid,
        name: &str,
        name_key: &str,
        balance: Option<Money>,
    ) -> ResultEngine<(Wallet, u64)> {
        with_tx!(self, |db_tx| {
            let current = store::wallets::find(&db_tx, owner_id, wallet_id).await?;
            if store::wallets::name_taken(&db_tx, owner_id, name_key, Some(wallet_id)).await? {
                return Err(EngineError::ExistingKey(name.to_string()));
            }
            if let Some(balance) = balance {
                current.corrected(balance)?;
            }
            store::wallets::rename(&db_tx, owner_id, wallet_id, name, balance).await?;
            let touched =
                store::transactions::rename_wallet(&db_tx, owner_id, wallet_id, name).await?;
            let wallet = store::wallets::find(&db_tx, owner_id, wallet_id).await?;
            Ok((wallet, touched))
        })
    }

    /// Delete a wallet.
    ///
    /// With [`DeletePolicy::Reject`] a wallet that still has transactions is
    /// refused with a conflict; with [`DeletePolicy::Cascade`] its
    /// transactions are deleted too. Returns the number of deleted
    /// transactions.
    pub async fn delete_wallet(
        &self,
        owner_id: &str,
        wallet_id: Uuid,
        policy: DeletePolicy,
    ) -> ResultEngine<u64> {
        let owner_id = require_owner(owner_id)?;
        let removed = self.delete_wallet_unit(owner_id, wallet_id, policy).await?;

        tracing::info!(
            owner_id,
            wallet_id = %wallet_id,
            transactions = removed,
            "deleted wallet"
        );
        self.publish(owner_id, wallet_scopes(removed));
        Ok(removed)
    }

    async fn delete_wallet_unit(
        &self,
        owner_id: &str,
        wallet_id: Uuid,
        policy: DeletePolicy,
    ) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            store::wallets::find(&db_tx, owner_id, wallet_id).await?;
            let count =
                store::transactions::count_for_wallet(&db_tx, owner_id, wallet_id).await?;
            let removed = match policy {
                DeletePolicy::Reject if count > 0 => {
                    return Err(EngineError::Conflict(format!(
                        "wallet has {count} transactions"
                    )));
                }
                DeletePolicy::Reject => 0,
                DeletePolicy::Cascade => {
                    store::transactions::delete_for_wallet(&db_tx, owner_id, wallet_id).await?
                }
            };
            store::wallets::delete(&db_tx, owner_id, wallet_id).await?;
            Ok(removed)
        })
    }

    /// Balance, income and expense summed over the owner's wallets.
    ///
    /// Fails with a validation error when a sum does not fit in `Money`.
    pub async fn totals(&self, owner_id: &str) -> ResultEngine<Totals> {
        let wallets = self.list_wallets(owner_id).await?;
        wallets.iter().try_fold(Totals::default(), |acc, w| {
            Ok(Totals {
                balance: acc.balance.try_add(w.balance)?,
                income: acc.income.try_add(w.income_total)?,
                expense: acc.expense.try_add(w.expense_total)?,
            })
        })
    }
}
