//! Ledger writes: record, amend, retire and recompute.
//!
//! Each write is one unit of work: the log change and every wallet adjustment
//! it implies run inside a single DB transaction, followed by a check of the
//! wallet identity for the touched wallets. A failure at any step rolls the
//! whole unit back. Transient failures are retried with backoff; a failed
//! identity check triggers a recompute of the wallet and one more attempt.

use std::future::Future;

use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    Amendment, ChangeScope, EngineError, Money, RecordCmd, ResultEngine, Transaction,
    TransactionFields, TransactionKind, Wallet,
    retry::with_retry,
    store,
    util::{normalize_description, normalize_required_name, require_owner},
};

use super::{Engine, with_tx};

const LEDGER_SCOPES: &[ChangeScope] = &[ChangeScope::Transactions, ChangeScope::Wallets];

fn normalize_idempotency_key(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn ensure_positive(amount: Money) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::Validation("amount must be > 0".to_string()));
    }
    Ok(())
}

impl Engine {
    /// Runs a ledger unit of work with retries and identity repair.
    async fn run_ledger_unit<T, F, Fut>(
        &self,
        owner_id: &str,
        label: &'static str,
        mut unit: F,
    ) -> ResultEngine<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ResultEngine<T>>,
    {
        match with_retry(&self.config.retry, label, &mut unit).await {
            Err(EngineError::Consistency(wallet_id, detail)) => {
                tracing::error!(
                    owner_id,
                    wallet_id = %wallet_id,
                    op = label,
                    "wallet identity violated: {detail}; recomputing"
                );
                self.recompute(owner_id, wallet_id).await?;
                with_retry(&self.config.retry, label, &mut unit).await
            }
            outcome => outcome,
        }
    }

    /// Record an income or expense and apply it to its wallet.
    ///
    /// With an idempotency key already used by the owner, the stored record is
    /// returned and nothing is written.
    pub async fn record(&self, cmd: RecordCmd) -> ResultEngine<Transaction> {
        let owner_id = require_owner(&cmd.owner_id)?;
        let category = normalize_required_name(&cmd.category, "category")?;
        let description =
            normalize_description(&cmd.description, self.config.max_description_len)?;
        ensure_positive(cmd.amount)?;
        let key = normalize_idempotency_key(cmd.idempotency_key.as_deref());

        let (tx, created) = self
            .run_ledger_unit(owner_id, "record", || {
                self.record_unit(
                    owner_id,
                    &cmd,
                    category.clone(),
                    description.clone(),
                    key.clone(),
                )
            })
            .await?;

        if created {
            tracing::debug!(
                owner_id,
                transaction_id = %tx.id,
                wallet_id = %tx.wallet_id,
                "recorded {} of {}",
                tx.kind,
                tx.amount
            );
            self.publish(owner_id, LEDGER_SCOPES);
        }
        Ok(tx)
    }

    async fn record_unit(
        &self,
        owner_id: &str,
        cmd: &RecordCmd,
        category: String,
        description: String,
        key: Option<String>,
    ) -> ResultEngine<(Transaction, bool)> {
        with_tx!(self, |db_tx| {
            if let Some(key) = key.as_deref() {
                let existing =
                    store::transactions::find_by_idempotency_key(&db_tx, owner_id, key).await?;
                if let Some(existing) = existing {
                    return Ok((existing, false));
                }
            }

            let wallet = store::wallets::find(&db_tx, owner_id, cmd.wallet_id).await?;
            wallet.applied(cmd.kind.effect(cmd.amount))?;
            let tx = Transaction::new(
                owner_id.to_string(),
                cmd.kind,
                TransactionFields {
                    category,
                    amount: cmd.amount,
                    wallet_id: wallet.id,
                    wallet_name: wallet.name,
                    description,
                    date: cmd.date,
                },
                key,
            )?;
            store::transactions::append(&db_tx, &tx).await?;
            store::wallets::adjust(&db_tx, owner_id, tx.wallet_id, tx.effect()).await?;
            store::wallets::ensure_consistent(&db_tx, owner_id, tx.wallet_id).await?;
            Ok((tx, true))
        })
    }

    /// Amend a recorded transaction and move its effect accordingly.
    ///
    /// The old effect is reversed and the new one applied in the same unit of
    /// work; when both land on the same wallet only the net difference is
    /// written. A kind change replaces the record with a new id, which is why
    /// the resulting transaction is returned.
    pub async fn amend(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
        amendment: Amendment,
    ) -> ResultEngine<Transaction> {
        let owner_id = require_owner(owner_id)?;
        let amendment = Amendment {
            category: amendment
                .category
                .as_deref()
                .map(|c| normalize_required_name(c, "category"))
                .transpose()?,
            description: amendment
                .description
                .as_deref()
                .map(|d| normalize_description(d, self.config.max_description_len))
                .transpose()?,
            ..amendment
        };
        if let Some(amount) = amendment.amount {
            ensure_positive(amount)?;
        }

        let (previous, amended) = self
            .run_ledger_unit(owner_id, "amend", || {
                self.amend_unit(owner_id, transaction_id, &amendment)
            })
            .await?;

        tracing::debug!(
            owner_id,
            transaction_id = %previous.id,
            amended_id = %amended.id,
            "amended {} into {} of {}",
            previous.kind,
            amended.kind,
            amended.amount
        );
        self.publish(owner_id, LEDGER_SCOPES);
        Ok(amended)
    }

    async fn amend_unit(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
        amendment: &Amendment,
    ) -> ResultEngine<(Transaction, Transaction)> {
        with_tx!(self, |db_tx| {
            let current = store::transactions::find(&db_tx, owner_id, transaction_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;

            let target_wallet_id = amendment.wallet_id.unwrap_or(current.wallet_id);
            let target_wallet = store::wallets::find(&db_tx, owner_id, target_wallet_id).await?;
            let kind = amendment.kind.unwrap_or(current.kind);
            let mut fields = current.fields();
            if let Some(category) = &amendment.category {
                fields.category = category.clone();
            }
            if let Some(amount) = amendment.amount {
                fields.amount = amount;
            }
            if let Some(description) = &amendment.description {
                fields.description = description.clone();
            }
            if let Some(date) = amendment.date {
                fields.date = date;
            }
            fields.wallet_id = target_wallet.id;
            fields.wallet_name = target_wallet.name.clone();

            let amended = if kind == current.kind {
                store::transactions::update(&db_tx, owner_id, current.id, current.kind, &fields)
                    .await?;
                Transaction {
                    category: fields.category,
                    amount: fields.amount,
                    wallet_id: fields.wallet_id,
                    wallet_name: fields.wallet_name,
                    description: fields.description,
                    date: fields.date,
                    ..current.clone()
                }
            } else {
                store::transactions::remove(&db_tx, owner_id, current.id, current.kind).await?;
                let mut replacement = Transaction::new(
                    owner_id.to_string(),
                    kind,
                    fields,
                    current.idempotency_key.clone(),
                )?;
                replacement.created_at = current.created_at;
                store::transactions::append(&db_tx, &replacement).await?;
                replacement
            };

            let reverse = current.effect().reversed();
            if current.wallet_id == amended.wallet_id {
                let net = reverse.try_add(amended.effect())?;
                target_wallet.applied(net)?;
                store::wallets::adjust(&db_tx, owner_id, current.wallet_id, net).await?;
            } else {
                store::wallets::find(&db_tx, owner_id, current.wallet_id)
                    .await?
                    .applied(reverse)?;
                target_wallet.applied(amended.effect())?;
                store::wallets::adjust(&db_tx, owner_id, current.wallet_id, reverse).await?;
                store::wallets::adjust(&db_tx, owner_id, amended.wallet_id, amended.effect())
                    .await?;
                store::wallets::ensure_consistent(&db_tx, owner_id, current.wallet_id).await?;
            }
            store::wallets::ensure_consistent(&db_tx, owner_id, amended.wallet_id).await?;
            Ok((current, amended))
        })
    }

    /// Remove a transaction and reverse its effect on the wallet.
    ///
    /// Returns `false` when the transaction does not exist: retiring twice is
    /// a no-op.
    pub async fn retire(&self, owner_id: &str, transaction_id: Uuid) -> ResultEngine<bool> {
        let owner_id = require_owner(owner_id)?;
        let retired = self
            .run_ledger_unit(owner_id, "retire", || {
                self.retire_unit(owner_id, transaction_id)
            })
            .await?;

        match retired {
            Some(tx) => {
                tracing::debug!(
                    owner_id,
                    transaction_id = %tx.id,
                    wallet_id = %tx.wallet_id,
                    "retired {} of {}",
                    tx.kind,
                    tx.amount
                );
                self.publish(owner_id, LEDGER_SCOPES);
                Ok(true)
            }
            None => {
                tracing::debug!(owner_id, transaction_id = %transaction_id, "retire: already absent");
                Ok(false)
            }
        }
    }

    async fn retire_unit(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Option<Transaction>> {
        with_tx!(self, |db_tx| {
            let Some(current) =
                store::transactions::find(&db_tx, owner_id, transaction_id).await?
            else {
                return Ok(None);
            };
            store::wallets::find(&db_tx, owner_id, current.wallet_id)
                .await?
                .applied(current.effect().reversed())?;
            store::wallets::adjust(
                &db_tx,
                owner_id,
                current.wallet_id,
                current.effect().reversed(),
            )
            .await?;
            store::transactions::remove(&db_tx, owner_id, current.id, current.kind).await?;
            store::wallets::ensure_consistent(&db_tx, owner_id, current.wallet_id).await?;
            Ok(Some(current))
        })
    }

    /// Rebuild the aggregate of one wallet from the transaction log.
    ///
    /// `initial_balance` is kept; totals are summed from the log and the
    /// balance is derived from them.
    pub async fn recompute(&self, owner_id: &str, wallet_id: Uuid) -> ResultEngine<Wallet> {
        let owner_id = require_owner(owner_id)?;
        let (before, after) = with_retry(&self.config.retry, "recompute", || {
            self.recompute_unit(owner_id, wallet_id)
        })
        .await?;

        if before != after {
            tracing::info!(
                owner_id,
                wallet_id = %wallet_id,
                "recomputed wallet: balance {} -> {}, income {} -> {}, expense {} -> {}",
                before.balance,
                after.balance,
                before.income_total,
                after.income_total,
                before.expense_total,
                after.expense_total
            );
            self.publish(owner_id, &[ChangeScope::Wallets]);
        } else {
            tracing::debug!(owner_id, wallet_id = %wallet_id, "recompute: wallet already consistent");
        }
        Ok(after)
    }

    async fn recompute_unit(
        &self,
        owner_id: &str,
        wallet_id: Uuid,
    ) -> ResultEngine<(Wallet, Wallet)> {
        with_tx!(self, |db_tx| {
            let before = store::wallets::find(&db_tx, owner_id, wallet_id).await?;
            let log = store::transactions::list_for_wallet(&db_tx, owner_id, wallet_id).await?;

            let mut after = before.clone();
            after.income_total = Money::ZERO;
            after.expense_total = Money::ZERO;
            for tx in &log {
                match tx.kind {
                    TransactionKind::Income => {
                        after.income_total = after.income_total.try_add(tx.amount)?;
                    }
                    TransactionKind::Expense => {
                        after.expense_total = after.expense_total.try_add(tx.amount)?;
                    }
                }
            }
            after.balance = after.expected_balance()?;

            if before != after {
                store::wallets::overwrite_aggregate(&db_tx, &after).await?;
            }
            Ok((before, after))
        })
    }

    /// Recompute every wallet of the owner.
    pub async fn recompute_all(&self, owner_id: &str) -> ResultEngine<Vec<Wallet>> {
        let owner_id = require_owner(owner_id)?;
        let wallets = store::wallets::list(&self.database, owner_id).await?;
        let mut out = Vec::with_capacity(wallets.len());
        for wallet in wallets {
            out.push(self.recompute(owner_id, wallet.id).await?);
        }
        Ok(out)
    }
}
