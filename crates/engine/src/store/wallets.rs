//! Wallet store: wallet rows and the atomic aggregate increment.

use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, Wallet, WalletDelta, wallets};

fn wallet_not_found() -> EngineError {
    EngineError::KeyNotFound("wallet not exists".to_string())
}

pub(crate) async fn insert<C: ConnectionTrait>(db: &C, wallet: &Wallet) -> ResultEngine<()> {
    wallets::ActiveModel::from(wallet).insert(db).await?;
    Ok(())
}

pub(crate) async fn find<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    wallet_id: Uuid,
) -> ResultEngine<Wallet> {
    wallets::Entity::find_by_id(wallet_id)
        .filter(wallets::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .map(Wallet::from)
        .ok_or_else(wallet_not_found)
}

pub(crate) async fn list<C: ConnectionTrait>(db: &C, owner_id: &str) -> ResultEngine<Vec<Wallet>> {
    let models = wallets::Entity::find()
        .filter(wallets::Column::OwnerId.eq(owner_id))
        .order_by_asc(wallets::Column::CreatedAt)
        .order_by_asc(wallets::Column::Id)
        .all(db)
        .await?;
    Ok(models.into_iter().map(Wallet::from).collect())
}

/// Looks for another wallet of the owner whose name has the same key.
pub(crate) async fn name_taken<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    name_key: &str,
    except: Option<Uuid>,
) -> ResultEngine<bool> {
    let taken = list(db, owner_id)
        .await?
        .into_iter()
        .filter(|w| Some(w.id) != except)
        .any(|w| crate::util::normalize_name_key(&w.name) == name_key);
    Ok(taken)
}

/// Adds `delta` to the three aggregate columns in one statement.
///
/// The increment is evaluated by the store (`col = col + delta`), so two
/// concurrent adjustments of the same wallet can never overwrite each other.
pub(crate) async fn adjust<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    wallet_id: Uuid,
    delta: WalletDelta,
) -> ResultEngine<()> {
    let result = wallets::Entity::update_many()
        .col_expr(
            wallets::Column::Balance,
            Expr::col(wallets::Column::Balance).add(delta.balance.cents()),
        )
        .col_expr(
            wallets::Column::IncomeTotal,
            Expr::col(wallets::Column::IncomeTotal).add(delta.income.cents()),
        )
        .col_expr(
            wallets::Column::ExpenseTotal,
            Expr::col(wallets::Column::ExpenseTotal).add(delta.expense.cents()),
        )
        .filter(wallets::Column::Id.eq(wallet_id))
        .filter(wallets::Column::OwnerId.eq(owner_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(wallet_not_found());
    }
    Ok(())
}

/// Manual correction: new name and, optionally, a new balance.
///
/// A new balance re-derives `initial_balance` from the current totals so the
/// ledger identity keeps holding.
pub(crate) async fn rename<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    wallet_id: Uuid,
    name: &str,
    balance: Option<Money>,
) -> ResultEngine<()> {
    let mut update = wallets::Entity::update_many()
        .col_expr(wallets::Column::Name, Expr::value(name.to_string()));
    if let Some(balance) = balance {
        update = update
            .col_expr(wallets::Column::Balance, Expr::value(balance.cents()))
            .col_expr(
                wallets::Column::InitialBalance,
                Expr::col(wallets::Column::ExpenseTotal)
                    .sub(Expr::col(wallets::Column::IncomeTotal))
                    .add(balance.cents()),
            );
    }
    let result = update
        .filter(wallets::Column::Id.eq(wallet_id))
        .filter(wallets::Column::OwnerId.eq(owner_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(wallet_not_found());
    }
    Ok(())
}

/// Overwrites the cached aggregate with the values in `wallet`.
pub(crate) async fn overwrite_aggregate<C: ConnectionTrait>(
    db: &C,
    wallet: &Wallet,
) -> ResultEngine<()> {
    let active = wallets::ActiveModel {
        id: ActiveValue::Unchanged(wallet.id),
        balance: ActiveValue::Set(wallet.balance.cents()),
        income_total: ActiveValue::Set(wallet.income_total.cents()),
        expense_total: ActiveValue::Set(wallet.expense_total.cents()),
        ..Default::default()
    };
    active.update(db).await?;
    Ok(())
}

pub(crate) async fn delete<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    wallet_id: Uuid,
) -> ResultEngine<()> {
    let result = wallets::Entity::delete_many()
        .filter(wallets::Column::Id.eq(wallet_id))
        .filter(wallets::Column::OwnerId.eq(owner_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(wallet_not_found());
    }
    Ok(())
}

/// Verifies `balance == initial_balance + income_total - expense_total`.
pub(crate) async fn ensure_consistent<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    wallet_id: Uuid,
) -> ResultEngine<()> {
    let wallet = find(db, owner_id, wallet_id).await?;
    if !wallet.is_consistent() {
        let expected = wallet
            .expected_balance()
            .map_or_else(|_| "out of range".to_string(), |m| m.to_string());
        return Err(EngineError::Consistency(
            wallet.id,
            format!(
                "balance is {} but initial {} + income {} - expense {} is {expected}",
                wallet.balance, wallet.initial_balance, wallet.income_total, wallet.expense_total,
            ),
        ));
    }
    Ok(())
}
