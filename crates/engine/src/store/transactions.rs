//! Transaction log: append, update and remove records, partitioned by kind.
//!
//! Point operations address a record by `(id, kind)`, the same way the two
//! partitions of the log are kept apart by the `(owner_id, kind)` index.

use sea_orm::{ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionFields, TransactionKind, transactions,
};

fn transaction_not_found() -> EngineError {
    EngineError::KeyNotFound("transaction not exists".to_string())
}

fn into_transactions(models: Vec<transactions::Model>) -> ResultEngine<Vec<Transaction>> {
    models.into_iter().map(Transaction::try_from).collect()
}

pub(crate) async fn append<C: ConnectionTrait>(db: &C, tx: &Transaction) -> ResultEngine<Uuid> {
    transactions::ActiveModel::from(tx).insert(db).await?;
    Ok(tx.id)
}

pub(crate) async fn find<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    id: Uuid,
) -> ResultEngine<Option<Transaction>> {
    transactions::Entity::find_by_id(id)
        .filter(transactions::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .map(Transaction::try_from)
        .transpose()
}

pub(crate) async fn find_by_idempotency_key<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    key: &str,
) -> ResultEngine<Option<Transaction>> {
    transactions::Entity::find()
        .filter(transactions::Column::OwnerId.eq(owner_id))
        .filter(transactions::Column::IdempotencyKey.eq(key))
        .one(db)
        .await?
        .map(Transaction::try_from)
        .transpose()
}

/// Overwrites the mutable fields of a record in place.
pub(crate) async fn update<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    id: Uuid,
    kind: TransactionKind,
    fields: &TransactionFields,
) -> ResultEngine<()> {
    let changes = transactions::ActiveModel {
        category: ActiveValue::Set(fields.category.clone()),
        amount_minor: ActiveValue::Set(fields.amount.cents()),
        wallet_id: ActiveValue::Set(fields.wallet_id),
        wallet_name: ActiveValue::Set(fields.wallet_name.clone()),
        description: ActiveValue::Set(fields.description.clone()),
        date: ActiveValue::Set(fields.date),
        ..Default::default()
    };
    let result = transactions::Entity::update_many()
        .set(changes)
        .filter(transactions::Column::Id.eq(id))
        .filter(transactions::Column::OwnerId.eq(owner_id))
        .filter(transactions::Column::Kind.eq(kind.as_str()))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(transaction_not_found());
    }
    Ok(())
}

pub(crate) async fn remove<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    id: Uuid,
    kind: TransactionKind,
) -> ResultEngine<()> {
    let result = transactions::Entity::delete_many()
        .filter(transactions::Column::Id.eq(id))
        .filter(transactions::Column::OwnerId.eq(owner_id))
        .filter(transactions::Column::Kind.eq(kind.as_str()))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(transaction_not_found());
    }
    Ok(())
}

/// Full scan of one kind partition for the owner.
pub(crate) async fn list_all<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    kind: TransactionKind,
) -> ResultEngine<Vec<Transaction>> {
    let models = transactions::Entity::find()
        .filter(transactions::Column::OwnerId.eq(owner_id))
        .filter(transactions::Column::Kind.eq(kind.as_str()))
        .order_by_asc(transactions::Column::CreatedAt)
        .all(db)
        .await?;
    into_transactions(models)
}

pub(crate) async fn list_for_wallet<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    wallet_id: Uuid,
) -> ResultEngine<Vec<Transaction>> {
    let models = transactions::Entity::find()
        .filter(transactions::Column::OwnerId.eq(owner_id))
        .filter(transactions::Column::WalletId.eq(wallet_id))
        .all(db)
        .await?;
    into_transactions(models)
}

pub(crate) async fn count_for_wallet<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    wallet_id: Uuid,
) -> ResultEngine<u64> {
    let count = transactions::Entity::find()
        .filter(transactions::Column::OwnerId.eq(owner_id))
        .filter(transactions::Column::WalletId.eq(wallet_id))
        .count(db)
        .await?;
    Ok(count)
}

pub(crate) async fn delete_for_wallet<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    wallet_id: Uuid,
) -> ResultEngine<u64> {
    let result = transactions::Entity::delete_many()
        .filter(transactions::Column::OwnerId.eq(owner_id))
        .filter(transactions::Column::WalletId.eq(wallet_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Refreshes the denormalized wallet name on every record of the wallet.
pub(crate) async fn rename_wallet<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    wallet_id: Uuid,
    wallet_name: &str,
) -> ResultEngine<u64> {
    let changes = transactions::ActiveModel {
        wallet_name: ActiveValue::Set(wallet_name.to_string()),
        ..Default::default()
    };
    let result = transactions::Entity::update_many()
        .set(changes)
        .filter(transactions::Column::OwnerId.eq(owner_id))
        .filter(transactions::Column::WalletId.eq(wallet_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
