//! Wallets API endpoints.

use api_types::wallet::{
    Totals, WalletDelete, WalletDeleted, WalletList, WalletNew, WalletUpdate, WalletView,
};
use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use engine::{DeletePolicy, Money};
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{parse_money, totals_view, wallet_view},
    server::{Owner, ServerState},
};

pub async fn list(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
) -> Result<Json<WalletList>, ServerError> {
    let wallets = state
        .engine
        .list_wallets(&owner_id)
        .await?
        .into_iter()
        .map(wallet_view)
        .collect();
    Ok(Json(WalletList { wallets }))
}

pub async fn create(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
    payload: Result<Json<WalletNew>, JsonRejection>,
) -> Result<(StatusCode, Json<WalletView>), ServerError> {
    let Json(payload) = payload?;
    let initial_balance = match payload.initial_balance.as_deref() {
        Some(value) => parse_money(value)?,
        None => Money::ZERO,
    };
    let wallet = state
        .engine
        .create_wallet(&owner_id, &payload.name, initial_balance)
        .await?;
    Ok((StatusCode::CREATED, Json(wallet_view(wallet))))
}

pub async fn get(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
    wallet_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<WalletView>, ServerError> {
    let Path(wallet_id) = wallet_id?;
    let wallet = state.engine.wallet(&owner_id, wallet_id).await?;
    Ok(Json(wallet_view(wallet)))
}

pub async fn update(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
    wallet_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<WalletUpdate>, JsonRejection>,
) -> Result<Json<WalletView>, ServerError> {
    let Path(wallet_id) = wallet_id?;
    let Json(payload) = payload?;
    let balance = payload.balance.as_deref().map(parse_money).transpose()?;
    let wallet = state
        .engine
        .rename_wallet(&owner_id, wallet_id, &payload.name, balance)
        .await?;
    Ok(Json(wallet_view(wallet)))
}

pub async fn delete(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
    wallet_id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<WalletDelete>, QueryRejection>,
) -> Result<Json<WalletDeleted>, ServerError> {
    let Path(wallet_id) = wallet_id?;
    let Query(params) = params?;
    let policy = if params.cascade.unwrap_or(false) {
        DeletePolicy::Cascade
    } else {
        DeletePolicy::Reject
    };
    let transactions_deleted = state
        .engine
        .delete_wallet(&owner_id, wallet_id, policy)
        .await?;
    Ok(Json(WalletDeleted {
        transactions_deleted,
    }))
}

pub async fn recompute(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
    wallet_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<WalletView>, ServerError> {
    let Path(wallet_id) = wallet_id?;
    let wallet = state.engine.recompute(&owner_id, wallet_id).await?;
    Ok(Json(wallet_view(wallet)))
}

pub async fn totals(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
) -> Result<Json<Totals>, ServerError> {
    let totals = state.engine.totals(&owner_id).await?;
    Ok(Json(totals_view(totals)))
}
