//! Transactions API endpoints

use api_types::transaction::{
    FeedParams, FeedResponse, TransactionNew, TransactionRetired, TransactionUpdate,
    TransactionView,
};
use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use engine::{Amendment, FeedFilter, FeedQuery, RecordCmd};
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{kind_from_api, parse_money, transaction_view},
    server::{Owner, ServerState},
};

pub async fn feed(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
    params: Result<Query<FeedParams>, QueryRejection>,
) -> Result<Json<FeedResponse>, ServerError> {
    let Query(params) = params?;
    let query = FeedQuery {
        filter: FeedFilter {
            wallet_id: params.wallet_id,
            kind: params.kind.map(kind_from_api),
            from: params.from,
            to: params.to,
        },
        limit: params.limit,
        cursor: params.cursor,
    };
    let page = state.engine.feed(&owner_id, &query).await?;
    Ok(Json(FeedResponse {
        transactions: page
            .transactions
            .into_iter()
            .map(transaction_view)
            .collect(),
        next_cursor: page.next_cursor,
    }))
}

pub async fn record(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
    payload: Result<Json<TransactionNew>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let Json(payload) = payload?;
    let amount = parse_money(&payload.amount)?;
    let mut cmd = RecordCmd::new(
        owner_id,
        kind_from_api(payload.kind),
        payload.wallet_id,
        amount,
        payload.date,
    )
    .category(payload.category)
    .description(payload.description.unwrap_or_default());
    if let Some(key) = payload.idempotency_key {
        cmd = cmd.idempotency_key(key);
    }

    let tx = state.engine.record(cmd).await?;
    Ok((StatusCode::CREATED, Json(transaction_view(tx))))
}

pub async fn amend(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
    transaction_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TransactionUpdate>, JsonRejection>,
) -> Result<Json<TransactionView>, ServerError> {
    let Path(transaction_id) = transaction_id?;
    let Json(payload) = payload?;
    let amendment = Amendment {
        kind: payload.kind.map(kind_from_api),
        category: payload.category,
        amount: payload.amount.as_deref().map(parse_money).transpose()?,
        wallet_id: payload.wallet_id,
        description: payload.description,
        date: payload.date,
    };
    let tx = state
        .engine
        .amend(&owner_id, transaction_id, amendment)
        .await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn retire(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
    transaction_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TransactionRetired>, ServerError> {
    let Path(transaction_id) = transaction_id?;
    let retired = state.engine.retire(&owner_id, transaction_id).await?;
    Ok(Json(TransactionRetired { retired }))
}
