//! Categories API endpoints.

use api_types::category::{CategoryFilter, CategoryList, CategoryNew, CategoryView};
use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{category_view, kind_from_api},
    server::{Owner, ServerState},
};

pub async fn list(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
    filter: Result<Query<CategoryFilter>, QueryRejection>,
) -> Result<Json<CategoryList>, ServerError> {
    let Query(filter) = filter?;
    let categories = state
        .engine
        .list_categories(&owner_id, filter.kind.map(kind_from_api))
        .await?
        .into_iter()
        .map(category_view)
        .collect();
    Ok(Json(CategoryList { categories }))
}

pub async fn create(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
    payload: Result<Json<CategoryNew>, JsonRejection>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let Json(payload) = payload?;
    let category = state
        .engine
        .create_category(&owner_id, kind_from_api(payload.kind), &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(category_view(category))))
}

pub async fn delete(
    Extension(Owner(owner_id)): Extension<Owner>,
    State(state): State<ServerState>,
    category_id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ServerError> {
    let Path(category_id) = category_id?;
    state.engine.delete_category(&owner_id, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
