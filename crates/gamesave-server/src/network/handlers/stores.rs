//! `/api/stores` route handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use gamesave_core::Store;

use super::{ApiError, AppState};
use crate::storage::metadata::RequestCancel;

#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub store_id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ListStoresResponse {
    pub stores: Vec<Store>,
}

/// `GET /api/stores`
pub async fn list_stores_handler(State(state): State<AppState>) -> Result<Json<ListStoresResponse>, ApiError> {
    let ctx = RequestCancel::new();
    let stores = state.service.list_stores(&ctx).await?;
    Ok(Json(ListStoresResponse { stores }))
}

/// `POST /api/stores`
pub async fn create_store_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<Store>), ApiError> {
    let ctx = RequestCancel::new();
    let store = state.service.create_store(&ctx, &body.store_id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(store)))
}

/// `GET /api/stores/{store_id}`
pub async fn get_store_handler(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
) -> Result<Json<Store>, ApiError> {
    let ctx = RequestCancel::new();
    let store = state.service.get_store(&ctx, &store_id).await?;
    Ok(Json(store))
}

/// `DELETE /api/stores/{store_id}`
pub async fn delete_store_handler(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let ctx = RequestCancel::new();
    state.service.delete_store(&ctx, &store_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
