//! `/api/metadata/{metadata_type}/{metadata_id}` route handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{Map, Value};

use super::{ApiError, AppState};
use crate::storage::metadata::RequestCancel;

/// `POST /api/metadata/{type}/{id}` -- upsert.
pub async fn set_metadata_handler(
    State(state): State<AppState>,
    Path((metadata_type, metadata_id)): Path<(String, String)>,
    Json(body): Json<Map<String, Value>>,
) -> Result<StatusCode, ApiError> {
    let ctx = RequestCancel::new();
    state
        .service
        .set_metadata(&ctx, &metadata_type, &metadata_id, body)
        .await?;
    Ok(StatusCode::OK)
}

/// `GET /api/metadata/{type}/{id}`
pub async fn get_metadata_handler(
    State(state): State<AppState>,
    Path((metadata_type, metadata_id)): Path<(String, String)>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let ctx = RequestCancel::new();
    let data = state.service.get_metadata(&ctx, &metadata_type, &metadata_id).await?;
    Ok(Json(data))
}

/// `DELETE /api/metadata/{type}/{id}`
pub async fn delete_metadata_handler(
    State(state): State<AppState>,
    Path((metadata_type, metadata_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let ctx = RequestCancel::new();
    state
        .service
        .delete_metadata(&ctx, &metadata_type, &metadata_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
