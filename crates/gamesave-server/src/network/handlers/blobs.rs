//! `/api/stores/{store_id}/records/{record_id}/blobs` route handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::{ApiError, AppState};
use crate::storage::blob::BlobPayload;
use crate::storage::metadata::RequestCancel;

/// `GET /api/stores/{store_id}/records/{record_id}/blobs`
pub async fn list_blobs_handler(
    State(state): State<AppState>,
    Path((store_id, record_id)): Path<(String, String)>,
) -> Result<Json<Vec<String>>, ApiError> {
    let ctx = RequestCancel::new();
    let keys = state.service.list_blobs(&ctx, &store_id, &record_id).await?;
    Ok(Json(keys))
}

/// `PUT /api/stores/{store_id}/records/{record_id}/blobs/{blob_key}`
pub async fn put_blob_handler(
    State(state): State<AppState>,
    Path((store_id, record_id, blob_key)): Path<(String, String, String)>,
    headers: axum::http::HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let ctx = RequestCancel::new();
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state
        .service
        .put_blob(
            &ctx,
            &store_id,
            &record_id,
            &blob_key,
            BlobPayload { bytes: body, content_type },
        )
        .await?;
    Ok(StatusCode::OK)
}

/// `GET /api/stores/{store_id}/records/{record_id}/blobs/{blob_key}`
pub async fn get_blob_handler(
    State(state): State<AppState>,
    Path((store_id, record_id, blob_key)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let ctx = RequestCancel::new();
    let payload = state.service.get_blob(&ctx, &store_id, &record_id, &blob_key).await?;

    let content_type = payload
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, payload.bytes.len().to_string()),
        ],
        payload.bytes,
    )
        .into_response())
}

/// `DELETE /api/stores/{store_id}/records/{record_id}/blobs/{blob_key}`
pub async fn delete_blob_handler(
    State(state): State<AppState>,
    Path((store_id, record_id, blob_key)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let ctx = RequestCancel::new();
    state.service.delete_blob(&ctx, &store_id, &record_id, &blob_key).await?;
    Ok(StatusCode::NO_CONTENT)
}
