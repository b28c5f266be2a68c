//! `/api/stores/{store_id}/records` route handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use gamesave_core::{Record, RecordQuery};

use super::{ApiError, AppState};
use crate::domain::RecordPatch;
use crate::storage::metadata::RequestCancel;

#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub record_id: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecordRequest {
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl From<UpdateRecordRequest> for RecordPatch {
    fn from(req: UpdateRecordRequest) -> Self {
        Self {
            owner_id: req.owner_id,
            game_id: req.game_id,
            tags: req.tags,
            properties: req.properties,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListRecordsParams {
    pub owner_id: Option<String>,
    pub game_id: Option<String>,
    pub limit: Option<u32>,
}

impl From<ListRecordsParams> for RecordQuery {
    fn from(params: ListRecordsParams) -> Self {
        Self {
            owner_id: params.owner_id,
            game_id: params.game_id,
            limit: params.limit.unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListRecordsResponse {
    pub records: Vec<Record>,
}

/// `GET /api/stores/{store_id}/records`
pub async fn list_records_handler(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    Query(params): Query<ListRecordsParams>,
) -> Result<Json<ListRecordsResponse>, ApiError> {
    let ctx = RequestCancel::new();
    let records = state
        .service
        .query_records(&ctx, &store_id, &params.into())
        .await?;
    Ok(Json(ListRecordsResponse { records }))
}

/// `POST /api/stores/{store_id}/records`
pub async fn create_record_handler(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    Json(body): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let ctx = RequestCancel::new();
    let record = state
        .service
        .create_record(
            &ctx,
            &store_id,
            &body.record_id,
            body.owner_id,
            body.game_id,
            body.tags,
            body.properties,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /api/stores/{store_id}/records/{record_id}`
pub async fn get_record_handler(
    State(state): State<AppState>,
    Path((store_id, record_id)): Path<(String, String)>,
) -> Result<Json<Record>, ApiError> {
    let ctx = RequestCancel::new();
    let record = state.service.get_record(&ctx, &store_id, &record_id).await?;
    Ok(Json(record))
}

/// `PUT /api/stores/{store_id}/records/{record_id}`
pub async fn update_record_handler(
    State(state): State<AppState>,
    Path((store_id, record_id)): Path<(String, String)>,
    Json(body): Json<UpdateRecordRequest>,
) -> Result<Json<Record>, ApiError> {
    let ctx = RequestCancel::new();
    let record = state
        .service
        .update_record(&ctx, &store_id, &record_id, body.into())
        .await?;
    Ok(Json(record))
}

/// `DELETE /api/stores/{store_id}/records/{record_id}`
pub async fn delete_record_handler(
    State(state): State<AppState>,
    Path((store_id, record_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let ctx = RequestCancel::new();
    state.service.delete_record(&ctx, &store_id, &record_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
