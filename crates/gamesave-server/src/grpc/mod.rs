//! gRPC frontend (C5): the parallel RPC surface over the same Domain
//! Service used by the HTTP frontend, with standard status-code mapping.

use std::sync::Arc;

use serde_json::{Map, Value};
use tonic::{Request, Response, Status};

use gamesave_core::{RecordQuery, Record as CoreRecord, ServiceError, Store as CoreStore};

use crate::domain::{GameSaveService, RecordPatch};
use crate::storage::blob::BlobPayload;
use crate::storage::metadata::RequestCancel;

pub mod proto {
    tonic::include_proto!("gamesave.v1");
}

use proto::game_save_server::GameSave;
use proto::*;

/// Maps a [`ServiceError`] onto the standard NotFound/AlreadyExists/
/// InvalidArgument/Unavailable/Internal gRPC status codes.
fn status_from(err: ServiceError) -> Status {
    match err {
        ServiceError::NotFound => Status::not_found(err.to_string()),
        ServiceError::AlreadyExists => Status::already_exists(err.to_string()),
        ServiceError::InvalidArgument(_) => Status::invalid_argument(err.to_string()),
        ServiceError::Unavailable(_) => Status::unavailable(err.to_string()),
        ServiceError::Internal(_) => Status::internal(err.to_string()),
    }
}

fn properties_json(properties: &Map<String, Value>) -> String {
    serde_json::to_string(properties).unwrap_or_else(|_| "{}".to_string())
}

fn parse_properties_json(raw: &str) -> Result<Map<String, Value>, Status> {
    if raw.is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str(raw).map_err(|err| Status::invalid_argument(format!("invalid properties_json: {err}")))
}

fn store_to_proto(store: CoreStore) -> Store {
    Store {
        store_id: store.store_id,
        name: store.name,
        created_at: store.created_at,
        updated_at: store.updated_at,
    }
}

fn record_to_proto(record: CoreRecord) -> Record {
    Record {
        store_id: record.store_id,
        record_id: record.record_id,
        owner_id: record.owner_id,
        game_id: record.game_id,
        tags: record.tags,
        properties_json: properties_json(&record.properties),
        blob_keys: record.blob_keys,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

/// Implements the generated `GameSave` service over the shared
/// [`GameSaveService`] Domain Service.
pub struct GameSaveGrpc {
    service: Arc<GameSaveService>,
}

impl GameSaveGrpc {
    #[must_use]
    pub fn new(service: Arc<GameSaveService>) -> Self {
        Self { service }
    }

    pub fn into_server(self) -> proto::game_save_server::GameSaveServer<Self> {
        proto::game_save_server::GameSaveServer::new(self)
    }
}

#[tonic::async_trait]
impl GameSave for GameSaveGrpc {
    async fn create_store(&self, request: Request<CreateStoreRequest>) -> Result<Response<Store>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        let store = self
            .service
            .create_store(&ctx, &req.store_id, &req.name)
            .await
            .map_err(status_from)?;
        Ok(Response::new(store_to_proto(store)))
    }

    async fn get_store(&self, request: Request<GetStoreRequest>) -> Result<Response<Store>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        let store = self.service.get_store(&ctx, &req.store_id).await.map_err(status_from)?;
        Ok(Response::new(store_to_proto(store)))
    }

    async fn list_stores(&self, _request: Request<ListStoresRequest>) -> Result<Response<ListStoresResponse>, Status> {
        let ctx = RequestCancel::new();
        let stores = self.service.list_stores(&ctx).await.map_err(status_from)?;
        Ok(Response::new(ListStoresResponse {
            stores: stores.into_iter().map(store_to_proto).collect(),
        }))
    }

    async fn delete_store(&self, request: Request<DeleteStoreRequest>) -> Result<Response<DeleteStoreResponse>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        self.service.delete_store(&ctx, &req.store_id).await.map_err(status_from)?;
        Ok(Response::new(DeleteStoreResponse {}))
    }

    async fn create_record(&self, request: Request<CreateRecordRequest>) -> Result<Response<Record>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        let properties = parse_properties_json(&req.properties_json)?;
        let record = self
            .service
            .create_record(
                &ctx,
                &req.store_id,
                &req.record_id,
                req.owner_id,
                req.game_id,
                req.tags,
                properties,
            )
            .await
            .map_err(status_from)?;
        Ok(Response::new(record_to_proto(record)))
    }

    async fn get_record(&self, request: Request<GetRecordRequest>) -> Result<Response<Record>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        let record = self
            .service
            .get_record(&ctx, &req.store_id, &req.record_id)
            .await
            .map_err(status_from)?;
        Ok(Response::new(record_to_proto(record)))
    }

    async fn update_record(&self, request: Request<UpdateRecordRequest>) -> Result<Response<Record>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        let properties = req.properties_json.as_deref().map(parse_properties_json).transpose()?;
        let patch = RecordPatch {
            owner_id: req.owner_id,
            game_id: req.game_id,
            tags: req.has_tags.unwrap_or(false).then_some(req.tags),
            properties,
        };
        let record = self
            .service
            .update_record(&ctx, &req.store_id, &req.record_id, patch)
            .await
            .map_err(status_from)?;
        Ok(Response::new(record_to_proto(record)))
    }

    async fn delete_record(&self, request: Request<DeleteRecordRequest>) -> Result<Response<DeleteRecordResponse>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        self.service
            .delete_record(&ctx, &req.store_id, &req.record_id)
            .await
            .map_err(status_from)?;
        Ok(Response::new(DeleteRecordResponse {}))
    }

    async fn query_records(&self, request: Request<QueryRecordsRequest>) -> Result<Response<QueryRecordsResponse>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        let query = RecordQuery {
            owner_id: req.owner_id,
            game_id: req.game_id,
            limit: req.limit,
        };
        let records = self
            .service
            .query_records(&ctx, &req.store_id, &query)
            .await
            .map_err(status_from)?;
        Ok(Response::new(QueryRecordsResponse {
            records: records.into_iter().map(record_to_proto).collect(),
        }))
    }

    async fn put_blob(&self, request: Request<PutBlobRequest>) -> Result<Response<PutBlobResponse>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        let payload = BlobPayload {
            bytes: req.data.into(),
            content_type: req.content_type,
        };
        self.service
            .put_blob(&ctx, &req.store_id, &req.record_id, &req.blob_key, payload)
            .await
            .map_err(status_from)?;
        Ok(Response::new(PutBlobResponse {}))
    }

    async fn get_blob(&self, request: Request<GetBlobRequest>) -> Result<Response<GetBlobResponse>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        let payload = self
            .service
            .get_blob(&ctx, &req.store_id, &req.record_id, &req.blob_key)
            .await
            .map_err(status_from)?;
        Ok(Response::new(GetBlobResponse {
            data: payload.bytes.to_vec(),
            content_type: payload.content_type,
        }))
    }

    async fn list_blobs(&self, request: Request<ListBlobsRequest>) -> Result<Response<ListBlobsResponse>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        let blob_keys = self
            .service
            .list_blobs(&ctx, &req.store_id, &req.record_id)
            .await
            .map_err(status_from)?;
        Ok(Response::new(ListBlobsResponse { blob_keys }))
    }

    async fn delete_blob(&self, request: Request<DeleteBlobRequest>) -> Result<Response<DeleteBlobResponse>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        self.service
            .delete_blob(&ctx, &req.store_id, &req.record_id, &req.blob_key)
            .await
            .map_err(status_from)?;
        Ok(Response::new(DeleteBlobResponse {}))
    }

    async fn set_metadata(&self, request: Request<SetMetadataRequest>) -> Result<Response<SetMetadataResponse>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        let data = parse_properties_json(&req.data_json)?;
        self.service
            .set_metadata(&ctx, &req.metadata_type, &req.metadata_id, data)
            .await
            .map_err(status_from)?;
        Ok(Response::new(SetMetadataResponse {}))
    }

    async fn get_metadata(&self, request: Request<GetMetadataRequest>) -> Result<Response<GetMetadataResponse>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        let data = self
            .service
            .get_metadata(&ctx, &req.metadata_type, &req.metadata_id)
            .await
            .map_err(status_from)?;
        Ok(Response::new(GetMetadataResponse {
            data_json: properties_json(&data),
        }))
    }

    async fn delete_metadata(&self, request: Request<DeleteMetadataRequest>) -> Result<Response<DeleteMetadataResponse>, Status> {
        let req = request.into_inner();
        let ctx = RequestCancel::new();
        self.service
            .delete_metadata(&ctx, &req.metadata_type, &req.metadata_id)
            .await
            .map_err(status_from)?;
        Ok(Response::new(DeleteMetadataResponse {}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_grpc_not_found() {
        let status = status_from(ServiceError::NotFound);
        assert_eq!(status.code(), tonic::Code::NotFound);
    }

    #[test]
    fn already_exists_maps_to_grpc_already_exists() {
        let status = status_from(ServiceError::AlreadyExists);
        assert_eq!(status.code(), tonic::Code::AlreadyExists);
    }

    #[test]
    fn unavailable_maps_to_grpc_unavailable() {
        let status = status_from(ServiceError::Unavailable("timeout".to_string()));
        assert_eq!(status.code(), tonic::Code::Unavailable);
    }

    #[test]
    fn properties_json_round_trips_through_parse() {
        let mut props = Map::new();
        props.insert("level".to_string(), Value::from(3));
        let json = properties_json(&props);
        assert_eq!(parse_properties_json(&json).unwrap(), props);
    }

    #[test]
    fn empty_properties_json_parses_to_empty_map() {
        assert_eq!(parse_properties_json("").unwrap(), Map::new());
    }
}
