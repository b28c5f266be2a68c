//! Domain Service (C4): orchestrates the Metadata, Blob, and Cache
//! adapters into the store/record/blob/metadata operations exposed by the
//! HTTP and RPC frontends. Owns the cross-adapter invariants the adapters
//! themselves cannot: parent-store existence, the `blob_keys` list, and
//! cache invalidation on writes.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use gamesave_core::{Clock, Record, RecordQuery, ServiceError, ServiceResult, Store};

use crate::storage::blob::{blob_object_key, record_blob_prefix, BlobPayload, BlobStore};
use crate::storage::cache::CacheStore;
use crate::storage::metadata::{MetadataStore, RequestCancel};

/// Number of records fetched per page during a cascading store delete.
const DELETE_SCAN_PAGE_SIZE: usize = 100;

/// Metadata document type for a store's companion document.
const STORE_INFO_TYPE: &str = "store_info";
/// Metadata document type for a record's companion document.
const RECORD_INFO_TYPE: &str = "record_info";

/// Fields of a record a caller may update. `blob_keys` is intentionally
/// absent -- it is owned by the blob lifecycle, never by the client.
#[derive(Debug, Default, Clone)]
pub struct RecordPatch {
    pub owner_id: Option<String>,
    pub game_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub properties: Option<Map<String, Value>>,
}

/// Orchestrates C1 (metadata), C2 (blob), and C3 (cache) into the public
/// store/record/blob/metadata operations.
pub struct GameSaveService {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    cache: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    cache_ttl_secs: u64,
}

impl GameSaveService {
    #[must_use]
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        cache: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            metadata,
            blobs,
            cache,
            clock,
            cache_ttl_secs,
        }
    }

    fn now(&self) -> i64 {
        self.clock.now_secs()
    }

    fn warm_store_cache(&self, store: &Store) {
        let cache = Arc::clone(&self.cache);
        let store = store.clone();
        let ttl = self.cache_ttl_secs;
        // Best effort: cache errors are logged, never propagated to the
        // caller, per the "cache is never authoritative" invariant.
        tokio::spawn(async move {
            if let Err(err) = cache.set_store(&store, ttl).await {
                warn!(store_id = %store.store_id, error = %err, "failed to warm store cache");
            }
        });
    }

    fn warm_record_cache(&self, record: &Record) {
        let cache = Arc::clone(&self.cache);
        let record = record.clone();
        let ttl = self.cache_ttl_secs;
        tokio::spawn(async move {
            if let Err(err) = cache.set_record(&record, ttl).await {
                warn!(
                    store_id = %record.store_id,
                    record_id = %record.record_id,
                    error = %err,
                    "failed to warm record cache"
                );
            }
        });
    }

    async fn invalidate_store_cache(&self, store_id: &str) {
        if let Err(err) = self.cache.delete_store(store_id).await {
            warn!(store_id, error = %err, "failed to invalidate store cache entry");
        }
    }

    async fn invalidate_record_cache(&self, store_id: &str, record_id: &str) {
        if let Err(err) = self.cache.delete_record(store_id, record_id).await {
            warn!(store_id, record_id, error = %err, "failed to invalidate record cache entry");
        }
    }

    // ---- Store operations (4.4.1) ----------------------------------

    pub async fn create_store(&self, ctx: &RequestCancel, store_id: &str, name: &str) -> ServiceResult<Store> {
        reject_separator(store_id, "store_id")?;
        if store_id.is_empty() {
            return Err(ServiceError::InvalidArgument("store_id must not be empty".to_string()));
        }

        if self.metadata.get_store(ctx, store_id).await?.is_some() {
            return Err(ServiceError::AlreadyExists);
        }

        let now = self.now();
        let store = Store {
            store_id: store_id.to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.metadata.create_store(ctx, store.clone()).await?;
        self.metadata
            .set_metadata(ctx, STORE_INFO_TYPE, store_id, store_info_document(&store), now)
            .await?;

        Ok(store)
    }

    pub async fn get_store(&self, ctx: &RequestCancel, store_id: &str) -> ServiceResult<Store> {
        let store = self
            .metadata
            .get_store(ctx, store_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        self.warm_store_cache(&store);
        Ok(store)
    }

    pub async fn list_stores(&self, ctx: &RequestCancel) -> ServiceResult<Vec<Store>> {
        Ok(self.metadata.list_stores(ctx).await?)
    }

    /// Cascading delete: every record's blobs, then its metadata document,
    /// then the record itself; then the store's own metadata document and
    /// the store. Idempotent -- re-running against an already-deleted
    /// store succeeds with nothing left to do.
    pub async fn delete_store(&self, ctx: &RequestCancel, store_id: &str) -> ServiceResult<()> {
        let mut offset = 0;
        loop {
            let page = self
                .metadata
                .scan_records_page(ctx, store_id, offset, DELETE_SCAN_PAGE_SIZE)
                .await?;
            if page.is_empty() {
                break;
            }
            offset += page.len();

            for record in &page {
                let blob_keys = self.reconcile_blob_keys(ctx, store_id, &record.record_id).await?;
                let prefix = record_blob_prefix(store_id, &record.record_id);
                for blob_key in &blob_keys {
                    let object_key = blob_object_key(store_id, &record.record_id, blob_key);
                    debug_assert!(object_key.starts_with(&prefix));
                    self.blobs.delete(ctx, &object_key).await?;
                }

                let record_metadata_id = record_info_id(store_id, &record.record_id);
                self.metadata
                    .delete_metadata(ctx, RECORD_INFO_TYPE, &record_metadata_id)
                    .await?;
                self.metadata.delete_record(ctx, store_id, &record.record_id).await?;
                self.invalidate_record_cache(store_id, &record.record_id).await;
            }
        }

        self.metadata.delete_metadata(ctx, STORE_INFO_TYPE, store_id).await?;
        self.metadata.delete_store(ctx, store_id).await?;
        self.invalidate_store_cache(store_id).await;

        Ok(())
    }

    // ---- Record operations (4.4.2) ---------------------------------

    #[allow(clippy::too_many_arguments)]
    pub async fn create_record(
        &self,
        ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
        owner_id: Option<String>,
        game_id: Option<String>,
        tags: Vec<String>,
        properties: Map<String, Value>,
    ) -> ServiceResult<Record> {
        reject_separator(record_id, "record_id")?;
        if record_id.is_empty() {
            return Err(ServiceError::InvalidArgument("record_id must not be empty".to_string()));
        }

        if self.metadata.get_store(ctx, store_id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }

        let now = self.now();
        let record = Record {
            store_id: store_id.to_string(),
            record_id: record_id.to_string(),
            owner_id,
            game_id,
            tags,
            properties,
            blob_keys: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.metadata.create_record(ctx, record.clone()).await?;
        let metadata_id = record_info_id(store_id, record_id);
        self.metadata
            .set_metadata(ctx, RECORD_INFO_TYPE, &metadata_id, record_info_document(&record), now)
            .await?;

        Ok(record)
    }

    pub async fn get_record(&self, ctx: &RequestCancel, store_id: &str, record_id: &str) -> ServiceResult<Record> {
        let record = self
            .metadata
            .get_record(ctx, store_id, record_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        self.warm_record_cache(&record);
        Ok(record)
    }

    pub async fn update_record(
        &self,
        ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
        patch: RecordPatch,
    ) -> ServiceResult<Record> {
        let mut record = self
            .metadata
            .get_record(ctx, store_id, record_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if let Some(owner_id) = patch.owner_id {
            record.owner_id = Some(owner_id);
        }
        if let Some(game_id) = patch.game_id {
            record.game_id = Some(game_id);
        }
        if let Some(tags) = patch.tags {
            record.tags = tags;
        }
        if let Some(properties) = patch.properties {
            record.properties = properties;
        }
        record.updated_at = self.now();

        self.metadata.update_record(ctx, record.clone()).await?;
        self.invalidate_record_cache(store_id, record_id).await;

        Ok(record)
    }

    pub async fn delete_record(&self, ctx: &RequestCancel, store_id: &str, record_id: &str) -> ServiceResult<()> {
        // Does not cascade to blobs: orphaned blobs are reclaimed by
        // DeleteStore or out-of-band sweeping, matching the source's
        // observed behavior (open question #2).
        let metadata_id = record_info_id(store_id, record_id);
        self.metadata.delete_metadata(ctx, RECORD_INFO_TYPE, &metadata_id).await?;
        self.metadata.delete_record(ctx, store_id, record_id).await?;
        self.invalidate_record_cache(store_id, record_id).await;
        Ok(())
    }

    pub async fn query_records(
        &self,
        ctx: &RequestCancel,
        store_id: &str,
        query: &RecordQuery,
    ) -> ServiceResult<Vec<Record>> {
        if self.metadata.get_store(ctx, store_id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }
        Ok(self.metadata.query_records(ctx, store_id, query).await?)
    }

    // ---- Blob operations and the blob_keys invariant (4.4.3) -------

    pub async fn put_blob(
        &self,
        ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
        blob_key: &str,
        payload: BlobPayload,
    ) -> ServiceResult<()> {
        reject_separator(blob_key, "blob_key")?;

        let record = self
            .metadata
            .get_record(ctx, store_id, record_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let object_key = blob_object_key(store_id, record_id, blob_key);
        self.blobs.put(ctx, &object_key, payload).await?;

        if !record.blob_keys.iter().any(|k| k == blob_key) {
            let mut updated = record;
            updated.add_blob_key(blob_key);
            updated.updated_at = self.now();

            if let Err(err) = self.metadata.update_record(ctx, updated).await {
                // blob_keys may drift; self-healed on the next ListBlobs
                // reconciliation or a later successful write.
                warn!(store_id, record_id, blob_key, error = %err, "blob put succeeded but record update failed");
            } else {
                self.invalidate_record_cache(store_id, record_id).await;
            }
        }

        Ok(())
    }

    pub async fn get_blob(
        &self,
        ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
        blob_key: &str,
    ) -> ServiceResult<BlobPayload> {
        if self.metadata.get_record(ctx, store_id, record_id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }

        let object_key = blob_object_key(store_id, record_id, blob_key);
        self.blobs
            .get(ctx, &object_key)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    pub async fn list_blobs(&self, ctx: &RequestCancel, store_id: &str, record_id: &str) -> ServiceResult<Vec<String>> {
        let record = self
            .metadata
            .get_record(ctx, store_id, record_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        Ok(record.blob_keys)
    }

    /// Repairs `blob_keys` drift left behind when a blob write or delete
    /// succeeds but the following record-metadata update fails (see the
    /// warnings logged in [`Self::put_blob`] and [`Self::delete_blob`]).
    ///
    /// Lists the record's actual blob objects from the object store and
    /// overwrites `blob_keys` to match, then returns the corrected list.
    /// Not reachable from any HTTP/RPC route; called by [`Self::delete_store`]
    /// before it relies on `blob_keys` to know what to delete, and available
    /// to a future maintenance sweep over records with suspected drift.
    pub async fn reconcile_blob_keys(
        &self,
        ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
    ) -> ServiceResult<Vec<String>> {
        let mut record = self
            .metadata
            .get_record(ctx, store_id, record_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let prefix = record_blob_prefix(store_id, record_id);
        let mut actual_keys: Vec<String> = self
            .blobs
            .list(ctx, &prefix)
            .await?
            .iter()
            .filter_map(|object_key| object_key.strip_prefix(&prefix).map(str::to_string))
            .collect();
        actual_keys.sort();

        if actual_keys != record.blob_keys {
            warn!(
                store_id,
                record_id,
                recorded = record.blob_keys.len(),
                actual = actual_keys.len(),
                "reconciling drifted blob_keys"
            );
            record.blob_keys = actual_keys.clone();
            record.updated_at = self.now();
            self.metadata.update_record(ctx, record).await?;
            self.invalidate_record_cache(store_id, record_id).await;
        }

        Ok(actual_keys)
    }

    pub async fn delete_blob(
        &self,
        ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
        blob_key: &str,
    ) -> ServiceResult<()> {
        let mut record = self
            .metadata
            .get_record(ctx, store_id, record_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if !record.blob_keys.iter().any(|k| k == blob_key) {
            return Err(ServiceError::NotFound);
        }

        let object_key = blob_object_key(store_id, record_id, blob_key);
        self.blobs.delete(ctx, &object_key).await?;

        record.remove_blob_key(blob_key);
        record.updated_at = self.now();
        if let Err(err) = self.metadata.update_record(ctx, record).await {
            warn!(store_id, record_id, blob_key, error = %err, "blob delete succeeded but record update failed");
        } else {
            self.invalidate_record_cache(store_id, record_id).await;
        }

        Ok(())
    }

    // ---- Metadata operations (4.4.4) --------------------------------

    pub async fn set_metadata(
        &self,
        ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
        data: Map<String, Value>,
    ) -> ServiceResult<()> {
        if metadata_type.is_empty() || metadata_id.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "metadata type and id must not be empty".to_string(),
            ));
        }
        let now = self.now();
        self.metadata.set_metadata(ctx, metadata_type, metadata_id, data, now).await?;
        Ok(())
    }

    pub async fn get_metadata(
        &self,
        ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
    ) -> ServiceResult<Map<String, Value>> {
        let doc = self
            .metadata
            .get_metadata(ctx, metadata_type, metadata_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        Ok(doc.data)
    }

    pub async fn delete_metadata(&self, ctx: &RequestCancel, metadata_type: &str, metadata_id: &str) -> ServiceResult<()> {
        self.metadata.delete_metadata(ctx, metadata_type, metadata_id).await?;
        Ok(())
    }
}

fn reject_separator(value: &str, field: &str) -> ServiceResult<()> {
    if value.contains('/') {
        return Err(ServiceError::InvalidArgument(format!(
            "{field} must not contain '/'"
        )));
    }
    Ok(())
}

fn record_info_id(store_id: &str, record_id: &str) -> String {
    format!("{store_id}#{record_id}")
}

fn store_info_document(store: &Store) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("store_id".to_string(), Value::String(store.store_id.clone()));
    data.insert("name".to_string(), Value::String(store.name.clone()));
    data
}

fn record_info_document(record: &Record) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("store_id".to_string(), Value::String(record.store_id.clone()));
    data.insert("record_id".to_string(), Value::String(record.record_id.clone()));
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::blob::memory::MemoryBlobStore;
    use crate::storage::cache::noop::NoopCache;
    use crate::storage::metadata::memory::MemoryMetadataStore;
    use bytes::Bytes;
    use gamesave_core::FixedClock;

    fn service() -> GameSaveService {
        GameSaveService::new(
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(NoopCache::new()),
            Arc::new(FixedClock::new(1_000)),
            3600,
        )
    }

    #[tokio::test]
    async fn create_store_then_get_round_trips_name() {
        let svc = service();
        let ctx = RequestCancel::new();
        svc.create_store(&ctx, "s1", "S1").await.unwrap();

        let store = svc.get_store(&ctx, "s1").await.unwrap();
        assert_eq!(store.name, "S1");
        assert!(store.created_at > 0);
    }

    #[tokio::test]
    async fn create_store_rejects_duplicate_id() {
        let svc = service();
        let ctx = RequestCancel::new();
        svc.create_store(&ctx, "s1", "S1").await.unwrap();

        let err = svc.create_store(&ctx, "s1", "Other").await.unwrap_err();
        assert_eq!(err, ServiceError::AlreadyExists);
    }

    #[tokio::test]
    async fn create_store_rejects_separator_in_id() {
        let svc = service();
        let ctx = RequestCancel::new();
        let err = svc.create_store(&ctx, "s/1", "S1").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn create_record_requires_existing_store() {
        let svc = service();
        let ctx = RequestCancel::new();
        let err = svc
            .create_record(&ctx, "missing", "r1", None, None, vec![], Map::new())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::NotFound);
    }

    #[tokio::test]
    async fn query_records_filters_by_owner_across_three_records() {
        let svc = service();
        let ctx = RequestCancel::new();
        svc.create_store(&ctx, "s1", "S1").await.unwrap();
        svc.create_record(&ctx, "s1", "r1", Some("u".to_string()), None, vec![], Map::new())
            .await
            .unwrap();
        svc.create_record(&ctx, "s1", "r2", Some("v".to_string()), None, vec![], Map::new())
            .await
            .unwrap();
        svc.create_record(&ctx, "s1", "r3", Some("u".to_string()), None, vec![], Map::new())
            .await
            .unwrap();

        let query = RecordQuery {
            owner_id: Some("u".to_string()),
            game_id: None,
            limit: 0,
        };
        let results = svc.query_records(&ctx, "s1", &query).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.owner_id.as_deref() == Some("u")));
    }

    #[tokio::test]
    async fn put_blob_then_get_blob_round_trips_bytes_and_updates_blob_keys() {
        let svc = service();
        let ctx = RequestCancel::new();
        svc.create_store(&ctx, "s1", "S1").await.unwrap();
        svc.create_record(&ctx, "s1", "r1", None, None, vec![], Map::new())
            .await
            .unwrap();

        let payload = BlobPayload {
            bytes: Bytes::from_static(b"hello"),
            content_type: None,
        };
        svc.put_blob(&ctx, "s1", "r1", "b1", payload).await.unwrap();

        let fetched = svc.get_blob(&ctx, "s1", "r1", "b1").await.unwrap();
        assert_eq!(fetched.bytes, Bytes::from_static(b"hello"));

        let keys = svc.list_blobs(&ctx, "s1", "r1").await.unwrap();
        assert_eq!(keys, vec!["b1".to_string()]);
    }

    #[tokio::test]
    async fn delete_blob_removes_it_from_blob_keys_and_store() {
        let svc = service();
        let ctx = RequestCancel::new();
        svc.create_store(&ctx, "s1", "S1").await.unwrap();
        svc.create_record(&ctx, "s1", "r1", None, None, vec![], Map::new())
            .await
            .unwrap();
        svc.put_blob(
            &ctx,
            "s1",
            "r1",
            "b1",
            BlobPayload {
                bytes: Bytes::from_static(b"hello"),
                content_type: None,
            },
        )
        .await
        .unwrap();

        svc.delete_blob(&ctx, "s1", "r1", "b1").await.unwrap();

        assert!(svc.list_blobs(&ctx, "s1", "r1").await.unwrap().is_empty());
        let err = svc.get_blob(&ctx, "s1", "r1", "b1").await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound);
    }

    #[tokio::test]
    async fn delete_blob_for_a_blob_key_never_written_is_not_found() {
        let svc = service();
        let ctx = RequestCancel::new();
        svc.create_store(&ctx, "s1", "S1").await.unwrap();
        svc.create_record(&ctx, "s1", "r1", None, None, vec![], Map::new())
            .await
            .unwrap();

        let err = svc.delete_blob(&ctx, "s1", "r1", "missing").await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound);
    }

    #[tokio::test]
    async fn reconcile_blob_keys_picks_up_an_object_written_outside_put_blob() {
        let svc = service();
        let ctx = RequestCancel::new();
        svc.create_store(&ctx, "s1", "S1").await.unwrap();
        svc.create_record(&ctx, "s1", "r1", None, None, vec![], Map::new())
            .await
            .unwrap();

        // Simulate drift: an object lands in the blob store without going
        // through put_blob, so blob_keys never learns about it.
        let object_key = blob_object_key("s1", "r1", "b1");
        svc.blobs
            .put(
                &ctx,
                &object_key,
                BlobPayload {
                    bytes: Bytes::from_static(b"drifted"),
                    content_type: None,
                },
            )
            .await
            .unwrap();
        assert!(svc.list_blobs(&ctx, "s1", "r1").await.unwrap().is_empty());

        let reconciled = svc.reconcile_blob_keys(&ctx, "s1", "r1").await.unwrap();
        assert_eq!(reconciled, vec!["b1".to_string()]);
        assert_eq!(svc.list_blobs(&ctx, "s1", "r1").await.unwrap(), vec!["b1".to_string()]);
    }

    #[tokio::test]
    async fn reconcile_blob_keys_is_a_no_op_when_already_in_sync() {
        let svc = service();
        let ctx = RequestCancel::new();
        svc.create_store(&ctx, "s1", "S1").await.unwrap();
        svc.create_record(&ctx, "s1", "r1", None, None, vec![], Map::new())
            .await
            .unwrap();
        svc.put_blob(
            &ctx,
            "s1",
            "r1",
            "b1",
            BlobPayload {
                bytes: Bytes::from_static(b"hello"),
                content_type: None,
            },
        )
        .await
        .unwrap();

        let reconciled = svc.reconcile_blob_keys(&ctx, "s1", "r1").await.unwrap();
        assert_eq!(reconciled, vec!["b1".to_string()]);
    }

    #[tokio::test]
    async fn delete_store_is_idempotent_and_cascades_to_records_and_blobs() {
        let svc = service();
        let ctx = RequestCancel::new();
        svc.create_store(&ctx, "s1", "S1").await.unwrap();
        svc.create_record(&ctx, "s1", "r1", None, None, vec![], Map::new())
            .await
            .unwrap();
        svc.put_blob(
            &ctx,
            "s1",
            "r1",
            "b1",
            BlobPayload {
                bytes: Bytes::from_static(b"hello"),
                content_type: None,
            },
        )
        .await
        .unwrap();

        svc.delete_store(&ctx, "s1").await.unwrap();
        assert_eq!(svc.get_store(&ctx, "s1").await.unwrap_err(), ServiceError::NotFound);
        assert_eq!(
            svc.get_record(&ctx, "s1", "r1").await.unwrap_err(),
            ServiceError::NotFound
        );

        // Re-running against an already-deleted store succeeds.
        svc.delete_store(&ctx, "s1").await.unwrap();
    }

    #[tokio::test]
    async fn delete_record_does_not_cascade_to_blobs() {
        let svc = service();
        let ctx = RequestCancel::new();
        svc.create_store(&ctx, "s1", "S1").await.unwrap();
        svc.create_record(&ctx, "s1", "r1", None, None, vec![], Map::new())
            .await
            .unwrap();
        svc.put_blob(
            &ctx,
            "s1",
            "r1",
            "b1",
            BlobPayload {
                bytes: Bytes::from_static(b"hello"),
                content_type: None,
            },
        )
        .await
        .unwrap();

        svc.delete_record(&ctx, "s1", "r1").await.unwrap();

        // The object is still present in the object store even though the
        // record metadata is gone -- reclaimed only by DeleteStore.
        let object_key = blob_object_key("s1", "r1", "b1");
        assert!(svc.blobs.head(&ctx, &object_key).await.unwrap());
    }

    #[tokio::test]
    async fn set_metadata_then_get_metadata_round_trips_arbitrary_json() {
        let svc = service();
        let ctx = RequestCancel::new();
        let mut data = Map::new();
        data.insert("level".to_string(), Value::from(7));
        data.insert("nested".to_string(), serde_json::json!({"a": [1, 2, 3]}));

        svc.set_metadata(&ctx, "leaderboard", "global", data.clone()).await.unwrap();
        let fetched = svc.get_metadata(&ctx, "leaderboard", "global").await.unwrap();
        assert_eq!(fetched, data);
    }
}

#[cfg(test)]
mod round_trip_laws {
    use super::*;
    use crate::storage::blob::memory::MemoryBlobStore;
    use crate::storage::cache::noop::NoopCache;
    use crate::storage::metadata::memory::MemoryMetadataStore;
    use bytes::Bytes;
    use gamesave_core::SystemClock;
    use proptest::prelude::*;

    fn service() -> GameSaveService {
        GameSaveService::new(
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(NoopCache::new()),
            Arc::new(SystemClock),
            3600,
        )
    }

    /// A JSON leaf value, kept finite (no `NaN`/infinity, no bignums) so
    /// equality after a JSON round trip is exact.
    fn arb_json_leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(Value::from),
            "[a-zA-Z0-9_ ]{0,16}".prop_map(Value::String),
        ]
    }

    /// An arbitrary metadata document: a handful of string-keyed JSON leaves.
    fn arb_metadata_doc() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map("[a-z][a-z0-9_]{0,8}", arb_json_leaf(), 0..6)
            .prop_map(|map| map.into_iter().collect::<Map<String, Value>>())
    }

    proptest! {
        /// `SetMetadata(t, i, d); GetMetadata(t, i)` returns exactly `d`, for
        /// any JSON document `d` built from finite, non-bignum leaves.
        #[test]
        fn set_metadata_then_get_metadata_round_trips(data in arb_metadata_doc()) {
            let svc = service();
            let ctx = RequestCancel::new();
            let rt = tokio::runtime::Runtime::new().unwrap();

            rt.block_on(async {
                svc.set_metadata(&ctx, "t", "i", data.clone()).await.unwrap();
                let fetched = svc.get_metadata(&ctx, "t", "i").await.unwrap();
                prop_assert_eq!(fetched, data);
                Ok(())
            })?;
        }

        /// `PutBlob(s, r, k, bytes); GetBlob(s, r, k)` returns exactly
        /// `bytes`, for any byte payload.
        #[test]
        fn put_blob_then_get_blob_round_trips(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            let svc = service();
            let ctx = RequestCancel::new();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let payload_bytes = Bytes::from(bytes.clone());

            rt.block_on(async {
                svc.create_store(&ctx, "s1", "S1").await.unwrap();
                svc.create_record(&ctx, "s1", "r1", None, None, vec![], Map::new())
                    .await
                    .unwrap();
                svc.put_blob(
                    &ctx,
                    "s1",
                    "r1",
                    "k1",
                    BlobPayload {
                        bytes: payload_bytes.clone(),
                        content_type: None,
                    },
                )
                .await
                .unwrap();

                let fetched = svc.get_blob(&ctx, "s1", "r1", "k1").await.unwrap();
                prop_assert_eq!(fetched.bytes, payload_bytes);
                Ok(())
            })?;
        }
    }
}
