//! In-memory [`MetadataStore`], backed by `dashmap` the way
//! `topgun-server`'s connection registry and `pmcp-tasks`'s in-memory task
//! store shard their state. Used by integration tests and installed as the
//! degraded default if no metadata backend is configured.

use dashmap::DashMap;

use gamesave_core::{BackendError, BackendResult, MetadataDocument, Record, RecordQuery, Store};

use super::{MetadataStore, RequestCancel};
use async_trait::async_trait;

type RecordKey = (String, String);
type MetadataKey = (String, String);

/// Process-local metadata store. Not durable across restarts.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    stores: DashMap<String, Store>,
    records: DashMap<RecordKey, Record>,
    metadata: DashMap<MetadataKey, MetadataDocument>,
}

impl MemoryMetadataStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn create_store(&self, _ctx: &RequestCancel, store: Store) -> BackendResult<()> {
        if self.stores.contains_key(&store.store_id) {
            return Err(BackendError::AlreadyExists);
        }
        self.stores.insert(store.store_id.clone(), store);
        Ok(())
    }

    async fn get_store(&self, _ctx: &RequestCancel, store_id: &str) -> BackendResult<Option<Store>> {
        Ok(self.stores.get(store_id).map(|entry| entry.clone()))
    }

    async fn list_stores(&self, _ctx: &RequestCancel) -> BackendResult<Vec<Store>> {
        Ok(self.stores.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn delete_store(&self, _ctx: &RequestCancel, store_id: &str) -> BackendResult<()> {
        self.stores.remove(store_id);
        Ok(())
    }

    async fn create_record(&self, _ctx: &RequestCancel, record: Record) -> BackendResult<()> {
        let key = (record.store_id.clone(), record.record_id.clone());
        if self.records.contains_key(&key) {
            return Err(BackendError::AlreadyExists);
        }
        self.records.insert(key, record);
        Ok(())
    }

    async fn get_record(
        &self,
        _ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
    ) -> BackendResult<Option<Record>> {
        let key = (store_id.to_string(), record_id.to_string());
        Ok(self.records.get(&key).map(|entry| entry.clone()))
    }

    async fn update_record(&self, _ctx: &RequestCancel, record: Record) -> BackendResult<()> {
        let key = (record.store_id.clone(), record.record_id.clone());
        self.records.insert(key, record);
        Ok(())
    }

    async fn delete_record(
        &self,
        _ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
    ) -> BackendResult<()> {
        let key = (store_id.to_string(), record_id.to_string());
        self.records.remove(&key);
        Ok(())
    }

    async fn query_records(
        &self,
        _ctx: &RequestCancel,
        store_id: &str,
        query: &RecordQuery,
    ) -> BackendResult<Vec<Record>> {
        let mut matches: Vec<Record> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == store_id)
            .map(|entry| entry.value().clone())
            .filter(|r| {
                query
                    .owner_id
                    .as_ref()
                    .map_or(true, |owner| r.owner_id.as_deref() == Some(owner.as_str()))
            })
            .filter(|r| {
                query
                    .game_id
                    .as_ref()
                    .map_or(true, |game| r.game_id.as_deref() == Some(game.as_str()))
            })
            .collect();

        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });

        if query.limit > 0 {
            matches.truncate(query.limit as usize);
        }
        Ok(matches)
    }

    async fn scan_records_page(
        &self,
        _ctx: &RequestCancel,
        store_id: &str,
        offset: usize,
        page_size: usize,
    ) -> BackendResult<Vec<Record>> {
        let mut all: Vec<Record> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == store_id)
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| a.record_id.cmp(&b.record_id));

        Ok(all.into_iter().skip(offset).take(page_size).collect())
    }

    async fn set_metadata(
        &self,
        _ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
        data: serde_json::Map<String, serde_json::Value>,
        now: i64,
    ) -> BackendResult<()> {
        let key = (metadata_type.to_string(), metadata_id.to_string());
        let created_at = self.metadata.get(&key).map_or(now, |doc| doc.created_at);
        self.metadata.insert(
            key,
            MetadataDocument {
                metadata_type: metadata_type.to_string(),
                metadata_id: metadata_id.to_string(),
                data,
                created_at,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn get_metadata(
        &self,
        _ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
    ) -> BackendResult<Option<MetadataDocument>> {
        let key = (metadata_type.to_string(), metadata_id.to_string());
        Ok(self.metadata.get(&key).map(|entry| entry.clone()))
    }

    async fn delete_metadata(
        &self,
        _ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
    ) -> BackendResult<()> {
        let key = (metadata_type.to_string(), metadata_id.to_string());
        self.metadata.remove(&key);
        Ok(())
    }

    async fn query_metadata(
        &self,
        _ctx: &RequestCancel,
        metadata_type: &str,
    ) -> BackendResult<Vec<MetadataDocument>> {
        let mut docs: Vec<MetadataDocument> = self
            .metadata
            .iter()
            .filter(|entry| entry.key().0 == metadata_type)
            .map(|entry| entry.value().clone())
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }
}
