//! In-memory [`BlobStore`], `dashmap`-backed like its metadata counterpart.
//! Used by integration tests and the degraded default when no blob backend
//! is configured.

use async_trait::async_trait;
use dashmap::DashMap;
use gamesave_core::BackendResult;

use super::{BlobPayload, BlobStore};
use crate::storage::metadata::RequestCancel;

/// Process-local blob store. Not durable across restarts.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: DashMap<String, BlobPayload>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn head(&self, _ctx: &RequestCancel, key: &str) -> BackendResult<bool> {
        Ok(self.objects.contains_key(key))
    }

    async fn get(&self, _ctx: &RequestCancel, key: &str) -> BackendResult<Option<BlobPayload>> {
        Ok(self.objects.get(key).map(|entry| entry.clone()))
    }

    async fn put(&self, _ctx: &RequestCancel, key: &str, payload: BlobPayload) -> BackendResult<()> {
        self.objects.insert(key.to_string(), payload);
        Ok(())
    }

    async fn delete(&self, _ctx: &RequestCancel, key: &str) -> BackendResult<()> {
        self.objects.remove(key);
        Ok(())
    }

    async fn list(&self, _ctx: &RequestCancel, prefix: &str) -> BackendResult<Vec<String>> {
        Ok(self
            .objects
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn payload(data: &str) -> BlobPayload {
        BlobPayload {
            bytes: Bytes::from(data.to_string()),
            content_type: Some("application/octet-stream".to_string()),
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MemoryBlobStore::new();
        let ctx = RequestCancel::new();
        store.put(&ctx, "s1/r1/save.bin", payload("hello")).await.unwrap();

        let found = store.get(&ctx, "s1/r1/save.bin").await.unwrap().unwrap();
        assert_eq!(found.bytes, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn delete_removes_blob() {
        let store = MemoryBlobStore::new();
        let ctx = RequestCancel::new();
        store.put(&ctx, "s1/r1/save.bin", payload("hello")).await.unwrap();
        store.delete(&ctx, "s1/r1/save.bin").await.unwrap();

        assert!(!store.head(&ctx, "s1/r1/save.bin").await.unwrap());
        assert!(store.get(&ctx, "s1/r1/save.bin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_by_prefix() {
        let store = MemoryBlobStore::new();
        let ctx = RequestCancel::new();
        store.put(&ctx, "s1/r1/a.bin", payload("a")).await.unwrap();
        store.put(&ctx, "s1/r1/b.bin", payload("b")).await.unwrap();
        store.put(&ctx, "s1/r2/c.bin", payload("c")).await.unwrap();

        let mut keys = store.list(&ctx, "s1/r1/").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["s1/r1/a.bin".to_string(), "s1/r1/b.bin".to_string()]);
    }
}
