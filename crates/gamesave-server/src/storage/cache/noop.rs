//! No-op [`CacheStore`]: always misses, never errors. Installed when no
//! cache address is configured, or when the Redis health check at startup
//! fails -- a missing cache degrades latency, not correctness.

use async_trait::async_trait;
use gamesave_core::{BackendResult, Record, Store};

use super::{CacheLookup, CacheStore};

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl NoopCache {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheStore for NoopCache {
    async fn get_store(&self, _store_id: &str) -> BackendResult<CacheLookup<Store>> {
        Ok(CacheLookup::Miss)
    }

    async fn set_store(&self, _store: &Store, _ttl_secs: u64) -> BackendResult<()> {
        Ok(())
    }

    async fn delete_store(&self, _store_id: &str) -> BackendResult<()> {
        Ok(())
    }

    async fn get_record(&self, _store_id: &str, _record_id: &str) -> BackendResult<CacheLookup<Record>> {
        Ok(CacheLookup::Miss)
    }

    async fn set_record(&self, _record: &Record, _ttl_secs: u64) -> BackendResult<()> {
        Ok(())
    }

    async fn delete_record(&self, _store_id: &str, _record_id: &str) -> BackendResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_misses() {
        let cache = NoopCache::new();
        assert_eq!(cache.get_store("s1").await.unwrap(), CacheLookup::Miss);
        assert_eq!(cache.get_record("s1", "r1").await.unwrap(), CacheLookup::Miss);
    }

    #[tokio::test]
    async fn writes_and_deletes_are_accepted_silently() {
        let cache = NoopCache::new();
        let store = Store {
            store_id: "s1".to_string(),
            name: "n".to_string(),
            created_at: 1,
            updated_at: 1,
        };
        cache.set_store(&store, 60).await.unwrap();
        cache.delete_store("s1").await.unwrap();
    }
}
