//! Redis-backed [`CacheStore`]. Connection is established eagerly at
//! startup with a bounded health-check window; callers that can't get a
//! healthy connection in time should fall back to [`super::noop::NoopCache`]
//! rather than block server startup on a down cache.

use async_trait::async_trait;
use gamesave_core::{BackendError, BackendResult, Record, Store};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{CacheLookup, CacheStore};

fn map_redis_error(err: redis::RedisError) -> BackendError {
    if err.is_timeout() || err.is_connection_dropped() || err.is_connection_refusal() {
        BackendError::Transient(err.to_string())
    } else {
        BackendError::Fatal(err.to_string())
    }
}

fn store_key(store_id: &str) -> String {
    format!("store:{store_id}")
}

fn record_key(store_id: &str, record_id: &str) -> String {
    format!("record:{store_id}:{record_id}")
}

/// Redis-backed cache using a single multiplexed, auto-reconnecting
/// connection manager.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connects and verifies liveness with `PING`, bounded by `timeout`.
    /// Returns `None` if the cache cannot be reached in time -- callers
    /// should install [`super::noop::NoopCache`] instead of failing startup.
    pub async fn connect(address: &str, timeout: std::time::Duration) -> Option<Self> {
        let client = redis::Client::open(address).ok()?;
        let connect = ConnectionManager::new(client);
        let mut connection = tokio::time::timeout(timeout, connect).await.ok()?.ok()?;

        let ping: redis::RedisResult<String> = tokio::time::timeout(timeout, redis::cmd("PING").query_async(&mut connection))
            .await
            .ok()?;
        ping.ok()?;

        Some(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get_store(&self, store_id: &str) -> BackendResult<CacheLookup<Store>> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn.get(store_key(store_id)).await.map_err(map_redis_error)?;
        match raw {
            None => Ok(CacheLookup::Miss),
            Some(json) => serde_json::from_str(&json)
                .map(CacheLookup::Hit)
                .map_err(|err| BackendError::Fatal(err.to_string())),
        }
    }

    async fn set_store(&self, store: &Store, ttl_secs: u64) -> BackendResult<()> {
        let mut conn = self.connection.clone();
        let json = serde_json::to_string(store).map_err(|err| BackendError::Fatal(err.to_string()))?;
        let _: () = conn
            .set_ex(store_key(&store.store_id), json, ttl_secs)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn delete_store(&self, store_id: &str) -> BackendResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(store_key(store_id)).await.map_err(map_redis_error)?;
        Ok(())
    }

    async fn get_record(&self, store_id: &str, record_id: &str) -> BackendResult<CacheLookup<Record>> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn
            .get(record_key(store_id, record_id))
            .await
            .map_err(map_redis_error)?;
        match raw {
            None => Ok(CacheLookup::Miss),
            Some(json) => serde_json::from_str(&json)
                .map(CacheLookup::Hit)
                .map_err(|err| BackendError::Fatal(err.to_string())),
        }
    }

    async fn set_record(&self, record: &Record, ttl_secs: u64) -> BackendResult<()> {
        let mut conn = self.connection.clone();
        let json = serde_json::to_string(record).map_err(|err| BackendError::Fatal(err.to_string()))?;
        let _: () = conn
            .set_ex(record_key(&record.store_id, &record.record_id), json, ttl_secs)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn delete_record(&self, store_id: &str, record_id: &str) -> BackendResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .del(record_key(store_id, record_id))
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_key_is_namespaced() {
        assert_eq!(store_key("s1"), "store:s1");
    }

    #[test]
    fn record_key_is_namespaced_by_store_and_record() {
        assert_eq!(record_key("s1", "r1"), "record:s1:r1");
    }
}
