//! Cache Adapter (C3): optional read-through cache in front of the
//! Metadata Backend Adapter. A miss is a first-class outcome distinct from
//! a transient backend error -- callers always fall through to the
//! metadata store on either, but only a genuine error is worth logging at
//! warn level.

pub mod noop;
#[cfg(feature = "redis-cache")]
pub mod redis;

use async_trait::async_trait;
use gamesave_core::{BackendResult, Record, Store};

/// Default time-to-live for cached entries, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Hit(T),
    Miss,
}

impl<T> CacheLookup<T> {
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Hit(value) => Some(value),
            Self::Miss => None,
        }
    }
}

/// Read-through cache in front of stores and records (C3).
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get_store(&self, store_id: &str) -> BackendResult<CacheLookup<Store>>;
    async fn set_store(&self, store: &Store, ttl_secs: u64) -> BackendResult<()>;
    async fn delete_store(&self, store_id: &str) -> BackendResult<()>;

    async fn get_record(&self, store_id: &str, record_id: &str) -> BackendResult<CacheLookup<Record>>;
    async fn set_record(&self, record: &Record, ttl_secs: u64) -> BackendResult<()>;
    async fn delete_record(&self, store_id: &str, record_id: &str) -> BackendResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_unwraps_to_some() {
        assert_eq!(CacheLookup::Hit(1).into_option(), Some(1));
    }

    #[test]
    fn miss_unwraps_to_none() {
        assert_eq!(CacheLookup::<i32>::Miss.into_option(), None);
    }
}
