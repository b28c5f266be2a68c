//! Blob Backend Adapter (C2): stores opaque byte payloads addressed by a
//! fully-qualified key. Callers format the key (`{store_id}/{record_id}/{blob_key}`
//! per the design note in [`crate::domain`]); the adapter itself is key-shape
//! agnostic.

pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use gamesave_core::BackendResult;

use crate::storage::metadata::RequestCancel;

/// A blob's content together with its declared length.
#[derive(Debug, Clone)]
pub struct BlobPayload {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Persistence for record-owned blob payloads (C2).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns `true` if a blob exists at `key` without transferring its body.
    async fn head(&self, ctx: &RequestCancel, key: &str) -> BackendResult<bool>;
    async fn get(&self, ctx: &RequestCancel, key: &str) -> BackendResult<Option<BlobPayload>>;
    async fn put(&self, ctx: &RequestCancel, key: &str, payload: BlobPayload) -> BackendResult<()>;
    async fn delete(&self, ctx: &RequestCancel, key: &str) -> BackendResult<()>;
    /// Lists every blob key stored under `prefix` (typically `{store_id}/{record_id}/`).
    async fn list(&self, ctx: &RequestCancel, prefix: &str) -> BackendResult<Vec<String>>;
}

/// Builds the fully-qualified storage key for a record's blob.
#[must_use]
pub fn blob_object_key(store_id: &str, record_id: &str, blob_key: &str) -> String {
    format!("{store_id}/{record_id}/{blob_key}")
}

/// Builds the prefix under which all of a record's blobs live.
#[must_use]
pub fn record_blob_prefix(store_id: &str, record_id: &str) -> String {
    format!("{store_id}/{record_id}/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_joins_store_record_and_blob() {
        assert_eq!(blob_object_key("s1", "r1", "save.bin"), "s1/r1/save.bin");
    }

    #[test]
    fn record_prefix_has_trailing_slash() {
        assert_eq!(record_blob_prefix("s1", "r1"), "s1/r1/");
    }
}
