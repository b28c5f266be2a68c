//! Metadata Backend Adapter (C1): persists stores, records, and metadata
//! documents; supports point lookup, scan, and indexed query.
//!
//! [`MetadataStore`] is the capability trait; concrete variants are a
//! document-style NoSQL table trio ([`dynamodb::DynamoMetadataStore`]), a
//! MongoDB-compatible collection trio ([`mongo::MongoMetadataStore`]), and
//! an in-memory variant ([`memory::MemoryMetadataStore`]) used by tests and
//! as the degraded default when no backend is configured.

#[cfg(feature = "dynamodb")]
pub mod dynamodb;
pub mod memory;
#[cfg(feature = "mongo")]
pub mod mongo;

use async_trait::async_trait;
use gamesave_core::{BackendResult, MetadataDocument, Record, RecordQuery, Store};

/// Persistence for stores, records, and metadata documents (C1).
///
/// Every method accepts a request-scoped cancellation token first, per the
/// "carry cancellation explicitly" design note; adapters are expected to
/// abort in-flight I/O promptly when it fires.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn create_store(&self, ctx: &RequestCancel, store: Store) -> BackendResult<()>;
    async fn get_store(&self, ctx: &RequestCancel, store_id: &str) -> BackendResult<Option<Store>>;
    async fn list_stores(&self, ctx: &RequestCancel) -> BackendResult<Vec<Store>>;
    async fn delete_store(&self, ctx: &RequestCancel, store_id: &str) -> BackendResult<()>;

    async fn create_record(&self, ctx: &RequestCancel, record: Record) -> BackendResult<()>;
    async fn get_record(
        &self,
        ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
    ) -> BackendResult<Option<Record>>;
    async fn update_record(&self, ctx: &RequestCancel, record: Record) -> BackendResult<()>;
    async fn delete_record(
        &self,
        ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
    ) -> BackendResult<()>;
    /// Scans only the partition for `store_id`; results ordered by
    /// `created_at` descending, tie-broken by `record_id` ascending.
    async fn query_records(
        &self,
        ctx: &RequestCancel,
        store_id: &str,
        query: &RecordQuery,
    ) -> BackendResult<Vec<Record>>;
    /// Pages through every record of a store, `page_size` at a time, for
    /// use by the cascading `DeleteStore` sweep. Returns an empty vec when
    /// `offset` is past the end.
    async fn scan_records_page(
        &self,
        ctx: &RequestCancel,
        store_id: &str,
        offset: usize,
        page_size: usize,
    ) -> BackendResult<Vec<Record>>;

    async fn set_metadata(
        &self,
        ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
        data: serde_json::Map<String, serde_json::Value>,
        now: i64,
    ) -> BackendResult<()>;
    async fn get_metadata(
        &self,
        ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
    ) -> BackendResult<Option<MetadataDocument>>;
    async fn delete_metadata(
        &self,
        ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
    ) -> BackendResult<()>;
    async fn query_metadata(
        &self,
        ctx: &RequestCancel,
        metadata_type: &str,
    ) -> BackendResult<Vec<MetadataDocument>>;
}

/// Per-request cancellation handle threaded through every adapter call.
///
/// A real deployment derives this from the inbound HTTP/gRPC request
/// (client disconnect, per-request deadline); tests construct it directly.
/// Thin wrapper over `tokio_util::sync::CancellationToken` so call sites
/// depend on the domain-named type rather than the `tokio-util` type.
#[derive(Debug, Clone, Default)]
pub struct RequestCancel {
    token: tokio_util::sync::CancellationToken,
}

impl RequestCancel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_resolves_the_cancelled_future() {
        let cancel = RequestCancel::new();
        assert!(!cancel.is_cancelled());

        let waiter = cancel.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });

        cancel.cancel();
        handle.await.unwrap();
        assert!(cancel.is_cancelled());
    }
}
