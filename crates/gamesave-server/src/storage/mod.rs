//! Backend adapters: Metadata Backend Adapter (C1), Blob Backend Adapter
//! (C2), and Cache Adapter (C3). Each is a capability trait plus swappable
//! variants, selected at startup from [`crate::config::GameSaveConfig`].

pub mod blob;
pub mod cache;
pub mod metadata;

pub use blob::{blob_object_key, record_blob_prefix, BlobPayload, BlobStore};
pub use cache::{CacheLookup, CacheStore, DEFAULT_TTL_SECS};
pub use metadata::{MetadataStore, RequestCancel};
