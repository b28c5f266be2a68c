//! Game save server — key/value and blob storage for game save data,
//! served over HTTP and gRPC with pluggable metadata, blob, and cache
//! backends.

pub mod config;
pub mod domain;
pub mod grpc;
pub mod network;
pub mod storage;

pub use config::{BlobBackendKind, GameSaveConfig, LogFormat, MetadataBackendKind};
pub use domain::{GameSaveService, RecordPatch};
pub use grpc::GameSaveGrpc;
pub use network::{AppState, NetworkModule};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {}
}
