//! Configuration (C6): every recognized option, loaded via `clap`
//! derive+env the way `topgun-server`'s lifecycle loads its `ServerConfig`.
//! Every field has a CLI flag and an environment variable fallback so the
//! same binary runs unchanged under a container orchestrator or a shell.

use clap::{Parser, ValueEnum};

/// Top-level configuration for the game-save service.
#[derive(Debug, Clone, Parser)]
#[command(name = "gamesave-server", about = "Game-save key/value and blob service")]
pub struct GameSaveConfig {
    /// TCP port for the HTTP listener.
    #[arg(long, env = "GAMESAVE_HTTP_PORT", default_value_t = 8080)]
    pub http_port: u16,

    /// TCP port for the gRPC listener.
    #[arg(long, env = "GAMESAVE_GRPC_PORT", default_value_t = 8081)]
    pub grpc_port: u16,

    /// Bind address shared by both listeners.
    #[arg(long, env = "GAMESAVE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Region hint passed to AWS-backed adapters (DynamoDB, S3).
    #[arg(long, env = "AWS_REGION")]
    pub aws_region: Option<String>,

    /// Which metadata backend to construct.
    #[arg(long, env = "GAMESAVE_METADATA_BACKEND", value_enum, default_value_t = MetadataBackendKind::Memory)]
    pub metadata_backend: MetadataBackendKind,
    /// Logical table name for stores.
    #[arg(long, env = "GAMESAVE_STORES_TABLE", default_value = "gamesave-stores")]
    pub stores_table: String,
    /// Logical table name for records.
    #[arg(long, env = "GAMESAVE_RECORDS_TABLE", default_value = "gamesave-records")]
    pub records_table: String,
    /// Logical table name for metadata documents.
    #[arg(long, env = "GAMESAVE_METADATA_TABLE", default_value = "gamesave-metadata")]
    pub metadata_table: String,
    /// MongoDB connection string, used only when `metadata_backend = mongo`.
    #[arg(long, env = "GAMESAVE_MONGO_URI")]
    pub mongo_uri: Option<String>,
    /// MongoDB database name, used only when `metadata_backend = mongo`.
    #[arg(long, env = "GAMESAVE_MONGO_DATABASE", default_value = "gamesave")]
    pub mongo_database: String,

    /// Which blob backend to construct.
    #[arg(long, env = "GAMESAVE_BLOB_BACKEND", value_enum, default_value_t = BlobBackendKind::Memory)]
    pub blob_backend: BlobBackendKind,
    /// Object-store bucket for blob payloads.
    #[arg(long, env = "GAMESAVE_BUCKET_NAME", default_value = "gamesave-blobs")]
    pub bucket_name: String,

    /// Cache endpoint (`redis://...`); empty disables the cache.
    #[arg(long, env = "GAMESAVE_CACHE_ADDRESS", default_value = "")]
    pub cache_address: String,
    /// Cache entry time-to-live, in seconds.
    #[arg(long, env = "GAMESAVE_CACHE_TTL_SECS", default_value_t = 3600)]
    pub cache_ttl_secs: u64,

    /// Log output format.
    #[arg(long, env = "GAMESAVE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
    /// `tracing-subscriber` `EnvFilter` directive, e.g. `info` or
    /// `gamesave_server=debug,tower_http=info`.
    #[arg(long, env = "GAMESAVE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Enables the Prometheus `/metrics` exposition endpoint.
    #[arg(long, env = "GAMESAVE_METRICS_ENABLED", default_value_t = true)]
    pub metrics_enabled: bool,
    /// TCP port the Prometheus exporter listens on.
    #[arg(long, env = "GAMESAVE_METRICS_PORT", default_value_t = 9090)]
    pub metrics_port: u16,

    /// Maximum time to wait for in-flight requests to drain on shutdown.
    #[arg(long, env = "GAMESAVE_SHUTDOWN_GRACE_SECS", default_value_t = 30)]
    pub shutdown_grace_secs: u64,
}

impl GameSaveConfig {
    #[must_use]
    pub fn cache_enabled(&self) -> bool {
        !self.cache_address.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetadataBackendKind {
    Dynamodb,
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BlobBackendKind {
    S3,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_options() {
        let config = GameSaveConfig::parse_from(["gamesave-server"]);
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.grpc_port, 8081);
        assert_eq!(config.cache_ttl_secs, 3600);
        assert!(!config.cache_enabled());
    }

    #[test]
    fn non_empty_cache_address_enables_cache() {
        let config = GameSaveConfig::parse_from(["gamesave-server", "--cache-address", "redis://localhost"]);
        assert!(config.cache_enabled());
    }
}
