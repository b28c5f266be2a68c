use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gamesave_core::SystemClock;
use gamesave_server::config::{BlobBackendKind, LogFormat, MetadataBackendKind};
use gamesave_server::domain::GameSaveService;
use gamesave_server::grpc::GameSaveGrpc;
use gamesave_server::network::{NetworkConfig, NetworkModule};
use gamesave_server::storage::blob::memory::MemoryBlobStore;
use gamesave_server::storage::blob::BlobStore;
use gamesave_server::storage::cache::noop::NoopCache;
use gamesave_server::storage::cache::CacheStore;
use gamesave_server::storage::metadata::memory::MemoryMetadataStore;
use gamesave_server::storage::metadata::MetadataStore;
use gamesave_server::GameSaveConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "dynamodb")]
use gamesave_server::storage::metadata::dynamodb::DynamoMetadataStore;
#[cfg(feature = "mongo")]
use gamesave_server::storage::metadata::mongo::MongoMetadataStore;
#[cfg(feature = "s3")]
use gamesave_server::storage::blob::s3::S3BlobStore;
#[cfg(feature = "redis-cache")]
use gamesave_server::storage::cache::redis::RedisCache;

fn init_tracing(config: &GameSaveConfig) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}

async fn build_metadata_store(config: &GameSaveConfig) -> anyhow::Result<Arc<dyn MetadataStore>> {
    match config.metadata_backend {
        MetadataBackendKind::Memory => Ok(Arc::new(MemoryMetadataStore::new())),
        #[cfg(feature = "dynamodb")]
        MetadataBackendKind::Dynamodb => {
            let store = DynamoMetadataStore::from_env(
                config.aws_region.clone(),
                config.stores_table.clone(),
                config.records_table.clone(),
                config.metadata_table.clone(),
            )
            .await;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "dynamodb"))]
        MetadataBackendKind::Dynamodb => {
            anyhow::bail!("metadata-backend=dynamodb requires the `dynamodb` feature")
        }
        #[cfg(feature = "mongo")]
        MetadataBackendKind::Mongo => {
            let uri = config
                .mongo_uri
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("metadata-backend=mongo requires --mongo-uri"))?;
            let client = mongodb::Client::with_uri_str(uri).await?;
            let store = MongoMetadataStore::new(&client, &config.mongo_database);
            store.ensure_indexes().await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongo"))]
        MetadataBackendKind::Mongo => {
            anyhow::bail!("metadata-backend=mongo requires the `mongo` feature")
        }
    }
}

async fn build_blob_store(config: &GameSaveConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    match config.blob_backend {
        BlobBackendKind::Memory => Ok(Arc::new(MemoryBlobStore::new())),
        #[cfg(feature = "s3")]
        BlobBackendKind::S3 => {
            let store = S3BlobStore::from_env(config.aws_region.clone(), config.bucket_name.clone()).await;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "s3"))]
        BlobBackendKind::S3 => anyhow::bail!("blob-backend=s3 requires the `s3` feature"),
    }
}

#[cfg_attr(not(feature = "redis-cache"), allow(unused_variables))]
async fn build_cache_store(config: &GameSaveConfig) -> Arc<dyn CacheStore> {
    if !config.cache_enabled() {
        return Arc::new(NoopCache::new());
    }

    #[cfg(feature = "redis-cache")]
    {
        match RedisCache::connect(&config.cache_address, Duration::from_secs(2)).await {
            Some(cache) => return Arc::new(cache),
            None => warn!(address = %config.cache_address, "cache unreachable at startup, falling back to no-op cache"),
        }
    }
    #[cfg(not(feature = "redis-cache"))]
    {
        warn!("cache-address configured but the `redis-cache` feature is not enabled, falling back to no-op cache");
    }

    Arc::new(NoopCache::new())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GameSaveConfig::parse();
    init_tracing(&config);

    info!(
        http_port = config.http_port,
        grpc_port = config.grpc_port,
        metadata_backend = ?config.metadata_backend,
        blob_backend = ?config.blob_backend,
        "starting gamesave-server"
    );

    let metadata = build_metadata_store(&config).await?;
    let blobs = build_blob_store(&config).await?;
    let cache = build_cache_store(&config).await;

    let service = Arc::new(GameSaveService::new(
        metadata,
        blobs,
        cache,
        Arc::new(SystemClock),
        config.cache_ttl_secs,
    ));

    if config.metrics_enabled {
        match metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], config.metrics_port))
            .install()
        {
            Ok(()) => info!(port = config.metrics_port, "Prometheus exporter installed"),
            Err(err) => warn!(error = %err, "failed to install Prometheus exporter"),
        }
    }

    let network_config = NetworkConfig {
        host: config.host.clone(),
        port: config.http_port,
        cors_origins: vec!["*".to_string()],
        request_timeout: Duration::from_secs(30),
    };
    let mut http_module = NetworkModule::new(network_config, Arc::clone(&service));
    http_module.start().await?;
    let http_shutdown = http_module.shutdown_controller();

    let grpc_addr = format!("{}:{}", config.host, config.grpc_port).parse()?;
    let grpc_service = GameSaveGrpc::new(Arc::clone(&service)).into_server();

    let grace = Duration::from_secs(config.shutdown_grace_secs);
    let (grpc_shutdown_tx, grpc_shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let grpc_handle = tokio::spawn(async move {
        info!(addr = %grpc_addr, "gRPC listener starting");
        tonic::transport::Server::builder()
            .add_service(grpc_service)
            .serve_with_shutdown(grpc_addr, async {
                let _ = grpc_shutdown_rx.await;
            })
            .await
    });

    let http_handle = tokio::spawn(http_module.serve(shutdown_signal()));

    shutdown_signal().await;
    info!(grace_secs = config.shutdown_grace_secs, "shutdown signal received, draining");
    let _ = grpc_shutdown_tx.send(());

    let _ = tokio::time::timeout(grace, grpc_handle).await;
    http_handle.await??;
    let _ = http_shutdown.wait_for_drain(grace).await;

    info!("gamesave-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
