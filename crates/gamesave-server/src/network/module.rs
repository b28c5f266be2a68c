//! Network module with deferred startup lifecycle.
//!
//! Implements the deferred startup pattern: `new()` creates resources,
//! `start()` binds the TCP listener, and `serve()` starts accepting
//! connections. This separation lets the caller wire the Domain Service
//! into shared state between `start()` and `serve()`.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    blobs, health_handler, liveness_handler, metadata, readiness_handler, records, root_handler,
    stores, AppState,
};
use super::middleware::{build_http_layers, track_metrics};
use super::shutdown::{track_in_flight, ShutdownController};
use crate::domain::GameSaveService;

/// Manages the full HTTP server lifecycle.
///
/// Follows the deferred startup pattern:
/// 1. `new()` -- allocates the shutdown controller
/// 2. `start()` -- binds the TCP listener to the configured address
/// 3. `serve()` -- begins accepting connections until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    service: Arc<GameSaveService>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    #[must_use]
    pub fn new(config: NetworkConfig, service: Arc<GameSaveService>) -> Self {
        Self {
            config,
            listener: None,
            service,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with every route and the middleware stack.
    pub fn build_router(&self) -> Router {
        build_router(&self.config, Arc::clone(&self.service), Arc::clone(&self.shutdown))
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Starts serving connections until the shutdown signal fires.
    ///
    /// Consumes `self` because the listener is moved into the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a fatal I/O error.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called before `serve()`.
    pub async fn serve(self, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        let listener = self.listener.expect("start() must be called before serve()");
        let shutdown_ctrl = Arc::clone(&self.shutdown);
        let router = build_router(&self.config, self.service, Arc::clone(&shutdown_ctrl));

        shutdown_ctrl.set_ready();
        info!("Serving HTTP connections");

        let drain_trigger = Arc::clone(&shutdown_ctrl);
        let shutdown = async move {
            shutdown.await;
            drain_trigger.trigger_shutdown();
        };
        axum::serve(listener, router).with_graceful_shutdown(shutdown).await?;

        let drained = shutdown_ctrl.wait_for_drain(Duration::from_secs(30)).await;
        if drained {
            info!("All in-flight requests drained successfully");
        } else {
            warn!("Drain timeout expired with in-flight requests remaining");
        }
        Ok(())
    }
}

fn build_router(config: &NetworkConfig, service: Arc<GameSaveService>, shutdown: Arc<ShutdownController>) -> Router {
    let in_flight_layer = from_fn_with_state(Arc::clone(&shutdown), track_in_flight);

    let state = AppState {
        service,
        shutdown,
        config: Arc::new(config.clone()),
        start_time: Instant::now(),
    };

    let layers = build_http_layers(config);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route("/api/stores", get(stores::list_stores_handler).post(stores::create_store_handler))
        .route(
            "/api/stores/{store_id}",
            get(stores::get_store_handler).delete(stores::delete_store_handler),
        )
        .route(
            "/api/stores/{store_id}/records",
            get(records::list_records_handler).post(records::create_record_handler),
        )
        .route(
            "/api/stores/{store_id}/records/{record_id}",
            get(records::get_record_handler)
                .put(records::update_record_handler)
                .delete(records::delete_record_handler),
        )
        .route(
            "/api/stores/{store_id}/records/{record_id}/blobs",
            get(blobs::list_blobs_handler),
        )
        .route(
            "/api/stores/{store_id}/records/{record_id}/blobs/{blob_key}",
            get(blobs::get_blob_handler)
                .put(blobs::put_blob_handler)
                .delete(blobs::delete_blob_handler),
        )
        .route(
            "/api/metadata/{metadata_type}/{metadata_id}",
            post(metadata::set_metadata_handler)
                .get(metadata::get_metadata_handler)
                .delete(metadata::delete_metadata_handler),
        )
        .layer(layers)
        .layer(axum::middleware::from_fn(track_metrics))
        .layer(in_flight_layer)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::blob::memory::MemoryBlobStore;
    use crate::storage::cache::noop::NoopCache;
    use crate::storage::metadata::memory::MemoryMetadataStore;
    use gamesave_core::SystemClock;

    fn test_service() -> Arc<GameSaveService> {
        Arc::new(GameSaveService::new(
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(NoopCache::new()),
            Arc::new(SystemClock),
            3600,
        ))
    }

    #[test]
    fn new_creates_module_without_binding() {
        let module = NetworkModule::new(NetworkConfig::default(), test_service());
        assert!(module.listener.is_none());
    }

    #[test]
    fn shutdown_controller_returns_shared_arc() {
        let module = NetworkModule::new(NetworkConfig::default(), test_service());
        let s1 = module.shutdown_controller();
        let s2 = module.shutdown_controller();
        assert!(Arc::ptr_eq(&s1, &s2));
    }

    #[test]
    fn build_router_creates_router() {
        let module = NetworkModule::new(NetworkConfig::default(), test_service());
        let _router = module.build_router();
    }

    #[tokio::test]
    async fn start_binds_to_os_assigned_port() {
        let mut module = NetworkModule::new(NetworkConfig::default(), test_service());
        let port = module.start().await.expect("start should succeed");
        assert!(port > 0, "OS-assigned port should be > 0");
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    #[should_panic(expected = "start() must be called before serve()")]
    async fn serve_panics_without_start() {
        let module = NetworkModule::new(NetworkConfig::default(), test_service());
        let _ = module.serve(std::future::pending::<()>()).await;
    }
}
