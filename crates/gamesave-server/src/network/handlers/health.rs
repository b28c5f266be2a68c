//! Health, liveness, readiness, and banner endpoint handlers.
//!
//! These handlers expose server health information for orchestrators
//! (Kubernetes, load balancers) and satisfy the plain-text `/health` and
//! banner `/` routes named in the external interface.

use axum::extract::State;
use axum::http::StatusCode;

use super::AppState;
use crate::network::HealthState;

/// `GET /health` -- plain-text `OK`, always `200`.
pub async fn health_handler() -> &'static str {
    "OK"
}

/// `GET /` -- a short human banner.
pub async fn root_handler() -> &'static str {
    "gamesave-server: key/value and blob storage for game saves"
}

/// Kubernetes liveness probe -- always returns 200 OK.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe -- returns 200 when ready, 503 otherwise.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.health_state() == HealthState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GameSaveService;
    use crate::network::{NetworkConfig, ShutdownController};
    use crate::storage::blob::memory::MemoryBlobStore;
    use crate::storage::cache::noop::NoopCache;
    use crate::storage::metadata::memory::MemoryMetadataStore;
    use gamesave_core::SystemClock;
    use std::sync::Arc;
    use std::time::Instant;

    fn test_state() -> AppState {
        AppState {
            service: Arc::new(GameSaveService::new(
                Arc::new(MemoryMetadataStore::new()),
                Arc::new(MemoryBlobStore::new()),
                Arc::new(NoopCache::new()),
                Arc::new(SystemClock),
                3600,
            )),
            shutdown: Arc::new(ShutdownController::new()),
            config: Arc::new(NetworkConfig::default()),
            start_time: Instant::now(),
        }
    }

    #[tokio::test]
    async fn health_handler_returns_plain_ok() {
        assert_eq!(health_handler().await, "OK");
    }

    #[tokio::test]
    async fn liveness_handler_always_returns_200() {
        assert_eq!(liveness_handler().await, StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_handler_returns_503_when_starting() {
        let state = test_state();
        assert_eq!(readiness_handler(State(state)).await, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn readiness_handler_returns_200_when_ready() {
        let state = test_state();
        state.shutdown.set_ready();
        assert_eq!(readiness_handler(State(state)).await, StatusCode::OK);
    }
}
