//! HTTP handler definitions for the game-save service.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors), the `ServiceError` -> status code mapping shared by every
//! route, and re-exports each route group for convenient access when
//! building the router.

pub mod blobs;
pub mod health;
pub mod metadata;
pub mod records;
pub mod stores;

pub use health::{health_handler, liveness_handler, readiness_handler, root_handler};

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gamesave_core::ServiceError;

use super::{NetworkConfig, ShutdownController};
use crate::domain::GameSaveService;

/// Shared application state passed to all axum handlers via `State` extraction.
#[derive(Clone)]
pub struct AppState {
    /// The Domain Service orchestrating every backend adapter.
    pub service: Arc<GameSaveService>,
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// HTTP transport configuration (bind address, CORS, timeout).
    pub config: Arc<NetworkConfig>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}

/// Wraps a [`ServiceError`] so it can be returned directly from an axum
/// handler: maps to a status code and writes a short plain-text body, per
/// the "JSON error envelopes are not used" error-handling design.
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ServiceError::NotFound => (StatusCode::NOT_FOUND, self.0.to_string()),
            ServiceError::AlreadyExists => (StatusCode::CONFLICT, self.0.to_string()),
            ServiceError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            ServiceError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, self.0.to_string()),
            ServiceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()),
        };
        (status, message).into_response()
    }
}
