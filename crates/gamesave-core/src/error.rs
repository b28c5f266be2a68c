//! Error taxonomy shared by every adapter and the domain service.
//!
//! Two enums mirror the two layers named in the design: [`BackendError`] is
//! what a metadata/blob/cache adapter surfaces, and [`ServiceError`] is what
//! the domain service returns to a frontend. The conversion folds the
//! adapter's retry/fatal distinction into the service's more general
//! `Unavailable`/`Internal` split.

use thiserror::Error;

/// Failure taxonomy surfaced by the metadata and blob adapters (C1/C2).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A transient I/O failure; the caller may retry.
    #[error("transient backend error: {0}")]
    Transient(String),
    /// A configuration or authorization failure; not retryable.
    #[error("fatal backend error: {0}")]
    Fatal(String),
}

/// Failure taxonomy returned by the domain service and mapped onto both
/// wire frontends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A transient backend failure; the client may retry.
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// An unexpected failure; not retryable by the client alone.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<BackendError> for ServiceError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound => ServiceError::NotFound,
            BackendError::AlreadyExists => ServiceError::AlreadyExists,
            BackendError::InvalidArgument(msg) => ServiceError::InvalidArgument(msg),
            BackendError::Transient(msg) => ServiceError::Unavailable(msg),
            BackendError::Fatal(msg) => ServiceError::Internal(msg),
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_maps_to_unavailable() {
        let err: ServiceError = BackendError::Transient("timeout".into()).into();
        assert_eq!(err, ServiceError::Unavailable("timeout".into()));
    }

    #[test]
    fn fatal_maps_to_internal() {
        let err: ServiceError = BackendError::Fatal("bad creds".into()).into();
        assert_eq!(err, ServiceError::Internal("bad creds".into()));
    }

    #[test]
    fn not_found_and_already_exists_map_1to1() {
        assert_eq!(ServiceError::from(BackendError::NotFound), ServiceError::NotFound);
        assert_eq!(
            ServiceError::from(BackendError::AlreadyExists),
            ServiceError::AlreadyExists
        );
    }
}
