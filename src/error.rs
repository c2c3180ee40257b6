// Error types for the service registry
//
// Design Decision: one enum per failure domain, joined by `BuildError`
//
// Validation and loading failures are surfaced to the caller of
// `Registry::build` unchanged: `BuildError` wraps them transparently so the
// caller can still match on the original variant. Instance-level failures
// (accessor lookups, requests) live in `ServiceError`.

use crate::registry::symbol::{join_symbols, Symbol};
use std::fmt;
use thiserror::Error;

/// Configuration keys failed the required/optional check
///
/// Key lists are always sorted and free of duplicates, so the rendered
/// message is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One or more required keys were not supplied
    ///
    /// Recovery: the caller must supply them (or enable default credentials).
    #[error("Missing required arguments: {}", join_symbols(.0))]
    MissingRequired(Vec<Symbol>),

    /// Keys outside `required ∪ optional` were supplied
    ///
    /// Usually a typo in the caller's configuration.
    #[error("Unrecognized arguments: {}", join_symbols(.0))]
    UnrecognizedArguments(Vec<Symbol>),
}

/// Which base path a unit was looked up under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Model,
    Request,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Model => f.write_str("model"),
            UnitKind::Request => f.write_str("request"),
        }
    }
}

/// A declared unit could not be wired
///
/// The service type stays unloaded after any of these; a later build may
/// succeed once the unit is available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Nothing is registered at `path/name`
    #[error("Unresolved {kind} unit '{name}' (searched {path})")]
    UnresolvedUnit {
        kind: UnitKind,
        path: String,
        name: Symbol,
    },

    /// A model unit was found for a collection but identifies as another type
    #[error("Collection '{collection}' expects type {expected}, but the unit at {path} is {found}")]
    TypeMismatch {
        collection: Symbol,
        path: String,
        expected: String,
        found: String,
    },
}

/// Any failure while constructing a service instance
///
/// Construction is all-or-nothing: whenever this is returned, no instance
/// exists.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Load(#[from] LoadError),

    /// No service type is registered under this name
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// The Real variant's transport could not be created from the config
    #[error("Backend error: {0}")]
    Backend(String),
}

impl BuildError {
    /// The validation failure behind this error, if that is what it was
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            BuildError::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// The load failure behind this error, if that is what it was
    pub fn as_load(&self) -> Option<&LoadError> {
        match self {
            BuildError::Load(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors raised by a constructed service or one of its collections
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service exposes no accessor with this name
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// No request unit with this name was loaded for the service
    #[error("Unknown request: {0}")]
    UnknownRequest(String),

    /// A collection outlived the service it was created from
    #[error("Service for collection '{0}' has been dropped")]
    Disconnected(String),

    /// The backend (real or simulated) has no such resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport-level failure talking to the real backend
    #[error("Transport error: {0}")]
    Transport(String),

    /// A request unit failed
    #[error("Request '{name}' failed: {source}")]
    Request {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServiceError {
    /// Wrap a request unit's own failure
    ///
    /// Usage:
    ///     let body = parse(&raw).map_err(|e| ServiceError::request("list_servers", e))?;
    pub fn request(name: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        ServiceError::Request {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Errors from the settings/credentials layer
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file parsed but does not have the expected shape
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::MissingRequired(vec![Symbol::from("api_key"), Symbol::from("secret")]);
        assert_eq!(err.to_string(), "Missing required arguments: api_key, secret");

        let err = ValidationError::UnrecognizedArguments(vec![Symbol::from("bogus")]);
        assert_eq!(err.to_string(), "Unrecognized arguments: bogus");
    }

    #[test]
    fn test_build_error_is_transparent() {
        let err: BuildError = ValidationError::MissingRequired(vec![Symbol::from("api_key")]).into();
        assert_eq!(err.to_string(), "Missing required arguments: api_key");
        assert!(err.as_validation().is_some());
        assert!(err.as_load().is_none());
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError::UnresolvedUnit {
            kind: UnitKind::Request,
            path: "compute/requests".to_string(),
            name: Symbol::from("list_servers"),
        };
        assert_eq!(
            err.to_string(),
            "Unresolved request unit 'list_servers' (searched compute/requests)"
        );
    }

    #[test]
    fn test_request_error_keeps_source() {
        let err = ServiceError::request("list_servers", anyhow::anyhow!("quota exceeded"));
        assert_eq!(err.to_string(), "Request 'list_servers' failed: quota exceeded");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SettingsError = io_err.into();

        match err {
            SettingsError::Io(_) => {}
            _ => panic!("Expected Io variant"),
        }
    }
}
