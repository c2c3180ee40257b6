// Contracts for the units a service type declares and for the port that
// resolves them
//
// All traits are Send + Sync: wiring is shared process-wide and service
// handles move freely between tokio tasks.

use crate::backend::MockStore;
use crate::error::{LoadError, ServiceResult};
use crate::registry::symbol::{Attributes, Symbol};
use crate::service::{Collection, Connection, Service};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;
use std::sync::Arc;

/// A resource unit: backs one collection or one individual model
///
/// Collection accessors are only synthesized for units whose `type_name`
/// matches the identifier derived from the collection name
/// (`key_pairs` -> `KeyPairs`). Every accessor call goes through
/// `construct`, so a unit decides what its collection objects look like.
///
/// ```ignore
/// struct Servers;
///
/// impl ModelUnit for Servers {
///     fn type_name(&self) -> &str {
///         "Servers"
///     }
///
///     fn construct(&self, collection: Symbol, connection: Connection, mut attributes: Attributes)
///         -> Collection {
///         attributes.entry("flavor").or_insert(json!("small"));
///         Collection::new(collection, self.type_name(), connection, attributes)
///     }
/// }
/// ```
pub trait ModelUnit: Send + Sync {
    /// Canonical type identifier of the unit
    fn type_name(&self) -> &str;

    /// Build the object an accessor hands out
    ///
    /// `attributes` are the caller's, with the reserved `connection` key
    /// already removed; `connection` always points at the invoking service.
    /// The default is a plain attribute bag.
    fn construct(&self, collection: Symbol, connection: Connection, attributes: Attributes) -> Collection {
        Collection::new(collection, self.type_name(), connection, attributes)
    }
}

/// A request unit: one API operation, with real and simulated behaviour
///
/// The service picks which half runs based on its variant; both halves
/// see the same service handle and parameters.
///
/// ```ignore
/// struct ListServers;
///
/// #[async_trait]
/// impl RequestUnit for ListServers {
///     async fn real(&self, _service: &Service, transport: &dyn Transport, params: Value)
///         -> ServiceResult<Value> {
///         transport.send("list_servers", params).await
///     }
///
///     async fn mock(&self, _service: &Service, store: &MockStore, _params: Value)
///         -> ServiceResult<Value> {
///         Ok(store.get("default", "servers").await.unwrap_or(json!([])))
///     }
/// }
/// ```
#[async_trait]
pub trait RequestUnit: Send + Sync {
    /// Perform the request against the real backend
    async fn real(&self, service: &Service, transport: &dyn Transport, params: Value) -> ServiceResult<Value>;

    /// Simulate the request against the service type's mock data
    async fn mock(&self, service: &Service, store: &MockStore, params: Value) -> ServiceResult<Value>;
}

/// Unit resolution port
///
/// Given a base path and a unit name, hand back the unit or fail with
/// `LoadError::UnresolvedUnit`. The loader only relies on the sequencing
/// and idempotence of these calls, never on how lookup is done.
#[cfg_attr(test, automock)]
pub trait UnitResolver: Send + Sync {
    fn resolve_model(&self, base_path: &str, name: &str) -> Result<Arc<dyn ModelUnit>, LoadError>;

    fn resolve_request(&self, base_path: &str, name: &str) -> Result<Arc<dyn RequestUnit>, LoadError>;
}

/// Real backend connection used by request units
///
/// # Errors
/// - `ServiceError::Transport` for connection-level failures
/// - `ServiceError::Http` / `ServiceError::Json` when wrapping client errors
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the decoded response body
    async fn send(&self, request: &str, params: Value) -> ServiceResult<Value>;
}
