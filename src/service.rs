// Constructed service instances and the collections they hand out
//
// `Service` is a cheap-to-clone handle. Real and Mock instances are the
// same type: they share the accessor table of their service type and differ
// only in the backend their request units run against.

use crate::backend::{Backend, MockStore, Variant};
use crate::error::{ServiceError, ServiceResult};
use crate::registry::loader::Wiring;
use crate::registry::symbol::{Attributes, Config, Symbol};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};

/// Attribute key reserved for a collection's back-reference to its service
pub const CONNECTION_KEY: &str = "connection";

struct ServiceInner {
    service_name: String,
    config: Config,
    backend: Backend,
    wiring: Arc<Wiring>,
}

/// A fully wired client for one service type
///
/// Usage:
///     let compute = registry.build("compute", config)?;
///     let servers = compute.collection("servers", Attributes::new())?;
///     let listing = compute.request("list_servers", json!({})).await?;
#[derive(Clone)]
pub struct Service {
    inner: Arc<ServiceInner>,
}

impl Service {
    pub(crate) fn new(service_name: String, config: Config, backend: Backend, wiring: Arc<Wiring>) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                service_name,
                config,
                backend,
                wiring,
            }),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.inner.service_name
    }

    pub fn variant(&self) -> Variant {
        self.inner.backend.variant()
    }

    pub fn is_mocking(&self) -> bool {
        self.variant() == Variant::Mock
    }

    /// Configuration the instance was built with (defaults already merged)
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    /// The shared mock store, for Mock instances
    pub fn mock_store(&self) -> Option<&Arc<MockStore>> {
        match &self.inner.backend {
            Backend::Mock(store) => Some(store),
            Backend::Real(_) => None,
        }
    }

    /// Collection names this instance has accessors for, sorted
    pub fn collections(&self) -> Vec<Symbol> {
        self.inner.wiring.accessor_names()
    }

    /// Request names this instance can dispatch, sorted
    pub fn requests(&self) -> Vec<Symbol> {
        self.inner.wiring.request_names()
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.inner.wiring.accessor(name).is_some()
    }

    /// Invoke the accessor for `name`
    ///
    /// Caller attributes are kept as given, except `connection`, which is
    /// always this service.
    ///
    /// # Errors
    /// - `ServiceError::UnknownCollection` if no such collection was declared
    pub fn collection(&self, name: &str, attributes: Attributes) -> ServiceResult<Collection> {
        let accessor = self
            .inner
            .wiring
            .accessor(name)
            .ok_or_else(|| ServiceError::UnknownCollection(name.to_string()))?;
        Ok(accessor.call(self, attributes))
    }

    /// Run a request unit against this instance's backend
    ///
    /// # Errors
    /// - `ServiceError::UnknownRequest` if the request was not declared
    /// - whatever the request unit returns
    pub async fn request(&self, name: &str, params: Value) -> ServiceResult<Value> {
        let unit = self
            .inner
            .wiring
            .request(name)
            .cloned()
            .ok_or_else(|| ServiceError::UnknownRequest(name.to_string()))?;

        tracing::debug!("{} request '{}' on '{}'", self.variant(), name, self.service_name());

        match &self.inner.backend {
            Backend::Real(transport) => unit.real(self, transport.as_ref(), params).await,
            Backend::Mock(store) => unit.mock(self, store, params).await,
        }
    }

    /// Non-owning handle to this instance
    pub fn connection(&self) -> Connection {
        Connection {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same instance
    pub fn ptr_eq(&self, other: &Service) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("service_name", &self.inner.service_name)
            .field("variant", &self.variant())
            .field("collections", &self.collections())
            .finish()
    }
}

/// Back-reference from a collection to the service that created it
///
/// Never keeps the service alive.
#[derive(Clone)]
pub struct Connection {
    inner: Weak<ServiceInner>,
}

impl Connection {
    pub fn upgrade(&self) -> Option<Service> {
        self.inner.upgrade().map(|inner| Service { inner })
    }

    pub fn is_connected(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Whether this connection points at `service`
    pub fn points_to(&self, service: &Service) -> bool {
        Weak::ptr_eq(&self.inner, &Arc::downgrade(&service.inner))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.upgrade() {
            Some(inner) => write!(f, "Connection({})", inner.service_name),
            None => f.write_str("Connection(<dropped>)"),
        }
    }
}

/// Object produced by a collection accessor
#[derive(Debug, Clone)]
pub struct Collection {
    name: Symbol,
    kind: String,
    connection: Connection,
    attributes: Attributes,
}

impl Collection {
    /// Assemble a collection object; used by `ModelUnit::construct`
    ///
    /// The reserved `connection` key is never stored as an attribute.
    pub fn new(name: Symbol, kind: impl Into<String>, connection: Connection, mut attributes: Attributes) -> Self {
        attributes.remove(CONNECTION_KEY);

        Self {
            name,
            kind: kind.into(),
            connection,
            attributes,
        }
    }

    /// Collection name the accessor was declared under (`key_pairs`)
    pub fn collection_name(&self) -> &Symbol {
        &self.name
    }

    /// Type identifier of the backing model unit (`KeyPairs`)
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// The owning service
    ///
    /// # Errors
    /// - `ServiceError::Disconnected` once every handle to it was dropped
    pub fn service(&self) -> ServiceResult<Service> {
        self.connection
            .upgrade()
            .ok_or_else(|| ServiceError::Disconnected(self.name.to_string()))
    }

    /// Forward a request to the owning service
    pub async fn request(&self, name: &str, params: Value) -> ServiceResult<Value> {
        self.service()?.request(name, params).await
    }
}
