// Service-type declarations
//
// A `ServiceType` pairs a `Descriptor` (keys, collections, models, requests
// and where to find them) with the per-type state the registry needs:
// the optional parent, the Real transport factory, the shared mock store and
// the wiring once loaded.

use crate::backend::{default_transport_factory, MockStore, TransportFactory};
use crate::error::BuildError;
use crate::registry::loader::Wiring;
use crate::registry::symbol::{Config, Symbol};
use crate::units::Transport;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

/// Declarative definition of one service type
///
/// Key lists keep duplicates; set semantics are applied at validation time.
/// Lists only grow: outside this crate the fields are read through getters
/// and changed through the append methods.
///
/// ```compile_fail
/// let compute = servicekit::ServiceType::builder("compute").requires(["api_key"]).build();
/// compute.amend(|d| d.required_keys.clear());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    pub(crate) required_keys: Vec<Symbol>,
    pub(crate) optional_keys: Vec<Symbol>,
    pub(crate) collection_names: Vec<Symbol>,
    pub(crate) model_names: Vec<Symbol>,
    pub(crate) request_names: Vec<Symbol>,
    pub(crate) model_base_path: String,
    pub(crate) request_base_path: String,
}

impl Descriptor {
    pub fn required_keys(&self) -> &[Symbol] {
        &self.required_keys
    }

    pub fn optional_keys(&self) -> &[Symbol] {
        &self.optional_keys
    }

    pub fn collection_names(&self) -> &[Symbol] {
        &self.collection_names
    }

    pub fn model_names(&self) -> &[Symbol] {
        &self.model_names
    }

    pub fn request_names(&self) -> &[Symbol] {
        &self.request_names
    }

    pub fn model_base_path(&self) -> &str {
        &self.model_base_path
    }

    pub fn request_base_path(&self) -> &str {
        &self.request_base_path
    }

    pub fn requires<I, K>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<Symbol>,
    {
        self.required_keys.extend(keys.into_iter().map(Into::into));
    }

    pub fn recognizes<I, K>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<Symbol>,
    {
        self.optional_keys.extend(keys.into_iter().map(Into::into));
    }

    pub fn collection(&mut self, name: impl Into<Symbol>) {
        self.collection_names.push(name.into());
    }

    pub fn model(&mut self, name: impl Into<Symbol>) {
        self.model_names.push(name.into());
    }

    pub fn request(&mut self, name: impl Into<Symbol>) {
        self.request_names.push(name.into());
    }

    pub fn model_path(&mut self, path: impl Into<String>) {
        self.model_base_path = path.into();
    }

    pub fn request_path(&mut self, path: impl Into<String>) {
        self.request_base_path = path.into();
    }
}

/// A registered service type
///
/// Created once through `ServiceType::builder` and shared behind `Arc`.
/// The descriptor can still be amended after registration, but amendments
/// made after loading do not reach the already-built wiring.
///
/// The wiring lives on the type, not on a registry. Registering the same
/// `Arc<ServiceType>` with two registries that use different resolvers
/// means whichever loads it first decides the wiring for both; build a
/// separate type per resolver when they must differ.
pub struct ServiceType {
    name: String,
    parent: Option<Arc<ServiceType>>,
    descriptor: RwLock<Descriptor>,
    transport_factory: TransportFactory,
    mock_store: Arc<MockStore>,
    pub(crate) wiring: OnceLock<Arc<Wiring>>,
    pub(crate) load_lock: Mutex<()>,
}

impl ServiceType {
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<ServiceType>> {
        self.parent.as_ref()
    }

    /// Snapshot of this type's own descriptor (parent not included)
    pub fn descriptor(&self) -> Descriptor {
        self.descriptor
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Append to the descriptor after registration
    ///
    /// Key changes apply to the next validation. Collection, model and
    /// request changes only apply if the type has not been loaded yet.
    pub fn amend<F>(&self, f: F)
    where
        F: FnOnce(&mut Descriptor),
    {
        if self.is_loaded() {
            tracing::debug!(
                "Amending loaded service type '{}'; existing wiring is unchanged",
                self.name
            );
        }
        let mut descriptor = self
            .descriptor
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut descriptor);
    }

    /// Chain from the root ancestor down to this type
    pub fn lineage(&self) -> Vec<&ServiceType> {
        let mut chain = match &self.parent {
            Some(parent) => parent.lineage(),
            None => Vec::new(),
        };
        chain.push(self);
        chain
    }

    /// Required keys merged along the parent chain
    pub fn required_keys(&self) -> Vec<Symbol> {
        self.lineage()
            .into_iter()
            .flat_map(|t| t.descriptor().required_keys)
            .collect()
    }

    /// Optional keys merged along the parent chain
    pub fn optional_keys(&self) -> Vec<Symbol> {
        self.lineage()
            .into_iter()
            .flat_map(|t| t.descriptor().optional_keys)
            .collect()
    }

    /// `required ∪ optional` over the whole chain
    pub fn allowed_keys(&self) -> BTreeSet<Symbol> {
        self.required_keys()
            .into_iter()
            .chain(self.optional_keys())
            .collect()
    }

    pub fn is_loaded(&self) -> bool {
        self.wiring.get().is_some()
    }

    pub fn wiring(&self) -> Option<Arc<Wiring>> {
        self.wiring.get().cloned()
    }

    /// Simulated state shared by every Mock instance of this type
    pub fn mock_store(&self) -> &Arc<MockStore> {
        &self.mock_store
    }

    pub(crate) fn create_transport(&self, config: &Config) -> Result<Arc<dyn Transport>, BuildError> {
        (self.transport_factory)(config)
    }
}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceType")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("descriptor", &self.descriptor())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Append-only builder for a service type
///
/// Usage:
///     let compute = ServiceType::builder("compute")
///         .requires(["api_key"])
///         .recognizes(["region", "endpoint"])
///         .model_path("compute/models")
///         .collection("servers")
///         .request_path("compute/requests")
///         .request("list_servers")
///         .build();
pub struct DescriptorBuilder {
    name: String,
    parent: Option<Arc<ServiceType>>,
    descriptor: Descriptor,
    transport_factory: Option<TransportFactory>,
}

impl DescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            descriptor: Descriptor::default(),
            transport_factory: None,
        }
    }

    pub fn requires<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Symbol>,
    {
        self.descriptor.requires(keys);
        self
    }

    pub fn recognizes<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Symbol>,
    {
        self.descriptor.recognizes(keys);
        self
    }

    pub fn collection(mut self, name: impl Into<Symbol>) -> Self {
        self.descriptor.collection(name);
        self
    }

    pub fn model(mut self, name: impl Into<Symbol>) -> Self {
        self.descriptor.model(name);
        self
    }

    pub fn request(mut self, name: impl Into<Symbol>) -> Self {
        self.descriptor.request(name);
        self
    }

    /// Base path for model and collection units; last call wins
    pub fn model_path(mut self, path: impl Into<String>) -> Self {
        self.descriptor.model_path(path);
        self
    }

    /// Base path for request units; last call wins
    pub fn request_path(mut self, path: impl Into<String>) -> Self {
        self.descriptor.request_path(path);
        self
    }

    /// Inherit keys, collections, models and requests from `parent`
    pub fn parent(mut self, parent: Arc<ServiceType>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Constructor for the Real variant's transport
    ///
    /// Defaults to the parent's factory, or `HttpTransport` at the root.
    pub fn transport<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Config) -> Result<Arc<dyn Transport>, BuildError> + Send + Sync + 'static,
    {
        self.transport_factory = Some(Arc::new(factory));
        self
    }

    pub fn build(self) -> Arc<ServiceType> {
        let transport_factory = self
            .transport_factory
            .or_else(|| self.parent.as_ref().map(|p| p.transport_factory.clone()))
            .unwrap_or_else(default_transport_factory);

        Arc::new(ServiceType {
            name: self.name,
            parent: self.parent,
            descriptor: RwLock::new(self.descriptor),
            transport_factory,
            mock_store: Arc::new(MockStore::new()),
            wiring: OnceLock::new(),
            load_lock: Mutex::new(()),
        })
    }
}
