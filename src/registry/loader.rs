// Loader: resolves a service type's units once and builds its wiring
//
// Wiring = accessor table (one closure per collection) + resolved model and
// request units. It is published into the service type's `OnceLock` only
// after every resolution succeeded, so a failed load leaves the type
// unloaded and retryable.
//
// First-time loads of the same type are serialized by the type's
// `load_lock`; once published, lookups never take the lock.

use crate::error::LoadError;
use crate::registry::descriptor::ServiceType;
use crate::registry::naming::unit_type_name;
use crate::registry::symbol::{Attributes, Symbol};
use crate::service::{Collection, Service, CONNECTION_KEY};
use crate::units::{ModelUnit, RequestUnit, UnitResolver};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Closure synthesized for one collection
pub type AccessorFn = Arc<dyn Fn(&Service, Attributes) -> Collection + Send + Sync>;

/// One entry of a service's accessor table
#[derive(Clone)]
pub struct Accessor {
    name: Symbol,
    unit: Arc<dyn ModelUnit>,
    call: AccessorFn,
}

impl Accessor {
    /// Bind a collection name to its model unit
    ///
    /// The unit constructs the collection from the caller's attributes and
    /// a back-reference to the service the accessor is invoked on. A
    /// caller-supplied `connection` attribute never reaches the unit.
    fn synthesize(name: Symbol, unit: Arc<dyn ModelUnit>) -> Self {
        let collection = name.clone();
        let model = unit.clone();
        let call: AccessorFn = Arc::new(move |service: &Service, mut attributes: Attributes| {
            if attributes.remove(CONNECTION_KEY).is_some() {
                tracing::warn!(
                    "Ignoring caller-supplied '{}' attribute for collection '{}'",
                    CONNECTION_KEY,
                    collection
                );
            }
            model.construct(collection.clone(), service.connection(), attributes)
        });

        Self { name, unit, call }
    }

    pub fn name(&self) -> &Symbol {
        &self.name
    }

    /// Type identifier of the backing model unit
    pub fn type_name(&self) -> &str {
        self.unit.type_name()
    }

    pub fn call(&self, service: &Service, attributes: Attributes) -> Collection {
        (self.call)(service, attributes)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("name", &self.name)
            .field("type_name", &self.type_name())
            .finish()
    }
}

/// Everything a loaded service type exposes to its instances
#[derive(Clone, Default)]
pub struct Wiring {
    pub(crate) accessors: BTreeMap<Symbol, Accessor>,
    pub(crate) models: BTreeMap<Symbol, Arc<dyn ModelUnit>>,
    pub(crate) requests: BTreeMap<Symbol, Arc<dyn RequestUnit>>,
}

impl Wiring {
    pub fn accessor(&self, name: &str) -> Option<&Accessor> {
        self.accessors.get(name)
    }

    /// Collection names with an accessor, sorted
    pub fn accessor_names(&self) -> Vec<Symbol> {
        self.accessors.keys().cloned().collect()
    }

    pub fn model(&self, name: &str) -> Option<&Arc<dyn ModelUnit>> {
        self.models.get(name)
    }

    pub fn model_names(&self) -> Vec<Symbol> {
        self.models.keys().cloned().collect()
    }

    pub fn request(&self, name: &str) -> Option<&Arc<dyn RequestUnit>> {
        self.requests.get(name)
    }

    pub fn request_names(&self) -> Vec<Symbol> {
        self.requests.keys().cloned().collect()
    }
}

impl fmt::Debug for Wiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wiring")
            .field("accessors", &self.accessor_names())
            .field("models", &self.model_names())
            .field("requests", &self.request_names())
            .finish()
    }
}

/// Resolves and wires the units declared by service types
pub struct Loader {
    resolver: Arc<dyn UnitResolver>,
}

impl Loader {
    pub fn new(resolver: Arc<dyn UnitResolver>) -> Self {
        Self { resolver }
    }

    /// Load `service_type` (ancestors first) unless already loaded
    ///
    /// Idempotent: on a loaded type this returns the published wiring
    /// without touching the resolver.
    ///
    /// # Errors
    /// - `LoadError::UnresolvedUnit` when any declared unit is missing
    /// - `LoadError::TypeMismatch` when a collection's unit has the wrong type name
    pub fn ensure_loaded(&self, service_type: &ServiceType) -> Result<Arc<Wiring>, LoadError> {
        if let Some(wiring) = service_type.wiring.get() {
            return Ok(wiring.clone());
        }

        let inherited = match service_type.parent() {
            Some(parent) => Some(self.ensure_loaded(parent)?),
            None => None,
        };

        let _guard = service_type
            .load_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Another caller may have finished while we waited for the lock.
        if let Some(wiring) = service_type.wiring.get() {
            return Ok(wiring.clone());
        }

        let mut wiring = inherited.map(|w| (*w).clone()).unwrap_or_default();
        self.wire(service_type, &mut wiring)?;

        let wiring = Arc::new(wiring);
        if service_type.wiring.set(wiring.clone()).is_err() {
            tracing::warn!("Service type '{}' was loaded concurrently", service_type.name());
        }

        tracing::info!(
            "Loaded service type '{}': {} collection(s), {} model(s), {} request(s)",
            service_type.name(),
            wiring.accessors.len(),
            wiring.models.len(),
            wiring.requests.len()
        );

        Ok(wiring)
    }

    fn wire(&self, service_type: &ServiceType, wiring: &mut Wiring) -> Result<(), LoadError> {
        let descriptor = service_type.descriptor();

        for collection in &descriptor.collection_names {
            let unit = self
                .resolver
                .resolve_model(&descriptor.model_base_path, collection.as_str())?;

            let expected = unit_type_name(collection.as_str());
            if unit.type_name() != expected {
                return Err(LoadError::TypeMismatch {
                    collection: collection.clone(),
                    path: descriptor.model_base_path.clone(),
                    expected,
                    found: unit.type_name().to_string(),
                });
            }

            tracing::debug!(
                "Wiring collection '{}' -> {} for '{}'",
                collection,
                expected,
                service_type.name()
            );
            wiring
                .accessors
                .insert(collection.clone(), Accessor::synthesize(collection.clone(), unit));
        }

        for model in &descriptor.model_names {
            let unit = self
                .resolver
                .resolve_model(&descriptor.model_base_path, model.as_str())?;
            wiring.models.insert(model.clone(), unit);
        }

        for request in &descriptor.request_names {
            let unit = self
                .resolver
                .resolve_request(&descriptor.request_base_path, request.as_str())?;
            wiring.requests.insert(request.clone(), unit);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnitKind;
    use crate::units::mocks::test_helpers::*;
    use crate::units::traits::MockUnitResolver;
    use crate::units::UnitCatalog;
    use mockall::predicate::eq;

    fn compute_type() -> Arc<ServiceType> {
        ServiceType::builder("compute")
            .requires(["api_key"])
            .model_path(MODEL_PATH)
            .request_path(REQUEST_PATH)
            .collection("servers")
            .model("flavor")
            .request("echo")
            .build()
    }

    #[test]
    fn test_load_builds_wiring() {
        let loader = Loader::new(compute_catalog());
        let service_type = compute_type();

        let wiring = loader.ensure_loaded(&service_type).unwrap();

        assert_eq!(wiring.accessor_names(), vec![Symbol::from("servers")]);
        assert_eq!(wiring.accessor("servers").unwrap().type_name(), "Servers");
        assert_eq!(wiring.model_names(), vec![Symbol::from("flavor")]);
        assert_eq!(wiring.request_names(), vec![Symbol::from("echo")]);
        assert!(service_type.is_loaded());
    }

    #[test]
    fn test_second_load_does_not_resolve_again() {
        let mut resolver = MockUnitResolver::new();
        resolver
            .expect_resolve_model()
            .with(eq(MODEL_PATH), eq("servers"))
            .times(1)
            .returning(|_, _| Ok(named_model("Servers")));
        resolver
            .expect_resolve_model()
            .with(eq(MODEL_PATH), eq("flavor"))
            .times(1)
            .returning(|_, _| Ok(named_model("Flavor")));
        resolver
            .expect_resolve_request()
            .with(eq(REQUEST_PATH), eq("echo"))
            .times(1)
            .returning(|_, _| Ok(echo_request()));

        let loader = Loader::new(Arc::new(resolver));
        let service_type = compute_type();

        let first = loader.ensure_loaded(&service_type).unwrap();
        let second = loader.ensure_loaded(&service_type).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unresolved_request_leaves_type_unloaded() {
        let catalog = Arc::new(UnitCatalog::new());
        catalog.register_model(MODEL_PATH, "servers", named_model("Servers"));
        catalog.register_model(MODEL_PATH, "flavor", named_model("Flavor"));

        let loader = Loader::new(catalog.clone());
        let service_type = compute_type();

        let err = loader.ensure_loaded(&service_type).unwrap_err();
        assert_eq!(
            err,
            LoadError::UnresolvedUnit {
                kind: UnitKind::Request,
                path: REQUEST_PATH.to_string(),
                name: Symbol::from("echo"),
            }
        );
        assert!(!service_type.is_loaded());

        // Retry succeeds once the unit is available.
        catalog.register_request(REQUEST_PATH, "echo", echo_request());
        assert!(loader.ensure_loaded(&service_type).is_ok());
        assert!(service_type.is_loaded());
    }

    #[test]
    fn test_collection_unit_must_match_derived_type() {
        let catalog = Arc::new(UnitCatalog::new());
        catalog.register_model(MODEL_PATH, "key_pairs", named_model("Keypairs"));

        let loader = Loader::new(catalog);
        let service_type = ServiceType::builder("compute")
            .model_path(MODEL_PATH)
            .collection("key_pairs")
            .build();

        let err = loader.ensure_loaded(&service_type).unwrap_err();
        assert!(matches!(
            err,
            LoadError::TypeMismatch { ref expected, ref found, .. }
                if expected == "KeyPairs" && found == "Keypairs"
        ));
    }

    #[test]
    fn test_parent_loaded_first_and_inherited() {
        let catalog = compute_catalog();
        catalog.register_model("block/models", "volumes", named_model("Volumes"));

        let parent = compute_type();
        let child = ServiceType::builder("compute-with-volumes")
            .parent(parent.clone())
            .model_path("block/models")
            .collection("volumes")
            .build();

        let loader = Loader::new(catalog);
        let wiring = loader.ensure_loaded(&child).unwrap();

        assert!(parent.is_loaded());
        assert_eq!(
            wiring.accessor_names(),
            vec![Symbol::from("servers"), Symbol::from("volumes")]
        );
        assert!(wiring.request("echo").is_some());
    }

    #[test]
    fn test_failed_parent_blocks_child() {
        let catalog = Arc::new(UnitCatalog::new());
        let parent = compute_type();
        let child = ServiceType::builder("child").parent(parent.clone()).build();

        let loader = Loader::new(catalog);
        assert!(loader.ensure_loaded(&child).is_err());
        assert!(!parent.is_loaded());
        assert!(!child.is_loaded());
    }

    #[test]
    fn test_duplicate_collection_yields_one_accessor() {
        let service_type = ServiceType::builder("compute")
            .model_path(MODEL_PATH)
            .collection("servers")
            .collection("servers")
            .build();

        let wiring = Loader::new(compute_catalog()).ensure_loaded(&service_type).unwrap();
        assert_eq!(wiring.accessor_names().len(), 1);
    }

    #[test]
    fn test_wiring_is_shared_across_loaders() {
        let service_type = compute_type();
        let first = Loader::new(compute_catalog()).ensure_loaded(&service_type).unwrap();

        // No expectations: any resolver call would fail the test.
        let other = Loader::new(Arc::new(MockUnitResolver::new()));
        let second = other.ensure_loaded(&service_type).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_amend_after_load_keeps_wiring() {
        let service_type = compute_type();
        let loader = Loader::new(compute_catalog());
        loader.ensure_loaded(&service_type).unwrap();

        service_type.amend(|d| d.collection("key_pairs"));
        let wiring = loader.ensure_loaded(&service_type).unwrap();

        assert!(wiring.accessor("key_pairs").is_none());
        assert_eq!(service_type.descriptor().collection_names.len(), 2);
    }
}
