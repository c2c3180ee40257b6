// Registry and factory
//
// Service types are registered once at program start. `build` then turns a
// service name plus a configuration bag into a wired `Service`:
//
//   1. bin mode: merge default credentials (only allowed keys; caller wins)
//   2. validate keys against the type's required/optional sets
//   3. load the type's units (first time only)
//   4. pick Real or Mock from the build context
//   5. construct the instance
//
// Any failure aborts the build; no partial instance is returned.

pub mod descriptor;
pub mod loader;
pub mod naming;
pub mod symbol;
pub mod validation;

pub use descriptor::{Descriptor, DescriptorBuilder, ServiceType};
pub use loader::{Accessor, Loader, Wiring};
pub use naming::unit_type_name;
pub use symbol::{config_from, Attributes, Config, Symbol};
pub use validation::{check_arguments, validate_arguments, ArgumentReport};

use crate::backend::Backend;
use crate::error::{BuildError, BuildResult};
use crate::service::Service;
use crate::settings::{self, BuildContext, Mode};
use crate::units::UnitResolver;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Entry point for declaring service types and building instances
///
/// A registry made with `new` follows the process-wide context
/// (`settings::set_global`, `settings::set_mocking`) at every build; one
/// made with `with_context`, or pinned later through `set_context` or
/// `set_mode`, keeps its own.
///
/// Thread Safety: registration, builds and resets can run from any thread.
/// Builds of an already-loaded type do not contend on any lock besides the
/// short read lock on the type table.
///
/// Usage:
///     let registry = Registry::with_context(catalog, BuildContext::mock());
///     registry.register(compute_type);
///     let compute = registry.build("compute", config_from([("api_key", json!("x"))]))?;
pub struct Registry {
    types: RwLock<HashMap<String, Arc<ServiceType>>>,
    loader: Loader,
    /// `None` means "read `settings::global()` at build time"
    context: RwLock<Option<BuildContext>>,
}

impl Registry {
    /// Registry that follows the process-wide default context
    pub fn new(resolver: Arc<dyn UnitResolver>) -> Self {
        Self::with_optional_context(resolver, None)
    }

    /// Registry pinned to `context`
    pub fn with_context(resolver: Arc<dyn UnitResolver>, context: BuildContext) -> Self {
        Self::with_optional_context(resolver, Some(context))
    }

    fn with_optional_context(resolver: Arc<dyn UnitResolver>, context: Option<BuildContext>) -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
            loader: Loader::new(resolver),
            context: RwLock::new(context),
        }
    }

    /// Context the next `build` will use
    pub fn context(&self) -> BuildContext {
        self.context
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .unwrap_or_else(settings::global)
    }

    /// Whether this registry reads the process-wide context
    pub fn follows_global(&self) -> bool {
        self.context
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }

    /// Pin the registry to `context`
    pub fn set_context(&self, context: BuildContext) {
        *self
            .context
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(context);
    }

    /// Switch between Real and Mock for subsequent builds of this registry
    ///
    /// Pins the registry: the current global context is copied first if it
    /// was being followed.
    pub fn set_mode(&self, mode: Mode) {
        let mut context = self
            .context
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        context.get_or_insert_with(settings::global).mode = mode;
    }

    /// Register a service type under its name
    ///
    /// Re-registering a name replaces the previous type.
    pub fn register(&self, service_type: Arc<ServiceType>) -> Arc<ServiceType> {
        let mut types = self.types.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if types
            .insert(service_type.name().to_string(), service_type.clone())
            .is_some()
        {
            tracing::warn!("Service type '{}' re-registered", service_type.name());
        } else {
            tracing::debug!("Registered service type '{}'", service_type.name());
        }
        service_type
    }

    pub fn get(&self, name: &str) -> Option<Arc<ServiceType>> {
        self.types
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }

    /// Names of every registered type, sorted
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .types
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn lookup(&self, name: &str) -> BuildResult<Arc<ServiceType>> {
        self.get(name)
            .ok_or_else(|| BuildError::UnknownService(name.to_string()))
    }

    /// Build an instance of `name` with the registry's context
    ///
    /// # Errors
    /// - `BuildError::UnknownService`
    /// - `BuildError::Validation` (missing or unrecognized keys)
    /// - `BuildError::Load` (unresolvable units)
    /// - `BuildError::Backend` (Real transport could not be created)
    pub fn build(&self, name: &str, config: Config) -> BuildResult<Service> {
        let context = self.context();
        self.build_with(&context, name, config)
    }

    /// Build an instance of `name` with an explicit context
    pub fn build_with(&self, context: &BuildContext, name: &str, config: Config) -> BuildResult<Service> {
        let service_type = self.lookup(name)?;
        self.build_type(context, &service_type, config)
    }

    /// Build an instance of a service type that need not be registered
    pub fn build_type(
        &self,
        context: &BuildContext,
        service_type: &ServiceType,
        config: Config,
    ) -> BuildResult<Service> {
        let config = merge_default_credentials(context, service_type, config);

        validate_arguments(
            config.keys(),
            &service_type.required_keys(),
            &service_type.optional_keys(),
        )?;

        let wiring = self.loader.ensure_loaded(service_type)?;

        let backend = match context.mode {
            Mode::Mock => Backend::Mock(service_type.mock_store().clone()),
            Mode::Real => Backend::Real(service_type.create_transport(&config)?),
        };

        tracing::debug!(
            "Built {} instance of '{}' with {} collection accessor(s)",
            backend.variant(),
            service_type.name(),
            wiring.accessors.len()
        );

        Ok(Service::new(service_type.name().to_string(), config, backend, wiring))
    }

    /// Load a registered type's units without building an instance
    pub fn ensure_loaded(&self, name: &str) -> BuildResult<Arc<Wiring>> {
        let service_type = self.lookup(name)?;
        Ok(self.loader.ensure_loaded(&service_type)?)
    }

    /// Forward to the type's mock store: drop simulated state for `keys`
    /// (all known keys when `None`)
    pub async fn reset_data(&self, name: &str, keys: Option<&[Symbol]>) -> BuildResult<usize> {
        let service_type = self.lookup(name)?;
        Ok(service_type.mock_store().reset_data(keys).await)
    }
}

/// In bin mode, default credentials restricted to the type's allowed keys,
/// overlaid by the caller's config
fn merge_default_credentials(context: &BuildContext, service_type: &ServiceType, config: Config) -> Config {
    if !context.bin {
        return config;
    }

    let allowed = service_type.allowed_keys();
    let mut merged: Config = context
        .credentials
        .iter()
        .filter(|(key, _)| allowed.contains(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    tracing::debug!(
        "Merging {} default credential(s) into '{}' config",
        merged.len(),
        service_type.name()
    );

    merged.extend(config);
    merged
}
