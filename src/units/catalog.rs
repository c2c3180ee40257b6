// In-memory unit catalog
//
// Units are registered at program start under `<base_path>/<name>`, the same
// key the loader asks for. This is the registry-lookup flavour of the unit
// resolution port.

use super::traits::{ModelUnit, RequestUnit, UnitResolver};
use crate::error::{LoadError, UnitKind};
use crate::registry::symbol::Symbol;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe catalog of model and request units
///
/// Registration takes `&self`, so a catalog shared with a registry can
/// still be filled in later (for example after a failed load).
///
/// Usage:
///     let catalog = UnitCatalog::new();
///     catalog.register_model("compute/models", "servers", Arc::new(Servers));
///     catalog.register_request("compute/requests", "list_servers", Arc::new(ListServers));
#[derive(Default)]
pub struct UnitCatalog {
    models: RwLock<HashMap<String, Arc<dyn ModelUnit>>>,
    requests: RwLock<HashMap<String, Arc<dyn RequestUnit>>>,
}

/// Lookup key for a unit: `base/name`, or just `name` with an empty base
pub fn unit_path(base_path: &str, name: &str) -> String {
    let base = base_path.trim_end_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_model(&self, base_path: &str, name: &str, unit: Arc<dyn ModelUnit>) {
        let path = unit_path(base_path, name);
        tracing::debug!("Registering model unit {} ({})", path, unit.type_name());
        self.models
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path, unit);
    }

    pub fn register_request(&self, base_path: &str, name: &str, unit: Arc<dyn RequestUnit>) {
        let path = unit_path(base_path, name);
        tracing::debug!("Registering request unit {}", path);
        self.requests
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path, unit);
    }

    pub fn model_count(&self) -> usize {
        self.models.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().map(|r| r.len()).unwrap_or(0)
    }
}

impl UnitResolver for UnitCatalog {
    fn resolve_model(&self, base_path: &str, name: &str) -> Result<Arc<dyn ModelUnit>, LoadError> {
        let models = self.models.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        models
            .get(&unit_path(base_path, name))
            .cloned()
            .ok_or_else(|| LoadError::UnresolvedUnit {
                kind: UnitKind::Model,
                path: base_path.to_string(),
                name: Symbol::from(name),
            })
    }

    fn resolve_request(&self, base_path: &str, name: &str) -> Result<Arc<dyn RequestUnit>, LoadError> {
        let requests = self.requests.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        requests
            .get(&unit_path(base_path, name))
            .cloned()
            .ok_or_else(|| LoadError::UnresolvedUnit {
                kind: UnitKind::Request,
                path: base_path.to_string(),
                name: Symbol::from(name),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::mocks::test_helpers::*;

    #[test]
    fn test_unit_path() {
        assert_eq!(unit_path("compute/models", "servers"), "compute/models/servers");
        assert_eq!(unit_path("compute/models/", "servers"), "compute/models/servers");
        assert_eq!(unit_path("", "servers"), "servers");
    }

    #[test]
    fn test_resolve_registered_model() {
        let catalog = UnitCatalog::new();
        catalog.register_model("compute/models", "servers", named_model("Servers"));

        let unit = catalog.resolve_model("compute/models", "servers").unwrap();
        assert_eq!(unit.type_name(), "Servers");
        assert_eq!(catalog.model_count(), 1);
    }

    #[test]
    fn test_resolution_is_path_scoped() {
        let catalog = UnitCatalog::new();
        catalog.register_model("compute/models", "servers", named_model("Servers"));

        let err = catalog.resolve_model("storage/models", "servers").err().unwrap();
        assert_eq!(
            err,
            LoadError::UnresolvedUnit {
                kind: UnitKind::Model,
                path: "storage/models".to_string(),
                name: Symbol::from("servers"),
            }
        );
    }

    #[test]
    fn test_resolve_missing_request() {
        let catalog = UnitCatalog::new();
        catalog.register_request("compute/requests", "list_servers", echo_request());

        assert!(catalog.resolve_request("compute/requests", "list_servers").is_ok());
        assert!(matches!(
            catalog.resolve_request("compute/requests", "reboot_server"),
            Err(LoadError::UnresolvedUnit { kind: UnitKind::Request, .. })
        ));
        assert_eq!(catalog.request_count(), 1);
    }
}
