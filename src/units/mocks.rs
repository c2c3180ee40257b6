// Test helpers: ready-made units and catalogs
//
// Usage:
//     use crate::units::mocks::test_helpers::*;
//     let catalog = compute_catalog();

#[cfg(test)]
pub mod test_helpers {
    use crate::backend::MockStore;
    use crate::error::ServiceResult;
    use crate::service::Service;
    use crate::units::{ModelUnit, NamedModel, RequestUnit, Transport, UnitCatalog};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;

    pub const MODEL_PATH: &str = "compute/models";
    pub const REQUEST_PATH: &str = "compute/requests";

    /// Model unit identifying as `type_name`
    pub fn named_model(type_name: &str) -> Arc<dyn ModelUnit> {
        Arc::new(NamedModel::new(type_name))
    }

    /// Request unit that reports which half ran
    ///
    /// - real: forwards `params` to the transport under the name "echo"
    /// - mock: returns `{"variant": "mock", "params": params}`
    pub struct EchoRequest;

    #[async_trait]
    impl RequestUnit for EchoRequest {
        async fn real(&self, _service: &Service, transport: &dyn Transport, params: Value) -> ServiceResult<Value> {
            transport.send("echo", params).await
        }

        async fn mock(&self, _service: &Service, _store: &MockStore, params: Value) -> ServiceResult<Value> {
            Ok(json!({ "variant": "mock", "params": params }))
        }
    }

    pub fn echo_request() -> Arc<dyn RequestUnit> {
        Arc::new(EchoRequest)
    }

    /// Catalog with a `servers` collection, a `flavor` model and an `echo` request
    pub fn compute_catalog() -> Arc<UnitCatalog> {
        let catalog = UnitCatalog::new();
        catalog.register_model(MODEL_PATH, "servers", named_model("Servers"));
        catalog.register_model(MODEL_PATH, "key_pairs", named_model("KeyPairs"));
        catalog.register_model(MODEL_PATH, "flavor", named_model("Flavor"));
        catalog.register_request(REQUEST_PATH, "echo", echo_request());
        Arc::new(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use crate::units::UnitResolver;

    #[test]
    fn test_compute_catalog_contents() {
        let catalog = compute_catalog();
        assert_eq!(catalog.model_count(), 3);
        assert_eq!(catalog.request_count(), 1);
        assert!(catalog.resolve_model(MODEL_PATH, "key_pairs").is_ok());
    }

    #[test]
    fn test_named_model() {
        let unit = named_model("Servers");
        assert_eq!(unit.type_name(), "Servers");
    }
}
