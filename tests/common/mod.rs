// Shared fixtures for integration tests: a small "compute" service type
// with one collection and two requests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use servicekit::{
    MockStore, ModelUnit, NamedModel, RequestUnit, Service, ServiceError, ServiceType, Transport,
    UnitCatalog, UnitResolver,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const MODEL_PATH: &str = "compute/models";
pub const REQUEST_PATH: &str = "compute/requests";

/// Creates a server record in the mock store's "default" partition
pub struct CreateServer;

#[async_trait]
impl RequestUnit for CreateServer {
    async fn real(&self, _service: &Service, transport: &dyn Transport, params: Value) -> Result<Value, ServiceError> {
        transport.send("create_server", params).await
    }

    async fn mock(&self, _service: &Service, store: &MockStore, params: Value) -> Result<Value, ServiceError> {
        let id = store.next_id();
        let server = json!({ "id": id, "name": params.get("name").cloned().unwrap_or(Value::Null) });
        let record = server.clone();
        store
            .update("default", move |data| {
                let servers = data.entry("servers").or_insert_with(|| json!([]));
                if let Some(list) = servers.as_array_mut() {
                    list.push(record);
                }
            })
            .await;
        Ok(server)
    }
}

/// Lists servers from the mock store's "default" partition
pub struct ListServers;

#[async_trait]
impl RequestUnit for ListServers {
    async fn real(&self, _service: &Service, transport: &dyn Transport, params: Value) -> Result<Value, ServiceError> {
        transport.send("list_servers", params).await
    }

    async fn mock(&self, _service: &Service, store: &MockStore, _params: Value) -> Result<Value, ServiceError> {
        Ok(store.get("default", "servers").await.unwrap_or_else(|| json!([])))
    }
}

pub fn compute_catalog() -> Arc<UnitCatalog> {
    let catalog = UnitCatalog::new();
    catalog.register_model(MODEL_PATH, "servers", Arc::new(NamedModel::new("Servers")));
    catalog.register_model(MODEL_PATH, "server", Arc::new(NamedModel::new("Server")));
    catalog.register_request(REQUEST_PATH, "create_server", Arc::new(CreateServer));
    catalog.register_request(REQUEST_PATH, "list_servers", Arc::new(ListServers));
    Arc::new(catalog)
}

/// `required = {api_key}`, `optional = {region}`, `collections = [servers]`
pub fn compute_type() -> Arc<ServiceType> {
    ServiceType::builder("compute")
        .requires(["api_key"])
        .recognizes(["region"])
        .model_path(MODEL_PATH)
        .collection("servers")
        .model("server")
        .request_path(REQUEST_PATH)
        .request("create_server")
        .request("list_servers")
        .build()
}

/// Resolver that counts every lookup before delegating
pub struct CountingResolver {
    inner: Arc<UnitCatalog>,
    pub calls: AtomicUsize,
}

impl CountingResolver {
    pub fn new(inner: Arc<UnitCatalog>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UnitResolver for CountingResolver {
    fn resolve_model(&self, base_path: &str, name: &str) -> Result<Arc<dyn ModelUnit>, servicekit::LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_model(base_path, name)
    }

    fn resolve_request(&self, base_path: &str, name: &str) -> Result<Arc<dyn RequestUnit>, servicekit::LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_request(base_path, name)
    }
}
