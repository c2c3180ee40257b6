// Example: declare a "compute" service type and use it in mock mode
//
// Run with:
//     cargo run --example compute_demo
//
// Set SERVICEKIT_MOCK=0 and add an "endpoint" to the config to send the
// same requests over HTTP instead.

use async_trait::async_trait;
use serde_json::{json, Value};
use servicekit::{
    config_from, Attributes, BuildContext, MockStore, NamedModel, Registry, RequestUnit, Service,
    ServiceError, ServiceType, Transport, UnitCatalog,
};
use std::sync::Arc;

struct CreateServer;

#[async_trait]
impl RequestUnit for CreateServer {
    async fn real(&self, _service: &Service, transport: &dyn Transport, params: Value) -> Result<Value, ServiceError> {
        transport.send("create_server", params).await
    }

    async fn mock(&self, service: &Service, store: &MockStore, params: Value) -> Result<Value, ServiceError> {
        let region = service
            .config()
            .get("region")
            .and_then(Value::as_str)
            .unwrap_or("default")
            .to_string();
        let server = json!({ "id": store.next_id(), "name": params["name"], "region": region });
        let record = server.clone();
        store
            .update(region.as_str(), move |data| {
                if let Some(list) = data.entry("servers").or_insert_with(|| json!([])).as_array_mut() {
                    list.push(record);
                }
            })
            .await;
        Ok(server)
    }
}

struct ListServers;

#[async_trait]
impl RequestUnit for ListServers {
    async fn real(&self, _service: &Service, transport: &dyn Transport, params: Value) -> Result<Value, ServiceError> {
        transport.send("list_servers", params).await
    }

    async fn mock(&self, service: &Service, store: &MockStore, _params: Value) -> Result<Value, ServiceError> {
        let region = service.config().get("region").and_then(Value::as_str).unwrap_or("default");
        Ok(store.get(region, "servers").await.unwrap_or_else(|| json!([])))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    servicekit::logging::init();
    println!("=== servicekit compute demo ===\n");

    let catalog = Arc::new(UnitCatalog::new());
    catalog.register_model("compute/models", "servers", Arc::new(NamedModel::new("Servers")));
    catalog.register_model("compute/models", "key_pairs", Arc::new(NamedModel::new("KeyPairs")));
    catalog.register_request("compute/requests", "create_server", Arc::new(CreateServer));
    catalog.register_request("compute/requests", "list_servers", Arc::new(ListServers));

    let mut context = BuildContext::from_env()?;
    if std::env::var(servicekit::settings::MOCK_VAR).is_err() {
        context = context.with_mode(servicekit::Mode::Mock);
    }

    let registry = Registry::with_context(catalog, context);
    registry.register(
        ServiceType::builder("compute")
            .requires(["api_key"])
            .recognizes(["region", "endpoint"])
            .model_path("compute/models")
            .collection("servers")
            .collection("key_pairs")
            .request_path("compute/requests")
            .request("create_server")
            .request("list_servers")
            .build(),
    );

    println!("1. Missing configuration is rejected:");
    match registry.build("compute", config_from([("region", json!("eu-west"))])) {
        Ok(_) => println!("   unexpected success"),
        Err(e) => println!("   ✓ {}", e),
    }

    println!("\n2. Building a client:");
    let compute = registry.build(
        "compute",
        config_from([("api_key", json!("demo-key")), ("region", json!("eu-west"))]),
    )?;
    println!("   ✓ {} variant, collections: {:?}", compute.variant(), compute.collections());

    println!("\n3. Using the servers collection:");
    let servers = compute.collection("servers", Attributes::new())?;
    for name in ["web-1", "web-2"] {
        let created = servers.request("create_server", json!({ "name": name })).await?;
        println!("   ✓ created {}", created);
    }
    let listing = servers.request("list_servers", json!({})).await?;
    println!("   ✓ {} server(s) listed", listing.as_array().map(Vec::len).unwrap_or(0));

    println!("\n4. Resetting mock data:");
    let dropped = registry.reset_data("compute", None).await?;
    println!("   ✓ {} partition(s) dropped", dropped);

    Ok(())
}
