// Concurrent first-time builds of a never-loaded service type

mod common;

use common::*;
use serde_json::json;
use servicekit::{config_from, BuildContext, Registry, Symbol};
use std::sync::{Arc, Barrier};
use std::thread;

const BUILDERS: usize = 8;

#[test]
fn test_concurrent_first_builds_wire_identically() {
    let resolver = Arc::new(CountingResolver::new(compute_catalog()));
    let registry = Arc::new(Registry::with_context(resolver.clone(), BuildContext::mock()));
    registry.register(compute_type());

    let barrier = Arc::new(Barrier::new(BUILDERS));
    let handles: Vec<_> = (0..BUILDERS)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                registry
                    .build("compute", config_from([("api_key", json!("x"))]))
                    .map(|service| (service.collections(), service.requests()))
            })
        })
        .collect();

    let surfaces: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();

    for (collections, requests) in &surfaces {
        assert_eq!(collections, &vec![Symbol::from("servers")]);
        assert_eq!(
            requests,
            &vec![Symbol::from("create_server"), Symbol::from("list_servers")]
        );
    }

    // servers + server + two requests, resolved exactly once.
    assert_eq!(resolver.calls(), 4);
}

#[test]
fn test_loaded_type_builds_without_resolving() {
    let resolver = Arc::new(CountingResolver::new(compute_catalog()));
    let registry = Registry::with_context(resolver.clone(), BuildContext::mock());
    registry.register(compute_type());

    registry.ensure_loaded("compute").unwrap();
    let after_load = resolver.calls();

    for _ in 0..3 {
        registry
            .build("compute", config_from([("api_key", json!("x"))]))
            .unwrap();
    }
    assert_eq!(resolver.calls(), after_load);
}
