// Simulated backend state for the Mock variant
//
// One store per service type, shared by every Mock instance of that type.
// Data is partitioned by key (typically a credential or region), and each
// partition is a JSON object the type's request units read and write.

use crate::registry::symbol::Symbol;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Partition {
    created_at: DateTime<Utc>,
    data: Map<String, Value>,
}

impl Partition {
    fn new() -> Self {
        Self {
            created_at: Utc::now(),
            data: Map::new(),
        }
    }
}

/// Partitioned in-memory data behind a service type's Mock variant
///
/// Partitions are created on first write and dropped by `reset_data`.
///
/// Usage:
///     store.set("us-east", "servers", json!([])).await;
///     let servers = store.get("us-east", "servers").await;
///     store.reset_data(None).await;
#[derive(Debug, Default)]
pub struct MockStore {
    partitions: RwLock<BTreeMap<Symbol, Partition>>,
    ids: AtomicU64,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one field of a partition
    pub async fn get(&self, key: impl Into<Symbol>, field: &str) -> Option<Value> {
        let key = key.into();
        let partitions = self.partitions.read().await;
        partitions.get(&key).and_then(|p| p.data.get(field).cloned())
    }

    /// Write one field of a partition, creating the partition if needed
    pub async fn set(&self, key: impl Into<Symbol>, field: impl Into<String>, value: Value) {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(key.into())
            .or_insert_with(Partition::new)
            .data
            .insert(field.into(), value);
    }

    /// Run `f` with exclusive access to a partition's data
    pub async fn update<F, R>(&self, key: impl Into<Symbol>, f: F) -> R
    where
        F: FnOnce(&mut Map<String, Value>) -> R,
    {
        let mut partitions = self.partitions.write().await;
        let partition = partitions.entry(key.into()).or_insert_with(Partition::new);
        f(&mut partition.data)
    }

    /// Snapshot of a partition's data
    pub async fn partition(&self, key: impl Into<Symbol>) -> Option<Map<String, Value>> {
        let key = key.into();
        self.partitions.read().await.get(&key).map(|p| p.data.clone())
    }

    pub async fn created_at(&self, key: impl Into<Symbol>) -> Option<DateTime<Utc>> {
        let key = key.into();
        self.partitions.read().await.get(&key).map(|p| p.created_at)
    }

    /// Keys of every partition currently held, sorted
    pub async fn keys(&self) -> Vec<Symbol> {
        self.partitions.read().await.keys().cloned().collect()
    }

    /// Drop simulated state for `keys`, or for every known key when `None`
    ///
    /// Unknown keys are ignored. Returns how many partitions were dropped.
    pub async fn reset_data(&self, keys: Option<&[Symbol]>) -> usize {
        let mut partitions = self.partitions.write().await;
        let removed = match keys {
            None => {
                let count = partitions.len();
                partitions.clear();
                count
            }
            Some(keys) => keys.iter().filter(|k| partitions.remove(*k).is_some()).count(),
        };
        tracing::debug!("Mock data reset: {} partition(s) dropped", removed);
        removed
    }

    /// Monotonic identifier for simulated resources, starting at 1
    pub fn next_id(&self) -> u64 {
        self.ids.fetch_add(1, Ordering::Relaxed) + 1
    }
}
