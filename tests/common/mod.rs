//! Shared utilities for integration tests.

use std::sync::Arc;
use std::time::Duration;

use macgate::decision::DecisionEngine;
use macgate::store::{DeviceStore, MemoryStore};

/// Store seeded with the canonical scenario: device `aa:bb:cc:dd:ee:ff` in
/// group "Staff", which authorizes SSID "CorpNet".
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.add_device("aa:bb:cc:dd:ee:ff").await.unwrap();
    store.add_group("Staff").await.unwrap();
    store.add_network("CorpNet").await.unwrap();
    store
        .assign_device_to_group("aabbccddeeff", "Staff")
        .await
        .unwrap();
    store
        .grant_network_to_group("Staff", "CorpNet")
        .await
        .unwrap();
    Arc::new(store)
}

/// Engine with a lookup timeout generous enough for test stores.
pub fn engine_over(store: Arc<dyn DeviceStore>) -> Arc<DecisionEngine> {
    Arc::new(DecisionEngine::new(store, Duration::from_millis(500)))
}
