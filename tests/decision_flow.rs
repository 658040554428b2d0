//! End-to-end decision semantics against the in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use macgate::decision::{Decision, RejectReason};
use macgate::store::{
    Device, DeviceGroup, DeviceRecord, DeviceStore, MemoryStore, Network, StoreResult,
};

mod common;

#[tokio::test]
async fn staff_device_accepts_corpnet_and_rejects_guestnet() {
    let engine = common::engine_over(common::seeded_store().await);

    // Identity arrives in NAS format, not canonical form.
    let decision = engine.decide("AABBCCDDEEFF", "CorpNet", true).await;
    assert_eq!(decision, Decision::Accept);

    let decision = engine.decide("AABBCCDDEEFF", "GuestNet", true).await;
    assert_eq!(
        decision,
        Decision::Reject(RejectReason::NetworkNotAuthorized)
    );
}

#[tokio::test]
async fn unregistered_identity_rejects_for_any_network() {
    let engine = common::engine_over(common::seeded_store().await);

    for ssid in ["CorpNet", "GuestNet", "anything"] {
        let decision = engine.decide("112233445566", ssid, true).await;
        assert_eq!(decision, Decision::Reject(RejectReason::UnknownDevice));
    }
}

#[tokio::test]
async fn wired_port_rejects_a_fully_authorized_pair() {
    let engine = common::engine_over(common::seeded_store().await);

    let decision = engine.decide("aa:bb:cc:dd:ee:ff", "CorpNet", false).await;
    assert_eq!(decision, Decision::Reject(RejectReason::NotWireless));
}

#[tokio::test]
async fn union_of_groups_authorizes_each_member_network() {
    let store = MemoryStore::new();
    store.add_device("aabbccddeeff").await.unwrap();
    store.add_group("G1").await.unwrap();
    store.add_group("G2").await.unwrap();
    store.add_network("netA").await.unwrap();
    store.add_network("netB").await.unwrap();
    store.add_network("netC").await.unwrap();
    store.assign_device_to_group("aabbccddeeff", "G1").await.unwrap();
    store.assign_device_to_group("aabbccddeeff", "G2").await.unwrap();
    store.grant_network_to_group("G1", "netA").await.unwrap();
    store.grant_network_to_group("G2", "netB").await.unwrap();

    let engine = common::engine_over(Arc::new(store));
    assert!(engine.decide("aabbccddeeff", "netA", true).await.is_accept());
    assert!(engine.decide("aabbccddeeff", "netB", true).await.is_accept());
    assert_eq!(
        engine.decide("aabbccddeeff", "netC", true).await,
        Decision::Reject(RejectReason::NetworkNotAuthorized)
    );
}

/// Store wrapper that counts lookups, to pin down which paths reach it.
struct CountingStore {
    inner: MemoryStore,
    lookups: AtomicUsize,
}

#[async_trait]
impl DeviceStore for CountingStore {
    async fn find_device(&self, mac: &str) -> StoreResult<Option<DeviceRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_device(mac).await
    }
    async fn add_device(&self, mac: &str) -> StoreResult<Device> {
        self.inner.add_device(mac).await
    }
    async fn remove_device(&self, mac: &str) -> StoreResult<()> {
        self.inner.remove_device(mac).await
    }
    async fn list_devices(&self) -> StoreResult<Vec<Device>> {
        self.inner.list_devices().await
    }
    async fn add_group(&self, name: &str) -> StoreResult<DeviceGroup> {
        self.inner.add_group(name).await
    }
    async fn remove_group(&self, name: &str) -> StoreResult<()> {
        self.inner.remove_group(name).await
    }
    async fn list_groups(&self) -> StoreResult<Vec<DeviceGroup>> {
        self.inner.list_groups().await
    }
    async fn add_network(&self, ssid: &str) -> StoreResult<Network> {
        self.inner.add_network(ssid).await
    }
    async fn remove_network(&self, ssid: &str) -> StoreResult<()> {
        self.inner.remove_network(ssid).await
    }
    async fn list_networks(&self) -> StoreResult<Vec<Network>> {
        self.inner.list_networks().await
    }
    async fn assign_device_to_group(&self, mac: &str, group: &str) -> StoreResult<()> {
        self.inner.assign_device_to_group(mac, group).await
    }
    async fn unassign_device_from_group(&self, mac: &str, group: &str) -> StoreResult<()> {
        self.inner.unassign_device_from_group(mac, group).await
    }
    async fn grant_network_to_group(&self, group: &str, ssid: &str) -> StoreResult<()> {
        self.inner.grant_network_to_group(group, ssid).await
    }
    async fn revoke_network_from_group(&self, group: &str, ssid: &str) -> StoreResult<()> {
        self.inner.revoke_network_from_group(group, ssid).await
    }
    async fn health_check(&self) -> StoreResult<()> {
        self.inner.health_check().await
    }
    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

#[tokio::test]
async fn malformed_identity_never_reaches_the_store() {
    let store = Arc::new(CountingStore {
        inner: MemoryStore::new(),
        lookups: AtomicUsize::new(0),
    });
    let engine = common::engine_over(store.clone());

    let decision = engine.decide("not-a-mac", "CorpNet", true).await;
    assert_eq!(decision, Decision::Reject(RejectReason::MalformedAddress));
    assert_eq!(store.lookups.load(Ordering::SeqCst), 0);

    // A well-formed identity does, for contrast.
    let _ = engine.decide("aabbccddeeff", "CorpNet", true).await;
    assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn writes_become_visible_to_later_decisions() {
    let store = Arc::new(MemoryStore::new());
    let engine = common::engine_over(store.clone());

    assert_eq!(
        engine.decide("aabbccddeeff", "CorpNet", true).await,
        Decision::Reject(RejectReason::UnknownDevice)
    );

    // The collaborator registers the device mid-flight.
    store.add_device("aabbccddeeff").await.unwrap();
    store.add_group("Staff").await.unwrap();
    store.add_network("CorpNet").await.unwrap();
    store.assign_device_to_group("aabbccddeeff", "Staff").await.unwrap();
    store.grant_network_to_group("Staff", "CorpNet").await.unwrap();

    assert!(engine.decide("aabbccddeeff", "CorpNet", true).await.is_accept());

    // And revocation takes effect just as promptly.
    store.revoke_network_from_group("Staff", "CorpNet").await.unwrap();
    assert_eq!(
        engine.decide("aabbccddeeff", "CorpNet", true).await,
        Decision::Reject(RejectReason::NetworkNotAuthorized)
    );
}
