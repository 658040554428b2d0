//! In-memory implementation of the permission store.
//!
//! # Purpose
//! Implements the `DeviceStore` trait entirely in memory using maps guarded
//! by `tokio::sync::RwLock`. It exists for local development and tests: no
//! file, no migrations, same observable semantics as the SQLite backend
//! (including error taxonomy and result ordering).
//!
//! # Durability and consistency
//! - Not durable: all state is lost on process restart.
//! - Reads are concurrent; writes take the write lock.
//! - Cascades are done by scanning association pairs, which is fine at the
//!   dataset sizes this store is meant for.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    canonical_mac, non_empty, Device, DeviceGroup, DeviceRecord, DeviceStore, Network, StoreError,
    StoreResult,
};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    /// Keyed by canonical address.
    devices: HashMap<String, Device>,
    /// Keyed by group name.
    groups: HashMap<String, DeviceGroup>,
    /// Keyed by SSID.
    networks: HashMap<String, Network>,
    /// (device_id, group_id) membership pairs.
    memberships: HashSet<(i64, i64)>,
    /// (group_id, network_id) authorization pairs.
    grants: HashSet<(i64, i64)>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Volatile permission store for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn find_device(&self, mac: &str) -> StoreResult<Option<DeviceRecord>> {
        let inner = self.inner.read().await;

        let Some(device) = inner.devices.get(mac).cloned() else {
            return Ok(None);
        };

        let mut groups: Vec<DeviceGroup> = inner
            .groups
            .values()
            .filter(|g| inner.memberships.contains(&(device.id, g.id)))
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));

        let mut networks: Vec<Network> = inner
            .networks
            .values()
            .filter(|n| {
                groups
                    .iter()
                    .any(|g| inner.grants.contains(&(g.id, n.id)))
            })
            .cloned()
            .collect();
        networks.sort_by(|a, b| a.ssid.cmp(&b.ssid));

        Ok(Some(DeviceRecord {
            device,
            groups,
            networks,
        }))
    }

    async fn add_device(&self, mac: &str) -> StoreResult<Device> {
        let mac = canonical_mac(mac)?;
        let mut inner = self.inner.write().await;

        if inner.devices.contains_key(&mac) {
            return Err(StoreError::Conflict(format!("device {mac} already exists")));
        }

        let now = Utc::now();
        let device = Device {
            id: inner.next_id(),
            mac: mac.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.devices.insert(mac, device.clone());
        Ok(device)
    }

    async fn remove_device(&self, mac: &str) -> StoreResult<()> {
        let mac = canonical_mac(mac)?;
        let mut inner = self.inner.write().await;

        let Some(device) = inner.devices.remove(&mac) else {
            return Err(StoreError::NotFound(format!("device {mac}")));
        };
        inner.memberships.retain(|(d, _)| *d != device.id);
        Ok(())
    }

    async fn list_devices(&self) -> StoreResult<Vec<Device>> {
        let inner = self.inner.read().await;
        let mut devices: Vec<Device> = inner.devices.values().cloned().collect();
        devices.sort_by(|a, b| a.mac.cmp(&b.mac));
        Ok(devices)
    }

    async fn add_group(&self, name: &str) -> StoreResult<DeviceGroup> {
        non_empty("group name", name)?;
        let mut inner = self.inner.write().await;

        if inner.groups.contains_key(name) {
            return Err(StoreError::Conflict(format!("group {name:?} already exists")));
        }

        let group = DeviceGroup {
            id: inner.next_id(),
            name: name.to_string(),
        };
        inner.groups.insert(name.to_string(), group.clone());
        Ok(group)
    }

    async fn remove_group(&self, name: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;

        let Some(group) = inner.groups.remove(name) else {
            return Err(StoreError::NotFound(format!("group {name:?}")));
        };
        inner.memberships.retain(|(_, g)| *g != group.id);
        inner.grants.retain(|(g, _)| *g != group.id);
        Ok(())
    }

    async fn list_groups(&self) -> StoreResult<Vec<DeviceGroup>> {
        let inner = self.inner.read().await;
        let mut groups: Vec<DeviceGroup> = inner.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn add_network(&self, ssid: &str) -> StoreResult<Network> {
        non_empty("SSID", ssid)?;
        let mut inner = self.inner.write().await;

        if inner.networks.contains_key(ssid) {
            return Err(StoreError::Conflict(format!(
                "network {ssid:?} already exists"
            )));
        }

        let network = Network {
            id: inner.next_id(),
            ssid: ssid.to_string(),
        };
        inner.networks.insert(ssid.to_string(), network.clone());
        Ok(network)
    }

    async fn remove_network(&self, ssid: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;

        let Some(network) = inner.networks.remove(ssid) else {
            return Err(StoreError::NotFound(format!("network {ssid:?}")));
        };
        inner.grants.retain(|(_, n)| *n != network.id);
        Ok(())
    }

    async fn list_networks(&self) -> StoreResult<Vec<Network>> {
        let inner = self.inner.read().await;
        let mut networks: Vec<Network> = inner.networks.values().cloned().collect();
        networks.sort_by(|a, b| a.ssid.cmp(&b.ssid));
        Ok(networks)
    }

    async fn assign_device_to_group(&self, mac: &str, group: &str) -> StoreResult<()> {
        let mac = canonical_mac(mac)?;
        let mut inner = self.inner.write().await;

        let device_id = match inner.devices.get(&mac) {
            Some(d) => d.id,
            None => return Err(StoreError::NotFound(format!("device {mac}"))),
        };
        let group_id = match inner.groups.get(group) {
            Some(g) => g.id,
            None => return Err(StoreError::NotFound(format!("group {group:?}"))),
        };

        if !inner.memberships.insert((device_id, group_id)) {
            return Err(StoreError::Conflict(format!(
                "device {mac} is already in group {group:?}"
            )));
        }
        if let Some(device) = inner.devices.get_mut(&mac) {
            device.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn unassign_device_from_group(&self, mac: &str, group: &str) -> StoreResult<()> {
        let mac = canonical_mac(mac)?;
        let mut inner = self.inner.write().await;

        let device_id = inner.devices.get(&mac).map(|d| d.id);
        let group_id = inner.groups.get(group).map(|g| g.id);
        let removed = match (device_id, group_id) {
            (Some(d), Some(g)) => inner.memberships.remove(&(d, g)),
            _ => false,
        };
        if !removed {
            return Err(StoreError::NotFound(format!(
                "device {mac} in group {group:?}"
            )));
        }
        if let Some(device) = inner.devices.get_mut(&mac) {
            device.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn grant_network_to_group(&self, group: &str, ssid: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;

        let group_id = match inner.groups.get(group) {
            Some(g) => g.id,
            None => return Err(StoreError::NotFound(format!("group {group:?}"))),
        };
        let network_id = match inner.networks.get(ssid) {
            Some(n) => n.id,
            None => return Err(StoreError::NotFound(format!("network {ssid:?}"))),
        };

        if !inner.grants.insert((group_id, network_id)) {
            return Err(StoreError::Conflict(format!(
                "group {group:?} already authorizes {ssid:?}"
            )));
        }
        Ok(())
    }

    async fn revoke_network_from_group(&self, group: &str, ssid: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;

        let group_id = inner.groups.get(group).map(|g| g.id);
        let network_id = inner.networks.get(ssid).map(|n| n.id);
        let removed = match (group_id, network_id) {
            (Some(g), Some(n)) => inner.grants.remove(&(g, n)),
            _ => false,
        };
        if !removed {
            return Err(StoreError::NotFound(format!(
                "network {ssid:?} granted to group {group:?}"
            )));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn behaves_like_the_durable_backend() {
        let store = MemoryStore::new();
        store.add_device("AA:BB:CC:DD:EE:FF").await.unwrap();
        store.add_group("staff").await.unwrap();
        store.add_network("CorpNet").await.unwrap();
        store.assign_device_to_group("aabbccddeeff", "staff").await.unwrap();
        store.grant_network_to_group("staff", "CorpNet").await.unwrap();

        let record = store.find_device("aabbccddeeff").await.unwrap().unwrap();
        assert_eq!(record.device.mac, "aabbccddeeff");
        assert!(record.authorizes("CorpNet"));
        assert!(!record.authorizes("GuestNet"));

        assert!(store.find_device("112233445566").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cascades_match_the_schema() {
        let store = MemoryStore::new();
        store.add_device("aabbccddeeff").await.unwrap();
        store.add_group("staff").await.unwrap();
        store.add_network("CorpNet").await.unwrap();
        store.assign_device_to_group("aabbccddeeff", "staff").await.unwrap();
        store.grant_network_to_group("staff", "CorpNet").await.unwrap();

        store.remove_group("staff").await.unwrap();

        let record = store.find_device("aabbccddeeff").await.unwrap().unwrap();
        assert!(record.groups.is_empty());
        assert!(record.networks.is_empty());
        assert_eq!(store.list_networks().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_writes_conflict() {
        let store = MemoryStore::new();
        store.add_device("aabbccddeeff").await.unwrap();
        store.add_group("staff").await.unwrap();
        store.assign_device_to_group("aabbccddeeff", "staff").await.unwrap();

        assert!(matches!(
            store.add_device("aabbccddeeff").await.unwrap_err(),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            store
                .assign_device_to_group("aabbccddeeff", "staff")
                .await
                .unwrap_err(),
            StoreError::Conflict(_)
        ));
    }
}
