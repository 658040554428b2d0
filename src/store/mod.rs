//! Permission store subsystem.
//!
//! # Data Flow
//! ```text
//! Decision path (read-only):
//!     decision engine → find_device(mac) → DeviceRecord { groups, networks }
//!
//! Collaborator path (writes):
//!     macgate-admin → add/remove/assign/grant → committed rows
//!     → visible to the next find_device call
//! ```
//!
//! # Design Decisions
//! - `find_device` returns `Ok(None)` for an unknown device: not-found is a
//!   normal outcome and must never be conflated with a storage fault
//! - The record carries the full membership closure (device → groups →
//!   union-input networks) so one decision needs one logical lookup
//! - Write methods enforce the data-model invariants (canonical MAC format,
//!   non-empty unique names) before touching storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A stored, authorized identity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: i64,
    /// Canonical address: 12 lowercase hex characters, no delimiters.
    pub mac: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named bundle of devices sharing network permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceGroup {
    pub id: i64,
    pub name: String,
}

/// A named wireless network a group may authorize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub id: i64,
    pub ssid: String,
}

/// The full membership closure for one device: the device itself, every
/// group it belongs to, and the union of networks those groups authorize.
///
/// This is an immutable snapshot for the duration of one decision; it holds
/// no live references into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub device: Device,
    pub groups: Vec<DeviceGroup>,
    pub networks: Vec<Network>,
}

impl DeviceRecord {
    /// Whether the device's groups authorize the given network.
    ///
    /// Exact string equality on the SSID; no case folding, no wildcards.
    pub fn authorizes(&self, ssid: &str) -> bool {
        self.networks.iter().any(|n| n.ssid == ssid)
    }
}

/// Errors surfaced by store operations.
///
/// `NotFound` and `Conflict` describe the caller's request; everything else
/// is a storage fault the decision path treats as fail-closed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid: {0}")]
    Invalid(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read and write access to the device/group/network permission model.
///
/// The decision path uses only `find_device`; the remaining methods are the
/// interface the administrative collaborator drives. Implementations must be
/// safe to share across concurrent request tasks.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Look up a device by canonical address, with its full membership
    /// closure. `Ok(None)` means the device is not registered.
    async fn find_device(&self, mac: &str) -> StoreResult<Option<DeviceRecord>>;

    async fn add_device(&self, mac: &str) -> StoreResult<Device>;
    /// Remove a device and its group memberships (never the groups).
    async fn remove_device(&self, mac: &str) -> StoreResult<()>;
    async fn list_devices(&self) -> StoreResult<Vec<Device>>;

    async fn add_group(&self, name: &str) -> StoreResult<DeviceGroup>;
    /// Remove a group and its associations on both sides (never the devices
    /// or networks themselves).
    async fn remove_group(&self, name: &str) -> StoreResult<()>;
    async fn list_groups(&self) -> StoreResult<Vec<DeviceGroup>>;

    async fn add_network(&self, ssid: &str) -> StoreResult<Network>;
    async fn remove_network(&self, ssid: &str) -> StoreResult<()>;
    async fn list_networks(&self) -> StoreResult<Vec<Network>>;

    async fn assign_device_to_group(&self, mac: &str, group: &str) -> StoreResult<()>;
    async fn unassign_device_from_group(&self, mac: &str, group: &str) -> StoreResult<()>;
    async fn grant_network_to_group(&self, group: &str, ssid: &str) -> StoreResult<()>;
    async fn revoke_network_from_group(&self, group: &str, ssid: &str) -> StoreResult<()>;

    /// Cheap liveness probe used at startup.
    async fn health_check(&self) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// Canonicalize and check a raw device address for the write path.
pub(crate) fn canonical_mac(raw: &str) -> StoreResult<String> {
    let mac = crate::mac::normalize(raw);
    if !crate::mac::is_valid_format(&mac) {
        return Err(StoreError::Invalid(format!("not a MAC address: {raw:?}")));
    }
    Ok(mac)
}

/// Check a group name or SSID for the write path.
pub(crate) fn non_empty(kind: &'static str, value: &str) -> StoreResult<()> {
    if value.is_empty() {
        return Err(StoreError::Invalid(format!("{kind} must not be empty")));
    }
    Ok(())
}
