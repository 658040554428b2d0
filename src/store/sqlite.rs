//! SQLite-backed implementation of the permission store.
//!
//! # What this module is
//! The durable backend for the device/group/network permission model. The
//! RADIUS decision path reads it; the administrative collaborator writes it.
//! Both go through the same `DeviceStore` trait, so writes committed by the
//! collaborator are visible to the next decision lookup.
//!
//! # Key invariants
//! - `devices.mac` holds canonical addresses only (write path normalizes and
//!   validates before insert).
//! - Foreign keys are enforced on every connection; deleting a device or a
//!   group removes its association rows and never the entities on the other
//!   side of the join.
//!
//! # Concurrency model
//! - The store is shared across request tasks; `sqlx::SqlitePool` manages
//!   concurrency. `acquire_timeout` bounds how long a lookup waits for a
//!   pooled connection, and the busy handler bounds waiting on a writer's
//!   lock, so a stalled store fails fast instead of hanging the responder.
//! - `find_device` runs its three closure queries inside one read
//!   transaction so a decision sees a consistent snapshot.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::error::DatabaseError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};

use super::{
    canonical_mac, non_empty, Device, DeviceGroup, DeviceRecord, DeviceStore, Network, StoreError,
    StoreResult,
};
use crate::config::DatabaseConfig;

/// Durable permission store backed by SQLite.
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Row shape for the `devices` table.
///
/// DB-facing structs are kept separate from the domain types so schema
/// details (column names, storage formats) stay localized here.
#[derive(Debug, Clone, FromRow)]
struct DbDevice {
    id: i64,
    mac: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DbDevice> for Device {
    fn from(row: DbDevice) -> Self {
        Device {
            id: row.id,
            mac: row.mac,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row shape for the `device_groups` table.
#[derive(Debug, Clone, FromRow)]
struct DbGroup {
    id: i64,
    name: String,
}

impl From<DbGroup> for DeviceGroup {
    fn from(row: DbGroup) -> Self {
        DeviceGroup {
            id: row.id,
            name: row.name,
        }
    }
}

/// Row shape for the `networks` table.
#[derive(Debug, Clone, FromRow)]
struct DbNetwork {
    id: i64,
    ssid: String,
}

impl From<DbNetwork> for Network {
    fn from(row: DbNetwork) -> Self {
        Network {
            id: row.id,
            ssid: row.ssid,
        }
    }
}

impl SqliteStore {
    /// Open (creating if missing) the database, apply migrations, and build
    /// the connection pool.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        // `acquire_timeout` bounds waiting for a pooled connection so a
        // saturated store degrades to an error the decision path can treat
        // as fail-closed, rather than queueing forever.
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect_with(options)
            .await?;

        // Migrations run before serving so every query can assume the schema.
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

/// Map a unique-constraint violation to a domain conflict; pass everything
/// else through as a storage fault.
fn conflict_on_unique(err: sqlx::Error, what: impl FnOnce() -> String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(what()),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl DeviceStore for SqliteStore {
    async fn find_device(&self, mac: &str) -> StoreResult<Option<DeviceRecord>> {
        let mut tx = self.pool.begin().await?;

        let row: Option<DbDevice> =
            sqlx::query_as("SELECT id, mac, created_at, updated_at FROM devices WHERE mac = ?")
                .bind(mac)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(row) = row else {
            // Unknown device: a normal outcome, not a fault.
            return Ok(None);
        };

        let groups: Vec<DbGroup> = sqlx::query_as(
            "SELECT DISTINCT g.id, g.name \
             FROM device_groups g \
             INNER JOIN device_group_members m ON g.id = m.group_id \
             WHERE m.device_id = ? \
             ORDER BY g.name",
        )
        .bind(row.id)
        .fetch_all(&mut *tx)
        .await?;

        let networks: Vec<DbNetwork> = sqlx::query_as(
            "SELECT DISTINCT n.id, n.ssid \
             FROM networks n \
             INNER JOIN group_networks gn ON n.id = gn.network_id \
             INNER JOIN device_group_members m ON gn.group_id = m.group_id \
             WHERE m.device_id = ? \
             ORDER BY n.ssid",
        )
        .bind(row.id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(DeviceRecord {
            device: row.into(),
            groups: groups.into_iter().map(Into::into).collect(),
            networks: networks.into_iter().map(Into::into).collect(),
        }))
    }

    async fn add_device(&self, mac: &str) -> StoreResult<Device> {
        let mac = canonical_mac(mac)?;
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO devices (mac, created_at, updated_at) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&mac)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("device {mac} already exists")))?;

        Ok(Device {
            id,
            mac,
            created_at: now,
            updated_at: now,
        })
    }

    async fn remove_device(&self, mac: &str) -> StoreResult<()> {
        let mac = canonical_mac(mac)?;
        let result = sqlx::query("DELETE FROM devices WHERE mac = ?")
            .bind(&mac)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("device {mac}")));
        }
        Ok(())
    }

    async fn list_devices(&self) -> StoreResult<Vec<Device>> {
        let rows: Vec<DbDevice> =
            sqlx::query_as("SELECT id, mac, created_at, updated_at FROM devices ORDER BY mac")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_group(&self, name: &str) -> StoreResult<DeviceGroup> {
        non_empty("group name", name)?;
        let id: i64 = sqlx::query_scalar("INSERT INTO device_groups (name) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, || format!("group {name:?} already exists")))?;
        Ok(DeviceGroup {
            id,
            name: name.to_string(),
        })
    }

    async fn remove_group(&self, name: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM device_groups WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("group {name:?}")));
        }
        Ok(())
    }

    async fn list_groups(&self) -> StoreResult<Vec<DeviceGroup>> {
        let rows: Vec<DbGroup> =
            sqlx::query_as("SELECT id, name FROM device_groups ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_network(&self, ssid: &str) -> StoreResult<Network> {
        non_empty("SSID", ssid)?;
        let id: i64 = sqlx::query_scalar("INSERT INTO networks (ssid) VALUES (?) RETURNING id")
            .bind(ssid)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, || format!("network {ssid:?} already exists")))?;
        Ok(Network {
            id,
            ssid: ssid.to_string(),
        })
    }

    async fn remove_network(&self, ssid: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM networks WHERE ssid = ?")
            .bind(ssid)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("network {ssid:?}")));
        }
        Ok(())
    }

    async fn list_networks(&self) -> StoreResult<Vec<Network>> {
        let rows: Vec<DbNetwork> = sqlx::query_as("SELECT id, ssid FROM networks ORDER BY ssid")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn assign_device_to_group(&self, mac: &str, group: &str) -> StoreResult<()> {
        let mac = canonical_mac(mac)?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO device_group_members (device_id, group_id) \
             SELECT d.id, g.id FROM devices d, device_groups g \
             WHERE d.mac = ? AND g.name = ?",
        )
        .bind(&mac)
        .bind(group)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || format!("device {mac} is already in group {group:?}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "device {mac} or group {group:?}"
            )));
        }

        // Group membership is a mutation of the device.
        sqlx::query("UPDATE devices SET updated_at = ? WHERE mac = ?")
            .bind(Utc::now())
            .bind(&mac)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn unassign_device_from_group(&self, mac: &str, group: &str) -> StoreResult<()> {
        let mac = canonical_mac(mac)?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "DELETE FROM device_group_members \
             WHERE device_id = (SELECT id FROM devices WHERE mac = ?) \
             AND group_id = (SELECT id FROM device_groups WHERE name = ?)",
        )
        .bind(&mac)
        .bind(group)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "device {mac} in group {group:?}"
            )));
        }

        sqlx::query("UPDATE devices SET updated_at = ? WHERE mac = ?")
            .bind(Utc::now())
            .bind(&mac)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn grant_network_to_group(&self, group: &str, ssid: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "INSERT INTO group_networks (group_id, network_id) \
             SELECT g.id, n.id FROM device_groups g, networks n \
             WHERE g.name = ? AND n.ssid = ?",
        )
        .bind(group)
        .bind(ssid)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || format!("group {group:?} already authorizes {ssid:?}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "group {group:?} or network {ssid:?}"
            )));
        }
        Ok(())
    }

    async fn revoke_network_from_group(&self, group: &str, ssid: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "DELETE FROM group_networks \
             WHERE group_id = (SELECT id FROM device_groups WHERE name = ?) \
             AND network_id = (SELECT id FROM networks WHERE ssid = ?)",
        )
        .bind(group)
        .bind(ssid)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "network {ssid:?} granted to group {group:?}"
            )));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One pooled connection keeps the whole test on a single in-memory
    /// database (`:memory:` is per-connection).
    async fn test_store() -> SqliteStore {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..DatabaseConfig::default()
        };
        SqliteStore::connect(&config).await.unwrap()
    }

    #[tokio::test]
    async fn unknown_device_is_none_not_error() {
        let store = test_store().await;
        assert!(store.find_device("112233445566").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn add_device_normalizes_and_rejects_garbage() {
        let store = test_store().await;

        let device = store.add_device("AA:BB:CC:DD:EE:FF").await.unwrap();
        assert_eq!(device.mac, "aabbccddeeff");

        let err = store.add_device("not-a-mac").await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn duplicate_device_is_a_conflict() {
        let store = test_store().await;
        store.add_device("aabbccddeeff").await.unwrap();

        let err = store.add_device("AA-BB-CC-DD-EE-FF").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn closure_lookup_unions_networks_across_groups() {
        let store = test_store().await;
        store.add_device("aabbccddeeff").await.unwrap();
        store.add_group("staff").await.unwrap();
        store.add_group("lab").await.unwrap();
        store.add_network("CorpNet").await.unwrap();
        store.add_network("LabNet").await.unwrap();
        store.assign_device_to_group("aabbccddeeff", "staff").await.unwrap();
        store.assign_device_to_group("aabbccddeeff", "lab").await.unwrap();
        store.grant_network_to_group("staff", "CorpNet").await.unwrap();
        store.grant_network_to_group("lab", "LabNet").await.unwrap();

        let record = store.find_device("aabbccddeeff").await.unwrap().unwrap();
        assert_eq!(record.groups.len(), 2);
        assert!(record.authorizes("CorpNet"));
        assert!(record.authorizes("LabNet"));
        assert!(!record.authorizes("GuestNet"));
    }

    #[tokio::test]
    async fn removing_a_device_cascades_memberships_only() {
        let store = test_store().await;
        store.add_device("aabbccddeeff").await.unwrap();
        store.add_group("staff").await.unwrap();
        store.assign_device_to_group("aabbccddeeff", "staff").await.unwrap();

        store.remove_device("aabbccddeeff").await.unwrap();

        assert!(store.find_device("aabbccddeeff").await.unwrap().is_none());
        // The group survives the cascade.
        assert_eq!(store.list_groups().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn removing_a_group_leaves_devices_and_networks() {
        let store = test_store().await;
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
    async fn assign_to_missing_group_is_not_found() {
        let store = test_store().await;
        store.add_device("aabbccddeeff").await.unwrap();

        let err = store
            .assign_device_to_group("aabbccddeeff", "ghosts")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn double_assignment_is_a_conflict() {
        let store = test_store().await;
        store.add_device("aabbccddeeff").await.unwrap();
        store.add_group("staff").await.unwrap();
        store.assign_device_to_group("aabbccddeeff", "staff").await.unwrap();

        let err = store
            .assign_device_to_group("AA:BB:CC:DD:EE:FF", "staff")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn revoking_narrows_the_union() {
        let store = test_store().await;
        store.add_device("aabbccddeeff").await.unwrap();
        store.add_group("staff").await.unwrap();
        store.add_network("CorpNet").await.unwrap();
        store.assign_device_to_group("aabbccddeeff", "staff").await.unwrap();
        store.grant_network_to_group("staff", "CorpNet").await.unwrap();

        store.revoke_network_from_group("staff", "CorpNet").await.unwrap();

        let record = store.find_device("aabbccddeeff").await.unwrap().unwrap();
        assert!(!record.authorizes("CorpNet"));
    }
}
