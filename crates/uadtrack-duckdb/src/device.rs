use anyhow::{bail, Result};
use chrono::Utc;
use duckdb::Connection;
use tracing::{debug, info};

use uadtrack_core::device::{Device, DeviceProfile};

use crate::names::generate_device_name;
use crate::sql::{format_ts, optional, parse_ts};
use crate::DuckDbBackend;

/// Attempts at drawing an unused device name before giving up.
const NAME_ATTEMPTS: usize = 16;

/// Column list matching [`device_from_row`], qualified by `alias`.
pub(crate) fn device_columns(alias: &str) -> String {
    [
        "id",
        "name",
        "key",
        "user_id",
        "is_mobile",
        "is_tablet",
        "is_touch_capable",
        "is_pc",
        "is_bot",
        "browser_family",
        "browser_version",
        "os_family",
        "os_version",
        "device_family",
        "device_brand",
        "device_model",
        "ip",
    ]
    .iter()
    .map(|c| format!("{alias}.{c}"))
    .chain(std::iter::once(format!(
        "CAST({alias}.created_at AS VARCHAR)"
    )))
    .collect::<Vec<_>>()
    .join(", ")
}

/// Number of columns produced by [`device_columns`].
pub(crate) const DEVICE_COLUMN_COUNT: usize = 18;

pub(crate) fn device_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Device> {
    Ok(Device {
        id: row.get(0)?,
        name: row.get(1)?,
        key: row.get(2)?,
        profile: DeviceProfile {
            user_id: row.get(3)?,
            is_mobile: row.get(4)?,
            is_tablet: row.get(5)?,
            is_touch_capable: row.get(6)?,
            is_pc: row.get(7)?,
            is_bot: row.get(8)?,
            browser_family: row.get(9)?,
            browser_version: row.get(10)?,
            os_family: row.get(11)?,
            os_version: row.get(12)?,
            device_family: row.get(13)?,
            device_brand: row.get(14)?,
            device_model: row.get(15)?,
            ip: row.get(16)?,
        },
        created_at: parse_ts(row, 17)?,
    })
}

pub(crate) fn select_device_by_id(conn: &Connection, id: i64) -> Result<Option<Device>> {
    let sql = format!("SELECT {} FROM devices d WHERE d.id = ?1", device_columns("d"));
    let device = optional(conn.prepare(&sql)?.query_row(duckdb::params![id], device_from_row))?;
    Ok(device)
}

fn select_device_by_key(conn: &Connection, key: &str) -> Result<Option<Device>> {
    let sql = format!("SELECT {} FROM devices d WHERE d.key = ?1", device_columns("d"));
    let device = optional(conn.prepare(&sql)?.query_row(duckdb::params![key], device_from_row))?;
    Ok(device)
}

fn name_taken(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn
        .prepare("SELECT COUNT(*) FROM devices WHERE name = ?1")?
        .query_row(duckdb::params![name], |row| row.get(0))?;
    Ok(count > 0)
}

fn insert_device(conn: &Connection, profile: &DeviceProfile, key: &str) -> Result<Device> {
    let mut name = generate_device_name();
    let mut attempts = 1;
    while name_taken(conn, &name)? {
        if attempts >= NAME_ATTEMPTS {
            bail!("could not allocate a unique device name after {attempts} attempts");
        }
        name = generate_device_name();
        attempts += 1;
    }

    let id: i64 = conn.query_row(
        r#"INSERT INTO devices (
            name, key, user_id,
            is_mobile, is_tablet, is_touch_capable, is_pc, is_bot,
            browser_family, browser_version, os_family, os_version,
            device_family, device_brand, device_model,
            ip, created_at
        ) VALUES (
            ?1, ?2, ?3,
            ?4, ?5, ?6, ?7, ?8,
            ?9, ?10, ?11, ?12,
            ?13, ?14, ?15,
            ?16, ?17
        ) RETURNING id"#,
        duckdb::params![
            name,
            key,
            profile.user_id,
            profile.is_mobile,
            profile.is_tablet,
            profile.is_touch_capable,
            profile.is_pc,
            profile.is_bot,
            profile.browser_family,
            profile.browser_version,
            profile.os_family,
            profile.os_version,
            profile.device_family,
            profile.device_brand,
            profile.device_model,
            profile.ip,
            format_ts(Utc::now()),
        ],
        |row| row.get(0),
    )?;

    let Some(device) = select_device_by_id(conn, id)? else {
        bail!("device {id} vanished after insert");
    };
    info!(device_id = id, name = %device.name, "Device created");
    Ok(device)
}

impl DuckDbBackend {
    pub async fn get_device(&self, id: i64) -> Result<Option<Device>> {
        let conn = self.conn.lock().await;
        select_device_by_id(&conn, id)
    }

    pub async fn get_device_by_key(&self, key: &str) -> Result<Option<Device>> {
        let conn = self.conn.lock().await;
        select_device_by_key(&conn, key)
    }

    /// Insert a new device for `profile` under `key` with a fresh unique name.
    pub async fn create_device(&self, profile: &DeviceProfile, key: &str) -> Result<Device> {
        let conn = self.conn.lock().await;
        insert_device(&conn, profile, key)
    }

    /// Return the device stored under `key`, creating it from `profile` on a
    /// miss. Lookup and insert share one lock acquisition, so two requests
    /// with the same fingerprint cannot both create a row.
    pub async fn get_or_create_device(&self, profile: &DeviceProfile, key: &str) -> Result<Device> {
        let conn = self.conn.lock().await;
        if let Some(device) = select_device_by_key(&conn, key)? {
            debug!(device_id = device.id, "Device matched by key");
            return Ok(device);
        }
        insert_device(&conn, profile, key)
    }
}
