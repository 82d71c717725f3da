use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client attributes derived from a single request.
///
/// Every field is optional: an empty `User-Agent` yields a profile carrying
/// only `ip` and `user_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub user_id: Option<String>,
    pub is_mobile: Option<bool>,
    pub is_tablet: Option<bool>,
    pub is_touch_capable: Option<bool>,
    pub is_pc: Option<bool>,
    pub is_bot: Option<bool>,
    pub browser_family: Option<String>,
    pub browser_version: Option<String>,
    pub os_family: Option<String>,
    pub os_version: Option<String>,
    pub device_family: Option<String>,
    pub device_brand: Option<String>,
    pub device_model: Option<String>,
    pub ip: Option<String>,
}

/// A persisted device row. Mirrors the DuckDB `devices` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    /// Random human-readable name, assigned once at creation.
    pub name: String,
    pub key: Option<String>,
    #[serde(flatten)]
    pub profile: DeviceProfile,
    pub created_at: DateTime<Utc>,
}

impl Device {
    pub fn is_anonymous(&self) -> bool {
        self.profile.user_id.is_none()
    }
}

/// What the tracking layer attaches to each request it resolves.
///
/// `profile` reflects the stored device when the cookie matched, and the
/// freshly parsed request otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceContext {
    pub device: Device,
    pub profile: DeviceProfile,
    /// `true` when the device was resolved from the `UAD` cookie.
    pub from_cookie: bool,
}

impl DeviceContext {
    pub fn key(&self) -> Option<&str> {
        self.device.key.as_deref()
    }
}
