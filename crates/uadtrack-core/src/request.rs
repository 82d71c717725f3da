use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::RequestStatus;

/// Request metadata captured by the tracking layer after the response is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeviceRequest {
    pub device_id: i64,
    pub endpoint: String,
    pub response_status_code: u16,
    pub method: Option<String>,
    pub query_params: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// Rolling request counts for one device, each including the request being
/// logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCounts {
    /// All-time request number.
    pub rn: i64,
    /// Requests in the trailing hour.
    pub rn_ph: i64,
    /// Requests in the trailing 24 hours.
    pub rn_24h: i64,
}

impl RequestCounts {
    /// Counts for a request whose device already has the given numbers of
    /// stored rows.
    pub fn following(total: i64, last_hour: i64, last_24h: i64) -> Self {
        Self {
            rn: total + 1,
            rn_ph: last_hour + 1,
            rn_24h: last_24h + 1,
        }
    }

    pub fn status(&self) -> RequestStatus {
        RequestStatus::classify(self.rn_ph)
    }
}

/// A persisted request log row. Mirrors the DuckDB `device_requests` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRequest {
    pub id: i64,
    pub device_id: i64,
    pub endpoint: String,
    pub response_status_code: u16,
    #[serde(flatten)]
    pub counts: RequestCounts,
    pub status: RequestStatus,
    pub status_color: String,
    pub method: Option<String>,
    pub query_params: Option<serde_json::Value>,
    pub headers: Option<serde_json::Value>,
    pub cookies: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
