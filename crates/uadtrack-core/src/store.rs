use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::device::{Device, DeviceProfile};
use crate::request::{DeviceRequest, NewDeviceRequest};
use crate::status::RequestStatus;

pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 200;

/// Admin list filters for devices. `None` leaves a dimension unfiltered.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    /// Matches `id` exactly, or `user_id`, `ip`, `key`, `name` as a
    /// case-insensitive substring.
    pub search: Option<String>,
    pub is_mobile: Option<bool>,
    pub is_tablet: Option<bool>,
    pub is_touch_capable: Option<bool>,
    pub is_pc: Option<bool>,
    pub is_bot: Option<bool>,
    pub browser_family: Option<String>,
    pub os_family: Option<String>,
    pub device_family: Option<String>,
}

/// Admin list filters for request log rows.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    /// Matches the owning device's `id` exactly, or its `user_id`, `ip`,
    /// `key` as a case-insensitive substring.
    pub search: Option<String>,
    pub status: Option<RequestStatus>,
    pub response_status_code: Option<u16>,
    pub device_id: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(total: i64, page: PageRequest, returned: usize) -> Self {
        let seen = i64::from(page.offset) + returned as i64;
        Self {
            total,
            limit: page.limit,
            offset: page.offset,
            has_more: seen < total,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub pagination: Pagination,
}

/// Request counts shown next to a device in the admin views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceActivity {
    pub total_requests: i64,
    pub requests_last_24h: i64,
    pub requests_last_hour: i64,
}

#[derive(Debug, Clone)]
pub struct DeviceSummary {
    pub device: Device,
    pub activity: DeviceActivity,
}

#[derive(Debug, Clone)]
pub struct RequestSummary {
    pub request: DeviceRequest,
    pub device_name: String,
}

/// Distinct values available for the family filters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceFacets {
    pub browser_family: Vec<String>,
    pub os_family: Vec<String>,
    pub device_family: Vec<String>,
}

/// Storage interface for device fingerprints and the request log.
///
/// The DuckDB backend implements this; handlers and the tracking layer only
/// see the trait.
#[async_trait::async_trait]
pub trait DeviceStore: Send + Sync + 'static {
    async fn get_device(&self, id: i64) -> anyhow::Result<Option<Device>>;

    async fn get_device_by_key(&self, key: &str) -> anyhow::Result<Option<Device>>;

    async fn create_device(&self, profile: &DeviceProfile, key: &str) -> anyhow::Result<Device>;

    async fn get_or_create_device(
        &self,
        profile: &DeviceProfile,
        key: &str,
    ) -> anyhow::Result<Device>;

    /// Insert a request row, computing `rn`, `rn_ph`, `rn_24h` and the status
    /// from the device's existing rows relative to `request.created_at`.
    async fn log_request(&self, request: NewDeviceRequest) -> anyhow::Result<DeviceRequest>;

    async fn device_activity(
        &self,
        device_id: i64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<DeviceActivity>;

    async fn list_devices(
        &self,
        filter: &DeviceFilter,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Page<DeviceSummary>>;

    async fn device_facets(&self) -> anyhow::Result<DeviceFacets>;

    async fn list_requests(
        &self,
        filter: &RequestFilter,
        page: PageRequest,
    ) -> anyhow::Result<Page<RequestSummary>>;

    async fn get_request(&self, id: i64) -> anyhow::Result<Option<RequestSummary>>;

    async fn ping(&self) -> anyhow::Result<()>;
}
