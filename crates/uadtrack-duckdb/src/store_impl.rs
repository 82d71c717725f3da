use async_trait::async_trait;
use chrono::{DateTime, Utc};

use uadtrack_core::device::{Device, DeviceProfile};
use uadtrack_core::request::{DeviceRequest, NewDeviceRequest};
use uadtrack_core::store::{
    DeviceActivity, DeviceFacets, DeviceFilter, DeviceStore, DeviceSummary, Page, PageRequest,
    RequestFilter, RequestSummary,
};

use crate::DuckDbBackend;

#[async_trait]
impl DeviceStore for DuckDbBackend {
    async fn get_device(&self, id: i64) -> anyhow::Result<Option<Device>> {
        DuckDbBackend::get_device(self, id).await
    }

    async fn get_device_by_key(&self, key: &str) -> anyhow::Result<Option<Device>> {
        DuckDbBackend::get_device_by_key(self, key).await
    }

    async fn create_device(&self, profile: &DeviceProfile, key: &str) -> anyhow::Result<Device> {
        DuckDbBackend::create_device(self, profile, key).await
    }

    async fn get_or_create_device(
        &self,
        profile: &DeviceProfile,
        key: &str,
    ) -> anyhow::Result<Device> {
        DuckDbBackend::get_or_create_device(self, profile, key).await
    }

    async fn log_request(&self, request: NewDeviceRequest) -> anyhow::Result<DeviceRequest> {
        DuckDbBackend::log_request(self, request).await
    }

    async fn device_activity(
        &self,
        device_id: i64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<DeviceActivity> {
        DuckDbBackend::device_activity(self, device_id, now).await
    }

    async fn list_devices(
        &self,
        filter: &DeviceFilter,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Page<DeviceSummary>> {
        DuckDbBackend::list_devices(self, filter, page, now).await
    }

    async fn device_facets(&self) -> anyhow::Result<DeviceFacets> {
        DuckDbBackend::device_facets(self).await
    }

    async fn list_requests(
        &self,
        filter: &RequestFilter,
        page: PageRequest,
    ) -> anyhow::Result<Page<RequestSummary>> {
        DuckDbBackend::list_requests(self, filter, page).await
    }

    async fn get_request(&self, id: i64) -> anyhow::Result<Option<RequestSummary>> {
        DuckDbBackend::get_request(self, id).await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        DuckDbBackend::ping(self).await
    }
}
