use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use uadtrack_core::{
    device::Device,
    display,
    store::{DeviceActivity, DeviceFilter, DeviceSummary},
};

use super::{non_empty, PageQuery};
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct DevicesQuery {
    pub search: Option<String>,
    pub is_mobile: Option<bool>,
    pub is_tablet: Option<bool>,
    pub is_touch_capable: Option<bool>,
    pub is_pc: Option<bool>,
    pub is_bot: Option<bool>,
    pub browser_family: Option<String>,
    pub os_family: Option<String>,
    pub device_family: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// `GET /api/admin/devices`: newest devices first, with request counts.
#[tracing::instrument(skip(state))]
pub async fn list_devices(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DevicesQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let page = PageQuery {
        limit: query.limit,
        offset: query.offset,
    }
    .validate()?;

    let filter = DeviceFilter {
        search: non_empty(query.search),
        is_mobile: query.is_mobile,
        is_tablet: query.is_tablet,
        is_touch_capable: query.is_touch_capable,
        is_pc: query.is_pc,
        is_bot: query.is_bot,
        browser_family: non_empty(query.browser_family),
        os_family: non_empty(query.os_family),
        device_family: non_empty(query.device_family),
    };

    let result = state
        .store
        .list_devices(&filter, page, Utc::now())
        .await
        .map_err(AppError::Internal)?;

    let data: Vec<Value> = result.rows.iter().map(device_row).collect();
    Ok(Json(json!({
        "data": data,
        "pagination": result.pagination,
    })))
}

/// `GET /api/admin/devices/facets`: values for the family filter dropdowns.
#[tracing::instrument(skip(state))]
pub async fn device_facets(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let facets = state
        .store
        .device_facets()
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(json!({ "data": facets })))
}

/// `GET /api/admin/devices/{id}`: one device split into identity and
/// user-agent sections, plus its request counts.
#[tracing::instrument(skip(state))]
pub async fn get_device(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let device = state
        .store
        .get_device(id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound("Device not found".to_string()))?;
    let activity = state
        .store
        .device_activity(id, Utc::now())
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(json!({ "data": device_detail(&device, activity) })))
}

fn device_row(summary: &DeviceSummary) -> Value {
    let device = &summary.device;
    let profile = &device.profile;
    json!({
        "id": device.id,
        "name": device.name,
        "key": device.key,
        "user_id": profile.user_id,
        "user_id_display": display::user_id_display(profile),
        "device_type_display": display::device_type_display(profile),
        "browser_display": display::browser_display(profile),
        "os_display": display::os_display(profile),
        "device_display": display::device_display(profile),
        "ip": profile.ip,
        "created_at": device.created_at.to_rfc3339(),
        "total_requests": summary.activity.total_requests,
        "requests_last_24h": summary.activity.requests_last_24h,
        "requests_last_hour": summary.activity.requests_last_hour,
    })
}

fn device_detail(device: &Device, activity: DeviceActivity) -> Value {
    let profile = &device.profile;
    json!({
        "id": device.id,
        "base_info": {
            "name": device.name,
            "key": device.key,
            "user_id": profile.user_id,
            "user_id_display": display::user_id_display(profile),
            "ip": profile.ip,
            "created_at": device.created_at.to_rfc3339(),
        },
        "user_agent": {
            "is_mobile": profile.is_mobile,
            "is_tablet": profile.is_tablet,
            "is_touch_capable": profile.is_touch_capable,
            "is_pc": profile.is_pc,
            "is_bot": profile.is_bot,
            "device_type_display": display::device_type_display(profile),
            "browser_family": profile.browser_family,
            "browser_version": profile.browser_version,
            "os_family": profile.os_family,
            "os_version": profile.os_version,
            "device_family": profile.device_family,
            "device_brand": profile.device_brand,
            "device_model": profile.device_model,
        },
        "activity": activity,
    })
}
