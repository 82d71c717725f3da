use axum::{response::IntoResponse, Extension, Json};
use serde_json::json;

use uadtrack_core::device::DeviceContext;

use crate::error::AppError;

/// `GET /api/device`: the device the tracking layer resolved for this request.
///
/// Responds `503 device_unavailable` when resolution failed upstream (or the
/// route was mounted outside the tracking layer).
#[tracing::instrument(skip(context))]
pub async fn current_device(
    context: Option<Extension<DeviceContext>>,
) -> Result<impl IntoResponse, AppError> {
    let Some(Extension(context)) = context else {
        return Err(AppError::DeviceUnavailable);
    };
    Ok(Json(json!({ "data": context })))
}
