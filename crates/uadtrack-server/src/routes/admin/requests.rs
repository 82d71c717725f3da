use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use uadtrack_core::{
    display,
    status::RequestStatus,
    store::{RequestFilter, RequestSummary},
};

use super::{non_empty, PageQuery};
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct RequestsQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub response_status_code: Option<u16>,
    pub device_id: Option<i64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// `GET /api/admin/requests`: the request log, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RequestsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let page = PageQuery {
        limit: query.limit,
        offset: query.offset,
    }
    .validate()?;

    let status = non_empty(query.status)
        .map(|s| s.parse::<RequestStatus>())
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let filter = RequestFilter {
        search: non_empty(query.search),
        status,
        response_status_code: query.response_status_code,
        device_id: query.device_id,
    };

    let result = state
        .store
        .list_requests(&filter, page)
        .await
        .map_err(AppError::Internal)?;

    let data: Vec<Value> = result.rows.iter().map(|r| request_row(r, false)).collect();
    Ok(Json(json!({
        "data": data,
        "pagination": result.pagination,
    })))
}

/// `GET /api/admin/requests/{id}`: one log row including the captured
/// query parameters, headers and cookies.
#[tracing::instrument(skip(state))]
pub async fn get_request(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let summary = state
        .store
        .get_request(id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound("Request not found".to_string()))?;
    Ok(Json(json!({ "data": request_row(&summary, true) })))
}

fn request_row(summary: &RequestSummary, detail: bool) -> Value {
    let r = &summary.request;
    let mut row = json!({
        "id": r.id,
        "device_id": r.device_id,
        "device_name": summary.device_name,
        "endpoint": r.endpoint,
        "method": r.method,
        "response_status_code": r.response_status_code,
        "response_status_color": display::response_status_color(r.response_status_code),
        "rn": r.counts.rn,
        "rn_ph": r.counts.rn_ph,
        "rn_24h": r.counts.rn_24h,
        "status": r.status,
        "status_color": r.status_color,
        "created_at": r.created_at.to_rfc3339(),
    });
    if detail {
        row["query_params"] = r.query_params.clone().unwrap_or(Value::Null);
        row["headers"] = r.headers.clone().unwrap_or(Value::Null);
        row["cookies"] = r.cookies.clone().unwrap_or(Value::Null);
    }
    row
}
