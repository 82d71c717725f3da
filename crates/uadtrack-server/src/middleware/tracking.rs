use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Query, Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{error, warn};

use uadtrack_core::{
    config::CookieConfig,
    device::DeviceContext,
    fingerprint::compute_device_key,
    request::NewDeviceRequest,
    store::DeviceStore,
};

use crate::identity::{self, AuthenticatedUser};
use crate::state::AppState;

/// Device-tracking middleware.
///
/// For every request:
/// 1. resolve the device (cookie → fingerprint key → create on miss) and
///    attach a [`DeviceContext`] to the request extensions;
/// 2. run the inner service;
/// 3. set the device cookie on the response;
/// 4. append a row to the request log.
///
/// A failure in step 1 serves the request untouched (no cookie, no log row).
/// A failure in step 4 is logged and the response is returned unchanged.
pub async fn track_device(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let user_id = identity::user_id(
        request.extensions().get::<AuthenticatedUser>(),
        request.headers(),
        state.config.user_header.as_deref(),
    );
    let cookie_key = identity::cookie(request.headers(), &state.config.cookie.name);

    let resolved = resolve_device(
        state.store.as_ref(),
        cookie_key.as_deref(),
        user_id,
        request.headers(),
        peer,
    )
    .await;
    let context = match resolved {
        Ok(context) => context,
        Err(e) => {
            error!(error = %e, path = %request.uri().path(), "Device resolution failed");
            return next.run(request).await;
        }
    };

    let endpoint = request.uri().path().to_string();
    let method = request.method().to_string();
    let query_params = query_snapshot(&request);
    let headers = identity::header_snapshot(request.headers(), &state.config.redact_headers);
    let cookies = identity::cookies(request.headers());
    let device_id = context.device.id;
    let key = context.key().map(str::to_string);

    request.extensions_mut().insert(context);
    let mut response = next.run(request).await;

    if let Some(key) = key {
        match HeaderValue::from_str(&device_cookie(&state.config.cookie, &key)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, device_id, "Device key is not a valid cookie value"),
        }
    }

    let entry = NewDeviceRequest {
        device_id,
        endpoint,
        response_status_code: response.status().as_u16(),
        method: Some(method),
        query_params,
        headers,
        cookies,
        created_at: Utc::now(),
    };
    if let Err(e) = state.store.log_request(entry).await {
        warn!(error = %e, device_id, "Failed to log device request");
    }

    response
}

/// Find the device for this request.
///
/// The cookie match is ignored when it points at an anonymous device but the
/// request is authenticated, so a user signing in gets a device of their own.
pub async fn resolve_device(
    store: &dyn DeviceStore,
    cookie_key: Option<&str>,
    user_id: Option<String>,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> anyhow::Result<DeviceContext> {
    if let Some(key) = cookie_key {
        if let Some(device) = store.get_device_by_key(key).await? {
            if !(device.is_anonymous() && user_id.is_some()) {
                let profile = device.profile.clone();
                return Ok(DeviceContext {
                    device,
                    profile,
                    from_cookie: true,
                });
            }
        }
    }

    let profile = identity::profile_from_request(headers, peer, user_id);
    let key = compute_device_key(&profile);
    let device = store.get_or_create_device(&profile, &key).await?;
    Ok(DeviceContext {
        device,
        profile,
        from_cookie: false,
    })
}

fn query_snapshot(request: &Request) -> BTreeMap<String, String> {
    match Query::<Vec<(String, String)>>::try_from_uri(request.uri()) {
        Ok(Query(pairs)) => pairs.into_iter().collect(),
        Err(_) => BTreeMap::new(),
    }
}

fn device_cookie(config: &CookieConfig, key: &str) -> String {
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path=/",
        config.name,
        key,
        config.max_age().as_secs()
    );
    if config.http_only {
        cookie.push_str("; HttpOnly");
    }
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}
