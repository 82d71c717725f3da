use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::http::{header, HeaderMap};

use uadtrack_core::device::DeviceProfile;

use crate::user_agent::parse_user_agent;

/// The authenticated user behind a request.
///
/// Host applications insert this into request extensions from their own
/// auth layer, which must run before the device-tracking layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

/// Extract the client IP from `X-Forwarded-For` (first entry), falling back to
/// the TCP peer address when the header is absent.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// Resolve the user id: an [`AuthenticatedUser`] extension wins, then the
/// configured trusted header. Blank values are anonymous.
pub fn user_id(
    extension: Option<&AuthenticatedUser>,
    headers: &HeaderMap,
    user_header: Option<&str>,
) -> Option<String> {
    if let Some(AuthenticatedUser(id)) = extension {
        let id = id.trim();
        return (!id.is_empty()).then(|| id.to_string());
    }
    let name = user_header?;
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Every `name=value` pair of the `Cookie` header(s). Later duplicates win.
pub fn cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

pub fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    cookies(headers).remove(name).filter(|v| !v.is_empty())
}

/// Request headers as lower-cased name → value, with `redact` names masked.
/// Repeated headers are joined with `, `.
pub fn header_snapshot(headers: &HeaderMap, redact: &[String]) -> BTreeMap<String, String> {
    let mut snapshot: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_str();
        let value = if redact.iter().any(|r| r == name) {
            "[redacted]".to_string()
        } else {
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        };
        snapshot
            .entry(name.to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    snapshot
}

/// Build the device profile for a request that did not match a stored device.
pub fn profile_from_request(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    user_id: Option<String>,
) -> DeviceProfile {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let ua = parse_user_agent(user_agent);

    DeviceProfile {
        user_id,
        is_mobile: ua.is_mobile,
        is_tablet: ua.is_tablet,
        is_touch_capable: ua.is_touch_capable,
        is_pc: ua.is_pc,
        is_bot: ua.is_bot,
        browser_family: ua.browser_family,
        browser_version: ua.browser_version,
        os_family: ua.os_family,
        os_version: ua.os_version,
        device_family: ua.device_family,
        device_brand: ua.device_brand,
        device_model: ua.device_model,
        ip: client_ip(headers, peer),
    }
}
