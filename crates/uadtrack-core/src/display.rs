//! Human-readable renderings used by the admin views.

use crate::device::DeviceProfile;

pub const ANONYMOUS: &str = "Anonymous";

pub fn user_id_display(profile: &DeviceProfile) -> String {
    profile
        .user_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| ANONYMOUS.to_string())
}

/// Summary of the device type flags, e.g. `"Mobile / TouchCapable"`.
/// `"Unknown"` when no flag is set.
pub fn device_type_display(profile: &DeviceProfile) -> String {
    let flags = [
        (profile.is_pc, "PC"),
        (profile.is_mobile, "Mobile"),
        (profile.is_tablet, "Tablet"),
        (profile.is_bot, "Bot"),
        (profile.is_touch_capable, "TouchCapable"),
    ];
    let parts: Vec<&str> = flags
        .iter()
        .filter(|(flag, _)| flag.unwrap_or(false))
        .map(|(_, label)| *label)
        .collect();
    if parts.is_empty() {
        "Unknown".to_string()
    } else {
        parts.join(" / ")
    }
}

pub fn browser_display(profile: &DeviceProfile) -> String {
    join_present(&[&profile.browser_family, &profile.browser_version])
}

pub fn os_display(profile: &DeviceProfile) -> String {
    join_present(&[&profile.os_family, &profile.os_version])
}

pub fn device_display(profile: &DeviceProfile) -> String {
    join_present(&[
        &profile.device_family,
        &profile.device_brand,
        &profile.device_model,
    ])
}

/// Badge color for an HTTP status code, keyed by its class.
pub fn response_status_color(code: u16) -> &'static str {
    match code / 100 {
        1 => "#8093f1",
        2 => "#72ddf7",
        3 => "#fdc5f5",
        4 => "#f7aef8",
        5 => "#b388eb",
        _ => "#fff",
    }
}

fn join_present(values: &[&Option<String>]) -> String {
    values
        .iter()
        .filter_map(|v| v.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
