use md5::{Digest, Md5};

use crate::device::DeviceProfile;

/// Compute the device key for `profile`.
///
/// Formula: md5 of the profile fields joined with `-`, in the fixed order
/// `user_id, is_mobile, is_tablet, is_touch_capable, is_pc, is_bot,
/// browser_family, browser_version, os_family, os_version, device_family,
/// device_brand, device_model, ip`, hex encoded (32 chars).
///
/// Falsy values render as the empty string (`None`, `false`, `""`) and `true`
/// renders as `True`, so keys stay identical to the ones already stored in
/// `UAD` cookies by earlier deployments.
pub fn compute_device_key(profile: &DeviceProfile) -> String {
    let parts = [
        text(&profile.user_id),
        flag(profile.is_mobile),
        flag(profile.is_tablet),
        flag(profile.is_touch_capable),
        flag(profile.is_pc),
        flag(profile.is_bot),
        text(&profile.browser_family),
        text(&profile.browser_version),
        text(&profile.os_family),
        text(&profile.os_version),
        text(&profile.device_family),
        text(&profile.device_brand),
        text(&profile.device_model),
        text(&profile.ip),
    ];
    let input = parts.join("-");
    hex::encode(Md5::digest(input.as_bytes()))
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "True",
        _ => "",
    }
}
