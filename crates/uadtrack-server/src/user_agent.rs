//! `User-Agent` classification via the `woothee` crate.

/// Value woothee reports for anything it cannot classify.
const UNKNOWN: &str = "UNKNOWN";

/// Parsed User-Agent fields, shaped like the device profile columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub is_mobile: Option<bool>,
    pub is_tablet: Option<bool>,
    pub is_touch_capable: Option<bool>,
    pub is_pc: Option<bool>,
    pub is_bot: Option<bool>,
    pub browser_family: Option<String>,
    pub browser_version: Option<String>,
    pub os_family: Option<String>,
    pub os_version: Option<String>,
    pub device_family: Option<String>,
    pub device_brand: Option<String>,
    pub device_model: Option<String>,
}

/// Model prefixes of common Android vendors.
const ANDROID_BRANDS: &[(&str, &str)] = &[
    ("SM-", "Samsung"),
    ("GT-", "Samsung"),
    ("SAMSUNG", "Samsung"),
    ("Pixel", "Google"),
    ("Nexus", "Google"),
    ("LG-", "LG"),
    ("LM-", "LG"),
    ("Redmi", "Xiaomi"),
    ("Mi ", "Xiaomi"),
    ("moto", "Motorola"),
    ("HUAWEI", "Huawei"),
    ("ONEPLUS", "OnePlus"),
];

/// Classify a `User-Agent` header value.
///
/// An empty string, or one woothee refuses, yields a profile with every
/// field `None`.
pub fn parse_user_agent(user_agent: &str) -> UserAgentInfo {
    let user_agent = user_agent.trim();
    if user_agent.is_empty() {
        return UserAgentInfo::default();
    }

    let Some(result) = woothee::parser::Parser::new().parse(user_agent) else {
        return UserAgentInfo::default();
    };

    let os = known(&result.os);
    let is_bot = result.category == "crawler";
    let is_pc = result.category == "pc";
    let is_android = user_agent.contains("Android");
    let is_tablet = os.as_deref() == Some("iPad")
        || (is_android && !user_agent.contains("Mobile"))
        || user_agent.contains("Tablet");
    let is_mobile = matches!(result.category, "smartphone" | "mobilephone") && !is_tablet;
    let is_touch_capable = is_mobile || is_tablet || user_agent.contains("Touch");

    let (device_family, device_brand, device_model) = if is_bot {
        (
            Some("Spider".to_string()),
            Some("Spider".to_string()),
            None,
        )
    } else if let Some(apple) = os
        .as_deref()
        .filter(|os| matches!(*os, "iPhone" | "iPad" | "iPod"))
    {
        (
            Some(apple.to_string()),
            Some("Apple".to_string()),
            Some(apple.to_string()),
        )
    } else if let Some(model) = is_android.then(|| android_model(user_agent)).flatten() {
        let brand = android_brand(&model);
        let family = match brand {
            Some(brand) => format!("{brand} {model}"),
            None => model.clone(),
        };
        (Some(family), brand.map(str::to_string), Some(model))
    } else {
        (Some("Other".to_string()), None, None)
    };

    UserAgentInfo {
        is_mobile: Some(is_mobile),
        is_tablet: Some(is_tablet),
        is_touch_capable: Some(is_touch_capable),
        is_pc: Some(is_pc),
        is_bot: Some(is_bot),
        browser_family: Some(known(&result.name).unwrap_or_else(|| "Other".to_string())),
        browser_version: known(&result.version),
        os_family: Some(os.unwrap_or_else(|| "Other".to_string())),
        os_version: known(&result.os_version),
        device_family,
        device_brand,
        device_model,
    }
}

/// woothee returns empty string or `UNKNOWN` for missing values; normalise to `None`.
fn known(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == UNKNOWN {
        None
    } else {
        Some(value.to_string())
    }
}

/// The device model from an Android UA: the last `;`-separated entry of the
/// parenthesised platform group, without any ` Build/...` suffix.
fn android_model(user_agent: &str) -> Option<String> {
    let start = user_agent.find('(')?;
    let rest = &user_agent[start + 1..];
    let group = &rest[..rest.find(')')?];
    if !group.contains("Android") {
        return None;
    }
    let last = group.rsplit(';').next()?.trim();
    let model = last.split(" Build/").next()?.trim();
    if model.is_empty() || model.starts_with("Android") || model == "Linux" {
        return None;
    }
    Some(model.to_string())
}

fn android_brand(model: &str) -> Option<&'static str> {
    ANDROID_BRANDS
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, brand)| *brand)
}
