use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use uadtrack_core::{
    device::DeviceProfile,
    fingerprint::compute_device_key,
    request::NewDeviceRequest,
    status::RequestStatus,
    store::{DeviceFilter, DeviceStore, PageRequest, RequestFilter},
};
use uadtrack_duckdb::DuckDbBackend;

fn desktop_profile(ip: &str) -> DeviceProfile {
    DeviceProfile {
        is_mobile: Some(false),
        is_tablet: Some(false),
        is_touch_capable: Some(false),
        is_pc: Some(true),
        is_bot: Some(false),
        browser_family: Some("Chrome".to_string()),
        browser_version: Some("120.0.0.0".to_string()),
        os_family: Some("Windows 10".to_string()),
        os_version: Some("NT 10.0".to_string()),
        device_family: Some("Other".to_string()),
        ip: Some(ip.to_string()),
        ..DeviceProfile::default()
    }
}

fn phone_profile(ip: &str) -> DeviceProfile {
    DeviceProfile {
        is_mobile: Some(true),
        is_tablet: Some(false),
        is_touch_capable: Some(true),
        is_pc: Some(false),
        is_bot: Some(false),
        browser_family: Some("Safari".to_string()),
        os_family: Some("iPhone".to_string()),
        os_version: Some("17.2".to_string()),
        device_family: Some("iPhone".to_string()),
        device_brand: Some("Apple".to_string()),
        device_model: Some("iPhone".to_string()),
        ip: Some(ip.to_string()),
        ..DeviceProfile::default()
    }
}

fn request_at(device_id: i64, endpoint: &str, code: u16, at: DateTime<Utc>) -> NewDeviceRequest {
    NewDeviceRequest {
        device_id,
        endpoint: endpoint.to_string(),
        response_status_code: code,
        method: Some("GET".to_string()),
        query_params: BTreeMap::from([("page".to_string(), "2".to_string())]),
        headers: BTreeMap::from([("user-agent".to_string(), "test".to_string())]),
        cookies: BTreeMap::new(),
        created_at: at,
    }
}

#[tokio::test]
async fn get_or_create_returns_same_device_for_same_key() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let profile = desktop_profile("198.51.100.1");
    let key = compute_device_key(&profile);

    let first = db.get_or_create_device(&profile, &key).await.expect("create");
    let second = db.get_or_create_device(&profile, &key).await.expect("lookup");

    assert_eq!(first.id, second.id);
    assert_eq!(first.name, second.name);
    assert_eq!(first.key.as_deref(), Some(key.as_str()));
    assert_eq!(first.profile, profile);
}

#[tokio::test]
async fn created_devices_get_distinct_names() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let mut names = std::collections::HashSet::new();
    for i in 0..20 {
        let profile = desktop_profile(&format!("10.0.0.{i}"));
        let key = compute_device_key(&profile);
        let device = db.create_device(&profile, &key).await.expect("create");
        assert!(names.insert(device.name.clone()), "duplicate name {}", device.name);
    }
}

#[tokio::test]
async fn lookup_by_unknown_key_is_none() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    assert!(db
        .get_device_by_key("0123456789abcdef0123456789abcdef")
        .await
        .expect("lookup")
        .is_none());
    assert!(db.get_device(999).await.expect("lookup").is_none());
}

#[tokio::test]
async fn request_numbers_count_existing_rows_plus_one() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let profile = desktop_profile("198.51.100.2");
    let device = db
        .get_or_create_device(&profile, &compute_device_key(&profile))
        .await
        .expect("device");

    let now = Utc::now();
    db.log_request(request_at(device.id, "/old", 200, now - Duration::hours(30)))
        .await
        .expect("log old");
    db.log_request(request_at(device.id, "/earlier", 200, now - Duration::hours(2)))
        .await
        .expect("log earlier");
    db.log_request(request_at(device.id, "/recent", 200, now - Duration::minutes(10)))
        .await
        .expect("log recent");

    let logged = db
        .log_request(request_at(device.id, "/now", 404, now))
        .await
        .expect("log now");

    assert_eq!(logged.counts.rn, 4);
    assert_eq!(logged.counts.rn_ph, 2);
    assert_eq!(logged.counts.rn_24h, 3);
    assert_eq!(logged.status, RequestStatus::Normal);
    assert_eq!(logged.status_color, "#06d6a0");
    assert_eq!(logged.response_status_code, 404);
    assert_eq!(logged.query_params, Some(serde_json::json!({ "page": "2" })));
}

#[tokio::test]
async fn counts_are_per_device() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let a = desktop_profile("198.51.100.3");
    let b = phone_profile("198.51.100.4");
    let device_a = db
        .get_or_create_device(&a, &compute_device_key(&a))
        .await
        .expect("a");
    let device_b = db
        .get_or_create_device(&b, &compute_device_key(&b))
        .await
        .expect("b");

    let now = Utc::now();
    for _ in 0..3 {
        db.log_request(request_at(device_a.id, "/", 200, now))
            .await
            .expect("log a");
    }
    let first_b = db
        .log_request(request_at(device_b.id, "/", 200, now))
        .await
        .expect("log b");
    assert_eq!(first_b.counts.rn, 1);
}

#[tokio::test]
async fn fifty_requests_in_an_hour_is_busy() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let profile = desktop_profile("198.51.100.5");
    let device = db
        .get_or_create_device(&profile, &compute_device_key(&profile))
        .await
        .expect("device");

    let now = Utc::now();
    let mut last = None;
    for i in 0..50 {
        let at = now - Duration::minutes(50) + Duration::minutes(i);
        last = Some(
            db.log_request(request_at(device.id, "/poll", 200, at))
                .await
                .expect("log"),
        );
    }
    let last = last.expect("at least one request");
    assert_eq!(last.counts.rn_ph, 50);
    assert_eq!(last.status, RequestStatus::Busy);
    assert_eq!(last.status_color, "#ffba08");
}

#[tokio::test]
async fn list_devices_filters_and_counts() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let desktop = desktop_profile("203.0.113.10");
    let phone = phone_profile("203.0.113.11");
    let desktop_device = db
        .get_or_create_device(&desktop, &compute_device_key(&desktop))
        .await
        .expect("desktop");
    db.get_or_create_device(&phone, &compute_device_key(&phone))
        .await
        .expect("phone");

    let now = Utc::now();
    db.log_request(request_at(desktop_device.id, "/", 200, now - Duration::hours(5)))
        .await
        .expect("log");
    db.log_request(request_at(desktop_device.id, "/", 200, now - Duration::minutes(5)))
        .await
        .expect("log");

    let all = db
        .list_devices(&DeviceFilter::default(), PageRequest::default(), now)
        .await
        .expect("list");
    assert_eq!(all.pagination.total, 2);
    assert_eq!(all.rows.len(), 2);

    let mobile_only = DeviceFilter {
        is_mobile: Some(true),
        ..DeviceFilter::default()
    };
    let mobile = db
        .list_devices(&mobile_only, PageRequest::default(), now)
        .await
        .expect("list mobile");
    assert_eq!(mobile.pagination.total, 1);
    assert_eq!(mobile.rows[0].device.profile.device_brand.as_deref(), Some("Apple"));
    assert_eq!(mobile.rows[0].activity.total_requests, 0);

    let by_ip = DeviceFilter {
        search: Some("203.0.113.10".to_string()),
        ..DeviceFilter::default()
    };
    let found = db
        .list_devices(&by_ip, PageRequest::default(), now)
        .await
        .expect("search");
    assert_eq!(found.rows.len(), 1);
    let activity = found.rows[0].activity;
    assert_eq!(activity.total_requests, 2);
    assert_eq!(activity.requests_last_24h, 2);
    assert_eq!(activity.requests_last_hour, 1);
}

#[tokio::test]
async fn list_devices_paginates() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    for i in 0..5 {
        let profile = desktop_profile(&format!("192.0.2.{i}"));
        db.get_or_create_device(&profile, &compute_device_key(&profile))
            .await
            .expect("device");
    }

    let page = PageRequest {
        limit: 2,
        offset: 2,
    };
    let result = db
        .list_devices(&DeviceFilter::default(), page, Utc::now())
        .await
        .expect("list");
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.pagination.total, 5);
    assert!(result.pagination.has_more);
}

#[tokio::test]
async fn facets_list_distinct_families() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    for profile in [
        desktop_profile("192.0.2.20"),
        desktop_profile("192.0.2.21"),
        phone_profile("192.0.2.22"),
    ] {
        db.get_or_create_device(&profile, &compute_device_key(&profile))
            .await
            .expect("device");
    }

    let facets = db.device_facets().await.expect("facets");
    assert_eq!(facets.browser_family, vec!["Chrome", "Safari"]);
    assert_eq!(facets.os_family, vec!["Windows 10", "iPhone"]);
    assert_eq!(facets.device_family, vec!["Other", "iPhone"]);
}

#[tokio::test]
async fn list_requests_filters_by_status_code_and_search() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let desktop = desktop_profile("203.0.113.30");
    let phone = phone_profile("203.0.113.31");
    let d = db
        .get_or_create_device(&desktop, &compute_device_key(&desktop))
        .await
        .expect("desktop");
    let p = db
        .get_or_create_device(&phone, &compute_device_key(&phone))
        .await
        .expect("phone");

    let now = Utc::now();
    db.log_request(request_at(d.id, "/ok", 200, now))
        .await
        .expect("log");
    db.log_request(request_at(d.id, "/missing", 404, now))
        .await
        .expect("log");
    db.log_request(request_at(p.id, "/ok", 200, now))
        .await
        .expect("log");

    let not_found = RequestFilter {
        response_status_code: Some(404),
        ..RequestFilter::default()
    };
    let result = db
        .list_requests(&not_found, PageRequest::default())
        .await
        .expect("list");
    assert_eq!(result.pagination.total, 1);
    assert_eq!(result.rows[0].request.endpoint, "/missing");
    assert_eq!(result.rows[0].device_name, d.name);
    assert!(result.rows[0].request.headers.is_none());

    let by_ip = RequestFilter {
        search: Some("203.0.113.31".to_string()),
        ..RequestFilter::default()
    };
    let result = db
        .list_requests(&by_ip, PageRequest::default())
        .await
        .expect("search");
    assert_eq!(result.pagination.total, 1);
    assert_eq!(result.rows[0].request.device_id, p.id);

    let normal = RequestFilter {
        status: Some(RequestStatus::Normal),
        ..RequestFilter::default()
    };
    let result = db
        .list_requests(&normal, PageRequest::default())
        .await
        .expect("status");
    assert_eq!(result.pagination.total, 3);
}

#[tokio::test]
async fn get_request_includes_payloads() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let profile = desktop_profile("203.0.113.40");
    let device = db
        .get_or_create_device(&profile, &compute_device_key(&profile))
        .await
        .expect("device");
    let logged = db
        .log_request(request_at(device.id, "/detail", 201, Utc::now()))
        .await
        .expect("log");

    let store: &dyn DeviceStore = &db;
    let detail = store
        .get_request(logged.id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(detail.request.endpoint, "/detail");
    assert_eq!(
        detail.request.headers,
        Some(serde_json::json!({ "user-agent": "test" }))
    );
    assert_eq!(detail.request.cookies, Some(serde_json::json!({})));
    assert!(store.get_request(logged.id + 100).await.expect("get").is_none());
}
