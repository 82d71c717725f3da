use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use uadtrack_core::config::Config;
use uadtrack_duckdb::DuckDbBackend;
use uadtrack_server::app::build_app;
use uadtrack_server::state::AppState;

const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1";

fn setup(config: Config) -> Router {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    build_app(Arc::new(AppState::new(db, config)))
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

async fn visit(app: &Router, user_agent: &str, ip: &str, user: Option<&str>) {
    let mut builder = Request::builder()
        .uri("/api/device")
        .header("user-agent", user_agent)
        .header("x-forwarded-for", ip);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).expect("build request"))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);
}

async fn get(app: &Router, uri: &str) -> axum::http::Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    app.clone().oneshot(request).await.expect("request")
}

/// Two browsers; the Chrome one visits twice.
async fn seeded() -> Router {
    let app = setup(Config::for_tests());
    visit(&app, CHROME_WINDOWS, "203.0.113.10", Some("carol")).await;
    visit(&app, CHROME_WINDOWS, "203.0.113.10", Some("carol")).await;
    visit(&app, SAFARI_IPHONE, "203.0.113.20", None).await;
    app
}

#[tokio::test]
async fn test_list_devices_with_display_fields() {
    let app = seeded().await;

    let response = get(&app, "/api/admin/devices?search=carol").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;

    assert_eq!(json["pagination"]["total"], 1);
    let row = &json["data"][0];
    assert_eq!(row["user_id"], "carol");
    assert_eq!(row["user_id_display"], "carol");
    assert_eq!(row["device_type_display"], "PC");
    assert_eq!(row["browser_display"], "Chrome 120.0.0.0");
    assert_eq!(row["ip"], "203.0.113.10");
    assert_eq!(row["total_requests"], 2);
    assert_eq!(row["requests_last_hour"], 2);
}

#[tokio::test]
async fn test_list_devices_flag_filter() {
    let app = seeded().await;

    let json = json_body(get(&app, "/api/admin/devices?is_mobile=true").await).await;
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["data"][0]["user_id_display"], "Anonymous");
    assert_eq!(json["data"][0]["device_type_display"], "Mobile / TouchCapable");

    let json = json_body(get(&app, "/api/admin/devices?browser_family=Chrome").await).await;
    assert_eq!(json["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_list_devices_rejects_bad_limit() {
    let app = seeded().await;
    let response = get(&app, "/api/admin/devices?limit=0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_device_facets() {
    let app = seeded().await;
    let json = json_body(get(&app, "/api/admin/devices/facets").await).await;
    let browsers: Vec<&str> = json["data"]["browser_family"]
        .as_array()
        .expect("array")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(browsers.contains(&"Chrome"));
    assert!(browsers.contains(&"Safari"));
}

#[tokio::test]
async fn test_device_detail_and_404() {
    let app = seeded().await;

    let list = json_body(get(&app, "/api/admin/devices?search=carol").await).await;
    let id = list["data"][0]["id"].as_i64().expect("device id");

    let response = get(&app, &format!("/api/admin/devices/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["base_info"]["user_id"], "carol");
    assert_eq!(json["data"]["user_agent"]["browser_family"], "Chrome");
    assert_eq!(json["data"]["user_agent"]["is_pc"], true);
    assert_eq!(json["data"]["activity"]["total_requests"], 2);

    let response = get(&app, "/api/admin/devices/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_list_requests_and_detail() {
    let app = seeded().await;

    let response = get(&app, "/api/admin/requests?search=carol&status=Normal").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["pagination"]["total"], 2);

    let newest = &json["data"][0];
    assert_eq!(newest["rn"], 2);
    assert_eq!(newest["status"], "Normal");
    assert_eq!(newest["status_color"], "#06d6a0");
    assert_eq!(newest["response_status_code"], 200);
    assert_eq!(newest["response_status_color"], "#72ddf7");
    assert!(newest["device_name"].as_str().is_some_and(|n| !n.is_empty()));
    assert!(newest.get("headers").is_none());

    let id = newest["id"].as_i64().expect("request id");
    let detail = json_body(get(&app, &format!("/api/admin/requests/{id}")).await).await;
    assert_eq!(detail["data"]["headers"]["x-user-id"], "carol");

    let response = get(&app, "/api/admin/requests/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_requests_rejects_unknown_status() {
    let app = seeded().await;
    let response = get(&app, "/api/admin/requests?status=Sleepy").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_is_read_only() {
    let app = seeded().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/devices")
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_admin_token_required_when_configured() {
    let config = Config {
        admin_token: Some("s3cret".to_string()),
        ..Config::for_tests()
    };
    let app = setup(config);

    let response = get(&app, "/api/admin/devices").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "unauthorized");

    let request = Request::builder()
        .uri("/api/admin/devices")
        .header("authorization", "Bearer s3cret")
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_query_uses_error_envelope() {
    let app = seeded().await;

    let response = get(&app, "/api/admin/devices?limit=-1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
    assert!(json["error"]["message"]
        .as_str()
        .is_some_and(|m| m.contains("limit")));

    let response = get(&app, "/api/admin/requests?device_id=abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_non_numeric_id_uses_error_envelope() {
    let app = seeded().await;

    for uri in ["/api/admin/devices/abc", "/api/admin/requests/abc"] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "validation_error", "{uri}");
    }
}
