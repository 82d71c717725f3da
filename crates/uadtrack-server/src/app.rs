use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    middleware::{admin_auth::require_admin, track_device},
    routes,
    state::AppState,
};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer`: structured request/response logging via `tracing`.
/// 2. `CorsLayer`: `UADTRACK_CORS_ORIGINS`, or any origin when unset.
/// 3. `track_device`: device fingerprinting and the request log. `/health`
///    sits outside it so probes do not create devices.
/// 4. `require_admin`: bearer token on `/api/admin/*` only.
pub fn build_app(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/devices", get(routes::admin::devices::list_devices))
        .route("/devices/facets", get(routes::admin::devices::device_facets))
        .route("/devices/{id}", get(routes::admin::devices::get_device))
        .route("/requests", get(routes::admin::requests::list_requests))
        .route("/requests/{id}", get(routes::admin::requests::get_request))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let tracked = Router::new()
        .route("/api/device", get(routes::device::current_device))
        .nest("/api/admin", admin);

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(with_device_tracking(tracked, state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

/// Wrap a host application's router in the device-tracking layer.
///
/// Every request routed through `router` is fingerprinted and logged, and its
/// handlers can read the [`uadtrack_core::device::DeviceContext`] extension.
pub fn with_device_tracking<S>(router: Router<S>, state: Arc<AppState>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(state, track_device))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}
