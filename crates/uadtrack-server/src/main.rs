use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use uadtrack_server::state::AppState;

/// `uadtrack health`: liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$UADTRACK_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("UADTRACK_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("uadtrack=info".parse()?),
        )
        .json()
        .init();

    let cfg = uadtrack_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/uadtrack.db", cfg.data_dir);
    let db = uadtrack_duckdb::DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;

    if cfg.admin_token.is_none() {
        tracing::warn!("UADTRACK_ADMIN_TOKEN not set; /api/admin is open");
    }

    let state = Arc::new(AppState::new(db, cfg.clone()));

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = uadtrack_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, "uadtrack listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
    })
    .await?;

    Ok(())
}
