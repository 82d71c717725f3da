use std::time::Duration;

use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    /// DuckDB size string such as `"1GB"` or `"512MB"`.
    pub duckdb_memory_limit: String,
    /// Bearer token guarding `/api/admin`. `None` leaves the admin API open.
    pub admin_token: Option<String>,
    /// Header the standalone binary trusts for the authenticated user id.
    /// Embedding applications should insert `AuthenticatedUser` instead.
    pub user_header: Option<String>,
    pub cookie: CookieConfig,
    /// Lower-cased header names whose values are replaced before logging.
    pub redact_headers: Vec<String>,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CookieConfig {
    pub name: String,
    pub max_age_days: u32,
    pub secure: bool,
    pub http_only: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "UAD".to_string(),
            max_age_days: 365,
            secure: false,
            http_only: false,
        }
    }
}

impl CookieConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(u64::from(self.max_age_days) * 24 * 60 * 60)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, CoreError> {
        let defaults = CookieConfig::default();
        Ok(Self {
            port: std::env::var("UADTRACK_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| CoreError::Config(format!("invalid port: {e}")))?,
            data_dir: std::env::var("UADTRACK_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("UADTRACK_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            admin_token: non_empty_var("UADTRACK_ADMIN_TOKEN"),
            user_header: non_empty_var("UADTRACK_USER_HEADER").map(|h| h.to_ascii_lowercase()),
            cookie: CookieConfig {
                name: non_empty_var("UADTRACK_COOKIE_NAME").unwrap_or(defaults.name),
                max_age_days: std::env::var("UADTRACK_COOKIE_MAX_AGE_DAYS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.max_age_days),
                secure: std::env::var("UADTRACK_COOKIE_SECURE")
                    .map(|v| v == "true")
                    .unwrap_or(defaults.secure),
                http_only: std::env::var("UADTRACK_COOKIE_HTTP_ONLY")
                    .map(|v| v == "true")
                    .unwrap_or(defaults.http_only),
            },
            redact_headers: std::env::var("UADTRACK_REDACT_HEADERS")
                .map(|v| split_list(&v))
                .unwrap_or_else(|_| vec!["authorization".to_string()]),
            cors_origins: std::env::var("UADTRACK_CORS_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
        })
    }

    /// Configuration suitable for tests: in-memory friendly paths, open admin API.
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            data_dir: "/tmp/uadtrack-test".to_string(),
            duckdb_memory_limit: "1GB".to_string(),
            admin_token: None,
            user_header: Some("x-user-id".to_string()),
            cookie: CookieConfig::default(),
            redact_headers: vec!["authorization".to_string()],
            cors_origins: vec![],
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
