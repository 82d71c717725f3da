/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `UADTRACK_DUCKDB_MEMORY`, default `"1GB"`). The DuckDB default of 80%
/// of system RAM is not acceptable inside a host web process.
///
/// `device_requests.device_id` carries no FOREIGN KEY: DuckDB enforces FK
/// constraints immediately and rejects later maintenance on the parent row.
/// The tracking layer only ever writes ids it has just read from `devices`.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- DEVICES (one row per fingerprint)
-- ===========================================
CREATE SEQUENCE IF NOT EXISTS devices_id_seq START 1;
CREATE TABLE IF NOT EXISTS devices (
    id                BIGINT PRIMARY KEY DEFAULT nextval('devices_id_seq'),
    name              VARCHAR NOT NULL UNIQUE,     -- random 'adjective-noun-NNNN', never changes
    key               VARCHAR UNIQUE,              -- md5 fingerprint, 32 hex chars
    user_id           VARCHAR,                     -- NULL for anonymous devices

    is_mobile         BOOLEAN,
    is_tablet         BOOLEAN,
    is_touch_capable  BOOLEAN,
    is_pc             BOOLEAN,
    is_bot            BOOLEAN,

    browser_family    VARCHAR,
    browser_version   VARCHAR,
    os_family         VARCHAR,
    os_version        VARCHAR,
    device_family     VARCHAR,
    device_brand      VARCHAR,
    device_model      VARCHAR,

    ip                VARCHAR,

    created_at        TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP  -- first visit
);
CREATE INDEX IF NOT EXISTS idx_devices_created_at ON devices(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_devices_user_id    ON devices(user_id);

-- ===========================================
-- DEVICE REQUESTS (one row per tracked request)
-- ===========================================
CREATE SEQUENCE IF NOT EXISTS device_requests_id_seq START 1;
CREATE TABLE IF NOT EXISTS device_requests (
    id                    BIGINT PRIMARY KEY DEFAULT nextval('device_requests_id_seq'),
    device_id             BIGINT NOT NULL,
    endpoint              VARCHAR NOT NULL,
    response_status_code  INTEGER NOT NULL,

    rn                    BIGINT NOT NULL DEFAULT 0,    -- total request number
    rn_ph                 BIGINT NOT NULL DEFAULT 0,    -- requests in the trailing hour
    rn_24h                BIGINT NOT NULL DEFAULT 0,    -- requests in the trailing 24 hours

    status                VARCHAR(64) NOT NULL DEFAULT 'Normal',  -- 'Normal' | 'Busy' | 'Very Busy' | 'Abnormal'
    status_color          VARCHAR NOT NULL DEFAULT '#06d6a0',

    method                VARCHAR(64),
    query_params          VARCHAR,                      -- JSON object string
    headers               VARCHAR,                      -- JSON object string
    cookies               VARCHAR,                      -- JSON object string

    created_at            TIMESTAMP NOT NULL
);
-- Rolling-window counts on every insert: device + time range
CREATE INDEX IF NOT EXISTS idx_device_requests_device_time
    ON device_requests(device_id, created_at);
CREATE INDEX IF NOT EXISTS idx_device_requests_created_at
    ON device_requests(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_device_requests_status
    ON device_requests(status, response_status_code);
"#
    )
}
