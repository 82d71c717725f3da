use anyhow::{bail, Result};
use chrono::Duration;
use duckdb::types::Type;
use tracing::debug;

use uadtrack_core::request::{DeviceRequest, NewDeviceRequest, RequestCounts};
use uadtrack_core::status::RequestStatus;

use crate::sql::{format_ts, parse_json, parse_ts};
use crate::DuckDbBackend;

/// Columns matching [`request_from_row`]. With `detail == false` the JSON
/// payload columns are replaced by NULLs to keep list queries light.
pub(crate) fn request_columns(alias: &str, detail: bool) -> String {
    let payload = |c: &str| {
        if detail {
            format!("{alias}.{c}")
        } else {
            "NULL".to_string()
        }
    };
    format!(
        "{a}.id, {a}.device_id, {a}.endpoint, {a}.response_status_code, \
         {a}.rn, {a}.rn_ph, {a}.rn_24h, {a}.status, {a}.status_color, {a}.method, \
         {qp}, {hd}, {ck}, CAST({a}.created_at AS VARCHAR)",
        a = alias,
        qp = payload("query_params"),
        hd = payload("headers"),
        ck = payload("cookies"),
    )
}

/// Number of columns produced by [`request_columns`].
pub(crate) const REQUEST_COLUMN_COUNT: usize = 14;

pub(crate) fn request_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<DeviceRequest> {
    let code: i32 = row.get(3)?;
    let status_raw: String = row.get(7)?;
    let status = status_raw
        .parse::<RequestStatus>()
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;
    Ok(DeviceRequest {
        id: row.get(0)?,
        device_id: row.get(1)?,
        endpoint: row.get(2)?,
        response_status_code: u16::try_from(code).unwrap_or_default(),
        counts: RequestCounts {
            rn: row.get(4)?,
            rn_ph: row.get(5)?,
            rn_24h: row.get(6)?,
        },
        status,
        status_color: row.get(8)?,
        method: row.get(9)?,
        query_params: parse_json(row, 10)?,
        headers: parse_json(row, 11)?,
        cookies: parse_json(row, 12)?,
        created_at: parse_ts(row, 13)?,
    })
}

impl DuckDbBackend {
    /// Insert one request log row for `request.device_id`.
    ///
    /// Counting and inserting run inside a single transaction under the
    /// connection lock, so `rn` is strictly increasing per device even when
    /// requests for the same device arrive concurrently.
    ///
    /// Windows are measured back from `request.created_at`: rows at exactly
    /// `created_at - 1h` still count towards `rn_ph`.
    pub async fn log_request(&self, request: NewDeviceRequest) -> Result<DeviceRequest> {
        let query_params = serde_json::to_string(&request.query_params)?;
        let headers = serde_json::to_string(&request.headers)?;
        let cookies = serde_json::to_string(&request.cookies)?;

        let hour_ago = format_ts(request.created_at - Duration::hours(1));
        let day_ago = format_ts(request.created_at - Duration::hours(24));
        let created_at = format_ts(request.created_at);

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let (total, last_hour, last_24h): (i64, i64, i64) = tx
            .prepare(
                "SELECT COUNT(*), \
                        COUNT(*) FILTER (WHERE created_at >= CAST(?2 AS TIMESTAMP)), \
                        COUNT(*) FILTER (WHERE created_at >= CAST(?3 AS TIMESTAMP)) \
                 FROM device_requests WHERE device_id = ?1",
            )?
            .query_row(
                duckdb::params![request.device_id, hour_ago, day_ago],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        let counts = RequestCounts::following(total, last_hour, last_24h);
        let status = counts.status();

        let id: i64 = tx.query_row(
            r#"INSERT INTO device_requests (
                device_id, endpoint, response_status_code,
                rn, rn_ph, rn_24h,
                status, status_color,
                method, query_params, headers, cookies,
                created_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11, ?12,
                CAST(?13 AS TIMESTAMP)
            ) RETURNING id"#,
            duckdb::params![
                request.device_id,
                request.endpoint,
                i32::from(request.response_status_code),
                counts.rn,
                counts.rn_ph,
                counts.rn_24h,
                status.as_str(),
                status.color(),
                request.method,
                query_params,
                headers,
                cookies,
                created_at,
            ],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM device_requests r WHERE r.id = ?1",
            request_columns("r", true)
        );
        let stored = tx
            .prepare(&sql)?
            .query_row(duckdb::params![id], request_from_row);
        let stored = match stored {
            Ok(row) => row,
            Err(duckdb::Error::QueryReturnedNoRows) => bail!("request {id} vanished after insert"),
            Err(e) => return Err(e.into()),
        };

        tx.commit()?;
        debug!(
            device_id = request.device_id,
            rn = counts.rn,
            rn_ph = counts.rn_ph,
            status = %status,
            "Request logged"
        );
        Ok(stored)
    }
}
