use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use duckdb::Connection;

use uadtrack_core::store::{
    DeviceActivity, DeviceFacets, DeviceFilter, DeviceSummary, Page, PageRequest, Pagination,
    RequestFilter, RequestSummary,
};

use crate::device::{device_columns, device_from_row, DEVICE_COLUMN_COUNT};
use crate::requests::{request_columns, request_from_row, REQUEST_COLUMN_COUNT};
use crate::sql::{format_ts, optional, where_clause, SqlParams};
use crate::DuckDbBackend;

fn normalized_search(raw: Option<&str>) -> Option<String> {
    raw.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty())
}

fn device_filter_clauses(filter: &DeviceFilter, params: &mut SqlParams) -> Vec<String> {
    let mut clauses = Vec::new();

    if let Some(search) = normalized_search(filter.search.as_deref()) {
        let exact_id = search.parse::<i64>().ok();
        let needle = params.push(search);
        let mut any = ["user_id", "ip", "key", "name"]
            .iter()
            .map(|c| format!("contains(lower(coalesce(d.{c}, '')), {needle})"))
            .collect::<Vec<_>>();
        if let Some(id) = exact_id {
            any.push(format!("d.id = {}", params.push(id)));
        }
        clauses.push(format!("({})", any.join(" OR ")));
    }

    let flags = [
        ("is_mobile", filter.is_mobile),
        ("is_tablet", filter.is_tablet),
        ("is_touch_capable", filter.is_touch_capable),
        ("is_pc", filter.is_pc),
        ("is_bot", filter.is_bot),
    ];
    for (column, value) in flags {
        if let Some(value) = value {
            clauses.push(format!("d.{column} = {}", params.push(value)));
        }
    }

    let families = [
        ("browser_family", &filter.browser_family),
        ("os_family", &filter.os_family),
        ("device_family", &filter.device_family),
    ];
    for (column, value) in families {
        if let Some(value) = value {
            clauses.push(format!("d.{column} = {}", params.push(value.clone())));
        }
    }

    clauses
}

fn request_filter_clauses(filter: &RequestFilter, params: &mut SqlParams) -> Vec<String> {
    let mut clauses = Vec::new();

    if let Some(search) = normalized_search(filter.search.as_deref()) {
        let exact_id = search.parse::<i64>().ok();
        let needle = params.push(search);
        let mut any = ["user_id", "ip", "key"]
            .iter()
            .map(|c| format!("contains(lower(coalesce(d.{c}, '')), {needle})"))
            .collect::<Vec<_>>();
        if let Some(id) = exact_id {
            any.push(format!("d.id = {}", params.push(id)));
        }
        clauses.push(format!("({})", any.join(" OR ")));
    }
    if let Some(status) = filter.status {
        clauses.push(format!(
            "r.status = {}",
            params.push(status.as_str().to_string())
        ));
    }
    if let Some(code) = filter.response_status_code {
        clauses.push(format!(
            "r.response_status_code = {}",
            params.push(i32::from(code))
        ));
    }
    if let Some(device_id) = filter.device_id {
        clauses.push(format!("r.device_id = {}", params.push(device_id)));
    }

    clauses
}

fn activity_for(conn: &Connection, device_id: i64, now: DateTime<Utc>) -> Result<DeviceActivity> {
    let activity = conn
        .prepare(
            "SELECT COUNT(*), \
                    COUNT(*) FILTER (WHERE created_at >= CAST(?3 AS TIMESTAMP)), \
                    COUNT(*) FILTER (WHERE created_at >= CAST(?2 AS TIMESTAMP)) \
             FROM device_requests WHERE device_id = ?1",
        )?
        .query_row(
            duckdb::params![
                device_id,
                format_ts(now - Duration::hours(1)),
                format_ts(now - Duration::hours(24)),
            ],
            |row| {
                Ok(DeviceActivity {
                    total_requests: row.get(0)?,
                    requests_last_24h: row.get(1)?,
                    requests_last_hour: row.get(2)?,
                })
            },
        )?;
    Ok(activity)
}

fn distinct_values(conn: &Connection, column: &str) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT {column} FROM devices WHERE {column} IS NOT NULL ORDER BY {column}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut values = Vec::new();
    for row in rows {
        values.push(row?);
    }
    Ok(values)
}

impl DuckDbBackend {
    /// Request counts for one device relative to `now`.
    pub async fn device_activity(
        &self,
        device_id: i64,
        now: DateTime<Utc>,
    ) -> Result<DeviceActivity> {
        let conn = self.conn.lock().await;
        activity_for(&conn, device_id, now)
    }

    /// Devices newest first, each with its request counts relative to `now`.
    pub async fn list_devices(
        &self,
        filter: &DeviceFilter,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<Page<DeviceSummary>> {
        let conn = self.conn.lock().await;

        let mut params = SqlParams::default();
        let clauses = device_filter_clauses(filter, &mut params);
        let where_sql = where_clause(&clauses);

        let total: i64 = {
            let sql = format!("SELECT COUNT(*) FROM devices d {where_sql}");
            conn.prepare(&sql)?
                .query_row(params.as_refs().as_slice(), |row| row.get(0))?
        };

        // Page first, then aggregate only the page's request rows.
        let limit = params.push(i64::from(page.limit));
        let offset = params.push(i64::from(page.offset));
        let day_ago = params.push(format_ts(now - Duration::hours(24)));
        let hour_ago = params.push(format_ts(now - Duration::hours(1)));
        let sql = format!(
            "WITH page AS (
                SELECT {columns}, d.created_at AS sort_ts
                FROM devices d
                {where_sql}
                ORDER BY d.created_at DESC, d.id DESC
                LIMIT {limit} OFFSET {offset}
            ),
            activity AS (
                SELECT r.device_id,
                       COUNT(*) AS total_requests,
                       COUNT(*) FILTER (WHERE r.created_at >= CAST({day_ago} AS TIMESTAMP)) AS last_24h,
                       COUNT(*) FILTER (WHERE r.created_at >= CAST({hour_ago} AS TIMESTAMP)) AS last_hour
                FROM device_requests r
                WHERE r.device_id IN (SELECT id FROM page)
                GROUP BY r.device_id
            )
            SELECT page.* EXCLUDE (sort_ts),
                   COALESCE(activity.total_requests, 0),
                   COALESCE(activity.last_24h, 0),
                   COALESCE(activity.last_hour, 0)
            FROM page
            LEFT JOIN activity ON activity.device_id = page.id
            ORDER BY page.sort_ts DESC, page.id DESC",
            columns = device_columns("d"),
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_refs().as_slice(), |row| {
            Ok(DeviceSummary {
                device: device_from_row(row)?,
                activity: DeviceActivity {
                    total_requests: row.get(DEVICE_COLUMN_COUNT)?,
                    requests_last_24h: row.get(DEVICE_COLUMN_COUNT + 1)?,
                    requests_last_hour: row.get(DEVICE_COLUMN_COUNT + 2)?,
                },
            })
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }

        let pagination = Pagination::new(total, page, summaries.len());
        Ok(Page {
            rows: summaries,
            pagination,
        })
    }

    pub async fn device_facets(&self) -> Result<DeviceFacets> {
        let conn = self.conn.lock().await;
        Ok(DeviceFacets {
            browser_family: distinct_values(&conn, "browser_family")?,
            os_family: distinct_values(&conn, "os_family")?,
            device_family: distinct_values(&conn, "device_family")?,
        })
    }

    /// Request log rows newest first, without their JSON payloads.
    pub async fn list_requests(
        &self,
        filter: &RequestFilter,
        page: PageRequest,
    ) -> Result<Page<RequestSummary>> {
        let conn = self.conn.lock().await;

        let mut params = SqlParams::default();
        let clauses = request_filter_clauses(filter, &mut params);
        let where_sql = where_clause(&clauses);

        let total: i64 = {
            let sql = format!(
                "SELECT COUNT(*) FROM device_requests r \
                 JOIN devices d ON d.id = r.device_id {where_sql}"
            );
            conn.prepare(&sql)?
                .query_row(params.as_refs().as_slice(), |row| row.get(0))?
        };

        let limit = params.push(i64::from(page.limit));
        let offset = params.push(i64::from(page.offset));
        let sql = format!(
            "SELECT {columns}, d.name
             FROM device_requests r
             JOIN devices d ON d.id = r.device_id
             {where_sql}
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT {limit} OFFSET {offset}",
            columns = request_columns("r", false),
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_refs().as_slice(), |row| {
            Ok(RequestSummary {
                request: request_from_row(row)?,
                device_name: row.get(REQUEST_COLUMN_COUNT)?,
            })
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }

        let pagination = Pagination::new(total, page, summaries.len());
        Ok(Page {
            rows: summaries,
            pagination,
        })
    }

    /// One request log row including query params, headers, and cookies.
    pub async fn get_request(&self, id: i64) -> Result<Option<RequestSummary>> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {}, d.name FROM device_requests r \
             JOIN devices d ON d.id = r.device_id WHERE r.id = ?1",
            request_columns("r", true)
        );
        let summary = optional(conn.prepare(&sql)?.query_row(duckdb::params![id], |row| {
            Ok(RequestSummary {
                request: request_from_row(row)?,
                device_name: row.get(REQUEST_COLUMN_COUNT)?,
            })
        }))?;
        Ok(summary)
    }
}
