use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::types::{ToSql, Type};

/// DuckDB TIMESTAMP has microsecond precision.
const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format(WRITE_FORMAT).to_string()
}

/// Read a `CAST(ts AS VARCHAR)` column back into a UTC instant.
pub(crate) fn parse_ts(row: &duckdb::Row<'_>, idx: usize) -> duckdb::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, READ_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read an optional JSON-string column.
pub(crate) fn parse_json(
    row: &duckdb::Row<'_>,
    idx: usize,
) -> duckdb::Result<Option<serde_json::Value>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        serde_json::from_str(&s)
            .map_err(|e| duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Turn `QueryReturnedNoRows` into `Ok(None)`.
pub(crate) fn optional<T>(result: duckdb::Result<T>) -> duckdb::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Positional parameters for queries assembled from optional filters.
///
/// `push` returns the `?N` placeholder for the value just added, so a
/// placeholder can be referenced more than once in the SQL text.
#[derive(Default)]
pub(crate) struct SqlParams {
    values: Vec<Box<dyn ToSql>>,
}

impl SqlParams {
    pub(crate) fn push<T: ToSql + 'static>(&mut self, value: T) -> String {
        self.values.push(Box::new(value));
        format!("?{}", self.values.len())
    }

    pub(crate) fn as_refs(&self) -> Vec<&dyn ToSql> {
        self.values.iter().map(|p| p.as_ref()).collect()
    }
}

/// Join `clauses` into a `WHERE ...` fragment, or nothing when empty.
pub(crate) fn where_clause(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    }
}
