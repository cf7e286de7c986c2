//! libSQL backend for the `Database` trait.
//!
//! Uses a local database file. Every connection enables foreign keys so the
//! cascade and restrict rules in the schema hold.

mod legal_practice;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use libsql::{Connection, Row, Value};

use crate::db::Database;
use crate::db::libsql_migrations::SCHEMA;
use crate::error::DatabaseError;

pub struct LibSqlBackend {
    db: libsql::Database,
    path: PathBuf,
}

impl LibSqlBackend {
    /// Open (or create) a database file at `path`.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!(
                    "failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn connect(&self) -> Result<Connection, DatabaseError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;").await?;
        Ok(conn)
    }
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let conn = self.connect().await?;
        conn.execute_batch(SCHEMA)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(())
    }
}

// ==================== Row helpers ====================

pub(crate) fn get_text(row: &Row, idx: i32) -> String {
    match row.get_value(idx) {
        Ok(Value::Text(value)) => value,
        _ => String::new(),
    }
}

pub(crate) fn get_opt_text(row: &Row, idx: i32) -> Option<String> {
    match row.get_value(idx) {
        Ok(Value::Text(value)) => Some(value),
        _ => None,
    }
}

pub(crate) fn get_i64(row: &Row, idx: i32) -> i64 {
    match row.get_value(idx) {
        Ok(Value::Integer(value)) => value,
        _ => 0,
    }
}

pub(crate) fn opt_text(value: Option<&str>) -> Value {
    match value {
        Some(text) => Value::Text(text.to_string()),
        None => Value::Null,
    }
}

/// Fixed-width UTC timestamp so string comparison orders chronologically.
pub(crate) fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn fmt_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Serialization(format!("invalid timestamp '{}': {}", raw, e)))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| DatabaseError::Serialization(format!("invalid date '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use libsql::params;

    use super::*;

    #[test]
    fn timestamps_sort_lexicographically() {
        let early = Utc.with_ymd_and_hms(2026, 3, 2, 9, 5, 0).single().expect("ts");
        let late = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).single().expect("ts");
        assert!(fmt_ts(&early) < fmt_ts(&late));
        assert_eq!(fmt_ts(&early), "2026-03-02T09:05:00.000Z");
        assert_eq!(parse_timestamp(&fmt_ts(&early)).expect("parse"), early);
    }

    #[test]
    fn parse_timestamp_accepts_sqlite_datetime_format() {
        let parsed = parse_timestamp("2026-03-02 09:05:00").expect("sqlite datetime");
        assert_eq!(
            parsed,
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 5, 0).single().expect("ts")
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn migrations_create_tables_and_are_idempotent() {
        let tmpdir = tempfile::tempdir().expect("tempdir");
        let backend = LibSqlBackend::new_local(&tmpdir.path().join("nested/schema.db"))
            .await
            .expect("backend");
        backend.run_migrations().await.expect("first migration");
        backend.run_migrations().await.expect("second migration");

        let conn = backend.connect().await.expect("connect");
        for table in [
            "clients",
            "matters",
            "deadline_types",
            "deadlines",
            "reminder_logs",
        ] {
            let row = conn
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    params![table],
                )
                .await
                .expect("query sqlite_master")
                .next()
                .await
                .expect("row read");
            assert!(row.is_some(), "missing table {table}");
        }
    }
}
