//! SQLite-backed annotation store.
//!
//! One `records` table keyed by `(collection, record_id)` holding the record
//! JSON, plus a `collections` table so an empty-but-created collection is
//! distinguishable from a missing one. The database file is the hand-off
//! point with the annotation UI, which edits rows and bumps `last_updated`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use quarry_core::errors::{QuarryResult, StoreError};
use quarry_core::models::{AnnotationRecord, RecordId};
use quarry_core::traits::{AnnotationStore, Clock, SystemClock};

use crate::query::Filter;
use crate::to_store_err;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS collections (
        name        TEXT PRIMARY KEY,
        created_at  TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS records (
        collection    TEXT NOT NULL REFERENCES collections(name),
        record_id     TEXT NOT NULL,
        last_updated  TEXT NOT NULL,
        body          TEXT NOT NULL,
        PRIMARY KEY (collection, record_id)
    );
    DROP INDEX IF EXISTS idx_records_updated;
    CREATE INDEX IF NOT EXISTS idx_records_window
        ON records (collection, julianday(last_updated));
";

/// Window prefilter widening, in days. `julianday` keeps millisecond
/// precision only; the exact bound check runs on the parsed column.
const WINDOW_SLACK_DAYS: f64 = 1.0 / 86_400.0;

/// Rows inside a `julianday` window, plus rows SQLite cannot date at all so
/// they surface as corrupt instead of vanishing.
const WINDOW_QUERY: &str = "
    SELECT record_id, last_updated, body FROM records
     WHERE collection = ?1
       AND julianday(last_updated) >= ?2 AND julianday(last_updated) <= ?3
    UNION ALL
    SELECT record_id, last_updated, body FROM records
     WHERE collection = ?1 AND julianday(last_updated) IS NULL
";

/// SQLite store. A single connection behind a mutex; the loop is
/// single-threaded and the UI writes through its own connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    /// Open (and migrate) a database file.
    pub fn open(path: &Path) -> QuarryResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_store_err(e.to_string()))?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA foreign_keys = ON;
            ",
        )
        .map_err(|e| to_store_err(e.to_string()))?;
        Self::initialize(conn, Arc::new(SystemClock))
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> QuarryResult<Self> {
        Self::open_in_memory_with_clock(Arc::new(SystemClock))
    }

    pub fn open_in_memory_with_clock(clock: Arc<dyn Clock>) -> QuarryResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_store_err(e.to_string()))?;
        Self::initialize(conn, clock)
    }

    fn initialize(conn: Connection, clock: Arc<dyn Clock>) -> QuarryResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| to_store_err(format!("schema: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock,
        })
    }

    /// Apply an annotator edit to one record and bump its `last_updated`.
    /// Returns false if the record does not exist.
    pub fn mutate<F>(&self, collection: &str, id: &RecordId, edit: F) -> QuarryResult<bool>
    where
        F: FnOnce(&mut AnnotationRecord),
    {
        let key = record_key(id)?;
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM records WHERE collection = ?1 AND record_id = ?2",
                params![collection, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| to_store_err(e.to_string()))?;
        let Some(body) = body else {
            return Ok(false);
        };

        let mut record = decode(collection, &key, &body)?;
        edit(&mut record);
        record.id = id.clone();
        let now = self.clock.now();
        record.last_updated = Some(now);

        conn.execute(
            "UPDATE records SET body = ?3, last_updated = ?4
             WHERE collection = ?1 AND record_id = ?2",
            params![collection, key, serde_json::to_string(&record)?, timestamp(now)],
        )
        .map_err(|e| to_store_err(e.to_string()))?;
        Ok(true)
    }

    /// Number of records in a collection (0 if absent).
    pub fn len(&self, collection: &str) -> QuarryResult<usize> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM records WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )
            .map_err(|e| to_store_err(e.to_string()))?;
        Ok(count as usize)
    }
}

impl AnnotationStore for SqliteStore {
    fn write(&self, records: &[AnnotationRecord], collection: &str) -> QuarryResult<usize> {
        let now = self.clock.now();
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tx = conn
            .transaction()
            .map_err(|e| to_store_err(format!("write begin: {e}")))?;

        tx.execute(
            "INSERT OR IGNORE INTO collections (name, created_at) VALUES (?1, ?2)",
            params![collection, timestamp(now)],
        )
        .map_err(|e| to_store_err(e.to_string()))?;

        for record in records {
            let mut stored = record.clone();
            stored.last_updated = Some(now);
            tx.execute(
                "INSERT INTO records (collection, record_id, last_updated, body)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (collection, record_id)
                 DO UPDATE SET last_updated = excluded.last_updated, body = excluded.body",
                params![
                    collection,
                    record_key(&stored.id)?,
                    timestamp(now),
                    serde_json::to_string(&stored)?
                ],
            )
            .map_err(|e| to_store_err(e.to_string()))?;
        }

        tx.commit()
            .map_err(|e| to_store_err(format!("write commit: {e}")))?;
        tracing::debug!(collection, written = records.len(), "records written");
        Ok(records.len())
    }

    fn query(&self, collection: &str, filter: &str) -> QuarryResult<Vec<AnnotationRecord>> {
        let parsed = Filter::parse(filter)?;
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;

        let exists: Option<String> = conn
            .query_row(
                "SELECT name FROM collections WHERE name = ?1",
                params![collection],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| to_store_err(e.to_string()))?;
        if exists.is_none() {
            return Err(StoreError::CollectionNotFound {
                collection: collection.to_string(),
            }
            .into());
        }

        let (after, before) = parsed.last_updated_bounds();
        let lower = after.map_or(f64::MIN, |t| julian_day(t) - WINDOW_SLACK_DAYS);
        let upper = before.map_or(f64::MAX, |t| julian_day(t) + WINDOW_SLACK_DAYS);

        let mut stmt = conn
            .prepare(WINDOW_QUERY)
            .map_err(|e| to_store_err(e.to_string()))?;
        let rows = stmt
            .query_map(params![collection, lower, upper], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| to_store_err(e.to_string()))?;

        let mut matched = Vec::new();
        for row in rows {
            let (key, updated, body) = row.map_err(|e| to_store_err(e.to_string()))?;
            let mut record = decode(collection, &key, &body)?;
            // The column is authoritative: the UI may only touch it.
            record.last_updated = Some(parse_column(collection, &key, &updated)?);
            if parsed.matches(&record) {
                matched.push((key, record));
            }
        }
        matched.sort_by(|(a_key, a), (b_key, b)| {
            a.last_updated
                .cmp(&b.last_updated)
                .then_with(|| a_key.cmp(b_key))
        });
        tracing::trace!(collection, hits = matched.len(), "window query");
        Ok(matched.into_iter().map(|(_, record)| record).collect())
    }
}

/// Storage key for a record id. JSON-encoded so `1` and `"1"` stay distinct.
fn record_key(id: &RecordId) -> QuarryResult<String> {
    Ok(serde_json::to_string(id)?)
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a `last_updated` column value. Accepts RFC 3339 as written by the
/// store and SQLite's native `YYYY-MM-DD HH:MM:SS[.fff]` form (UTC), which is
/// what `datetime('now')` and `CURRENT_TIMESTAMP` produce.
fn parse_column(collection: &str, key: &str, value: &str) -> QuarryResult<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            StoreError::CorruptRecord {
                collection: collection.to_string(),
                id: key.to_string(),
                reason: format!("unreadable last_updated `{value}`"),
            }
            .into()
        })
}

/// Julian day number as SQLite's `julianday()` computes it.
fn julian_day(time: DateTime<Utc>) -> f64 {
    time.timestamp_micros() as f64 / 86_400_000_000.0 + 2_440_587.5
}

fn decode(collection: &str, key: &str, body: &str) -> QuarryResult<AnnotationRecord> {
    serde_json::from_str(body).map_err(|e| {
        StoreError::CorruptRecord {
            collection: collection.to_string(),
            id: key.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use quarry_core::models::RecordStatus;

    use super::*;

    #[test]
    fn unknown_collection_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.query("missing", "*").unwrap_err().is_not_found());
    }

    #[test]
    fn created_empty_collection_is_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.write(&[], "batches").unwrap();
        assert!(store.query("batches", "*").unwrap().is_empty());
    }

    #[test]
    fn int_and_text_ids_do_not_collide() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .write(
                &[
                    AnnotationRecord::new(RecordId::Int(1), "int"),
                    AnnotationRecord::new("1", "text"),
                ],
                "seed",
            )
            .unwrap();
        assert_eq!(store.len("seed").unwrap(), 2);
    }

    #[test]
    fn mutate_round_trips_through_json() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .write(&[AnnotationRecord::new("0_0", "q")], "batches")
            .unwrap();
        assert!(store
            .mutate("batches", &"0_0".into(), |r| {
                r.status = RecordStatus::Validated;
                r.annotation = Some("DESC".into());
            })
            .unwrap());
        let hits = store
            .query("batches", "status:Validated AND annotation:DESC")
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn sqlite_native_timestamps_parse_as_utc() {
        let parsed = parse_column("batches", "\"0_0\"", "2099-01-01 12:30:00").unwrap();
        assert_eq!(timestamp(parsed), "2099-01-01T12:30:00.000000Z");
        let fractional = parse_column("batches", "\"0_0\"", "2099-01-01 12:30:00.250").unwrap();
        assert_eq!(fractional.timestamp_subsec_millis(), 250);
        assert!(parse_column("batches", "\"0_0\"", "yesterday").is_err());
    }

    #[test]
    fn julian_day_agrees_with_sqlite() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.conn.lock().unwrap();
        let at = DateTime::parse_from_rfc3339("2024-03-01T06:00:00.500Z")
            .unwrap()
            .with_timezone(&Utc);
        let sqlite: f64 = conn
            .query_row("SELECT julianday(?1)", params![timestamp(at)], |row| row.get(0))
            .unwrap();
        assert!((sqlite - julian_day(at)).abs() < WINDOW_SLACK_DAYS / 1000.0);
    }

    #[test]
    fn window_query_uses_the_expression_index() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!("EXPLAIN QUERY PLAN {WINDOW_QUERY}"))
            .unwrap();
        let details: Vec<String> = stmt
            .query_map(params!["batches", 0.0, 1.0], |row| row.get::<_, String>(3))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(
            details.iter().any(|d| d.contains("idx_records_window")),
            "plan: {details:?}"
        );
        assert!(!details.iter().any(|d| d.starts_with("SCAN records")), "plan: {details:?}");
    }
}
