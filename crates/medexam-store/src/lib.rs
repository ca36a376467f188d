//! medexam-store — SQLite persistence behind an r2d2 pool.
//!
//! The store enforces no business rules; it maps rows to the core model
//! types and back. All workflow decisions (authorization, transitions,
//! scoring) happen in `medexam-core` before anything is written here.

pub mod attempts;
pub mod catalog;
pub mod questions;
pub mod schema;

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use r2d2_sqlite::SqliteConnectionManager;

use medexam_core::error::{CoreError, CoreResult};

pub type SqlitePool = r2d2::Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Handle to the database. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) a file-backed database and bootstrap the
    /// schema.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")
        });
        let pool = r2d2::Pool::builder()
            .max_size(8)
            .build(manager)
            .map_err(internal("building connection pool"))?;
        let store = Store { pool };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory database for tests. Single-connection pool: separate
    /// SQLite `:memory:` connections do not share data.
    pub fn open_in_memory() -> CoreResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = r2d2::Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(internal("building in-memory pool"))?;
        let store = Store { pool };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> CoreResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(schema::SCHEMA)
            .map_err(internal("bootstrapping schema"))
    }

    pub(crate) fn conn(&self) -> CoreResult<PooledConnection> {
        self.pool.get().map_err(internal("acquiring connection"))
    }
}

/// Map a storage-layer failure into the core's internal error variant.
pub(crate) fn internal<E>(context: &'static str) -> impl FnOnce(E) -> CoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |e| CoreError::Internal(anyhow::Error::new(e).context(context))
}

/// Parse an enum column inside a `query_map` closure.
pub(crate) fn parse_col<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

/// Parse an RFC3339 timestamp column.
pub(crate) fn parse_ts(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

/// Parse an optional JSON text column.
pub(crate) fn parse_json_opt(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<serde_json::Value>> {
    raw.map(|s| {
        serde_json::from_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
    })
    .transpose()
}

/// Current time encoded the way every timestamp column stores it.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
