//! # basalt-sqlite
//!
//! SQLite-backed [`Engine`] implementation.
//!
//! A deliberately thin adapter: statements pass through verbatim, query
//! results are materialized into [`BufferedRows`] (buffered-result
//! semantics, so cursors can seek and rewind), and string escaping follows
//! SQLite's single-quote doubling rule. Named advisory locks are
//! process-local — SQLite has no server to hold them — but honor the same
//! acquire/release-with-timeout contract as a server-side engine.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::Deserialize;
use tracing::trace;

use basalt_sql_core::{BufferedRows, Engine, EngineError, Row, Rows, Value};

/// Connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file path; `None` opens an in-memory database.
    pub path: Option<PathBuf>,
    /// How long a locked database is retried before a statement fails.
    pub busy_timeout_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: 5_000,
        }
    }
}

/// A SQLite engine over one rusqlite connection.
pub struct SqliteEngine {
    conn: Connection,
    held_locks: Mutex<HashSet<String>>,
}

impl SqliteEngine {
    /// Opens an engine per `config`.
    pub fn connect(config: &SqliteConfig) -> Result<Self, EngineError> {
        let conn = match &config.path {
            Some(path) => Connection::open(path),
            None => Connection::open_in_memory(),
        }
        .map_err(engine_error)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(engine_error)?;
        Ok(Self {
            conn,
            held_locks: Mutex::new(HashSet::new()),
        })
    }

    /// An in-memory database with default settings.
    pub fn open_in_memory() -> Result<Self, EngineError> {
        Self::connect(&SqliteConfig::default())
    }
}

impl Engine for SqliteEngine {
    fn escape_string(&self, text: &str) -> Result<String, EngineError> {
        // Single quotes double; SQLite string literals know no other escape.
        Ok(text.replace('\'', "''"))
    }

    fn query(&self, sql: &str) -> Result<Box<dyn Rows>, EngineError> {
        trace!(target: "basalt::sqlite", sql = %sql, "query");
        let mut stmt = self.conn.prepare(sql).map_err(engine_error)?;
        let names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|name| String::from(*name))
            .collect();
        let mut driver_rows = stmt.query([]).map_err(engine_error)?;
        let mut rows = Vec::new();
        while let Some(raw) = driver_rows.next().map_err(engine_error)? {
            let mut row = Row::new();
            for (idx, name) in names.iter().enumerate() {
                let value = raw.get_ref(idx).map_err(engine_error)?;
                row.push(name.clone(), to_value(value));
            }
            rows.push(row);
        }
        Ok(Box::new(BufferedRows::new(rows)))
    }

    fn execute(&self, sql: &str) -> Result<u64, EngineError> {
        trace!(target: "basalt::sqlite", sql = %sql, "execute");
        let affected = self.conn.execute(sql, []).map_err(engine_error)?;
        Ok(affected as u64)
    }

    fn insert(&self, sql: &str) -> Result<i64, EngineError> {
        trace!(target: "basalt::sqlite", sql = %sql, "insert");
        self.conn.execute(sql, []).map_err(engine_error)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn begin(&self) -> Result<(), EngineError> {
        self.conn.execute_batch("BEGIN").map_err(engine_error)
    }

    fn commit(&self) -> Result<(), EngineError> {
        self.conn.execute_batch("COMMIT").map_err(engine_error)
    }

    fn rollback(&self) -> Result<(), EngineError> {
        self.conn.execute_batch("ROLLBACK").map_err(engine_error)
    }

    fn acquire_lock(&self, name: &str, timeout: Duration) -> Result<bool, EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut registry = lock_registry().lock().map_err(poisoned)?;
                if !registry.contains(name) {
                    registry.insert(String::from(name));
                    self.held_locks
                        .lock()
                        .map_err(poisoned)?
                        .insert(String::from(name));
                    return Ok(true);
                }
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn release_lock(&self, name: &str) -> Result<bool, EngineError> {
        if !self.held_locks.lock().map_err(poisoned)?.remove(name) {
            return Ok(false);
        }
        lock_registry().lock().map_err(poisoned)?.remove(name);
        Ok(true)
    }
}

impl Drop for SqliteEngine {
    fn drop(&mut self) {
        // Locks die with their holder, like server-side advisory locks
        // die with the connection.
        if let (Ok(mut held), Ok(mut registry)) = (self.held_locks.lock(), lock_registry().lock()) {
            for name in held.drain() {
                registry.remove(&name);
            }
        }
    }
}

fn lock_registry() -> &'static Mutex<HashSet<String>> {
    static REGISTRY: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashSet::new()))
}

fn poisoned<T>(_err: std::sync::PoisonError<T>) -> EngineError {
    EngineError::new(None, "advisory lock registry poisoned")
}

fn engine_error(err: rusqlite::Error) -> EngineError {
    match &err {
        rusqlite::Error::SqliteFailure(ffi_err, message) => EngineError::new(
            Some(ffi_err.extended_code),
            message.clone().unwrap_or_else(|| ffi_err.to_string()),
        ),
        other => EngineError::new(None, other.to_string()),
    }
}

fn to_value(raw: ValueRef<'_>) -> Value {
    match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Int(n),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}
