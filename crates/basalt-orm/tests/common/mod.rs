//! Shared fixtures for the integration suites.

use std::cell::RefCell;
use std::time::Duration;

use basalt_orm::Engine;
use basalt_sql_core::{EngineError, Rows};
use basalt_sqlite::SqliteEngine;

/// Wraps the SQLite engine and records every statement, so tests can assert
/// not only results but also which SQL (if any) was issued.
pub struct RecordingEngine {
    inner: SqliteEngine,
    statements: RefCell<Vec<String>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        Self {
            inner: SqliteEngine::open_in_memory().expect("open in-memory database"),
            statements: RefCell::new(Vec::new()),
        }
    }

    /// A fresh engine with the standard `users` table.
    pub fn with_users_table() -> Self {
        let engine = Self::new();
        engine
            .execute(
                "CREATE TABLE users (
                     id INTEGER PRIMARY KEY AUTOINCREMENT,
                     name TEXT,
                     age INTEGER,
                     profile TEXT
                 )",
            )
            .expect("create users table");
        engine.statements.borrow_mut().clear();
        engine
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    pub fn clear_statements(&self) {
        self.statements.borrow_mut().clear();
    }

    fn record(&self, sql: &str) {
        self.statements.borrow_mut().push(String::from(sql));
    }
}

impl Engine for RecordingEngine {
    fn escape_string(&self, text: &str) -> Result<String, EngineError> {
        self.inner.escape_string(text)
    }

    fn query(&self, sql: &str) -> Result<Box<dyn Rows>, EngineError> {
        self.record(sql);
        self.inner.query(sql)
    }

    fn execute(&self, sql: &str) -> Result<u64, EngineError> {
        self.record(sql);
        self.inner.execute(sql)
    }

    fn insert(&self, sql: &str) -> Result<i64, EngineError> {
        self.record(sql);
        self.inner.insert(sql)
    }

    fn begin(&self) -> Result<(), EngineError> {
        self.inner.begin()
    }

    fn commit(&self) -> Result<(), EngineError> {
        self.inner.commit()
    }

    fn rollback(&self) -> Result<(), EngineError> {
        self.inner.rollback()
    }

    fn acquire_lock(&self, name: &str, timeout: Duration) -> Result<bool, EngineError> {
        self.inner.acquire_lock(name, timeout)
    }

    fn release_lock(&self, name: &str) -> Result<bool, EngineError> {
        self.inner.release_lock(name)
    }
}
