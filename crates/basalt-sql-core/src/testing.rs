//! Engine double for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use crate::engine::{BufferedRows, Engine, Rows};
use crate::error::EngineError;
use crate::row::Row;

/// A scripted engine: escapes by single-quote doubling, replays queued
/// result sets, and records every statement it sees.
#[derive(Default)]
pub(crate) struct StubEngine {
    results: RefCell<VecDeque<Vec<Row>>>,
    statements: RefCell<Vec<String>>,
    next_insert_id: Cell<i64>,
    affected: Cell<u64>,
}

impl StubEngine {
    pub(crate) fn new() -> Self {
        let engine = Self::default();
        engine.next_insert_id.set(1);
        engine
    }

    /// Queues a result set for the next `query` call.
    pub(crate) fn push_rows(&self, rows: Vec<Row>) {
        self.results.borrow_mut().push_back(rows);
    }

    /// Every statement executed so far, in order.
    pub(crate) fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    #[allow(dead_code)]
    pub(crate) fn set_affected(&self, n: u64) {
        self.affected.set(n);
    }

    fn record(&self, sql: &str) {
        self.statements.borrow_mut().push(String::from(sql));
    }
}

impl Engine for StubEngine {
    fn escape_string(&self, text: &str) -> Result<String, EngineError> {
        Ok(text.replace('\'', "''"))
    }

    fn query(&self, sql: &str) -> Result<Box<dyn Rows>, EngineError> {
        self.record(sql);
        let rows = self.results.borrow_mut().pop_front().unwrap_or_default();
        Ok(Box::new(BufferedRows::new(rows)))
    }

    fn execute(&self, sql: &str) -> Result<u64, EngineError> {
        self.record(sql);
        Ok(self.affected.get())
    }

    fn insert(&self, sql: &str) -> Result<i64, EngineError> {
        self.record(sql);
        let id = self.next_insert_id.get();
        self.next_insert_id.set(id + 1);
        Ok(id)
    }

    fn begin(&self) -> Result<(), EngineError> {
        self.record("BEGIN");
        Ok(())
    }

    fn commit(&self) -> Result<(), EngineError> {
        self.record("COMMIT");
        Ok(())
    }

    fn rollback(&self) -> Result<(), EngineError> {
        self.record("ROLLBACK");
        Ok(())
    }

    fn acquire_lock(&self, _name: &str, _timeout: Duration) -> Result<bool, EngineError> {
        Ok(true)
    }

    fn release_lock(&self, _name: &str) -> Result<bool, EngineError> {
        Ok(true)
    }
}
