//! Scripted in-memory connection for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use rowbind_core::{
    BufferedCursor, Connection, Cursor, Error, ExecResult, Executor, RawRow, Result, Statement,
    Transaction,
};

#[derive(Default)]
struct MockState {
    log: Mutex<Vec<String>>,
    failures: Mutex<HashSet<String>>,
    responses: Mutex<HashMap<String, BufferedCursor>>,
    exec_result: Mutex<ExecResult>,
}

impl MockState {
    fn record(&self, entry: String) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    fn check(&self, key: &str) -> Result<()> {
        let failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        if failures.contains(key) {
            return Err(Error::driver(format!("scripted failure: {key}")));
        }
        Ok(())
    }
}

/// Records every statement and transaction call; statements issued through
/// a transaction are logged with a `[tx] ` prefix.
#[derive(Default)]
pub struct MockConnection {
    state: Arc<MockState>,
}

impl MockConnection {
    pub fn new() -> Self {
        let connection = Self::default();
        connection.set_exec_result(ExecResult {
            last_insert_id: 1,
            rows_affected: 1,
        });
        connection
    }

    /// Make the statement (or `BEGIN`/`COMMIT`/`ROLLBACK`) fail.
    pub fn fail_on(&self, key: &str) {
        self.state
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string());
    }

    pub fn clear_failures(&self) {
        self.state
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Rows returned when `sql` is queried.
    pub fn respond(&self, sql: &str, columns: &[&str], rows: &[&[Option<&str>]]) {
        let cursor = BufferedCursor::new(
            columns.iter().map(|c| (*c).to_string()).collect(),
            rows.iter()
                .map(|row| RawRow::from_text(row.iter().copied()))
                .collect(),
        );
        self.state
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sql.to_string(), cursor);
    }

    pub fn set_exec_result(&self, result: ExecResult) {
        *self
            .state
            .exec_result
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = result;
    }

    pub fn log(&self) -> Vec<String> {
        self.state
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

struct MockStatement {
    state: Arc<MockState>,
    sql: String,
    prefix: &'static str,
}

impl Statement for MockStatement {
    fn execute(&mut self) -> Result<ExecResult> {
        self.state.record(format!("{}{}", self.prefix, self.sql));
        self.state.check(&self.sql)?;
        Ok(*self
            .state
            .exec_result
            .lock()
            .unwrap_or_else(PoisonError::into_inner))
    }

    fn query(&mut self) -> Result<Box<dyn Cursor + '_>> {
        self.state.record(format!("{}{}", self.prefix, self.sql));
        self.state.check(&self.sql)?;
        let cursor = self
            .state
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.sql)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(cursor))
    }
}

fn prepare(state: &Arc<MockState>, sql: &str, prefix: &'static str) -> Box<dyn Statement> {
    Box::new(MockStatement {
        state: Arc::clone(state),
        sql: sql.to_string(),
        prefix,
    })
}

impl Executor for MockConnection {
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        Ok(prepare(&self.state, sql, ""))
    }
}

impl Connection for MockConnection {
    fn begin(&self) -> Result<Box<dyn Transaction>> {
        self.state.record("BEGIN".to_string());
        self.state.check("BEGIN")?;
        Ok(Box::new(MockTransaction {
            state: Arc::clone(&self.state),
        }))
    }

    fn close(&self) -> Result<()> {
        self.state.record("CLOSE".to_string());
        Ok(())
    }
}

struct MockTransaction {
    state: Arc<MockState>,
}

impl Executor for MockTransaction {
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        Ok(prepare(&self.state, sql, "[tx] "))
    }
}

impl Transaction for MockTransaction {
    fn commit(&self) -> Result<()> {
        self.state.record("COMMIT".to_string());
        self.state.check("COMMIT")
    }

    fn rollback(&self) -> Result<()> {
        self.state.record("ROLLBACK".to_string());
        self.state.check("ROLLBACK")
    }
}
