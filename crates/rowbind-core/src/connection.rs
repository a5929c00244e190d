//! Driver boundary.
//!
//! rowbind does not talk to a database itself. Drivers implement these traits:
//! statements are prepared from SQL text, executed for an [`ExecResult`] or
//! queried for a forward-only [`Cursor`] of raw rows. Every call is blocking;
//! there is no timeout or cancellation layer, so a hung network call hangs
//! the caller.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::ConnectConfig;
use crate::error::Result;

/// Outcome of executing a statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Identifier generated by the database for the last inserted row.
    pub last_insert_id: i64,
    /// Number of rows changed by the statement.
    pub rows_affected: u64,
}

/// One returned row: raw column bytes in cursor column order, `None` for NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    values: Vec<Option<Vec<u8>>>,
}

impl RawRow {
    pub fn new(values: Vec<Option<Vec<u8>>>) -> Self {
        Self { values }
    }

    /// Build a row from text values, `None` for NULL.
    pub fn from_text<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        Self {
            values: values
                .into_iter()
                .map(|v| v.map(|s| s.as_bytes().to_vec()))
                .collect(),
        }
    }

    /// Raw bytes of column `index`; `None` for NULL or out of range.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Forward-only handle over the rows of a query.
pub trait Cursor {
    fn columns(&self) -> &[String];

    /// The next row, or `None` once the result set is exhausted.
    fn next_row(&mut self) -> Result<Option<RawRow>>;
}

/// A prepared statement.
pub trait Statement {
    fn execute(&mut self) -> Result<ExecResult>;

    fn query(&mut self) -> Result<Box<dyn Cursor + '_>>;
}

/// Something statements can be prepared on: a connection or a transaction.
pub trait Executor: Send + Sync {
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement + '_>>;
}

/// An in-flight transaction.
pub trait Transaction: Executor {
    fn commit(&self) -> Result<()>;

    fn rollback(&self) -> Result<()>;
}

/// A database connection shared by every thread using a session.
pub trait Connection: Executor {
    /// Open a transaction. The returned handle must be committed or rolled
    /// back; dropping it unfinished leaves the transaction open.
    fn begin(&self) -> Result<Box<dyn Transaction>>;

    fn close(&self) -> Result<()>;
}

/// Opens connections from configuration.
pub trait Driver: Send + Sync {
    type Connection: Connection + 'static;

    fn connect(&self, config: &ConnectConfig) -> Result<Self::Connection>;
}

/// A cursor over rows that were already materialized in memory.
///
/// Drivers whose native row iterators borrow the statement or connection can
/// collect the rows first and hand out this cursor instead.
#[derive(Debug, Clone, Default)]
pub struct BufferedCursor {
    columns: Vec<String>,
    rows: VecDeque<RawRow>,
}

impl BufferedCursor {
    pub fn new(columns: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self {
            columns,
            rows: rows.into(),
        }
    }

    /// Rows not yet returned.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Cursor for BufferedCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<RawRow>> {
        Ok(self.rows.pop_front())
    }
}
