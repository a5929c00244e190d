//! SQLite driver for rowbind.
//!
//! Implements the driver boundary over `rusqlite`. One native connection is
//! shared, behind a mutex, by the connection handle, its statements and its
//! transactions. Query results are materialized into a [`BufferedCursor`]
//! before the lock is released.
//!
//! Transactions are plain `BEGIN`/`COMMIT`/`ROLLBACK` on the shared native
//! connection, so a statement issued by another thread while a transaction
//! is open runs inside that transaction.
//!
//! # Example
//!
//! ```ignore
//! let config = ConnectConfig::new().database("app.db");
//! let connection = SqliteDriver.connect(&config)?;
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use rowbind_core::{
    BufferedCursor, ConnectConfig, Connection, Cursor, Driver, Error, ExecResult, Executor, RawRow,
    Result, Statement, Transaction,
};
use rusqlite::types::ValueRef;

/// Database name that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

type Shared = Arc<Mutex<Option<rusqlite::Connection>>>;

/// Run `f` on the native connection, failing if it has been closed.
fn with_native<T>(
    shared: &Shared,
    f: impl FnOnce(&rusqlite::Connection) -> rusqlite::Result<T>,
) -> Result<T> {
    let guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
    let native = guard
        .as_ref()
        .ok_or_else(|| Error::driver("sqlite connection is closed"))?;
    f(native).map_err(Error::driver)
}

/// Opens [`SqliteConnection`]s. `ConnectConfig::database` is the file path;
/// an empty name or `:memory:` opens an in-memory database.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;

    fn connect(&self, config: &ConnectConfig) -> Result<SqliteConnection> {
        SqliteConnection::open(&config.database)
    }
}

/// A connection to a SQLite database.
pub struct SqliteConnection {
    native: Shared,
    path: String,
}

impl SqliteConnection {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let native = if path.is_empty() || path == IN_MEMORY {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(path)
        }
        .map_err(Error::driver)?;

        let path = if path.is_empty() { IN_MEMORY } else { path };
        tracing::info!(path, "Opened SQLite connection");

        Ok(Self {
            native: Arc::new(Mutex::new(Some(native))),
            path: path.to_string(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(IN_MEMORY)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run a batch of `;`-separated statements, e.g. a schema script.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        with_native(&self.native, |native| native.execute_batch(sql))
    }

    pub fn is_closed(&self) -> bool {
        self.native
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Executor for SqliteConnection {
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        Ok(Box::new(SqliteStatement::new(&self.native, sql)))
    }
}

impl Connection for SqliteConnection {
    fn begin(&self) -> Result<Box<dyn Transaction>> {
        with_native(&self.native, |native| native.execute_batch("BEGIN"))?;
        Ok(Box::new(SqliteTransaction {
            native: Arc::clone(&self.native),
        }))
    }

    fn close(&self) -> Result<()> {
        let native = self
            .native
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(native) = native {
            native.close().map_err(|(_, e)| Error::driver(e))?;
            tracing::info!(path = %self.path, "Closed SQLite connection");
        }
        Ok(())
    }
}

/// A transaction on a [`SqliteConnection`].
pub struct SqliteTransaction {
    native: Shared,
}

impl Executor for SqliteTransaction {
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        Ok(Box::new(SqliteStatement::new(&self.native, sql)))
    }
}

impl Transaction for SqliteTransaction {
    fn commit(&self) -> Result<()> {
        with_native(&self.native, |native| native.execute_batch("COMMIT"))
    }

    fn rollback(&self) -> Result<()> {
        with_native(&self.native, |native| native.execute_batch("ROLLBACK"))
    }
}

/// SQL text bound to a connection; compiled by SQLite when run.
pub struct SqliteStatement {
    native: Shared,
    sql: String,
}

impl SqliteStatement {
    fn new(native: &Shared, sql: &str) -> Self {
        Self {
            native: Arc::clone(native),
            sql: sql.to_string(),
        }
    }
}

/// Text form of a SQLite value, as the converter expects it.
fn raw_value(value: ValueRef<'_>) -> Option<Vec<u8>> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string().into_bytes()),
        ValueRef::Real(f) => Some(f.to_string().into_bytes()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(t.to_vec()),
    }
}

impl Statement for SqliteStatement {
    fn execute(&mut self) -> Result<ExecResult> {
        with_native(&self.native, |native| {
            let rows_affected = native.execute(&self.sql, [])?;
            Ok(ExecResult {
                last_insert_id: native.last_insert_rowid(),
                rows_affected: rows_affected as u64,
            })
        })
    }

    fn query(&mut self) -> Result<Box<dyn Cursor + '_>> {
        let cursor = with_native(&self.native, |native| {
            let mut statement = native.prepare(&self.sql)?;
            let columns: Vec<String> = statement
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();
            let width = columns.len();

            let mut rows = statement.query([])?;
            let mut materialized = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(width);
                for index in 0..width {
                    values.push(raw_value(row.get_ref(index)?));
                }
                materialized.push(RawRow::new(values));
            }
            Ok(BufferedCursor::new(columns, materialized))
        })?;
        Ok(Box::new(cursor))
    }
}
