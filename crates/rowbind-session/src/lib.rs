//! Session facade for rowbind.
//!
//! A [`Session`] is the public entry point: it binds records, generates SQL,
//! runs it on the connection and hydrates the results. Sessions are cheap to
//! clone and safe to share across threads; all clones created from one
//! connection share the same [`TransactionRegistry`].
//!
//! # Design Philosophy
//!
//! - **Blocking**: every call waits for the database round trip; there is no
//!   timeout or cancellation layer
//! - **Transparent transactions**: reads and writes look the same whether or
//!   not the calling thread has begun a transaction
//! - **No retries**: a failed prepare, execute or scan is returned immediately
//!
//! # Example
//!
//! ```ignore
//! let session = Session::new(SqliteDriver.connect(&config)?);
//!
//! let mut record = TestRecord { state: 1, description: "horm".into(), ..Default::default() };
//! let result = session.save(&record)?;
//! record.id = result.last_insert_id;
//!
//! let mut rows = Vec::new();
//! session.list(&mut rows, &["state = 1", "id desc"])?;
//!
//! session.begin()?;
//! session.update_by_id(&record)?;
//! session.commit()?;
//! ```

pub mod hydrate;
pub mod transaction;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use rowbind_core::{
    Connection, Cursor, Error, ExecResult, FieldValue, Record, Result, SessionConfig, Statement,
    type_metadata,
};
use rowbind_query::{RecordBinding, generator};

pub use transaction::TransactionRegistry;

/// A connection together with its transaction registry.
///
/// Every session created from the same `SharedConnection` serializes its
/// transactions through the same registry.
#[derive(Debug)]
pub struct SharedConnection<C> {
    connection: C,
    transactions: TransactionRegistry,
}

impl<C: Connection> SharedConnection<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            transactions: TransactionRegistry::new(),
        }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn transactions(&self) -> &TransactionRegistry {
        &self.transactions
    }
}

/// Entry point for record operations on one connection.
#[derive(Debug)]
pub struct Session<C> {
    shared: Arc<SharedConnection<C>>,
    config: SessionConfig,
}

impl<C> Clone for Session<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            config: self.config,
        }
    }
}

/// Add statement context to driver failures. Errors produced by rowbind
/// itself (cardinality, conversion) keep their own shape.
fn with_context(sql: &str, err: Error, wrap: impl FnOnce(String, Error) -> Error) -> Error {
    match err {
        Error::Driver(_) => wrap(sql.to_string(), err),
        other => other,
    }
}

impl<C: Connection> Session<C> {
    /// Create a session owning a fresh connection.
    pub fn new(connection: C) -> Self {
        Self::with_shared(Arc::new(SharedConnection::new(connection)), SessionConfig::default())
    }

    /// Create a session over a connection shared with other sessions.
    pub fn with_shared(shared: Arc<SharedConnection<C>>, config: SessionConfig) -> Self {
        Self { shared, config }
    }

    /// Set the session configuration.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn shared(&self) -> &Arc<SharedConnection<C>> {
        &self.shared
    }

    // ========================================================================
    // Statement routing
    // ========================================================================

    fn log_statement(&self, sql: &str) {
        if self.config.log_statements {
            tracing::info!(sql, "Executing statement");
        } else {
            tracing::debug!(sql, "Executing statement");
        }
    }

    /// Prepare `sql` on the calling thread's transaction when one is
    /// registered, otherwise on the connection, and hand the statement to `f`.
    fn with_statement<T>(
        &self,
        sql: &str,
        f: impl FnOnce(&mut dyn Statement) -> Result<T>,
    ) -> Result<T> {
        self.log_statement(sql);
        if let Some(transaction) = self.shared.transactions.current() {
            let mut statement = transaction.prepare(sql)?;
            f(statement.as_mut())
        } else {
            let mut statement = self.shared.connection.prepare(sql)?;
            f(statement.as_mut())
        }
    }

    fn execute(&self, sql: &str) -> Result<ExecResult> {
        self.with_statement(sql, |statement| statement.execute())
            .map_err(|e| with_context(sql, e, Error::execution))
    }

    fn query_with<T>(
        &self,
        sql: &str,
        hydrate: impl FnOnce(&mut dyn Cursor) -> Result<T>,
    ) -> Result<T> {
        self.with_statement(sql, |statement| {
            let mut cursor = statement.query()?;
            hydrate(cursor.as_mut())
        })
        .map_err(|e| with_context(sql, e, Error::query))
    }

    // ========================================================================
    // Record operations
    // ========================================================================

    /// Append every row of the record's table matching `fragments` to
    /// `target`.
    ///
    /// Fragments containing `=` are ANDed into the WHERE clause, fragments
    /// with `asc`/`desc` go to ORDER BY; others are dropped. Fragments are
    /// raw SQL and are embedded verbatim.
    #[tracing::instrument(level = "debug", skip(self, target))]
    pub fn list<M: Record + Default>(&self, target: &mut Vec<M>, fragments: &[&str]) -> Result<()> {
        let metadata = type_metadata::<M>()?;
        let sql = generator::list(&metadata, fragments)?;
        let refs = metadata.field_refs();
        let count = self.query_with(&sql, |cursor| hydrate::list(cursor, &refs, target))?;
        tracing::debug!(table = metadata.table_name, rows = count, "Listed records");
        Ok(())
    }

    /// Load the row identified by the record's primary key into `record`.
    ///
    /// Returns `false` and leaves the record unchanged when no row matches.
    #[tracing::instrument(level = "debug", skip(self, record))]
    pub fn find_by_id<M: Record>(&self, record: &mut M) -> Result<bool> {
        let binding = RecordBinding::new(&*record)?;
        let sql = generator::find_by_id(&binding)?;
        self.query_with(&sql, |cursor| hydrate::one(cursor, &binding.refs, record))
    }

    /// Insert the record. An auto-increment key is generated by the database
    /// and reported as `last_insert_id`.
    #[tracing::instrument(level = "debug", skip(self, record))]
    pub fn save<M: Record>(&self, record: &M) -> Result<ExecResult> {
        let binding = RecordBinding::new(record)?;
        let sql = generator::insert(&binding)?;
        let result = self.execute(&sql)?;
        tracing::info!(
            table = binding.table_name,
            last_insert_id = result.last_insert_id,
            "Saved record"
        );
        Ok(result)
    }

    /// Update every bound column of the row identified by the record's key.
    /// Returns the number of rows affected.
    #[tracing::instrument(level = "debug", skip(self, record))]
    pub fn update_by_id<M: Record>(&self, record: &M) -> Result<u64> {
        let binding = RecordBinding::new(record)?;
        let sql = generator::update_by_id(&binding)?;
        Ok(self.execute(&sql)?.rows_affected)
    }

    /// Delete the row identified by the record's key. Returns the number of
    /// rows affected.
    #[tracing::instrument(level = "debug", skip(self, record))]
    pub fn del_by_id<M: Record>(&self, record: &M) -> Result<u64> {
        let binding = RecordBinding::new(record)?;
        let sql = generator::delete_by_id(&binding)?;
        Ok(self.execute(&sql)?.rows_affected)
    }

    // ========================================================================
    // Raw SQL
    // ========================================================================

    /// Run `sql` and decode its single column of at most one row into `target`.
    pub fn query_scalar<T: FieldValue>(&self, sql: &str, target: &mut T) -> Result<bool> {
        self.query_with(sql, |cursor| hydrate::scalar(cursor, target))
    }

    /// Run `sql` and hydrate at most one row into `target`. Columns without a
    /// matching mapped field are ignored.
    pub fn query_one<M: Record>(&self, sql: &str, target: &mut M) -> Result<bool> {
        let refs = type_metadata::<M>()?.field_refs();
        self.query_with(sql, |cursor| hydrate::one(cursor, &refs, target))
    }

    /// Run `sql` and append one record per row to `target`.
    pub fn query_list<M: Record + Default>(&self, sql: &str, target: &mut Vec<M>) -> Result<usize> {
        let refs = type_metadata::<M>()?.field_refs();
        self.query_with(sql, |cursor| hydrate::list(cursor, &refs, target))
    }

    /// Run `sql` and append the single column of every row to `target`.
    pub fn query_scalars<T: FieldValue>(&self, sql: &str, target: &mut Vec<T>) -> Result<usize> {
        self.query_with(sql, |cursor| hydrate::scalars(cursor, target))
    }

    /// Execute a statement that returns no rows.
    pub fn exec(&self, sql: &str) -> Result<ExecResult> {
        self.execute(sql)
    }

    // ========================================================================
    // Transaction Management
    // ========================================================================

    /// Begin a transaction bound to the calling thread.
    ///
    /// Blocks while another thread holds this connection's transaction. The
    /// transaction must be finished with [`Session::commit`] or
    /// [`Session::rollback`] on the same thread.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn begin(&self) -> Result<()> {
        tracing::info!("Beginning transaction");
        self.shared.transactions.begin(&self.shared.connection)
    }

    /// Commit the calling thread's transaction.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn commit(&self) -> Result<()> {
        tracing::info!("Committing transaction");
        self.shared.transactions.commit()
    }

    /// Roll back the calling thread's transaction.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn rollback(&self) -> Result<()> {
        tracing::info!("Rolling back transaction");
        self.shared.transactions.rollback()
    }

    /// Whether the calling thread holds a transaction on this connection.
    pub fn in_transaction(&self) -> bool {
        self.shared.transactions.is_active()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
