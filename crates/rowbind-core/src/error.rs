//! Error types shared by every rowbind layer.
//!
//! Layers above the converter add context (column, statement text, operation)
//! by wrapping the cause in one of the context variants. `Error::root` walks
//! back to the innermost rowbind error when a caller needs to match on the
//! original failure.

use thiserror::Error;

use crate::value::FieldKind;

/// Main error type for rowbind operations.
#[derive(Error, Debug)]
pub enum Error {
    /// An identifier-based operation was used on a type without an `id` column.
    #[error("type {type_name} has no primary key column")]
    MissingPrimaryKey { type_name: &'static str },

    /// The primary key of the record is zero or empty.
    #[error("primary key of {table} can not be empty")]
    EmptyIdentifier { table: &'static str },

    /// The record type did not provide a table name.
    #[error("type {type_name} has no table name")]
    MissingTableName { type_name: &'static str },

    /// Nothing bound for an INSERT.
    #[error("there is no field to insert into {table}")]
    NoFieldsToInsert { table: &'static str },

    /// Nothing bound for an UPDATE.
    #[error("there is no field to update in {table}")]
    NoFieldsToUpdate { table: &'static str },

    /// No settable column to SELECT into.
    #[error("there is no field to select from {table}")]
    NoFieldsToSelect { table: &'static str },

    /// The primary key field has no setter.
    #[error("primary key {column} of {type_name} is not writable")]
    PrimaryKeyUnwritable {
        type_name: &'static str,
        column: &'static str,
    },

    /// The value kind has no SQL literal form.
    #[error("unsupported value kind: {kind}")]
    UnsupportedType { kind: &'static str },

    /// A raw column value could not be parsed into the target kind.
    #[error("can not convert {raw:?} into {kind}")]
    ValueConversion { kind: FieldKind, raw: String },

    /// Metadata for a record type could not be built.
    #[error("struct info for {type_name} is unavailable: {reason}")]
    StructInfoUnavailable {
        type_name: &'static str,
        reason: String,
    },

    /// A single-result target received more than one row.
    #[error("select one but found more")]
    MultipleRowsForSingleResult,

    /// A scalar target received the wrong number of columns.
    #[error("expected {expected} column(s) but found {found}")]
    ColumnCount { expected: usize, found: usize },

    /// Encoding a field while binding a record failed.
    #[error("failed to bind column {column}")]
    Bind {
        column: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// Decoding a returned column into a target failed.
    #[error("failed to set column {column}")]
    Hydrate {
        column: String,
        #[source]
        source: Box<Error>,
    },

    /// Preparing or executing a statement failed.
    #[error("execute sql error: {sql}")]
    Execution {
        sql: String,
        #[source]
        source: Box<Error>,
    },

    /// Preparing, running or reading a query failed.
    #[error("query sql error: {sql}")]
    Query {
        sql: String,
        #[source]
        source: Box<Error>,
    },

    /// The driver failed to begin, commit or roll back.
    #[error("transaction {op} failed")]
    Transaction {
        op: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// Commit or rollback without a transaction bound to the calling thread.
    #[error("no transaction is active on this thread")]
    NoActiveTransaction,

    /// Begin on a thread that already holds a transaction.
    #[error("a transaction is already active on this thread")]
    TransactionAlreadyActive,

    /// The manager does not know the connection id.
    #[error("unknown connection id {0}")]
    UnknownConnection(u64),

    /// Invalid connection configuration.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Error reported by the underlying driver.
    #[error("driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap any driver error.
    pub fn driver(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Driver(err.into())
    }

    pub fn bind(column: &'static str, source: Error) -> Self {
        Error::Bind {
            column,
            source: Box::new(source),
        }
    }

    pub fn hydrate(column: impl Into<String>, source: Error) -> Self {
        Error::Hydrate {
            column: column.into(),
            source: Box::new(source),
        }
    }

    pub fn execution(sql: impl Into<String>, source: Error) -> Self {
        Error::Execution {
            sql: sql.into(),
            source: Box::new(source),
        }
    }

    pub fn query(sql: impl Into<String>, source: Error) -> Self {
        Error::Query {
            sql: sql.into(),
            source: Box::new(source),
        }
    }

    pub fn transaction(op: &'static str, source: Error) -> Self {
        Error::Transaction {
            op,
            source: Box::new(source),
        }
    }

    /// The innermost rowbind error beneath any context wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Bind { source, .. }
            | Error::Hydrate { source, .. }
            | Error::Execution { source, .. }
            | Error::Query { source, .. }
            | Error::Transaction { source, .. } => source.root(),
            other => other,
        }
    }

    /// Format error with full details including the error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for rowbind operations.
pub type Result<T> = std::result::Result<T, Error>;
