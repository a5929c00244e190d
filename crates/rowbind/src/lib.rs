//! rowbind maps typed records onto rows of a relational table.
//!
//! Records declare their table and column mapping with `#[derive(Record)]`.
//! A [`Session`] turns a record into `INSERT`/`SELECT`/`UPDATE`/`DELETE`
//! statements, runs them on its connection and hydrates the results back
//! into records, scalars or lists of either. Transactions are bound to the
//! calling thread: once a thread calls [`Session::begin`], every statement it
//! issues through any session on that connection runs inside the transaction.
//!
//! # Quick Start
//!
//! ```ignore
//! use rowbind::prelude::*;
//!
//! #[derive(Record, Debug, Default)]
//! #[rowbind(table = "tb_test")]
//! struct TestRecord {
//!     #[rowbind(column = "id", default = "auto")]
//!     id: i64,
//!     #[rowbind(column = "state")]
//!     state: i32,
//!     #[rowbind(column = "description")]
//!     description: String,
//! }
//!
//! let session = fast_create(SqliteDriver, &ConnectConfig::new().database("app.db"))?;
//!
//! let mut record = TestRecord { state: 1, description: "horm".into(), ..Default::default() };
//! record.id = session.save(&record)?.last_insert_id;
//!
//! let mut rows = Vec::new();
//! session.list(&mut rows, &["state = 1", "id desc"])?;
//! ```
//!
//! The derive expands to paths under `rowbind_core`, so crates deriving
//! `Record` depend on `rowbind-core` alongside this crate.
//!
//! # Known limitations
//!
//! - Field values are embedded into statements as literals without
//!   escaping; a `'` inside text breaks the statement. There are no bound
//!   parameters, and list filter fragments are raw SQL.
//! - Every call blocks on the database round trip; there is no timeout or
//!   cancellation.
//! - At most one transaction is in flight per connection.

pub mod codegen;
pub mod manager;

pub use rowbind_core::{
    BufferedCursor, ConnectConfig, Connection, Cursor, Driver, Error, ExecResult, Executor,
    FieldDescriptor, FieldKind, FieldRef, FieldValue, MetadataRegistry, NaiveDateTime,
    PRIMARY_KEY_COLUMN, RawRow, Record, Result, SessionConfig, Statement, TIMESTAMP_FORMAT,
    Transaction, TypeMetadata, Value, convert, type_metadata,
};
pub use rowbind_macros::Record;
pub use rowbind_query::{
    BoundKey, FragmentKind, GENERATED_KEY_PLACEHOLDER, ListFilter, RecordBinding, generator,
};
pub use rowbind_session::{Session, SharedConnection, TransactionRegistry, hydrate};
pub use rowbind_sqlite::{SqliteConnection, SqliteDriver};

pub use codegen::{ColumnSchema, describe_table, generate_record, render_record};
pub use manager::{ConnectionId, Manager, fast_create};

/// Commonly used items.
pub mod prelude {
    pub use crate::codegen::generate_record;
    pub use crate::manager::{ConnectionId, Manager, fast_create};
    pub use rowbind_core::{
        ConnectConfig, Connection, Driver, Error, ExecResult, FieldValue, NaiveDateTime, Record,
        Result, SessionConfig, Value,
    };
    pub use rowbind_macros::Record;
    pub use rowbind_session::Session;
    pub use rowbind_sqlite::SqliteDriver;
}
