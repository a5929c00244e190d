//! Core types and traits for rowbind.
//!
//! `rowbind-core` is the **foundation layer** of the workspace. It defines the
//! contracts every other crate builds on.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: `Record` is implemented by user types (usually through
//!   `#[derive(Record)]`), `Connection`/`Statement`/`Cursor` by database drivers.
//! - **Type Inspector**: `MetadataRegistry` turns a record's descriptor table
//!   into cached `TypeMetadata`.
//! - **Value Converter**: `convert::encode`/`convert::decode` are the only place
//!   that turns values into SQL literals and raw column bytes back into values.
//!
//! # Who Uses This Crate
//!
//! - `rowbind-macros` generates `Record` implementations defined here.
//! - `rowbind-query` binds records and synthesizes SQL from their metadata.
//! - `rowbind-session` hydrates cursors and routes statements through transactions.
//! - `rowbind-sqlite` implements the driver traits.
//!
//! Most applications should use the `rowbind` facade.

pub mod config;
pub mod connection;
pub mod convert;
pub mod error;
pub mod record;
pub mod registry;
pub mod value;

pub use config::{ConnectConfig, SessionConfig};
pub use connection::{
    BufferedCursor, Connection, Cursor, Driver, ExecResult, Executor, RawRow, Statement,
    Transaction,
};
pub use convert::TIMESTAMP_FORMAT;
pub use error::{Error, Result};
pub use record::{FieldDescriptor, FieldRef, PRIMARY_KEY_COLUMN, Record, TypeMetadata};
pub use registry::{MetadataRegistry, type_metadata};
pub use value::{FieldKind, FieldValue, Value};

pub use chrono::NaiveDateTime;
