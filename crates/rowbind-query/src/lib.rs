//! Record binding and SQL generation for rowbind.
//!
//! `rowbind-query` sits between the Type Inspector and the session:
//!
//! - [`binder`] turns a live record into a [`RecordBinding`]: column literals,
//!   settable references and the resolved primary key.
//! - [`generator`] synthesizes INSERT/SELECT/UPDATE/DELETE text from a binding.
//! - [`filter`] sorts the raw fragments accepted by `List` into WHERE and
//!   ORDER BY clauses.
//!
//! Nothing here performs I/O.

pub mod binder;
pub mod filter;
pub mod generator;

pub use binder::{BoundKey, RecordBinding};
pub use filter::{FragmentKind, ListFilter};
pub use generator::GENERATED_KEY_PLACEHOLDER;
