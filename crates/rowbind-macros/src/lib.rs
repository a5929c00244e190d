//! Procedural macros for rowbind.
//!
//! `#[derive(Record)]` builds the per-type field-descriptor table at compile
//! time, so the Type Inspector never has to reflect over a value at runtime.
//!
//! Generated code refers to `::rowbind_core`, so crates deriving `Record`
//! depend on `rowbind-core` directly.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod record_derive;

/// Derive the `Record` trait.
///
/// # Attributes
///
/// On the struct:
/// - `#[rowbind(table = "tb_test")]`: table the record maps to
///
/// On fields:
/// - `#[rowbind(column = "state")]`: map the field onto a column; fields
///   without a column are not mapped
/// - `#[rowbind(default = "auto")]` or `#[rowbind(auto_increment)]`: the
///   database generates the value
/// - `#[rowbind(readonly)]`: the field gets no setter; the binder skips it
///   and query results never write it
///
/// # Example
///
/// ```ignore
/// #[derive(Record, Debug, Default)]
/// #[rowbind(table = "tb_test")]
/// struct TestRecord {
///     #[rowbind(column = "id", default = "auto")]
///     id: i64,
///     #[rowbind(column = "state")]
///     state: i64,
///     #[rowbind(column = "description")]
///     description: String,
///     cache_hits: u32,
/// }
/// ```
#[proc_macro_derive(Record, attributes(rowbind))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match record_derive::parse_record(&input) {
        Ok(def) => record_derive::generate_record_impl(&def).into(),
        Err(e) => e.to_compile_error().into(),
    }
}
