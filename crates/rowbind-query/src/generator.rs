//! SQL Generator.
//!
//! Pure functions from a [`RecordBinding`] (or, for `List`, inspected
//! metadata plus raw filter fragments) to statement text. Literals are
//! embedded directly; statements are never parameterized, so text fields
//! must not carry untrusted input (see `rowbind_core::convert`).
//!
//! Within one statement every column list enumerates the same columns in the
//! same order: primary key first, then bound fields in declaration order.

use rowbind_core::{Error, Record, Result, TypeMetadata};

use crate::binder::{BoundKey, RecordBinding};
use crate::filter::ListFilter;

/// Substituted for an auto-increment key in the INSERT value list.
pub const GENERATED_KEY_PLACEHOLDER: &str = "NULL";

fn require_table(table_name: &'static str, type_name: &'static str) -> Result<&'static str> {
    if table_name.is_empty() {
        return Err(Error::MissingTableName { type_name });
    }
    Ok(table_name)
}

fn require_columns(columns: Vec<&'static str>, table: &'static str) -> Result<String> {
    if columns.is_empty() {
        return Err(Error::NoFieldsToSelect { table });
    }
    Ok(columns.join(", "))
}

fn require_key<M>(binding: &RecordBinding<M>) -> Result<&BoundKey> {
    binding.primary_key.as_ref().ok_or(Error::MissingPrimaryKey {
        type_name: binding.type_name,
    })
}

/// The key of a binding that must identify an existing row.
fn require_identifier<M>(binding: &RecordBinding<M>) -> Result<&BoundKey> {
    let key = require_key(binding)?;
    if key.is_empty || key.literal.is_empty() {
        return Err(Error::EmptyIdentifier {
            table: binding.table_name,
        });
    }
    Ok(key)
}

/// `INSERT INTO t (id, a, b) VALUES (<id or NULL>, <a>, <b>)`
pub fn insert<M>(binding: &RecordBinding<M>) -> Result<String> {
    let table = require_table(binding.table_name, binding.type_name)?;
    let key = require_key(binding)?;
    if binding.literals.is_empty() {
        return Err(Error::NoFieldsToInsert { table });
    }

    let key_value = if key.auto_increment {
        GENERATED_KEY_PLACEHOLDER
    } else {
        key.literal.as_str()
    };

    let mut columns = Vec::with_capacity(binding.literals.len() + 1);
    let mut values = Vec::with_capacity(binding.literals.len() + 1);
    columns.push(key.column);
    values.push(key_value);
    for (column, literal) in &binding.literals {
        columns.push(*column);
        values.push(literal.as_str());
    }

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        values.join(", ")
    ))
}

/// `SELECT <columns> FROM t WHERE id = <id>`
pub fn find_by_id<M>(binding: &RecordBinding<M>) -> Result<String> {
    let table = require_table(binding.table_name, binding.type_name)?;
    let key = require_identifier(binding)?;
    let columns = require_columns(binding.columns().collect(), table)?;

    Ok(format!(
        "SELECT {} FROM {} WHERE {} = {}",
        columns,
        table,
        key.column,
        key.literal
    ))
}

/// `SELECT <columns> FROM t [WHERE ...] [ORDER BY ...]`
pub fn list<M: Record>(metadata: &TypeMetadata<M>, fragments: &[&str]) -> Result<String> {
    let table = require_table(metadata.table_name, metadata.type_name)?;
    let columns = require_columns(metadata.field_refs().keys().copied().collect(), table)?;
    let filter = ListFilter::parse(fragments);

    Ok(format!(
        "SELECT {} FROM {}{}",
        columns,
        table,
        filter.to_sql()
    ))
}

/// `UPDATE t SET a = <a>, b = <b> WHERE id = <id>`
pub fn update_by_id<M>(binding: &RecordBinding<M>) -> Result<String> {
    let table = require_table(binding.table_name, binding.type_name)?;
    let key = require_identifier(binding)?;
    if binding.literals.is_empty() {
        return Err(Error::NoFieldsToUpdate { table });
    }

    let assignments: Vec<_> = binding
        .literals
        .iter()
        .map(|(column, literal)| format!("{} = {}", column, literal))
        .collect();

    Ok(format!(
        "UPDATE {} SET {} WHERE {} = {}",
        table,
        assignments.join(", "),
        key.column,
        key.literal
    ))
}

/// `DELETE FROM t WHERE id = <id>`
pub fn delete_by_id<M>(binding: &RecordBinding<M>) -> Result<String> {
    let table = require_table(binding.table_name, binding.type_name)?;
    let key = require_identifier(binding)?;

    Ok(format!(
        "DELETE FROM {} WHERE {} = {}",
        table, key.column, key.literal
    ))
}
