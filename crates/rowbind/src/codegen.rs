//! Record source generation from a live table.
//!
//! Reads a table description (`DESC <table>`, as MySQL reports it) and
//! formats a `#[derive(Record)]` struct for it.

use rowbind_core::{Connection, Result};
use rowbind_macros::Record;
use rowbind_session::Session;

/// One row of a table description.
#[derive(Record, Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSchema {
    #[rowbind(column = "Field")]
    pub field: String,
    #[rowbind(column = "Type")]
    pub column_type: String,
    /// `auto_increment` and similar flags; empty when the database does not
    /// report them
    #[rowbind(column = "Extra")]
    pub extra: String,
}

impl ColumnSchema {
    pub fn new(field: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            column_type: column_type.into(),
            extra: String::new(),
        }
    }

    pub fn extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    fn is_auto_increment(&self) -> bool {
        self.extra.to_ascii_lowercase().contains("auto_increment")
    }
}

/// Describe the columns of `table`.
#[tracing::instrument(level = "debug", skip(session))]
pub fn describe_table<C: Connection>(
    session: &Session<C>,
    table: &str,
) -> Result<Vec<ColumnSchema>> {
    let mut columns = Vec::new();
    session.query_list(&format!("DESC {table}"), &mut columns)?;
    Ok(columns)
}

/// Rust type for a database column type, or `None` when unsupported.
fn rust_type(column_type: &str) -> Option<&'static str> {
    let lower = column_type.to_ascii_lowercase();
    let base = lower
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    match base {
        "tinyint" | "smallint" | "mediumint" | "int" | "bigint" | "integer" => Some("i64"),
        b if b.ends_with("char") || b.ends_with("text") => Some("String"),
        "timestamp" | "datetime" => Some("NaiveDateTime"),
        "float" | "double" | "decimal" | "real" | "numeric" => Some("f64"),
        _ => None,
    }
}

/// Lowercase the column name into a field identifier.
fn field_ident(column: &str) -> String {
    let ident: String = column
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{ident}")
    } else {
        ident
    }
}

/// Format a record struct named `struct_name` for `table`.
///
/// Columns whose type has no field mapping are listed as comments.
pub fn render_record(struct_name: &str, table: &str, columns: &[ColumnSchema]) -> String {
    let mut out = String::new();
    out.push_str("#[derive(Record, Debug, Clone, Default)]\n");
    out.push_str(&format!("#[rowbind(table = \"{table}\")]\n"));
    out.push_str(&format!("pub struct {struct_name} {{\n"));
    for column in columns {
        let Some(ty) = rust_type(&column.column_type) else {
            out.push_str(&format!(
                "    // skipped `{}`: unsupported type `{}`\n",
                column.field, column.column_type
            ));
            continue;
        };
        if column.is_auto_increment() {
            out.push_str(&format!(
                "    #[rowbind(column = \"{}\", default = \"auto\")]\n",
                column.field
            ));
        } else {
            out.push_str(&format!("    #[rowbind(column = \"{}\")]\n", column.field));
        }
        out.push_str(&format!("    pub {}: {ty},\n", field_ident(&column.field)));
    }
    out.push('}');
    out
}

/// Describe `table` and format a record struct for it.
pub fn generate_record<C: Connection>(
    session: &Session<C>,
    table: &str,
    struct_name: &str,
) -> Result<String> {
    let columns = describe_table(session, table)?;
    tracing::debug!(table, columns = columns.len(), "Generating record source");
    Ok(render_record(struct_name, table, &columns))
}
