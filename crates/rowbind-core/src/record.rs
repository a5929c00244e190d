//! Record and field definitions.
//!
//! A record type describes its mapped fields once through
//! [`Record::field_descriptors`], normally generated by `#[derive(Record)]`.
//! The Type Inspector (see [`crate::registry`]) turns that table into an
//! immutable [`TypeMetadata`] cached per type.

use indexmap::IndexMap;

use crate::error::Result;
use crate::value::{FieldKind, Value};

/// The reserved column name that marks a field as the primary key.
pub const PRIMARY_KEY_COLUMN: &str = "id";

/// Reads a field out of a record.
pub type Getter<M> = fn(&M) -> Value;

/// Writes a decoded value into a record field.
pub type Setter<M> = fn(&mut M, Value) -> Result<()>;

/// A typed record mapped onto rows of one table.
///
/// # Example
///
/// ```ignore
/// #[derive(Record, Default)]
/// #[rowbind(table = "tb_test")]
/// struct TestRecord {
///     #[rowbind(column = "id", default = "auto")]
///     id: i64,
///     #[rowbind(column = "state")]
///     state: i64,
///     #[rowbind(column = "description")]
///     description: String,
/// }
/// ```
pub trait Record: Sized + Send + Sync + 'static {
    /// The table this record maps to. Empty when the type does not declare
    /// one, in which case statement generation fails.
    fn table_name() -> &'static str {
        ""
    }

    /// The mapped fields of this type, in declaration order.
    fn field_descriptors() -> Vec<FieldDescriptor<Self>>;
}

/// Metadata and accessors for a single mapped field.
pub struct FieldDescriptor<M> {
    /// Rust field name
    pub name: &'static str,
    /// Database column name
    pub column: &'static str,
    /// Semantic kind of the field
    pub kind: FieldKind,
    /// Whether the database generates this value (only meaningful on the primary key)
    pub auto_increment: bool,
    getter: Getter<M>,
    setter: Option<Setter<M>>,
}

impl<M> FieldDescriptor<M> {
    /// Create a read-only descriptor; add a setter with [`FieldDescriptor::setter`].
    pub const fn new(
        name: &'static str,
        column: &'static str,
        kind: FieldKind,
        getter: Getter<M>,
    ) -> Self {
        Self {
            name,
            column,
            kind,
            auto_increment: false,
            getter,
            setter: None,
        }
    }

    /// Make the field writable.
    pub const fn setter(mut self, setter: Setter<M>) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Set auto-increment flag.
    pub const fn auto_increment(mut self, value: bool) -> Self {
        self.auto_increment = value;
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.column == PRIMARY_KEY_COLUMN
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Read the current value of this field.
    pub fn get(&self, record: &M) -> Value {
        (self.getter)(record)
    }

    /// The setter, if the field is writable.
    pub fn field_ref(&self) -> Option<FieldRef<M>> {
        self.setter.map(|set| FieldRef {
            kind: self.kind,
            set,
        })
    }
}

impl<M> Clone for FieldDescriptor<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for FieldDescriptor<M> {}

impl<M> std::fmt::Debug for FieldDescriptor<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("kind", &self.kind)
            .field("auto_increment", &self.auto_increment)
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// A settable reference to one field of any record of type `M`.
pub struct FieldRef<M> {
    pub kind: FieldKind,
    set: Setter<M>,
}

impl<M> FieldRef<M> {
    pub fn set(&self, record: &mut M, value: Value) -> Result<()> {
        (self.set)(record, value)
    }
}

impl<M> Clone for FieldRef<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for FieldRef<M> {}

impl<M> std::fmt::Debug for FieldRef<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRef").field("kind", &self.kind).finish()
    }
}

/// Inspected metadata of one record type. Built once, then immutable.
pub struct TypeMetadata<M> {
    /// Fully qualified Rust type name
    pub type_name: &'static str,
    /// Table name, empty if the type declares none
    pub table_name: &'static str,
    /// Mapped non-key fields keyed by Rust field name, in declaration order
    pub fields: IndexMap<&'static str, FieldDescriptor<M>>,
    /// The field mapped to the `id` column
    pub primary_key: Option<FieldDescriptor<M>>,
}

impl<M> TypeMetadata<M> {
    /// Settable references for every writable mapped column, primary key first.
    pub fn field_refs(&self) -> IndexMap<&'static str, FieldRef<M>> {
        self.primary_key
            .iter()
            .chain(self.fields.values())
            .filter_map(|field| field.field_ref().map(|r| (field.column, r)))
            .collect()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.primary_key
            .iter()
            .chain(self.fields.values())
            .map(|field| field.column)
            .collect()
    }
}

impl<M> std::fmt::Debug for TypeMetadata<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("type_name", &self.type_name)
            .field("table_name", &self.table_name)
            .field("fields", &self.fields)
            .field("primary_key", &self.primary_key)
            .finish()
    }
}
