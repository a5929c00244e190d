//! Record Binder.
//!
//! Combines inspected metadata with a live record: every writable mapped
//! field is encoded into a literal, and the primary key is resolved
//! separately. A binding is built per call and discarded after generation.

use indexmap::IndexMap;
use rowbind_core::{Error, FieldRef, Record, Result, TypeMetadata, convert, type_metadata};

/// The resolved primary key of a bound record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundKey {
    pub column: &'static str,
    /// SQL literal of the current key value
    pub literal: String,
    /// Whether the key value is zero, empty or NULL
    pub is_empty: bool,
    pub auto_increment: bool,
}

/// A record ready for SQL generation.
pub struct RecordBinding<M> {
    pub type_name: &'static str,
    pub table_name: &'static str,
    /// Literals of the bound non-key fields, keyed by column, in declaration order
    pub literals: IndexMap<&'static str, String>,
    /// Settable references for the selected columns, primary key first
    pub refs: IndexMap<&'static str, FieldRef<M>>,
    pub primary_key: Option<BoundKey>,
}

impl<M: Record> RecordBinding<M> {
    /// Bind `record` using the metadata from the global registry.
    pub fn new(record: &M) -> Result<Self> {
        let metadata = type_metadata::<M>()?;
        Self::with_metadata(&metadata, record)
    }

    /// Bind `record` against already inspected metadata.
    pub fn with_metadata(metadata: &TypeMetadata<M>, record: &M) -> Result<Self> {
        let mut literals = IndexMap::with_capacity(metadata.fields.len());
        for field in metadata.fields.values() {
            if !field.is_writable() {
                continue;
            }
            let literal = convert::encode(&field.get(record))
                .map_err(|e| Error::bind(field.column, e))?;
            literals.insert(field.column, literal);
        }

        let primary_key = match &metadata.primary_key {
            Some(pk) => {
                if !pk.is_writable() {
                    return Err(Error::PrimaryKeyUnwritable {
                        type_name: metadata.type_name,
                        column: pk.column,
                    });
                }
                let value = pk.get(record);
                Some(BoundKey {
                    column: pk.column,
                    literal: convert::encode(&value).map_err(|e| Error::bind(pk.column, e))?,
                    is_empty: value.is_empty_identifier(),
                    auto_increment: pk.auto_increment,
                })
            }
            None => None,
        };

        Ok(Self {
            type_name: metadata.type_name,
            table_name: metadata.table_name,
            literals,
            refs: metadata.field_refs(),
            primary_key,
        })
    }
}

impl<M> RecordBinding<M> {
    /// Columns to select, in the same order as `refs`.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.refs.keys().copied()
    }
}

impl<M> std::fmt::Debug for RecordBinding<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordBinding")
            .field("table_name", &self.table_name)
            .field("literals", &self.literals)
            .field("refs", &self.refs.keys().collect::<Vec<_>>())
            .field("primary_key", &self.primary_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowbind_core::{FieldDescriptor, FieldKind, FieldValue, Value};

    struct Test {
        id: i64,
        state: i32,
        description: String,
        flag: bool,
    }

    impl Record for Test {
        fn table_name() -> &'static str {
            "tb_test"
        }

        fn field_descriptors() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::new("id", "id", FieldKind::BigInt, |r: &Self| r.id.to_value())
                    .auto_increment(true)
                    .setter(|r: &mut Self, v| {
                        r.id = FieldValue::from_value(v)?;
                        Ok(())
                    }),
                FieldDescriptor::new("state", "state", FieldKind::Int, |r: &Self| {
                    r.state.to_value()
                })
                .setter(|r: &mut Self, v| {
                    r.state = FieldValue::from_value(v)?;
                    Ok(())
                }),
                FieldDescriptor::new("description", "description", FieldKind::Text, |r: &Self| {
                    r.description.to_value()
                })
                .setter(|r: &mut Self, v| {
                    r.description = FieldValue::from_value(v)?;
                    Ok(())
                }),
                // Read-only, so never encoded
                FieldDescriptor::new("flag", "flag", FieldKind::Bool, |r: &Self| r.flag.to_value()),
            ]
        }
    }

    struct LockedKey {
        id: i64,
    }

    impl Record for LockedKey {
        fn table_name() -> &'static str {
            "tb_locked"
        }

        fn field_descriptors() -> Vec<FieldDescriptor<Self>> {
            vec![FieldDescriptor::new(
                "id",
                "id",
                FieldKind::BigInt,
                |r: &Self| r.id.to_value(),
            )]
        }
    }

    struct Flagged {
        id: i64,
        flag: bool,
    }

    impl Record for Flagged {
        fn table_name() -> &'static str {
            "tb_flagged"
        }

        fn field_descriptors() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::new("id", "id", FieldKind::BigInt, |r: &Self| r.id.to_value())
                    .setter(|r: &mut Self, v| {
                        r.id = FieldValue::from_value(v)?;
                        Ok(())
                    }),
                FieldDescriptor::new("flag", "flag", FieldKind::Bool, |r: &Self| {
                    r.flag.to_value()
                })
                .setter(|r: &mut Self, v| {
                    r.flag = FieldValue::from_value(v)?;
                    Ok(())
                }),
            ]
        }
    }

    fn sample(id: i64) -> Test {
        Test {
            id,
            state: 1,
            description: "horm".to_string(),
            flag: true,
        }
    }

    #[test]
    fn test_bind_literals_and_key() {
        let binding = RecordBinding::new(&sample(9)).unwrap();
        assert_eq!(binding.table_name, "tb_test");
        assert_eq!(
            binding.literals.iter().map(|(c, l)| (*c, l.as_str())).collect::<Vec<_>>(),
            vec![("state", "1"), ("description", "'horm'")]
        );
        let pk = binding.primary_key.as_ref().unwrap();
        assert_eq!(pk.column, "id");
        assert_eq!(pk.literal, "9");
        assert!(!pk.is_empty);
        assert!(pk.auto_increment);
    }

    #[test]
    fn test_refs_include_key_and_skip_readonly() {
        let binding = RecordBinding::new(&sample(9)).unwrap();
        assert_eq!(binding.columns().collect::<Vec<_>>(), vec![
            "id",
            "state",
            "description"
        ]);

        let mut target = sample(0);
        binding.refs["description"]
            .set(&mut target, Value::Text("set".to_string()))
            .unwrap();
        assert_eq!(target.description, "set");
    }

    #[test]
    fn test_zero_key_is_empty() {
        let binding = RecordBinding::new(&sample(0)).unwrap();
        assert!(binding.primary_key.unwrap().is_empty);
    }

    #[test]
    fn test_unwritable_key_fails() {
        let err = RecordBinding::new(&LockedKey { id: 1 }).unwrap_err();
        assert!(matches!(err, Error::PrimaryKeyUnwritable {
            column: "id",
            ..
        }));
    }

    #[test]
    fn test_unsupported_field_fails_with_column() {
        let err = RecordBinding::new(&Flagged { id: 1, flag: true }).unwrap_err();
        assert!(matches!(err, Error::Bind { column: "flag", .. }));
        assert!(matches!(err.root(), Error::UnsupportedType { kind: "bool" }));
    }
}
