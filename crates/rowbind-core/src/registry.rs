//! Type Inspector: builds and caches [`TypeMetadata`] per record type.
//!
//! Metadata is computed at most once per registry and type. The first build
//! for a type runs under the write lock with a double check, so concurrent
//! first-time inspections converge on a single instance.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::record::{Record, TypeMetadata};

type Cached = Arc<dyn Any + Send + Sync>;

/// Read-through cache of inspected record types.
#[derive(Default)]
pub struct MetadataRegistry {
    cache: RwLock<HashMap<TypeId, Cached>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by the binder and the session.
    pub fn global() -> &'static MetadataRegistry {
        static REGISTRY: OnceLock<MetadataRegistry> = OnceLock::new();
        REGISTRY.get_or_init(MetadataRegistry::new)
    }

    /// Fetch the metadata for `M`, inspecting the type on first use.
    pub fn get_or_inspect<M: Record>(&self) -> Result<Arc<TypeMetadata<M>>> {
        let key = TypeId::of::<M>();

        // Fast path: already inspected
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.get(&key) {
                return downcast(cached);
            }
        }

        // Slow path: inspect under the write lock so only one build wins
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        match cache.entry(key) {
            Entry::Occupied(entry) => downcast(entry.get()),
            Entry::Vacant(entry) => {
                let metadata = Arc::new(inspect::<M>()?);
                tracing::debug!(
                    record = metadata.type_name,
                    table = metadata.table_name,
                    fields = metadata.fields.len(),
                    has_primary_key = metadata.primary_key.is_some(),
                    "Inspected record type"
                );
                entry.insert(metadata.clone());
                Ok(metadata)
            }
        }
    }

    /// Number of inspected types.
    pub fn len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataRegistry")
            .field("types", &self.len())
            .finish()
    }
}

/// Inspect `M` through the global registry.
pub fn type_metadata<M: Record>() -> Result<Arc<TypeMetadata<M>>> {
    MetadataRegistry::global().get_or_inspect::<M>()
}

fn downcast<M: Record>(cached: &Cached) -> Result<Arc<TypeMetadata<M>>> {
    cached
        .clone()
        .downcast::<TypeMetadata<M>>()
        .map_err(|_| Error::StructInfoUnavailable {
            type_name: std::any::type_name::<M>(),
            reason: "cached metadata has a different type".to_string(),
        })
}

/// Scan the descriptor table of `M` in declaration order.
///
/// Descriptors without a column are not mapped. The `id` column becomes the
/// primary key and is kept out of the general field collection.
fn inspect<M: Record>() -> Result<TypeMetadata<M>> {
    let type_name = std::any::type_name::<M>();
    let mut fields = IndexMap::new();
    let mut primary_key = None;
    let mut seen_columns = Vec::new();

    for field in M::field_descriptors() {
        if field.column.is_empty() {
            continue;
        }
        if seen_columns.contains(&field.column) {
            return Err(Error::StructInfoUnavailable {
                type_name,
                reason: format!("column {} is mapped more than once", field.column),
            });
        }
        seen_columns.push(field.column);

        if field.is_primary_key() {
            primary_key = Some(field);
        } else {
            fields.insert(field.name, field);
        }
    }

    Ok(TypeMetadata {
        type_name,
        table_name: M::table_name(),
        fields,
        primary_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldDescriptor;
    use crate::value::{FieldKind, FieldValue};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counted {
        id: i64,
        state: i32,
        note: String,
        secret: String,
    }

    impl Record for Counted {
        fn table_name() -> &'static str {
            "tb_counted"
        }

        fn field_descriptors() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::new("state", "state", FieldKind::Int, |r: &Self| {
                    r.state.to_value()
                })
                .setter(|r: &mut Self, v| {
                    r.state = FieldValue::from_value(v)?;
                    Ok(())
                }),
                FieldDescriptor::new("id", "id", FieldKind::BigInt, |r: &Self| r.id.to_value())
                    .auto_increment(true)
                    .setter(|r: &mut Self, v| {
                        r.id = FieldValue::from_value(v)?;
                        Ok(())
                    }),
                FieldDescriptor::new("note", "note", FieldKind::Text, |r: &Self| {
                    r.note.to_value()
                }),
                FieldDescriptor::new("secret", "", FieldKind::Text, |r: &Self| {
                    r.secret.to_value()
                }),
            ]
        }
    }

    struct NoTable {
        value: i32,
    }

    impl Record for NoTable {
        fn field_descriptors() -> Vec<FieldDescriptor<Self>> {
            vec![FieldDescriptor::new(
                "value",
                "value",
                FieldKind::Int,
                |r: &Self| r.value.to_value(),
            )]
        }
    }

    struct Duplicated {
        a: i32,
    }

    impl Record for Duplicated {
        fn field_descriptors() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::new("a", "col", FieldKind::Int, |r: &Self| r.a.to_value()),
                FieldDescriptor::new("b", "col", FieldKind::Int, |r: &Self| r.a.to_value()),
            ]
        }
    }

    #[test]
    fn test_inspect_splits_primary_key() {
        let registry = MetadataRegistry::new();
        let metadata = registry.get_or_inspect::<Counted>().unwrap();
        assert_eq!(metadata.table_name, "tb_counted");
        let pk = metadata.primary_key.expect("primary key");
        assert_eq!(pk.column, "id");
        assert!(pk.auto_increment);
        assert_eq!(metadata.fields.keys().copied().collect::<Vec<_>>(), vec![
            "state", "note"
        ]);
        assert!(!metadata.fields.contains_key("id"));
        assert_eq!(metadata.column_names(), vec!["id", "state", "note"]);
    }

    #[test]
    fn test_field_refs_skip_readonly() {
        let registry = MetadataRegistry::new();
        let metadata = registry.get_or_inspect::<Counted>().unwrap();
        let refs = metadata.field_refs();
        assert_eq!(refs.keys().copied().collect::<Vec<_>>(), vec!["id", "state"]);
    }

    #[test]
    fn test_missing_table_name_is_empty() {
        let registry = MetadataRegistry::new();
        let metadata = registry.get_or_inspect::<NoTable>().unwrap();
        assert_eq!(metadata.table_name, "");
        assert!(metadata.primary_key.is_none());
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let registry = MetadataRegistry::new();
        let err = registry.get_or_inspect::<Duplicated>().unwrap_err();
        assert!(matches!(err, Error::StructInfoUnavailable { .. }));
        assert!(registry.is_empty());
    }

    static ONCE_BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct Once {
        flag: i32,
    }

    impl Record for Once {
        fn field_descriptors() -> Vec<FieldDescriptor<Self>> {
            ONCE_BUILDS.fetch_add(1, Ordering::SeqCst);
            vec![FieldDescriptor::new("flag", "flag", FieldKind::Int, |r: &Self| {
                r.flag.to_value()
            })]
        }
    }

    #[test]
    fn test_second_inspection_is_cached() {
        let registry = MetadataRegistry::new();
        let first = registry.get_or_inspect::<Once>().unwrap();
        let second = registry.get_or_inspect::<Once>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(ONCE_BUILDS.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_first_inspection_converges() {
        let registry: &'static MetadataRegistry = Box::leak(Box::new(MetadataRegistry::new()));
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(move || registry.get_or_inspect::<Counted>().unwrap()))
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for metadata in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], metadata));
        }
        assert_eq!(registry.len(), 1);
    }
}
