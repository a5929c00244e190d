//! Result Hydrator.
//!
//! Moves rows from a [`Cursor`] into caller targets. Columns are matched to
//! field references by exact name; returned columns without a matching
//! reference are skipped, so callers may select a subset or a superset of
//! the mapped columns.
//!
//! Single-result targets are staged: the cursor is read until it is known to
//! hold at most one row and every value is decoded before the target is
//! touched. Any failure leaves the target as it was.

use indexmap::IndexMap;
use rowbind_core::{Cursor, Error, FieldRef, FieldValue, RawRow, Result, Value, convert};

/// Field references keyed by column name.
pub type FieldRefs<M> = IndexMap<&'static str, FieldRef<M>>;

/// Per-column reference, resolved once per cursor.
struct ColumnPlan<'a, M> {
    slots: Vec<Option<(&'a str, FieldRef<M>)>>,
}

impl<'a, M> ColumnPlan<'a, M> {
    fn new(columns: &'a [String], refs: &FieldRefs<M>) -> Self {
        let slots = columns
            .iter()
            .map(|column| refs.get(column.as_str()).map(|r| (column.as_str(), *r)))
            .collect();
        Self { slots }
    }

    /// Decode every mapped value of `row` without writing anything.
    fn decode(&self, row: &RawRow) -> Result<Vec<(FieldRef<M>, Value)>> {
        let mut decoded = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.iter().enumerate() {
            let Some((column, field)) = slot else {
                continue;
            };
            let value = convert::decode(field.kind, row.get(index))
                .map_err(|e| Error::hydrate(*column, e))?;
            decoded.push((*field, value));
        }
        Ok(decoded)
    }

    fn apply(&self, target: &mut M, decoded: Vec<(FieldRef<M>, Value)>) -> Result<()> {
        for (field, value) in decoded {
            field.set(target, value)?;
        }
        Ok(())
    }
}

/// Read the only row of `cursor`, failing if there is a second one.
fn single_row(cursor: &mut dyn Cursor) -> Result<Option<RawRow>> {
    let Some(row) = cursor.next_row()? else {
        return Ok(None);
    };
    if cursor.next_row()?.is_some() {
        return Err(Error::MultipleRowsForSingleResult);
    }
    Ok(Some(row))
}

fn single_column(cursor: &dyn Cursor) -> Result<&str> {
    match cursor.columns() {
        [column] => Ok(column.as_str()),
        columns => Err(Error::ColumnCount {
            expected: 1,
            found: columns.len(),
        }),
    }
}

fn decode_scalar<T: FieldValue>(column: &str, row: &RawRow) -> Result<T> {
    convert::decode(T::KIND, row.get(0))
        .and_then(T::from_value)
        .map_err(|e| Error::hydrate(column, e))
}

/// Hydrate a single scalar. Returns whether a row was found.
pub fn scalar<T: FieldValue>(cursor: &mut dyn Cursor, target: &mut T) -> Result<bool> {
    let column = single_column(cursor)?.to_string();
    let Some(row) = single_row(cursor)? else {
        return Ok(false);
    };
    *target = decode_scalar(&column, &row)?;
    Ok(true)
}

/// Hydrate a single record. Returns whether a row was found; with no row
/// the target is left unmodified.
pub fn one<M>(cursor: &mut dyn Cursor, refs: &FieldRefs<M>, target: &mut M) -> Result<bool> {
    let columns = cursor.columns().to_vec();
    let plan = ColumnPlan::new(&columns, refs);
    let Some(row) = single_row(cursor)? else {
        return Ok(false);
    };
    let decoded = plan.decode(&row)?;
    plan.apply(target, decoded)?;
    Ok(true)
}

/// Append one fresh record per row. Returns the number of rows appended.
///
/// Rows are collected before `target` is extended, so a failure on any row
/// appends nothing.
pub fn list<M: Default>(
    cursor: &mut dyn Cursor,
    refs: &FieldRefs<M>,
    target: &mut Vec<M>,
) -> Result<usize> {
    let columns = cursor.columns().to_vec();
    let plan = ColumnPlan::new(&columns, refs);
    let mut records = Vec::new();
    while let Some(row) = cursor.next_row()? {
        let mut record = M::default();
        let decoded = plan.decode(&row)?;
        plan.apply(&mut record, decoded)?;
        records.push(record);
    }
    let count = records.len();
    target.extend(records);
    Ok(count)
}

/// Append the single column of every row. Returns the number of rows appended.
pub fn scalars<T: FieldValue>(cursor: &mut dyn Cursor, target: &mut Vec<T>) -> Result<usize> {
    let column = single_column(cursor)?.to_string();
    let mut values = Vec::new();
    while let Some(row) = cursor.next_row()? {
        values.push(decode_scalar(&column, &row)?);
    }
    let count = values.len();
    target.extend(values);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowbind_core::{BufferedCursor, FieldDescriptor, FieldKind, Record, type_metadata};

    #[derive(Debug, Default, PartialEq)]
    struct Test {
        id: i64,
        state: i32,
        description: String,
    }

    impl Record for Test {
        fn table_name() -> &'static str {
            "tb_test"
        }

        fn field_descriptors() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::new("id", "id", FieldKind::BigInt, |r: &Self| r.id.to_value())
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
            ]
        }
    }

    fn refs() -> FieldRefs<Test> {
        type_metadata::<Test>().unwrap().field_refs()
    }

    fn cursor(columns: &[&str], rows: &[&[Option<&str>]]) -> BufferedCursor {
        BufferedCursor::new(
            columns.iter().map(|c| (*c).to_string()).collect(),
            rows.iter()
                .map(|row| RawRow::from_text(row.iter().copied()))
                .collect(),
        )
    }

    #[test]
    fn test_one_hydrates_matching_columns() {
        let mut rows = cursor(&["id", "state", "description", "extra"], &[&[
            Some("9"),
            Some("2"),
            Some("horm"),
            Some("ignored"),
        ]]);
        let mut record = Test::default();
        assert!(one(&mut rows, &refs(), &mut record).unwrap());
        assert_eq!(record, Test {
            id: 9,
            state: 2,
            description: "horm".to_string(),
        });
    }

    #[test]
    fn test_one_with_no_rows_leaves_target() {
        let mut rows = cursor(&["id", "state"], &[]);
        let mut record = Test {
            id: 5,
            state: 1,
            description: "keep".to_string(),
        };
        assert!(!one(&mut rows, &refs(), &mut record).unwrap());
        assert_eq!(record.description, "keep");
        assert_eq!(record.id, 5);
    }

    #[test]
    fn test_one_rejects_second_row_without_writing() {
        let mut rows = cursor(&["id", "state"], &[&[Some("1"), Some("1")], &[
            Some("2"),
            Some("2"),
        ]]);
        let mut record = Test::default();
        let err = one(&mut rows, &refs(), &mut record).unwrap_err();
        assert!(matches!(err, Error::MultipleRowsForSingleResult));
        assert_eq!(record, Test::default());
    }

    #[test]
    fn test_one_decode_failure_leaves_target() {
        let mut rows = cursor(&["id", "state"], &[&[Some("7"), Some("abc")]]);
        let mut record = Test::default();
        let err = one(&mut rows, &refs(), &mut record).unwrap_err();
        assert!(matches!(&err, Error::Hydrate { column, .. } if column == "state"));
        assert!(matches!(err.root(), Error::ValueConversion {
            kind: FieldKind::Int,
            ..
        }));
        assert_eq!(record.id, 0);
    }

    #[test]
    fn test_null_column_fails() {
        let mut rows = cursor(&["description"], &[&[None]]);
        let mut record = Test::default();
        let err = one(&mut rows, &refs(), &mut record).unwrap_err();
        assert!(matches!(err.root(), Error::ValueConversion { raw, .. } if raw == "NULL"));
    }

    #[test]
    fn test_list_appends_fresh_records() {
        let mut rows = cursor(&["id", "description"], &[&[Some("1"), Some("a")], &[
            Some("2"),
            Some("b"),
        ]]);
        let mut records = Vec::new();
        assert_eq!(list(&mut rows, &refs(), &mut records).unwrap(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].description, "b");
        assert_eq!(records[1].state, 0);
    }

    #[test]
    fn test_list_empty_result() {
        let mut rows = cursor(&["id"], &[]);
        let mut records: Vec<Test> = Vec::new();
        assert_eq!(list(&mut rows, &refs(), &mut records).unwrap(), 0);
        assert!(records.is_empty());
    }

    #[test]
    fn test_list_failure_appends_nothing() {
        let mut rows = cursor(&["id"], &[&[Some("1")], &[Some("x")]]);
        let mut records: Vec<Test> = Vec::new();
        assert!(list(&mut rows, &refs(), &mut records).is_err());
        assert!(records.is_empty());
    }

    #[test]
    fn test_scalar() {
        let mut rows = cursor(&["count(*)"], &[&[Some("42")]]);
        let mut count = 0_i64;
        assert!(scalar(&mut rows, &mut count).unwrap());
        assert_eq!(count, 42);

        let mut empty = cursor(&["count(*)"], &[]);
        let mut untouched = 3_i64;
        assert!(!scalar(&mut empty, &mut untouched).unwrap());
        assert_eq!(untouched, 3);
    }

    #[test]
    fn test_scalar_cardinality_and_width() {
        let mut two_rows = cursor(&["id"], &[&[Some("1")], &[Some("2")]]);
        let mut id = 0_i64;
        assert!(matches!(
            scalar(&mut two_rows, &mut id),
            Err(Error::MultipleRowsForSingleResult)
        ));
        assert_eq!(id, 0);

        let mut wide = cursor(&["id", "state"], &[&[Some("1"), Some("2")]]);
        assert!(matches!(scalar(&mut wide, &mut id), Err(Error::ColumnCount {
            expected: 1,
            found: 2
        })));
    }

    #[test]
    fn test_scalars() {
        let mut rows = cursor(&["description"], &[&[Some("a")], &[Some("b")]]);
        let mut values = vec!["existing".to_string()];
        assert_eq!(scalars(&mut rows, &mut values).unwrap(), 2);
        assert_eq!(values, vec!["existing", "a", "b"]);
    }
}
