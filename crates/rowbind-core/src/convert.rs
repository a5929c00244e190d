//! SQL literal encoding and raw column decoding.
//!
//! This module is the single place that decides which scalar kinds rowbind
//! supports: the integer family, text, the float family and timestamps.
//! Everything else fails with [`Error::UnsupportedType`].
//!
//! `encode` and `decode` are mirror images: the body of a literal produced by
//! `encode` (without surrounding quotes) is accepted by `decode` for the same
//! kind and yields the original value, within the precision the literal keeps
//! (two decimals for floats, whole seconds for timestamps).
//!
//! # Security
//!
//! Text is embedded between single quotes verbatim. No escaping is performed,
//! so a string containing `'` produces broken or attacker-controlled SQL.
//! Statements are never parameterized; callers must not bind untrusted text.

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::value::{FieldKind, Value};

/// Layout shared by timestamp literals and timestamp decoding.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert a value into the SQL literal embedded in statement text.
pub fn encode(value: &Value) -> Result<String> {
    match value {
        Value::TinyInt(v) => Ok(v.to_string()),
        Value::SmallInt(v) => Ok(v.to_string()),
        Value::Int(v) => Ok(v.to_string()),
        Value::BigInt(v) => Ok(v.to_string()),
        Value::Float(v) => float_literal(FieldKind::Float, f64::from(*v)),
        Value::Double(v) => float_literal(FieldKind::Double, *v),
        Value::Text(s) => Ok(format!("'{}'", s)),
        Value::Timestamp(ts) => Ok(format!("'{}'", ts.format(TIMESTAMP_FORMAT))),
        Value::Null | Value::Bool(_) | Value::Bytes(_) => Err(Error::UnsupportedType {
            kind: value.kind_name(),
        }),
    }
}

/// NaN and the infinities have no SQL literal form.
fn float_literal(kind: FieldKind, v: f64) -> Result<String> {
    if !v.is_finite() {
        return Err(Error::ValueConversion {
            kind,
            raw: v.to_string(),
        });
    }
    Ok(format!("{:.2}", v))
}

/// Convert raw column bytes returned by a driver into a value of `kind`.
///
/// `None` is SQL NULL, which no supported kind accepts.
pub fn decode(kind: FieldKind, raw: Option<&[u8]>) -> Result<Value> {
    let Some(raw) = raw else {
        return Err(Error::ValueConversion {
            kind,
            raw: "NULL".to_string(),
        });
    };
    if matches!(kind, FieldKind::Bool | FieldKind::Bytes) {
        return Err(Error::UnsupportedType { kind: kind.name() });
    }
    let text = std::str::from_utf8(raw).map_err(|_| conversion_error(kind, raw))?;

    let value = match kind {
        FieldKind::TinyInt => text.parse().map(Value::TinyInt).ok(),
        FieldKind::SmallInt => text.parse().map(Value::SmallInt).ok(),
        FieldKind::Int => text.parse().map(Value::Int).ok(),
        FieldKind::BigInt => text.parse().map(Value::BigInt).ok(),
        FieldKind::Float => text
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Value::Float),
        FieldKind::Double => text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Value::Double),
        FieldKind::Text => Some(Value::Text(text.to_string())),
        FieldKind::Timestamp => NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
            .map(Value::Timestamp)
            .ok(),
        FieldKind::Bool | FieldKind::Bytes => None,
    };
    value.ok_or_else(|| conversion_error(kind, raw))
}

fn conversion_error(kind: FieldKind, raw: &[u8]) -> Error {
    Error::ValueConversion {
        kind,
        raw: String::from_utf8_lossy(raw).into_owned(),
    }
}
