//! Dynamic values exchanged between records, the converter and drivers.

use std::fmt;

use chrono::NaiveDateTime;

use crate::error::{Error, Result};

/// A field value read from, or written into, a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean
    Bool(bool),
    /// 8-bit integer
    TinyInt(i8),
    /// 16-bit integer
    SmallInt(i16),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    BigInt(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Text
    Text(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Timestamp without time zone, second precision
    Timestamp(NaiveDateTime),
}

impl Value {
    /// The kind of this value, `None` for NULL.
    pub const fn kind(&self) -> Option<FieldKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(FieldKind::Bool),
            Value::TinyInt(_) => Some(FieldKind::TinyInt),
            Value::SmallInt(_) => Some(FieldKind::SmallInt),
            Value::Int(_) => Some(FieldKind::Int),
            Value::BigInt(_) => Some(FieldKind::BigInt),
            Value::Float(_) => Some(FieldKind::Float),
            Value::Double(_) => Some(FieldKind::Double),
            Value::Text(_) => Some(FieldKind::Text),
            Value::Bytes(_) => Some(FieldKind::Bytes),
            Value::Timestamp(_) => Some(FieldKind::Timestamp),
        }
    }

    /// Human readable kind name, used in error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self.kind() {
            Some(kind) => kind.name(),
            None => "null",
        }
    }

    /// Widen any integer variant to `i64`.
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(v) => Some(*v as i64),
            Value::SmallInt(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Widen any float variant to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value can not identify a row: NULL, integer zero or an empty string.
    pub fn is_empty_identifier(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            other => other.as_i64() == Some(0),
        }
    }
}

/// The semantic kind of a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Text,
    Bytes,
    Timestamp,
}

impl FieldKind {
    pub const fn name(self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::TinyInt => "tinyint",
            FieldKind::SmallInt => "smallint",
            FieldKind::Int => "int",
            FieldKind::BigInt => "bigint",
            FieldKind::Float => "float",
            FieldKind::Double => "double",
            FieldKind::Text => "text",
            FieldKind::Bytes => "bytes",
            FieldKind::Timestamp => "timestamp",
        }
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            FieldKind::TinyInt | FieldKind::SmallInt | FieldKind::Int | FieldKind::BigInt
        )
    }

    pub const fn is_float(self) -> bool {
        matches!(self, FieldKind::Float | FieldKind::Double)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Rust type that can live in a mapped record field.
///
/// `KIND` is what the converter decodes raw column text into; `from_value`
/// then moves the decoded value into the field.
pub trait FieldValue: Sized {
    const KIND: FieldKind;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(kind: FieldKind, value: &Value) -> Error {
    Error::ValueConversion {
        kind,
        raw: format!("{value:?}"),
    }
}

macro_rules! impl_integer_field {
    ($ty:ty, $variant:ident) => {
        impl FieldValue for $ty {
            const KIND: FieldKind = FieldKind::$variant;

            fn to_value(&self) -> Value {
                Value::$variant(*self)
            }

            fn from_value(value: Value) -> Result<Self> {
                value
                    .as_i64()
                    .and_then(|v| <$ty>::try_from(v).ok())
                    .ok_or_else(|| mismatch(Self::KIND, &value))
            }
        }
    };
}

impl_integer_field!(i8, TinyInt);
impl_integer_field!(i16, SmallInt);
impl_integer_field!(i32, Int);
impl_integer_field!(i64, BigInt);

impl FieldValue for f32 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Result<Self> {
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| mismatch(Self::KIND, &value))
    }
}

impl FieldValue for f64 {
    const KIND: FieldKind = FieldKind::Double;

    fn to_value(&self) -> Value {
        Value::Double(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| mismatch(Self::KIND, &value))
    }
}

impl FieldValue for String {
    const KIND: FieldKind = FieldKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch(Self::KIND, &other)),
        }
    }
}

impl FieldValue for NaiveDateTime {
    const KIND: FieldKind = FieldKind::Timestamp;

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            other => Err(mismatch(Self::KIND, &other)),
        }
    }
}

impl FieldValue for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(Self::KIND, &other)),
        }
    }
}

impl FieldValue for Vec<u8> {
    const KIND: FieldKind = FieldKind::Bytes;

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(mismatch(Self::KIND, &other)),
        }
    }
}
