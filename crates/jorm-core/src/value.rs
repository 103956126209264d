//! Runtime values bound to statements and read back from rows.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use crate::catalog::ColumnKind;

/// A runtime value that travels between the engine and a driver.
///
/// Arguments are always handed to the driver as a separate ordered sequence of
/// `Value`s; the engine never splices them into SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Point in time, UTC.
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => format!("boolean {b}"),
            Value::Int(i) => format!("integer {i}"),
            Value::Float(f) => format!("float {f}"),
            Value::Text(s) if s.chars().count() > 32 => {
                format!("text {:?}...", s.chars().take(32).collect::<String>())
            }
            Value::Text(s) => format!("text {s:?}"),
            Value::Bytes(b) => format!("{} bytes", b.len()),
            Value::Timestamp(t) => format!("timestamp {}", t.to_rfc3339()),
        }
    }
}

/// A row value could not be converted into the target Rust type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoerceError {
    /// No lossless conversion exists.
    #[error("cannot convert {found} into {expected}")]
    Mismatch {
        /// Target type.
        expected: &'static str,
        /// Description of the offending value.
        found: String,
    },

    /// Numeric value does not fit the target type.
    #[error("{found} is out of range for {expected}")]
    OutOfRange {
        /// Target type.
        expected: &'static str,
        /// Description of the offending value.
        found: String,
    },

    /// NULL read into a non-nullable field.
    #[error("unexpected null for non-nullable {expected}")]
    UnexpectedNull {
        /// Target type.
        expected: &'static str,
    },

    /// The entity has no field with this name.
    #[error("unknown field `{0}`")]
    UnknownField(String),
}

impl CoerceError {
    fn mismatch(expected: &'static str, found: &Value) -> Self {
        match found {
            Value::Null => CoerceError::UnexpectedNull { expected },
            other => CoerceError::Mismatch {
                expected,
                found: other.describe(),
            },
        }
    }
}

/// A Rust type that can be stored in a mapped column.
///
/// The associated constants feed the catalog: a field declared with
/// [`FieldDef::of`](crate::catalog::FieldDef::of) takes its column kind and
/// nullability from here, so the declaration cannot drift from the struct.
pub trait SqlType: Sized {
    /// Column kind used for DDL and coercion.
    const KIND: ColumnKind;
    /// Whether the column accepts NULL.
    const NULLABLE: bool = false;

    /// Convert to a bindable value.
    fn to_value(&self) -> Value;

    /// Convert a row value into this type, coercing where lossless.
    fn from_value(value: Value) -> Result<Self, CoerceError>;
}

fn coerce_i64(value: Value, expected: &'static str) -> Result<i64, CoerceError> {
    match value {
        Value::Int(i) => Ok(i),
        Value::Bool(b) => Ok(i64::from(b)),
        Value::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(f as i64)
        }
        Value::Text(ref s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| CoerceError::mismatch(expected, &value)),
        other => Err(CoerceError::mismatch(expected, &other)),
    }
}

macro_rules! impl_sql_int {
    ($($ty:ty),*) => {
        $(
            impl SqlType for $ty {
                const KIND: ColumnKind = ColumnKind::Integer;

                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, CoerceError> {
                    let wide = coerce_i64(value, stringify!($ty))?;
                    <$ty>::try_from(wide).map_err(|_| CoerceError::OutOfRange {
                        expected: stringify!($ty),
                        found: format!("integer {wide}"),
                    })
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_sql_int!(i8, i16, i32, i64, u8, u16, u32);

impl SqlType for f64 {
    const KIND: ColumnKind = ColumnKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        const EXACT: i64 = 1 << 53;
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) if (-EXACT..=EXACT).contains(&i) => Ok(i as f64),
            Value::Int(i) => Err(CoerceError::OutOfRange {
                expected: "f64",
                found: format!("integer {i}"),
            }),
            Value::Text(ref s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| CoerceError::mismatch("f64", &value)),
            other => Err(CoerceError::mismatch("f64", &other)),
        }
    }
}

impl SqlType for f32 {
    const KIND: ColumnKind = ColumnKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        let wide = f64::from_value(value).map_err(|e| match e {
            CoerceError::Mismatch { found, .. } => CoerceError::Mismatch {
                expected: "f32",
                found,
            },
            other => other,
        })?;
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            return Err(CoerceError::OutOfRange {
                expected: "f32",
                found: format!("float {wide}"),
            });
        }
        Ok(narrow)
    }
}

impl SqlType for bool {
    const KIND: ColumnKind = ColumnKind::Boolean;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            Value::Text(ref s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(true),
                "false" | "f" | "0" => Ok(false),
                _ => Err(CoerceError::mismatch("bool", &value)),
            },
            other => Err(CoerceError::mismatch("bool", &other)),
        }
    }
}

impl SqlType for String {
    const KIND: ColumnKind = ColumnKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Timestamp(t) => Ok(t.to_rfc3339()),
            Value::Bytes(b) => String::from_utf8(b).map_err(|e| CoerceError::Mismatch {
                expected: "String",
                found: format!("{} non-utf8 bytes", e.as_bytes().len()),
            }),
            Value::Null => Err(CoerceError::UnexpectedNull { expected: "String" }),
        }
    }
}

impl SqlType for Vec<u8> {
    const KIND: ColumnKind = ColumnKind::Other;

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(CoerceError::mismatch("Vec<u8>", &other)),
        }
    }
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse the textual timestamp encodings drivers hand back.
pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

impl SqlType for DateTime<Utc> {
    const KIND: ColumnKind = ColumnKind::Temporal;

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Timestamp(t) => Ok(t),
            Value::Text(ref s) => {
                parse_timestamp(s).ok_or_else(|| CoerceError::mismatch("DateTime<Utc>", &value))
            }
            Value::Int(secs) => {
                DateTime::from_timestamp(secs, 0).ok_or_else(|| CoerceError::OutOfRange {
                    expected: "DateTime<Utc>",
                    found: format!("integer {secs}"),
                })
            }
            other => Err(CoerceError::mismatch("DateTime<Utc>", &other)),
        }
    }
}

impl SqlType for NaiveDateTime {
    const KIND: ColumnKind = ColumnKind::Temporal;

    fn to_value(&self) -> Value {
        Value::Timestamp(self.and_utc())
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        DateTime::<Utc>::from_value(value).map(|t| t.naive_utc())
    }
}

impl<T: SqlType> SqlType for Option<T> {
    const KIND: ColumnKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v.and_utc())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_integer_coercion() {
        assert_eq!(i64::from_value(Value::Int(7)).unwrap(), 7);
        assert_eq!(i32::from_value(Value::Text(" 42 ".into())).unwrap(), 42);
        assert_eq!(i64::from_value(Value::Float(3.0)).unwrap(), 3);

        let err = i32::from_value(Value::Text("abc".into())).unwrap_err();
        assert!(matches!(err, CoerceError::Mismatch { expected: "i32", .. }));

        let err = u8::from_value(Value::Int(300)).unwrap_err();
        assert!(matches!(err, CoerceError::OutOfRange { expected: "u8", .. }));

        assert!(i64::from_value(Value::Float(1.5)).is_err());
    }

    #[test]
    fn test_null_handling() {
        assert_eq!(
            i64::from_value(Value::Null).unwrap_err(),
            CoerceError::UnexpectedNull { expected: "i64" }
        );
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::from_value(Value::Int(1)).unwrap(), Some(1));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_bool_coercion() {
        assert!(bool::from_value(Value::Int(1)).unwrap());
        assert!(!bool::from_value(Value::Text("false".into())).unwrap());
        assert!(bool::from_value(Value::Int(2)).is_err());
    }

    #[test]
    fn test_text_from_scalars() {
        assert_eq!(String::from_value(Value::Int(5)).unwrap(), "5");
        assert_eq!(String::from_value(Value::Bytes(b"hi".to_vec())).unwrap(), "hi");
        assert!(String::from_value(Value::Bytes(vec![0xff, 0xfe])).is_err());
    }

    #[test]
    fn test_timestamp_parsing() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();

        let rfc = DateTime::<Utc>::from_value(Value::Text("2024-05-01T12:30:00+00:00".into()));
        assert_eq!(rfc.unwrap(), expected);

        let sqlite = DateTime::<Utc>::from_value(Value::Text("2024-05-01 12:30:00".into()));
        assert_eq!(sqlite.unwrap(), expected);

        let epoch = DateTime::<Utc>::from_value(Value::Int(expected.timestamp()));
        assert_eq!(epoch.unwrap(), expected);

        assert!(DateTime::<Utc>::from_value(Value::Text("yesterday".into())).is_err());
    }

    #[test]
    fn test_float_bounds() {
        assert_eq!(f64::from_value(Value::Int(10)).unwrap(), 10.0);
        assert!(f64::from_value(Value::Int(i64::MAX)).is_err());
        assert!(f32::from_value(Value::Float(1e300)).is_err());
    }

    #[test]
    fn test_kind_constants() {
        assert_eq!(<i32 as SqlType>::KIND, ColumnKind::Integer);
        assert_eq!(<Option<String> as SqlType>::KIND, ColumnKind::Text);
        assert!(<Option<String> as SqlType>::NULLABLE);
        assert!(!<String as SqlType>::NULLABLE);
    }
}
