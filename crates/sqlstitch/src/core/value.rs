//! SQL value types shared by query parameters and decoded row data.
//!
//! `SqlValue` is the single owned representation used for bound query
//! parameters, raw result-row cells, and decoded entity fields.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// SQL value enum for type-safe parameter binding and row handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// SQL NULL.
    Null,

    /// Boolean value.
    Bool(bool),

    /// 64-bit signed integer (covers int, bigint, smallint).
    Int(i64),

    /// 64-bit floating point.
    Float(f64),

    /// Text/string data.
    Text(String),

    /// Binary data.
    Bytes(Vec<u8>),

    /// UUID/GUID value.
    Uuid(Uuid),

    /// Decimal value with arbitrary precision.
    Decimal(Decimal),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// Date without time component.
    Date(NaiveDate),

    /// Structured JSON value (object or array columns).
    Json(serde_json::Value),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Short type name for error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "int",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::Uuid(_) => "uuid",
            SqlValue::Decimal(_) => "decimal",
            SqlValue::DateTime(_) => "datetime",
            SqlValue::Date(_) => "date",
            SqlValue::Json(_) => "json",
        }
    }

    /// Canonical string rendering used to build entity keys.
    ///
    /// Returns `None` for values that cannot serve as a primary key
    /// (NULL and structured JSON).
    #[must_use]
    pub fn key_string(&self) -> Option<String> {
        match self {
            SqlValue::Null | SqlValue::Json(_) => None,
            SqlValue::Bool(v) => Some(v.to_string()),
            SqlValue::Int(v) => Some(v.to_string()),
            SqlValue::Float(v) => Some(v.to_string()),
            SqlValue::Text(v) => Some(v.clone()),
            SqlValue::Bytes(v) => Some(hex_string(v)),
            SqlValue::Uuid(v) => Some(v.to_string()),
            SqlValue::Decimal(v) => Some(v.to_string()),
            SqlValue::DateTime(v) => Some(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            SqlValue::Date(v) => Some(v.format("%Y-%m-%d").to_string()),
        }
    }

    /// Convert to a SQL literal string.
    ///
    /// # Security Note
    ///
    /// This performs basic SQL escaping (single quotes doubled) and is used
    /// only for DDL `DEFAULT` clauses, where the engines do not accept bound
    /// parameters. Data values in queries always go through parameters.
    #[must_use]
    pub fn to_sql_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(v) => {
                if *v {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Float(v) => v.to_string(),
            SqlValue::Text(v) => format!("'{}'", v.replace('\'', "''")),
            SqlValue::Bytes(v) => format!("x'{}'", hex_string(v)),
            SqlValue::Uuid(v) => format!("'{}'", v),
            SqlValue::Decimal(v) => v.to_string(),
            SqlValue::DateTime(v) => format!("'{}'", v.format("%Y-%m-%d %H:%M:%S%.f")),
            SqlValue::Date(v) => format!("'{}'", v.format("%Y-%m-%d")),
            SqlValue::Json(v) => format!("'{}'", v.to_string().replace('\'', "''")),
        }
    }

    /// Convert to a plain JSON value for entity serialization.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            SqlValue::Null => Value::Null,
            SqlValue::Bool(v) => Value::Bool(*v),
            SqlValue::Int(v) => Value::from(*v),
            SqlValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SqlValue::Text(v) => Value::String(v.clone()),
            SqlValue::Bytes(v) => Value::String(hex_string(v)),
            SqlValue::Uuid(v) => Value::String(v.to_string()),
            SqlValue::Decimal(v) => Value::String(v.to_string()),
            SqlValue::DateTime(v) => {
                Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            SqlValue::Date(v) => Value::String(v.format("%Y-%m-%d").to_string()),
            SqlValue::Json(v) => v.clone(),
        }
    }
}

fn hex_string(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

// From implementations for common types
impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(v: serde_json::Value) -> Self {
        SqlValue::Json(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null() {
        assert!(SqlValue::Null.is_null());
        assert!(!SqlValue::Int(42).is_null());
    }

    #[test]
    fn test_key_string() {
        assert_eq!(SqlValue::Int(42).key_string().as_deref(), Some("42"));
        assert_eq!(
            SqlValue::Text("u1".to_string()).key_string().as_deref(),
            Some("u1")
        );
        assert_eq!(SqlValue::Null.key_string(), None);
        assert_eq!(SqlValue::Json(serde_json::json!({})).key_string(), None);

        let uuid_key = SqlValue::Uuid(Uuid::nil()).key_string();
        assert_eq!(
            uuid_key.as_deref(),
            Some("00000000-0000-0000-0000-000000000000")
        );
    }

    #[test]
    fn test_sql_literal_escaping() {
        assert_eq!(
            SqlValue::Text("O'Brien".to_string()).to_sql_literal(),
            "'O''Brien'"
        );
        assert_eq!(SqlValue::Int(7).to_sql_literal(), "7");
        assert_eq!(SqlValue::Bool(true).to_sql_literal(), "TRUE");
        assert_eq!(SqlValue::Null.to_sql_literal(), "NULL");
    }

    #[test]
    fn test_to_json() {
        assert_eq!(SqlValue::Int(5).to_json(), serde_json::json!(5));
        assert_eq!(
            SqlValue::Text("x".to_string()).to_json(),
            serde_json::json!("x")
        );
        assert_eq!(SqlValue::Null.to_json(), serde_json::Value::Null);
        assert_eq!(
            SqlValue::Bytes(vec![0xde, 0xad]).to_json(),
            serde_json::json!("dead")
        );
    }

    #[test]
    fn test_from_implementations() {
        let v: SqlValue = 42i32.into();
        assert_eq!(v, SqlValue::Int(42));

        let v: SqlValue = "hello".into();
        assert_eq!(v, SqlValue::Text("hello".to_string()));
    }
}
