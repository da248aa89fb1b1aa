//! Row slicing and schema-driven decoding.
//!
//! A raw row is a flat map keyed `"<table>.<field>"`. The decoder slices it
//! by table prefix, runs decode hooks, applies implicit JSON/date coercion
//! for typed fields, then validates against the declarative field shapes.
//! Any failure aborts the whole normalization call.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::core::schema::{FieldShape, FieldType, TableSchema};
use crate::core::value::SqlValue;
use crate::error::{Result, StitchError};

use super::RawRow;

/// Slice a raw row down to one table's fields, stripping the alias prefix.
///
/// Prefix matching is exact: `"user2.id"` does not match table `"user"`.
pub(crate) fn slice_row<'a>(row: &'a RawRow, table: &str) -> HashMap<&'a str, &'a SqlValue> {
    row.iter()
        .filter_map(|(column, value)| {
            column
                .strip_prefix(table)
                .and_then(|rest| rest.strip_prefix('.'))
                .map(|field| (field, value))
        })
        .collect()
}

/// Whether a slice represents an outer-join miss (no columns, or all NULL).
pub(crate) fn slice_is_empty(slice: &HashMap<&str, &SqlValue>) -> bool {
    slice.is_empty() || slice.values().all(|v| v.is_null())
}

/// The table's primary-key value for this slice, as a canonical key string.
///
/// `None` when the table has no primary key, the column is missing from the
/// slice, or its value cannot key an entity (NULL).
pub(crate) fn pk_from_slice(
    table: &TableSchema,
    slice: &HashMap<&str, &SqlValue>,
) -> Option<String> {
    let pk = table.primary_key.as_deref()?;
    slice.get(pk).and_then(|v| v.key_string())
}

/// Decode and validate one table slice into entity fields.
pub(crate) fn decode_slice(
    table: &TableSchema,
    slice: &HashMap<&str, &SqlValue>,
) -> Result<BTreeMap<String, SqlValue>> {
    let declared: HashSet<&str> = table
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .chain(table.computed.iter().map(|c| c.name.as_str()))
        .collect();

    for name in slice.keys() {
        if !declared.contains(name) {
            return Err(StitchError::decode(
                &table.name,
                *name,
                "column is not declared in the table schema",
            ));
        }
    }

    let mut fields = BTreeMap::new();

    for field in &table.fields {
        let raw = slice.get(field.name.as_str()).copied();

        // Decode hooks run on present, non-null cells before shape validation.
        let hooked = match raw {
            Some(value) if !value.is_null() => {
                let decoded = match &field.decode {
                    Some(hook) => hook.apply(value).map_err(|message| {
                        StitchError::decode(
                            &table.name,
                            &field.name,
                            format!("decode hook failed on {:?}: {}", value, message),
                        )
                    })?,
                    None => value.clone(),
                };
                Some(decoded)
            }
            Some(value) => Some(value.clone()),
            None => None,
        };

        let validated = apply_shape(&field.shape, hooked).map_err(|message| {
            StitchError::decode(&table.name, &field.name, message)
        })?;

        if let Some(value) = validated {
            fields.insert(field.name.clone(), value);
        }
    }

    for computed in &table.computed {
        match slice.get(computed.name.as_str()) {
            None => {}
            Some(SqlValue::Null) => {
                fields.insert(computed.name.clone(), SqlValue::Null);
            }
            Some(value) => {
                let coerced = coerce((*value).clone(), computed.field_type).map_err(|message| {
                    StitchError::decode(&table.name, &computed.name, message)
                })?;
                fields.insert(computed.name.clone(), coerced);
            }
        }
    }

    Ok(fields)
}

/// Walk the declarative wrapper chain for one cell.
///
/// Returns `Ok(None)` when an `Optional` layer admits absence (the field is
/// simply omitted from the entity).
fn apply_shape(
    shape: &FieldShape,
    value: Option<SqlValue>,
) -> std::result::Result<Option<SqlValue>, String> {
    match shape {
        FieldShape::WithDefault(inner, default) => match value {
            None | Some(SqlValue::Null) => Ok(Some(default.clone())),
            some => apply_shape(inner, some),
        },
        FieldShape::Optional(inner) => match value {
            None => Ok(None),
            some => apply_shape(inner, some),
        },
        // Nullable admits NULL, not absence; an absent cell falls through
        // to the inner shape, which rejects it unless an Optional or
        // WithDefault layer is present.
        FieldShape::Nullable(inner) => match value {
            Some(SqlValue::Null) => Ok(Some(SqlValue::Null)),
            other => apply_shape(inner, other),
        },
        FieldShape::Core(ty) => match value {
            None => Err("missing required column".to_string()),
            Some(SqlValue::Null) => Err("unexpected NULL for required column".to_string()),
            Some(v) => coerce(v, *ty).map(Some),
        },
    }
}

/// Coerce a raw cell to the field's core type.
///
/// Text cells are parsed for JSON, date and UUID typed fields; 0/1
/// integers coerce to booleans; everything else must already match.
fn coerce(value: SqlValue, ty: FieldType) -> std::result::Result<SqlValue, String> {
    let mismatch = |value: &SqlValue| {
        Err(format!(
            "cannot decode {} value {:?} as {}",
            value.kind_name(),
            value,
            ty.as_str()
        ))
    };

    match ty {
        FieldType::Any => Ok(value),
        FieldType::Bool => match value {
            SqlValue::Bool(_) => Ok(value),
            SqlValue::Int(0) => Ok(SqlValue::Bool(false)),
            SqlValue::Int(1) => Ok(SqlValue::Bool(true)),
            other => mismatch(&other),
        },
        FieldType::Int => match value {
            SqlValue::Int(_) => Ok(value),
            other => mismatch(&other),
        },
        FieldType::Float => match value {
            SqlValue::Float(_) => Ok(value),
            SqlValue::Int(i) => Ok(SqlValue::Float(i as f64)),
            other => mismatch(&other),
        },
        FieldType::Text => match value {
            SqlValue::Text(_) => Ok(value),
            other => mismatch(&other),
        },
        FieldType::Bytes => match value {
            SqlValue::Bytes(_) => Ok(value),
            other => mismatch(&other),
        },
        FieldType::Uuid => match value {
            SqlValue::Uuid(_) => Ok(value),
            SqlValue::Text(s) => uuid::Uuid::parse_str(&s)
                .map(SqlValue::Uuid)
                .map_err(|e| format!("invalid UUID {:?}: {}", s, e)),
            other => mismatch(&other),
        },
        FieldType::Decimal => match value {
            SqlValue::Decimal(_) => Ok(value),
            SqlValue::Int(i) => Ok(SqlValue::Decimal(Decimal::from(i))),
            SqlValue::Text(s) => s
                .parse::<Decimal>()
                .map(SqlValue::Decimal)
                .map_err(|e| format!("invalid decimal {:?}: {}", s, e)),
            other => mismatch(&other),
        },
        FieldType::DateTime => match value {
            SqlValue::DateTime(_) => Ok(value),
            SqlValue::Text(s) => parse_datetime(&s)
                .map(SqlValue::DateTime)
                .ok_or_else(|| format!("invalid datetime {:?}", s)),
            other => mismatch(&other),
        },
        FieldType::Date => match value {
            SqlValue::Date(_) => Ok(value),
            SqlValue::DateTime(dt) => Ok(SqlValue::Date(dt.date())),
            SqlValue::Text(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map(SqlValue::Date)
                .map_err(|e| format!("invalid date {:?}: {}", s, e)),
            other => mismatch(&other),
        },
        FieldType::Json => match value {
            SqlValue::Json(_) => Ok(value),
            SqlValue::Text(s) => serde_json::from_str(&s)
                .map(SqlValue::Json)
                .map_err(|e| format!("invalid JSON {:?}: {}", s, e)),
            other => mismatch(&other),
        },
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::DecodeHook;

    fn row(pairs: &[(&str, SqlValue)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn post_table() -> TableSchema {
        TableSchema::builder("post")
            .field("id", "TEXT", FieldShape::core(FieldType::Text))
            .primary_key("id")
            .field(
                "meta",
                "TEXT",
                FieldShape::core(FieldType::Json).nullable(),
            )
            .field(
                "views",
                "BIGINT",
                FieldShape::core(FieldType::Int).with_default(0),
            )
            .build()
    }

    #[test]
    fn test_slice_row_exact_prefix() {
        let r = row(&[
            ("post.id", SqlValue::Text("p1".into())),
            ("poster.id", SqlValue::Text("x".into())),
            ("user.id", SqlValue::Text("u1".into())),
        ]);
        let slice = slice_row(&r, "post");
        assert_eq!(slice.len(), 1);
        assert_eq!(slice["id"], &SqlValue::Text("p1".into()));
    }

    #[test]
    fn test_slice_is_empty_on_outer_join_miss() {
        let r = row(&[("post.id", SqlValue::Null), ("post.meta", SqlValue::Null)]);
        let slice = slice_row(&r, "post");
        assert!(slice_is_empty(&slice));

        let r = row(&[("post.id", SqlValue::Text("p1".into()))]);
        assert!(!slice_is_empty(&slice_row(&r, "post")));
    }

    #[test]
    fn test_decode_json_coercion_from_text() {
        let table = post_table();
        let r = row(&[
            ("post.id", SqlValue::Text("p1".into())),
            ("post.meta", SqlValue::Text("{\"a\":1}".into())),
        ]);
        let fields = decode_slice(&table, &slice_row(&r, "post")).unwrap();
        assert_eq!(
            fields["meta"],
            SqlValue::Json(serde_json::json!({"a": 1}))
        );
        // default applied for the absent column
        assert_eq!(fields["views"], SqlValue::Int(0));
    }

    #[test]
    fn test_decode_invalid_json_fails_with_context() {
        let table = post_table();
        let r = row(&[
            ("post.id", SqlValue::Text("p1".into())),
            ("post.meta", SqlValue::Text("{not json".into())),
        ]);
        let err = decode_slice(&table, &slice_row(&r, "post")).unwrap_err();
        match err {
            StitchError::Decode { table, field, .. } => {
                assert_eq!(table, "post");
                assert_eq!(field, "meta");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nullable_admits_null_not_absence() {
        // present NULL decodes to Null
        let shape = FieldShape::core(FieldType::Text).nullable();
        assert_eq!(
            apply_shape(&shape, Some(SqlValue::Null)).unwrap(),
            Some(SqlValue::Null)
        );
        // an absent cell is still a missing required column
        let err = apply_shape(&shape, None).unwrap_err();
        assert!(err.contains("missing required column"));
        assert!(!shape.admits_absent());

        // absence needs an explicit Optional layer
        let shape = FieldShape::core(FieldType::Text).optional().nullable();
        assert_eq!(apply_shape(&shape, None).unwrap(), None);

        // same behavior through a whole slice: post.meta is nullable but
        // not optional, so omitting the column fails decoding
        let table = post_table();
        let r = row(&[("post.id", SqlValue::Text("p1".into()))]);
        let err = decode_slice(&table, &slice_row(&r, "post")).unwrap_err();
        assert!(err.to_string().contains("post.meta"));
    }

    #[test]
    fn test_decode_missing_required_column() {
        let table = post_table();
        let r = row(&[("post.meta", SqlValue::Text("{}".into()))]);
        let err = decode_slice(&table, &slice_row(&r, "post")).unwrap_err();
        assert!(err.to_string().contains("post.id"));
    }

    #[test]
    fn test_decode_undeclared_column() {
        let table = post_table();
        let r = row(&[
            ("post.id", SqlValue::Text("p1".into())),
            ("post.mystery", SqlValue::Int(1)),
        ]);
        let err = decode_slice(&table, &slice_row(&r, "post")).unwrap_err();
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn test_decode_hook_wraps_error() {
        let table = TableSchema::builder("t")
            .field_decoded(
                "v",
                "TEXT",
                FieldShape::core(FieldType::Text),
                DecodeHook::new(|_| Err("boom".to_string())),
            )
            .primary_key("v")
            .build();
        let r = row(&[("t.v", SqlValue::Text("x".into()))]);
        let err = decode_slice(&table, &slice_row(&r, "t")).unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert!(err.to_string().contains("t.v"));
    }

    #[test]
    fn test_datetime_coercion_formats() {
        assert!(parse_datetime("2024-05-01T10:30:00").is_some());
        assert!(parse_datetime("2024-05-01 10:30:00.125").is_some());
        assert!(parse_datetime("2024-05-01T10:30:00+02:00").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn test_bool_coercion_from_int() {
        assert_eq!(
            coerce(SqlValue::Int(1), FieldType::Bool).unwrap(),
            SqlValue::Bool(true)
        );
        assert_eq!(
            coerce(SqlValue::Int(0), FieldType::Bool).unwrap(),
            SqlValue::Bool(false)
        );
        assert!(coerce(SqlValue::Int(2), FieldType::Bool).is_err());
    }
}
