//! Expansion of nested fragments and DDL intents into one flat split-query.
//!
//! Expansion walks every interpolated value of a top-level split-query:
//! fragments are recursively expanded and merged in place, DDL intents are
//! dialect-resolved and merged in place, table references become identifier
//! markers, and everything else passes through untouched. The output
//! contains only parameters, identifier markers and builtin markers.

use crate::dialect::Dialect;
use crate::error::Result;
use crate::query::fragment::SplitQuery;
use crate::query::marker::{Ident, QueryValue};

/// Flatten a split-query for the given dialect.
///
/// This is the only point where DDL intents see a dialect; the flat result
/// is handed to the renderer unchanged.
pub fn expand(query: SplitQuery, dialect: Dialect) -> Result<SplitQuery> {
    let (segments, values) = query.into_parts();
    let mut seg_iter = segments.into_iter();
    let mut out = SplitQuery::new(seg_iter.next().unwrap_or_default());

    for (value, segment) in values.into_iter().zip(seg_iter) {
        match value {
            QueryValue::Fragment(inner) => {
                let flat = expand(inner, dialect)?;
                out = out.merge(flat, &segment);
            }
            QueryValue::Ddl(intent) => {
                let resolved = expand(intent.resolve(dialect)?, dialect)?;
                out = out.merge(resolved, &segment);
            }
            QueryValue::Table(name) => {
                out.push_resolved(QueryValue::Ident(Ident::new(name)), segment);
            }
            passthrough @ (QueryValue::Param(_)
            | QueryValue::Ident(_)
            | QueryValue::Builtin(_)) => {
                out.push_resolved(passthrough, segment);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{FieldShape, FieldType, TableSchema};
    use crate::core::value::SqlValue;

    fn users_table() -> TableSchema {
        TableSchema::builder("users")
            .field("id", "BIGINT", FieldShape::core(FieldType::Int))
            .primary_key("id")
            .build()
    }

    #[test]
    fn test_expand_passthrough() {
        let q = SplitQuery::new("WHERE a = ").bind(1);
        let flat = expand(q, Dialect::Sqlite).unwrap();
        assert_eq!(flat.values().len(), 1);
        assert!(matches!(
            flat.values()[0],
            QueryValue::Param(SqlValue::Int(1))
        ));
    }

    #[test]
    fn test_expand_table_reference() {
        let users = users_table();
        let q = SplitQuery::new("SELECT * FROM ").table(&users);
        let flat = expand(q, Dialect::Sqlite).unwrap();
        match &flat.values()[0] {
            QueryValue::Ident(id) => assert_eq!(id.name(), "users"),
            other => panic!("expected identifier, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_expand_nested_fragments() {
        let innermost = SplitQuery::new("b = ").bind(2);
        let inner = SplitQuery::new("a = ").bind(1).text(" AND ").fragment(innermost);
        let q = SplitQuery::new("WHERE ").fragment(inner).text(" ORDER BY 1");

        let flat = expand(q, Dialect::Sqlite).unwrap();
        assert_eq!(flat.segments().len(), flat.values().len() + 1);
        assert_eq!(flat.values().len(), 2);
        assert_eq!(flat.segments()[0], "WHERE a = ");
        assert_eq!(flat.segments()[1], " AND b = ");
        assert_eq!(flat.segments()[2], " ORDER BY 1");
    }
}
