//! Rendering a flat split-query into final SQL text plus parameters.
//!
//! This is the only place identifier quoting and placeholder syntax are
//! chosen. Identifier and builtin markers render inline and consume no
//! parameter slot; every other value becomes a positional placeholder and
//! lands in the ordered parameter list. Placeholder numbering comes from a
//! single counter, so it stays strictly increasing even across merged
//! fragments.

use crate::core::value::SqlValue;
use crate::dialect::Dialect;
use crate::error::{Result, StitchError};
use crate::query::expand::expand;
use crate::query::fragment::SplitQuery;
use crate::query::marker::QueryValue;

/// Final SQL text plus its ordered parameter list, ready for an external
/// driver's execute call.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// The SQL statement text.
    pub sql: String,

    /// Bound parameters in placeholder order.
    pub params: Vec<SqlValue>,
}

impl Rendered {
    /// Number of bound parameters.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

impl std::fmt::Display for Rendered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} /* {} params */", self.sql, self.params.len())
    }
}

/// Render an already-flat split-query for the given dialect.
///
/// A leftover fragment, DDL intent or table reference is a `Contract`
/// error: the query was never expanded, which is a composer bug.
pub fn render(query: &SplitQuery, dialect: Dialect) -> Result<Rendered> {
    let mut sql = String::new();
    let mut params: Vec<SqlValue> = Vec::new();

    let mut seg_iter = query.segments().iter();
    if let Some(first) = seg_iter.next() {
        sql.push_str(first);
    }

    for (value, segment) in query.values().iter().zip(seg_iter) {
        match value {
            QueryValue::Param(v) => {
                params.push(v.clone());
                sql.push_str(&dialect.placeholder(params.len()));
            }
            QueryValue::Ident(id) => {
                sql.push_str(&dialect.quote_ident(id.name())?);
            }
            QueryValue::Builtin(b) => {
                sql.push_str(b.sql(dialect));
            }
            other => {
                return Err(StitchError::contract(format!(
                    "unresolved {} marker at render time - query was not expanded",
                    other.kind_name()
                )));
            }
        }
        sql.push_str(segment);
    }

    tracing::debug!(
        dialect = dialect.name(),
        sql_len = sql.len(),
        params = params.len(),
        "rendered query"
    );

    Ok(Rendered { sql, params })
}

/// Expand and render in one step.
pub fn compile(query: SplitQuery, dialect: Dialect) -> Result<Rendered> {
    render(&expand(query, dialect)?, dialect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::marker::Builtin;

    #[test]
    fn test_render_plain_text_verbatim() {
        let q = SplitQuery::new("SELECT 1");
        let r = render(&q, Dialect::Postgres).unwrap();
        assert_eq!(r.sql, "SELECT 1");
        assert!(r.params.is_empty());
    }

    #[test]
    fn test_render_params_and_idents() {
        let q = SplitQuery::new("WHERE ")
            .ident("a")
            .text(" = ")
            .bind(5)
            .text(" AND ")
            .ident("b")
            .text(" = ")
            .bind("x");

        let r = render(&q, Dialect::Sqlite).unwrap();
        assert_eq!(r.sql, "WHERE \"a\" = ? AND \"b\" = ?");
        assert_eq!(r.params, vec![SqlValue::Int(5), SqlValue::Text("x".to_string())]);

        let r = render(&q, Dialect::Postgres).unwrap();
        assert_eq!(r.sql, "WHERE \"a\" = $1 AND \"b\" = $2");

        let r = render(&q, Dialect::Mysql).unwrap();
        assert_eq!(r.sql, "WHERE `a` = ? AND `b` = ?");
    }

    #[test]
    fn test_render_builtin_consumes_no_param_slot() {
        let q = SplitQuery::new("SET ts = ")
            .builtin(Builtin::CurrentTimestamp)
            .text(", n = ")
            .bind(1);

        let r = render(&q, Dialect::Postgres).unwrap();
        assert_eq!(r.sql, "SET ts = CURRENT_TIMESTAMP, n = $1");
        assert_eq!(r.param_count(), 1);
    }

    #[test]
    fn test_render_rejects_unexpanded_fragment() {
        let q = SplitQuery::new("WHERE ").fragment(SplitQuery::new("a = 1"));
        let err = render(&q, Dialect::Sqlite).unwrap_err();
        assert!(matches!(err, StitchError::Contract(_)));
        assert!(err.to_string().contains("fragment"));
    }

    #[test]
    fn test_render_rejects_invalid_identifier() {
        let q = SplitQuery::new("SELECT ").ident("bad\0name");
        assert!(render(&q, Dialect::Sqlite).is_err());
    }

    #[test]
    fn test_compile_scenario_identifier_fragment() {
        // "WHERE " + fragment(tbl.col) + " = " + param 5
        let col_ref = SplitQuery::new("").ident("tbl").text(".").ident("col");
        let q = SplitQuery::new("WHERE ").merge(col_ref, " = ").bind(5);

        let r = compile(q, Dialect::Sqlite).unwrap();
        assert_eq!(r.sql, "WHERE \"tbl\".\"col\" = ?");
        assert_eq!(r.params, vec![SqlValue::Int(5)]);
    }

    #[test]
    fn test_postgres_numbering_increases_across_fragments() {
        let frag_a = SplitQuery::new("a = ").bind(1).text(" AND b = ").bind(2);
        let frag_b = SplitQuery::new("c = ").bind(3);
        let q = SplitQuery::new("WHERE ")
            .fragment(frag_a)
            .text(" AND ")
            .fragment(frag_b);

        let r = compile(q, Dialect::Postgres).unwrap();
        assert_eq!(r.sql, "WHERE a = $1 AND b = $2 AND c = $3");
        assert_eq!(
            r.params,
            vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]
        );
    }
}
