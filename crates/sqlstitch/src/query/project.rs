//! SELECT column list projection with table-prefixed aliases.
//!
//! Every projected column is aliased `"<table>.<field>"`. That alias scheme
//! is a contract, not an implementation detail: the row decoder slices raw
//! rows by exact string match on these aliases, and whatever executes the
//! rendered SELECT must hand the aliases back as row keys.

use crate::core::schema::TableSchema;
use crate::query::fragment::SplitQuery;

/// Emit a comma-joined SELECT column list for the given tables.
///
/// Plain fields become `<table>.<field> AS "<table>.<field>"`; computed
/// expressions are appended as `(<expr>) AS "<table>.<name>"` with the
/// expression split-query merged in, so derived expressions may reference
/// identifier markers and bound parameters.
pub fn project(tables: &[&TableSchema]) -> SplitQuery {
    let mut query = SplitQuery::new("");
    let mut first = true;

    for table in tables {
        for field in &table.fields {
            if !first {
                query = query.text(", ");
            }
            first = false;
            query = query
                .ident(table.name.clone())
                .text(".")
                .ident(field.name.clone())
                .text(" AS ")
                .ident(format!("{}.{}", table.name, field.name));
        }
        for computed in &table.computed {
            if !first {
                query = query.text(", ");
            }
            first = false;
            query = query
                .text("(")
                .fragment(computed.expr.clone())
                .text(") AS ")
                .ident(format!("{}.{}", table.name, computed.name));
        }
    }

    query
}
