//! Identifier and builtin markers, and the interpolated value sum type.
//!
//! Markers say "render me as a quoted name" or "render me as a
//! database-native keyword" - never as a bound parameter.

use crate::core::value::SqlValue;
use crate::ddl::DdlIntent;
use crate::dialect::Dialect;
use crate::query::fragment::SplitQuery;

/// An identifier marker: renders to a dialect-quoted name inline,
/// consuming no parameter slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    name: String,
}

impl Ident {
    /// Wrap a name. Validation happens at render time.
    pub fn new(name: impl Into<String>) -> Self {
        Ident { name: name.into() }
    }

    /// The unquoted name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A closed set of database-native keywords that render as literal SQL
/// text, never as a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    CurrentTimestamp,
    CurrentDate,
    CurrentTime,
    Null,
    Default,
    Random,
}

impl Builtin {
    /// The keyword text for the given dialect.
    pub fn sql(&self, dialect: Dialect) -> &'static str {
        match self {
            Builtin::CurrentTimestamp => "CURRENT_TIMESTAMP",
            Builtin::CurrentDate => "CURRENT_DATE",
            Builtin::CurrentTime => "CURRENT_TIME",
            Builtin::Null => "NULL",
            Builtin::Default => "DEFAULT",
            Builtin::Random => match dialect {
                Dialect::Mysql => "RAND()",
                Dialect::Sqlite | Dialect::Postgres => "RANDOM()",
            },
        }
    }
}

/// A value interpolated into a split-query.
///
/// `Fragment`, `Ddl` and `Table` only appear in un-expanded queries; the
/// expander replaces them, and the renderer treats any leftover as a
/// contract violation.
#[derive(Debug, Clone)]
pub enum QueryValue {
    /// A bound parameter.
    Param(SqlValue),
    /// An identifier marker.
    Ident(Ident),
    /// A builtin keyword marker.
    Builtin(Builtin),
    /// A table reference; expansion turns it into an identifier marker.
    Table(String),
    /// A nested composable split-query.
    Fragment(SplitQuery),
    /// An abstract schema-mutation statement, dialect-resolved at
    /// expansion time.
    Ddl(DdlIntent),
}

impl QueryValue {
    /// Short name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            QueryValue::Param(_) => "param",
            QueryValue::Ident(_) => "identifier",
            QueryValue::Builtin(_) => "builtin",
            QueryValue::Table(_) => "table",
            QueryValue::Fragment(_) => "fragment",
            QueryValue::Ddl(_) => "ddl-intent",
        }
    }
}
