//! SQL dialect selection (Strategy pattern over a closed enum).
//!
//! The renderer is the only place identifier quoting and placeholder syntax
//! are chosen; every other component stays dialect-agnostic. DDL intents are
//! the one exception: they resolve dialect-specific syntax once, at
//! expansion time, which is why capability flags live here too.

use crate::core::identifier::{quote_backtick, quote_double};
use crate::ddl::DdlKind;
use crate::error::Result;

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// SQLite: `"…"` identifier quoting, repeating `?` placeholders.
    Sqlite,
    /// PostgreSQL: `"…"` identifier quoting, `$1, $2, …` placeholders.
    Postgres,
    /// MySQL: `` `…` `` identifier quoting, repeating `?` placeholders.
    Mysql,
}

impl Dialect {
    /// Get the dialect identifier.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
        }
    }

    /// Quote an identifier (table name, column name, alias).
    ///
    /// Validates the identifier before quoting; see
    /// [`crate::core::identifier`].
    pub fn quote_ident(&self, name: &str) -> Result<String> {
        match self {
            Dialect::Sqlite | Dialect::Postgres => quote_double(name),
            Dialect::Mysql => quote_backtick(name),
        }
    }

    /// Get a parameter placeholder for the given 1-based index.
    ///
    /// Postgres numbering is strictly increasing across the whole rendered
    /// query; the renderer feeds a single monotonic counter.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Sqlite | Dialect::Mysql => "?".to_string(),
            Dialect::Postgres => format!("${}", index),
        }
    }

    /// Whether the dialect accepts `IF NOT EXISTS` on the given DDL kind.
    ///
    /// Absent flags are silently omitted at resolution time; callers
    /// relying on idempotent re-application on those dialects must catch
    /// "already exists" errors externally.
    pub fn supports_if_not_exists(&self, kind: DdlKind) -> bool {
        match (self, kind) {
            (Dialect::Postgres, _) => true,
            (Dialect::Sqlite, DdlKind::CreateTable | DdlKind::CreateIndex) => true,
            (Dialect::Sqlite, _) => false,
            (Dialect::Mysql, DdlKind::CreateTable) => true,
            (Dialect::Mysql, _) => false,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
