//! Abstract, dialect-independent schema-mutation intents.
//!
//! A [`DdlIntent`] describes a schema-mutating statement without committing
//! to dialect syntax. Intents are pure and stateless: resolving one has no
//! side effects, so the same intent may be resolved repeatedly and
//! speculatively, for multiple dialects, without corrupting state. Higher
//! level migration orchestration (existence checks, advisory locking) lives
//! outside this crate and only consumes the resolved statements.

use crate::core::schema::{FieldDef, TableSchema};
use crate::dialect::Dialect;
use crate::error::{Result, StitchError};
use crate::query::fragment::SplitQuery;

/// The closed set of intent kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DdlKind {
    CreateTable,
    AddColumn,
    CreateIndex,
    CopyColumn,
}

impl DdlKind {
    /// Kebab-case name used in error context.
    pub fn as_str(&self) -> &'static str {
        match self {
            DdlKind::CreateTable => "create-table",
            DdlKind::AddColumn => "add-column",
            DdlKind::CreateIndex => "create-index",
            DdlKind::CopyColumn => "copy-column",
        }
    }
}

/// Kind-specific options.
#[derive(Debug, Clone)]
enum DdlOp {
    CreateTable {
        if_not_exists: bool,
    },
    AddColumn {
        column: String,
        if_not_exists: bool,
    },
    CreateIndex {
        columns: Vec<String>,
        unique: bool,
        name: Option<String>,
        if_not_exists: bool,
    },
    CopyColumn {
        from: String,
        to: String,
    },
}

/// An abstract schema-mutation statement, resolved to dialect-specific
/// syntax at expansion time.
#[derive(Debug, Clone)]
pub struct DdlIntent {
    table: TableSchema,
    op: DdlOp,
}

impl DdlIntent {
    /// Create the table with all of its declared columns.
    pub fn create_table(table: TableSchema) -> Self {
        DdlIntent {
            table,
            op: DdlOp::CreateTable {
                if_not_exists: false,
            },
        }
    }

    /// Add one declared column to an existing table.
    pub fn add_column(table: TableSchema, column: impl Into<String>) -> Self {
        DdlIntent {
            table,
            op: DdlOp::AddColumn {
                column: column.into(),
                if_not_exists: false,
            },
        }
    }

    /// Create an index over the given columns.
    pub fn create_index(table: TableSchema, columns: Vec<String>) -> Self {
        DdlIntent {
            table,
            op: DdlOp::CreateIndex {
                columns,
                unique: false,
                name: None,
                if_not_exists: false,
            },
        }
    }

    /// Backfill `to` from `from`, touching only rows where `to` is null.
    /// Idempotent by construction: existing data is never overwritten.
    pub fn copy_column(
        table: TableSchema,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        DdlIntent {
            table,
            op: DdlOp::CopyColumn {
                from: from.into(),
                to: to.into(),
            },
        }
    }

    /// Request `IF NOT EXISTS` where the target dialect supports it.
    ///
    /// On dialects lacking the flag for this kind the clause is silently
    /// omitted; callers relying on idempotent re-application there must
    /// catch "already exists" errors externally.
    pub fn if_not_exists(mut self) -> Self {
        match &mut self.op {
            DdlOp::CreateTable { if_not_exists }
            | DdlOp::AddColumn { if_not_exists, .. }
            | DdlOp::CreateIndex { if_not_exists, .. } => *if_not_exists = true,
            DdlOp::CopyColumn { .. } => {}
        }
        self
    }

    /// Make a create-index intent unique.
    pub fn unique(mut self) -> Self {
        if let DdlOp::CreateIndex { unique, .. } = &mut self.op {
            *unique = true;
        }
        self
    }

    /// Override the generated index name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let DdlOp::CreateIndex { name: n, .. } = &mut self.op {
            *n = Some(name.into());
        }
        self
    }

    /// The intent kind.
    pub fn kind(&self) -> DdlKind {
        match self.op {
            DdlOp::CreateTable { .. } => DdlKind::CreateTable,
            DdlOp::AddColumn { .. } => DdlKind::AddColumn,
            DdlOp::CreateIndex { .. } => DdlKind::CreateIndex,
            DdlOp::CopyColumn { .. } => DdlKind::CopyColumn,
        }
    }

    /// The target table.
    pub fn table(&self) -> &TableSchema {
        &self.table
    }

    /// Resolve the intent to a split-query for the given dialect.
    ///
    /// Resolution failures (unknown column, empty index) are fatal
    /// programming errors carrying `{table, kind, dialect}` context.
    pub fn resolve(&self, dialect: Dialect) -> Result<SplitQuery> {
        let kind = self.kind();
        match &self.op {
            DdlOp::CreateTable { if_not_exists } => {
                if self.table.fields.is_empty() {
                    return Err(self.error(dialect, "table has no columns"));
                }
                let mut q = SplitQuery::new("CREATE TABLE ");
                if *if_not_exists && dialect.supports_if_not_exists(kind) {
                    q = q.text("IF NOT EXISTS ");
                }
                q = q.ident(self.table.name.clone()).text(" (");
                for (i, field) in self.table.fields.iter().enumerate() {
                    if i > 0 {
                        q = q.text(", ");
                    }
                    q = q.merge(column_def(field), "");
                }
                if let Some(pk) = &self.table.primary_key {
                    q = q.text(", PRIMARY KEY (").ident(pk.clone()).text(")");
                }
                Ok(q.text(")"))
            }

            DdlOp::AddColumn {
                column,
                if_not_exists,
            } => {
                let field = self.require_field(column, dialect)?;
                let mut q = SplitQuery::new("ALTER TABLE ")
                    .ident(self.table.name.clone())
                    .text(" ADD COLUMN ");
                if *if_not_exists && dialect.supports_if_not_exists(kind) {
                    q = q.text("IF NOT EXISTS ");
                }
                Ok(q.merge(column_def(field), ""))
            }

            DdlOp::CreateIndex {
                columns,
                unique,
                name,
                if_not_exists,
            } => {
                if columns.is_empty() {
                    return Err(self.error(dialect, "index column list is empty"));
                }
                for column in columns {
                    self.require_field(column, dialect)?;
                }
                let index_name = name
                    .clone()
                    .unwrap_or_else(|| format!("idx_{}_{}", self.table.name, columns.join("_")));

                let mut q = SplitQuery::new("CREATE ");
                if *unique {
                    q = q.text("UNIQUE ");
                }
                q = q.text("INDEX ");
                if *if_not_exists && dialect.supports_if_not_exists(kind) {
                    q = q.text("IF NOT EXISTS ");
                }
                q = q
                    .ident(index_name)
                    .text(" ON ")
                    .ident(self.table.name.clone())
                    .text(" (");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        q = q.text(", ");
                    }
                    q = q.ident(column.clone());
                }
                Ok(q.text(")"))
            }

            DdlOp::CopyColumn { from, to } => {
                self.require_field(from, dialect)?;
                self.require_field(to, dialect)?;
                Ok(SplitQuery::new("UPDATE ")
                    .ident(self.table.name.clone())
                    .text(" SET ")
                    .ident(to.clone())
                    .text(" = ")
                    .ident(from.clone())
                    .text(" WHERE ")
                    .ident(to.clone())
                    .text(" IS NULL"))
            }
        }
    }

    fn require_field(&self, name: &str, dialect: Dialect) -> Result<&FieldDef> {
        self.table
            .field(name)
            .ok_or_else(|| self.error(dialect, format!("unknown column '{}'", name)))
    }

    fn error(&self, dialect: Dialect, message: impl Into<String>) -> StitchError {
        StitchError::intent(
            self.table.name.clone(),
            self.kind().as_str(),
            dialect.name(),
            message,
        )
    }
}

/// Column definition fragment: name, type, NOT NULL and DEFAULT/UNIQUE
/// modifiers. Defaults render as literals because the engines do not accept
/// bound parameters in DDL.
fn column_def(field: &FieldDef) -> SplitQuery {
    let mut q = SplitQuery::new("")
        .ident(field.name.clone())
        .text(format!(" {}", field.sql_type));
    if !field.shape.admits_null() && !field.shape.admits_absent() {
        q = q.text(" NOT NULL");
    }
    if let Some(default) = field.shape.default_value() {
        q = q.text(format!(" DEFAULT {}", default.to_sql_literal()));
    }
    if field.unique {
        q = q.text(" UNIQUE");
    }
    q
}
