//! # sqlstitch
//!
//! Dialect-aware SQL composition and result-set normalization library.
//!
//! Queries are built as split-query fragments: literal text segments
//! interleaved with typed markers (bound parameters, quoted identifiers,
//! dialect builtins, nested fragments, DDL intents). Fragments compose
//! without ever concatenating user values into SQL text, then compile to a
//! final statement for a specific dialect:
//!
//! - **Composition** via [`SplitQuery`] builder calls and fragment merging
//! - **Expansion** of nested fragments and DDL intents into flat queries
//! - **Rendering** with per-dialect identifier quoting and placeholders
//!   (`?` for SQLite/MySQL, `$1, $2, ...` for PostgreSQL)
//! - **Projection** of table schemas into aliased SELECT column lists
//! - **Normalization** of joined result rows into deduplicated, linked
//!   entities with schema-driven decoding
//!
//! ## Example
//!
//! ```rust
//! use sqlstitch::{compile, Dialect, SplitQuery};
//!
//! fn main() -> sqlstitch::Result<()> {
//!     let query = SplitQuery::new("SELECT * FROM ")
//!         .ident("post")
//!         .text(" WHERE ")
//!         .ident("views")
//!         .text(" > ")
//!         .bind(100);
//!     let rendered = compile(query, Dialect::Postgres)?;
//!     assert_eq!(rendered.sql, "SELECT * FROM \"post\" WHERE \"views\" > $1");
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod ddl;
pub mod dialect;
pub mod error;
pub mod normalize;
pub mod query;

// Re-exports for convenient access
pub use crate::core::schema::{
    ComputedField, DecodeHook, FieldDef, FieldShape, FieldType, Reference, TableSchema,
    TableSchemaBuilder,
};
pub use crate::core::value::SqlValue;
pub use ddl::{DdlIntent, DdlKind};
pub use dialect::Dialect;
pub use error::{Result, StitchError};
pub use normalize::{normalize, Entity, EntityKey, EntitySet, RawRow};
pub use query::{compile, expand, project, render, Builtin, Ident, QueryValue, Rendered, SplitQuery};
