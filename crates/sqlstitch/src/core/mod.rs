//! Dialect-agnostic foundations shared by the query and normalization layers.
//!
//! - [`schema`]: table, field and reference descriptors (external input)
//! - [`value`]: the owned SQL value representation
//! - [`identifier`]: identifier validation and quoting

pub mod identifier;
pub mod schema;
pub mod value;

// Re-export commonly used types for convenience
pub use schema::{
    ComputedField, DecodeHook, FieldDef, FieldShape, FieldType, Reference, TableSchema,
};
pub use value::SqlValue;
