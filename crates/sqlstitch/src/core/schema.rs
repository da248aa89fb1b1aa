//! Table schema descriptors consumed by the compile/normalize pipeline.
//!
//! These types are produced by the schema-definition layer and are read-only
//! to this crate. Wrapper semantics (optional/nullable/default) are carried
//! as an explicit declarative [`FieldShape`] chain walked by pattern
//! matching - no runtime type introspection happens at read time.
//!
//! Schemas are assembled through [`TableSchema::builder`], an explicit
//! builder that never mutates shared or global state.

use std::fmt;
use std::sync::Arc;

use crate::core::value::SqlValue;
use crate::query::fragment::SplitQuery;

/// Core value type a field decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
    Uuid,
    Decimal,
    DateTime,
    Date,
    /// JSON object or array; text cells are parsed on decode.
    Json,
    /// No validation or coercion.
    Any,
}

impl FieldType {
    /// Lowercase name used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Text => "text",
            FieldType::Bytes => "bytes",
            FieldType::Uuid => "uuid",
            FieldType::Decimal => "decimal",
            FieldType::DateTime => "datetime",
            FieldType::Date => "date",
            FieldType::Json => "json",
            FieldType::Any => "any",
        }
    }
}

/// Declarative wrapper chain describing a field's presence semantics.
///
/// Built once at schema-definition time and walked by simple pattern
/// matching during decode:
///
/// - `Core(ty)` - a value is required and must match `ty`
/// - `Nullable(inner)` - SQL NULL is admitted
/// - `Optional(inner)` - the column may be absent from the row slice
/// - `WithDefault(inner, default)` - absent/NULL cells take the default
#[derive(Debug, Clone)]
pub enum FieldShape {
    Core(FieldType),
    Nullable(Box<FieldShape>),
    Optional(Box<FieldShape>),
    WithDefault(Box<FieldShape>, SqlValue),
}

impl FieldShape {
    /// Shorthand for a required field of the given type.
    pub fn core(ty: FieldType) -> Self {
        FieldShape::Core(ty)
    }

    /// Wrap this shape to admit SQL NULL.
    pub fn nullable(self) -> Self {
        FieldShape::Nullable(Box::new(self))
    }

    /// Wrap this shape to admit absence from the row slice.
    pub fn optional(self) -> Self {
        FieldShape::Optional(Box::new(self))
    }

    /// Wrap this shape to substitute a default on absent/NULL cells.
    pub fn with_default(self, default: impl Into<SqlValue>) -> Self {
        FieldShape::WithDefault(Box::new(self), default.into())
    }

    /// The innermost core type of the chain.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldShape::Core(ty) => *ty,
            FieldShape::Nullable(inner)
            | FieldShape::Optional(inner)
            | FieldShape::WithDefault(inner, _) => inner.field_type(),
        }
    }

    /// Whether any layer of the chain admits SQL NULL.
    pub fn admits_null(&self) -> bool {
        match self {
            FieldShape::Core(_) => false,
            FieldShape::Nullable(_) => true,
            FieldShape::Optional(inner) => inner.admits_null(),
            FieldShape::WithDefault(_, _) => false,
        }
    }

    /// Whether any layer of the chain admits absence.
    pub fn admits_absent(&self) -> bool {
        match self {
            FieldShape::Core(_) => false,
            FieldShape::Nullable(inner) => inner.admits_absent(),
            FieldShape::Optional(_) => true,
            FieldShape::WithDefault(_, _) => true,
        }
    }

    /// The default value, if a `WithDefault` layer is present.
    pub fn default_value(&self) -> Option<&SqlValue> {
        match self {
            FieldShape::Core(_) => None,
            FieldShape::Nullable(inner) | FieldShape::Optional(inner) => inner.default_value(),
            FieldShape::WithDefault(_, default) => Some(default),
        }
    }
}

/// A decode hook applied to a raw cell value before shape validation.
///
/// Hooks return `Err(message)` on failure; the message is wrapped with
/// `{table, field}` context by the row decoder.
#[derive(Clone)]
pub struct DecodeHook(
    Arc<dyn Fn(&SqlValue) -> std::result::Result<SqlValue, String> + Send + Sync>,
);

impl DecodeHook {
    /// Wrap a decode function.
    pub fn new(
        f: impl Fn(&SqlValue) -> std::result::Result<SqlValue, String> + Send + Sync + 'static,
    ) -> Self {
        DecodeHook(Arc::new(f))
    }

    /// Apply the hook to a raw value.
    pub fn apply(&self, value: &SqlValue) -> std::result::Result<SqlValue, String> {
        (self.0)(value)
    }
}

impl fmt::Debug for DecodeHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DecodeHook(..)")
    }
}

/// A single column definition.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Column name.
    pub name: String,

    /// Column type string used verbatim in DDL (e.g. "TEXT", "BIGINT").
    pub sql_type: String,

    /// Presence/type semantics.
    pub shape: FieldShape,

    /// Whether the column carries a UNIQUE constraint in DDL.
    pub unique: bool,

    /// Optional decode hook run on present, non-null cells.
    pub decode: Option<DecodeHook>,
}

/// A foreign-key reference between two tables.
#[derive(Debug, Clone)]
pub struct Reference {
    /// Foreign-key field on this table.
    pub field: String,

    /// Referenced table name.
    pub target_table: String,

    /// Referenced field name (the target's primary key).
    pub target_field: String,

    /// Alias under which the single related entity is attached
    /// (default-visible in serialization).
    pub forward_alias: String,

    /// Alias under which the collection of referencing entities is attached
    /// to the target (excluded from default serialization).
    pub reverse_alias: Option<String>,
}

/// A derived SELECT expression projected alongside the table's columns.
#[derive(Debug, Clone)]
pub struct ComputedField {
    /// Alias field name (`<table>.<name>` in the projection).
    pub name: String,

    /// Type the expression's result decodes to.
    pub field_type: FieldType,

    /// The expression as a composable split-query; it may reference
    /// identifier markers and bound parameters.
    pub expr: SplitQuery,
}

/// Table schema descriptor (external input, read-only to the core).
#[derive(Debug, Clone)]
pub struct TableSchema {
    /// Table name; doubles as the row alias prefix.
    pub name: String,

    /// Primary key field name, if the table has one.
    pub primary_key: Option<String>,

    /// Ordered column definitions.
    pub fields: Vec<FieldDef>,

    /// Foreign-key references to other tables.
    pub references: Vec<Reference>,

    /// Per-row computed expressions.
    pub computed: Vec<ComputedField>,
}

impl TableSchema {
    /// Start building a schema for the named table.
    pub fn builder(name: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder {
            name: name.into(),
            primary_key: None,
            fields: Vec::new(),
            references: Vec::new(),
            computed: Vec::new(),
        }
    }

    /// Look up a field definition by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check if the table has a primary key.
    pub fn has_primary_key(&self) -> bool {
        self.primary_key.is_some()
    }
}

/// Explicit builder for [`TableSchema`].
///
/// Replaces fluent prototype-extension style modifier syntax with plain
/// composition: `primary_key`, `unique` and `references` are builder calls,
/// not mutations of a shared type registry.
#[derive(Debug)]
pub struct TableSchemaBuilder {
    name: String,
    primary_key: Option<String>,
    fields: Vec<FieldDef>,
    references: Vec<Reference>,
    computed: Vec<ComputedField>,
}

impl TableSchemaBuilder {
    /// Add a column.
    pub fn field(
        mut self,
        name: impl Into<String>,
        sql_type: impl Into<String>,
        shape: FieldShape,
    ) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            sql_type: sql_type.into(),
            shape,
            unique: false,
            decode: None,
        });
        self
    }

    /// Add a column with a decode hook.
    pub fn field_decoded(
        mut self,
        name: impl Into<String>,
        sql_type: impl Into<String>,
        shape: FieldShape,
        hook: DecodeHook,
    ) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            sql_type: sql_type.into(),
            shape,
            unique: false,
            decode: Some(hook),
        });
        self
    }

    /// Mark an already-added column as the primary key.
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = Some(name.into());
        self
    }

    /// Mark an already-added column as UNIQUE in DDL.
    pub fn unique(mut self, name: &str) -> Self {
        if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
            field.unique = true;
        }
        self
    }

    /// Declare a forward-only reference.
    pub fn references(
        self,
        field: impl Into<String>,
        target_table: impl Into<String>,
        target_field: impl Into<String>,
        forward_alias: impl Into<String>,
    ) -> Self {
        self.reference_inner(field, target_table, target_field, forward_alias, None)
    }

    /// Declare a reference with a reverse collection alias on the target.
    pub fn references_back(
        self,
        field: impl Into<String>,
        target_table: impl Into<String>,
        target_field: impl Into<String>,
        forward_alias: impl Into<String>,
        reverse_alias: impl Into<String>,
    ) -> Self {
        self.reference_inner(
            field,
            target_table,
            target_field,
            forward_alias,
            Some(reverse_alias.into()),
        )
    }

    fn reference_inner(
        mut self,
        field: impl Into<String>,
        target_table: impl Into<String>,
        target_field: impl Into<String>,
        forward_alias: impl Into<String>,
        reverse_alias: Option<String>,
    ) -> Self {
        self.references.push(Reference {
            field: field.into(),
            target_table: target_table.into(),
            target_field: target_field.into(),
            forward_alias: forward_alias.into(),
            reverse_alias,
        });
        self
    }

    /// Add a per-row computed expression.
    pub fn computed(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        expr: SplitQuery,
    ) -> Self {
        self.computed.push(ComputedField {
            name: name.into(),
            field_type,
            expr,
        });
        self
    }

    /// Finish building.
    pub fn build(self) -> TableSchema {
        TableSchema {
            name: self.name,
            primary_key: self.primary_key,
            fields: self.fields,
            references: self.references,
            computed: self.computed,
        }
    }
}
