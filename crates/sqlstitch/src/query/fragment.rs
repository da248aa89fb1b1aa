//! The split-query fragment model.
//!
//! A split-query is an alternating sequence of literal SQL text segments
//! and interpolated values, always holding the structural invariant
//! `segments.len() == values.len() + 1`. The invariant is preserved by
//! construction on every builder call and merge - it is never recomputed
//! after the fact.

use crate::core::value::SqlValue;
use crate::ddl::DdlIntent;
use crate::error::{Result, StitchError};
use crate::query::marker::{Builtin, Ident, QueryValue};

use crate::core::schema::TableSchema;

/// An immutable-once-built alternating sequence of SQL text and
/// interpolated values.
#[derive(Debug, Clone)]
pub struct SplitQuery {
    segments: Vec<String>,
    values: Vec<QueryValue>,
}

impl SplitQuery {
    /// Start a query with an initial text segment.
    pub fn new(text: impl Into<String>) -> Self {
        SplitQuery {
            segments: vec![text.into()],
            values: Vec::new(),
        }
    }

    /// Rebuild a split-query from raw parts, validating the arity
    /// invariant.
    ///
    /// This is the only entry point where a malformed fragment can be
    /// observed; a violation is a fatal `Contract` error indicating a
    /// composer bug, never bad input data.
    pub fn from_parts(segments: Vec<String>, values: Vec<QueryValue>) -> Result<Self> {
        if segments.len() != values.len() + 1 {
            return Err(StitchError::contract(format!(
                "split-query arity violation: {} segments for {} values (expected {})",
                segments.len(),
                values.len(),
                values.len() + 1
            )));
        }
        Ok(SplitQuery { segments, values })
    }

    /// Append literal text to the trailing segment.
    pub fn text(mut self, text: impl AsRef<str>) -> Self {
        // segments is non-empty by construction
        if let Some(last) = self.segments.last_mut() {
            last.push_str(text.as_ref());
        }
        self
    }

    /// Interpolate a bound parameter.
    pub fn bind(self, value: impl Into<SqlValue>) -> Self {
        self.push(QueryValue::Param(value.into()))
    }

    /// Interpolate an identifier marker.
    pub fn ident(self, name: impl Into<String>) -> Self {
        self.push(QueryValue::Ident(Ident::new(name)))
    }

    /// Interpolate a builtin keyword marker.
    pub fn builtin(self, builtin: Builtin) -> Self {
        self.push(QueryValue::Builtin(builtin))
    }

    /// Interpolate a table reference; expansion turns it into an
    /// identifier marker.
    pub fn table(self, table: &TableSchema) -> Self {
        self.push(QueryValue::Table(table.name.clone()))
    }

    /// Interpolate a nested fragment.
    pub fn fragment(self, fragment: SplitQuery) -> Self {
        self.push(QueryValue::Fragment(fragment))
    }

    /// Interpolate a DDL intent.
    pub fn ddl(self, intent: DdlIntent) -> Self {
        self.push(QueryValue::Ddl(intent))
    }

    /// Interpolate any value, opening a fresh empty trailing segment.
    pub fn push(mut self, value: QueryValue) -> Self {
        self.values.push(value);
        self.segments.push(String::new());
        self
    }

    /// Associatively merge another split-query into this one.
    ///
    /// Appends `other`'s first segment onto this query's last segment,
    /// interleaves the remaining segments and values, then appends
    /// `trailing` onto the new last segment. Arity holds by construction:
    /// `other` contributes exactly as many new segments as values.
    pub fn merge(mut self, other: SplitQuery, trailing: &str) -> Self {
        let SplitQuery { segments, values } = other;
        let mut seg_iter = segments.into_iter();
        if let (Some(last), Some(first)) = (self.segments.last_mut(), seg_iter.next()) {
            last.push_str(&first);
        }
        for (value, segment) in values.into_iter().zip(seg_iter) {
            self.values.push(value);
            self.segments.push(segment);
        }
        if let Some(last) = self.segments.last_mut() {
            last.push_str(trailing);
        }
        self
    }

    /// The literal text segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The interpolated values.
    pub fn values(&self) -> &[QueryValue] {
        &self.values
    }

    /// Whether the query carries no interpolated values.
    pub fn is_flat_text(&self) -> bool {
        self.values.is_empty()
    }

    /// Decompose into raw parts.
    pub fn into_parts(self) -> (Vec<String>, Vec<QueryValue>) {
        (self.segments, self.values)
    }

    pub(crate) fn push_resolved(&mut self, value: QueryValue, segment: String) {
        self.values.push(value);
        self.segments.push(segment);
    }
}

impl Default for SplitQuery {
    fn default() -> Self {
        SplitQuery::new("")
    }
}
