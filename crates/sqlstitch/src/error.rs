//! Error types for query compilation and result normalization.

use thiserror::Error;

/// Main error type for query compilation and normalization.
#[derive(Error, Debug)]
pub enum StitchError {
    /// A structural invariant was violated (split-query arity, unresolved
    /// marker at render time). Indicates a bug in a composer, never bad
    /// input data, and is never retried.
    #[error("Query contract violation: {0}")]
    Contract(String),

    /// Identifier failed validation before quoting.
    #[error("Invalid identifier: {0}")]
    Identifier(String),

    /// A raw row carries an alias prefix for a table that was not passed
    /// to `normalize` - the caller's query joins a table it forgot to
    /// register.
    #[error("Row column '{column}' references unregistered table '{prefix}'")]
    UnregisteredTable { prefix: String, column: String },

    /// A raw row key lacks the `"<table>.<field>"` separator, so no table
    /// slice can claim it. Whatever executed the SELECT did not preserve
    /// the projection's alias contract.
    #[error("Row column '{0}' is missing the '<table>.<field>' alias separator")]
    MalformedRowKey(String),

    /// Decoding a row slice failed (hook error, coercion failure, schema
    /// validation failure). Aborts the whole normalization call.
    #[error("Decode failed for {table}.{field}: {message}")]
    Decode {
        table: String,
        field: String,
        message: String,
    },

    /// A DDL intent could not be resolved for the requested dialect.
    #[error("Cannot resolve {kind} for table {table} on dialect {dialect}: {message}")]
    IntentResolution {
        table: String,
        kind: String,
        dialect: String,
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StitchError {
    /// Create a Contract error.
    pub fn contract(message: impl Into<String>) -> Self {
        StitchError::Contract(message.into())
    }

    /// Create a Decode error with table/field context.
    pub fn decode(
        table: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        StitchError::Decode {
            table: table.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an IntentResolution error with table/kind/dialect context.
    pub fn intent(
        table: impl Into<String>,
        kind: impl Into<String>,
        dialect: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        StitchError::IntentResolution {
            table: table.into(),
            kind: kind.into(),
            dialect: dialect.into(),
            message: message.into(),
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for query and normalization operations.
pub type Result<T> = std::result::Result<T, StitchError>;
