//! Centralized identifier validation and quoting for SQL injection prevention.
//!
//! SQL identifiers (table names, column names, aliases) cannot be passed as
//! parameters in prepared statements - only data values can be parameterized.
//! To safely construct dynamic SQL with identifiers, we:
//!
//! 1. Validate identifiers for suspicious patterns (null bytes, excessive length)
//! 2. Apply dialect-specific quoting (double quotes or backticks)
//! 3. Escape the quote character within the quotes by doubling it
//!
//! Every identifier marker that reaches the renderer funnels through this
//! module.

use crate::error::{Result, StitchError};

/// Maximum identifier length (conservative limit across databases).
/// - PostgreSQL: 63 bytes
/// - MySQL: 64 characters
/// - SQLite: effectively unlimited, capped here for consistency
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier for security issues.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes (injection vector)
/// - Identifiers exceeding maximum length
///
/// # Errors
///
/// Returns `StitchError::Identifier` with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StitchError::Identifier(
            "identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(StitchError::Identifier(format!(
            "identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(StitchError::Identifier(format!(
            "identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote an identifier with double quotes (PostgreSQL, SQLite).
///
/// Escapes embedded double quotes by doubling them. Validates the
/// identifier before quoting.
pub fn quote_double(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote an identifier with backticks (MySQL).
///
/// Escapes embedded backticks by doubling them. Validates the
/// identifier before quoting.
pub fn quote_backtick(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}
