use thiserror::Error;

use crate::validate::ValidationResult;

/// Errors raised by redirect operations.
///
/// Store implementations return these wrapped in [`anyhow::Error`]; callers
/// at an outer boundary recover the variant with `downcast_ref`.
#[derive(Error, Debug)]
pub enum RedirectError {
    #[error("validation failed: {}", .0.errors.join("; "))]
    Validation(ValidationResult),

    #[error("redirect not found: {0}")]
    NotFound(String),

    #[error("content document not found: {0}")]
    ContentNotFound(String),

    #[error("remote operation failed: {0}")]
    Remote(String),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

impl RedirectError {
    /// Stable, machine-readable code for this variant.
    pub fn code(&self) -> &'static str {
        match self {
            RedirectError::Validation(_) => "validation_failed",
            RedirectError::NotFound(_) | RedirectError::ContentNotFound(_) => "not_found",
            RedirectError::Remote(_) => "remote_error",
            RedirectError::InvalidValue { .. } => "bad_request",
        }
    }
}
