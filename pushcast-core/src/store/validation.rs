//! Template name validation
//!
//! Names become file names, so anything that could escape the data directory
//! or collide with hidden files is rejected. Non-ASCII names are allowed.

use thiserror::Error;

/// Longest accepted template name, in characters
pub const MAX_TEMPLATE_NAME_LEN: usize = 128;

/// Longest accepted template name in UTF-8 bytes; `<name>.json` must fit a
/// 255-byte file name
pub const MAX_TEMPLATE_NAME_BYTES: usize = 250;

/// Errors that can occur during template name validation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateNameError {
    #[error("Template name is empty")]
    Empty,

    #[error("Template name is too long (max 128 characters and 250 bytes)")]
    TooLong,

    #[error("Template name must not start with '.'")]
    LeadingDot,

    #[error("Template name contains a path separator or control character")]
    InvalidCharacters,
}

/// Validate a template name
pub fn validate_template_name(name: &str) -> Result<(), TemplateNameError> {
    if name.trim().is_empty() {
        return Err(TemplateNameError::Empty);
    }

    if name.len() > MAX_TEMPLATE_NAME_BYTES || name.chars().count() > MAX_TEMPLATE_NAME_LEN {
        return Err(TemplateNameError::TooLong);
    }

    // Also covers "." and ".."
    if name.starts_with('.') {
        return Err(TemplateNameError::LeadingDot);
    }

    if name
        .chars()
        .any(|ch| ch == '/' || ch == '\\' || ch == ':' || ch.is_control())
    {
        return Err(TemplateNameError::InvalidCharacters);
    }

    Ok(())
}

/// Check if a template name is valid (convenience function)
pub fn is_valid_template_name(name: &str) -> bool {
    validate_template_name(name).is_ok()
}
