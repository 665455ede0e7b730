//! Template store: named `{tokens, payload}` records

mod file;
mod memory;
pub mod validation;

pub use file::FileTemplateStore;
pub use memory::MemoryTemplateStore;
pub use validation::{is_valid_template_name, validate_template_name, TemplateNameError};

use crate::models::TemplateData;
use thiserror::Error;

/// Errors raised by a template store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid template name: {0}")]
    InvalidName(#[from] TemplateNameError),

    #[error("Template store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template record is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key-value storage for templates, keyed by name.
///
/// `put` overwrites (last write wins). `list` returns names in the backend's
/// enumeration order.
pub trait TemplateStore: Send + Sync {
    /// Store `data` under `name`, replacing any existing record
    fn put(&self, name: &str, data: &TemplateData) -> Result<(), StoreError>;

    /// Fetch the record stored under `name`, if any
    fn get(&self, name: &str) -> Result<Option<TemplateData>, StoreError>;

    /// Names of all stored templates
    fn list(&self) -> Result<Vec<String>, StoreError>;
}
