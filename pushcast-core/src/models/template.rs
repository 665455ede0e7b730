//! Saved token + payload bundles

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The persisted part of a template: everything except its name.
///
/// The payload is kept as an arbitrary JSON value so that loading returns
/// exactly what was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateData {
    pub tokens: Vec<String>,
    pub payload: Value,
}

/// A named template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub data: TemplateData,
}
