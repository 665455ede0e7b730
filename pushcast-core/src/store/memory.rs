//! In-memory template store

use super::{validate_template_name, StoreError, TemplateStore};
use crate::models::TemplateData;
use std::collections::HashMap;
use std::sync::RwLock;

/// Template store backed by a map. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<HashMap<String, TemplateData>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn put(&self, name: &str, data: &TemplateData) -> Result<(), StoreError> {
        validate_template_name(name)?;
        self.templates
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), data.clone());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<TemplateData>, StoreError> {
        validate_template_name(name)?;
        Ok(self
            .templates
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned())
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .templates
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect())
    }
}
