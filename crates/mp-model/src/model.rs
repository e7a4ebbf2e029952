//! Registry owning every root model part of a simulation.

use std::collections::BTreeMap;

use crate::error::{ModelError, ModelResult};
use crate::model_part::ModelPart;

#[derive(Debug, Clone, Default)]
pub struct Model {
    model_parts: BTreeMap<String, ModelPart>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_model_part(&mut self, name: &str) -> ModelResult<&mut ModelPart> {
        if name.is_empty() || name.contains('.') {
            return Err(ModelError::InvalidName {
                name: name.to_string(),
            });
        }
        if self.model_parts.contains_key(name) {
            return Err(ModelError::DuplicateModelPart {
                name: name.to_string(),
            });
        }
        tracing::debug!(model_part = name, "creating model part");
        Ok(self
            .model_parts
            .entry(name.to_string())
            .or_insert_with(|| ModelPart::new(name)))
    }

    /// Whether `path` names a root model part or one of its sub-model parts.
    pub fn has_model_part(&self, path: &str) -> bool {
        match path.split_once('.') {
            Some((root, rest)) => self
                .model_parts
                .get(root)
                .is_some_and(|mp| mp.sub_model_part(rest).is_some()),
            None => self.model_parts.contains_key(path),
        }
    }

    /// Whether `name` is registered as a root model part.
    pub fn is_root_model_part(&self, name: &str) -> bool {
        !name.contains('.') && self.model_parts.contains_key(name)
    }

    pub fn get_model_part(&self, name: &str) -> ModelResult<&ModelPart> {
        self.model_parts
            .get(name)
            .ok_or_else(|| ModelError::NotFound {
                name: name.to_string(),
            })
    }

    pub fn get_model_part_mut(&mut self, name: &str) -> ModelResult<&mut ModelPart> {
        self.model_parts
            .get_mut(name)
            .ok_or_else(|| ModelError::NotFound {
                name: name.to_string(),
            })
    }

    pub fn model_part_names(&self) -> impl Iterator<Item = &str> {
        self.model_parts.keys().map(String::as_str)
    }

    pub fn delete_model_part(&mut self, name: &str) -> Option<ModelPart> {
        self.model_parts.remove(name)
    }
}
