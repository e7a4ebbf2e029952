//! Swap placeholder element and condition types for physics-specific ones.

use mp_config::ElementReplaceSettings;

use crate::error::{ModelError, ModelResult};
use crate::model_part::ModelPart;

/// Node count encoded in a type name such as `Element2D3N`, if any.
fn nodes_in_name(name: &str) -> Option<usize> {
    let body = name.strip_suffix('N')?;
    let d_pos = body.rfind('D')?;
    let digits = &body[d_pos + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Rename every element and condition of the model part.
///
/// When the new type name encodes a node count, each entity's connectivity
/// must match it.
pub fn replace_elements_and_conditions(
    model_part: &mut ModelPart,
    settings: &ElementReplaceSettings,
) -> ModelResult<()> {
    let element_nodes = nodes_in_name(&settings.element_name);
    let condition_nodes = nodes_in_name(&settings.condition_name);

    for element in model_part.elements.values() {
        if let Some(expected) = element_nodes
            && element.nodes.len() != expected
        {
            return Err(ModelError::GeometryMismatch {
                name: settings.element_name.clone(),
                id: element.id,
                expected,
                got: element.nodes.len(),
            });
        }
    }
    for condition in model_part.conditions.values() {
        if let Some(expected) = condition_nodes
            && condition.nodes.len() != expected
        {
            return Err(ModelError::GeometryMismatch {
                name: settings.condition_name.clone(),
                id: condition.id,
                expected,
                got: condition.nodes.len(),
            });
        }
    }

    for element in model_part.elements.values_mut() {
        element.name.clone_from(&settings.element_name);
    }
    for condition in model_part.conditions.values_mut() {
        condition.name.clone_from(&settings.condition_name);
    }

    tracing::debug!(
        model_part = model_part.name(),
        element = %settings.element_name,
        condition = %settings.condition_name,
        "replaced elements and conditions"
    );
    Ok(())
}
