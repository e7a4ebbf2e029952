//! Model import pipeline shared by the solvers.

use std::path::Path;

use mp_config::{ElementReplaceSettings, ModelImportSettings};
use mp_model::{
    ImportSummary, ModelPart, OrientationPolicy, check_orientation, mdpa_path, read_model_part,
    replace_elements_and_conditions,
};

use crate::error::{SolverError, SolverResult};

pub const ELEMENT_3D: &str = "CompressiblePotentialFlowElement3D4N";
pub const CONDITION_3D: &str = "PotentialWallCondition3D3N";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Mdpa,
}

impl InputKind {
    pub fn parse(input_type: &str) -> SolverResult<Self> {
        match input_type {
            "mdpa" => Ok(InputKind::Mdpa),
            other => Err(SolverError::NotImplemented {
                what: format!("other model part input options ({other}) are not yet implemented"),
            }),
        }
    }
}

/// Read the mesh named by `settings`, resolved against `base_dir`, and run the
/// orientation check on it.
pub fn read_input(
    model_part: &mut ModelPart,
    settings: &ModelImportSettings,
    base_dir: &Path,
) -> SolverResult<ImportSummary> {
    match InputKind::parse(&settings.input_type)? {
        InputKind::Mdpa => {
            let path = mdpa_path(base_dir, &settings.input_filename);
            tracing::info!(path = %path.display(), "reading model part");
            let summary = read_model_part(&path, model_part)?;

            let policy = if settings.throw_orientation_errors {
                OrientationPolicy::Raise
            } else {
                OrientationPolicy::Repair
            };
            let report = check_orientation(model_part, policy)?;
            tracing::debug!(
                checked = report.checked,
                inverted = report.inverted.len(),
                "orientation check"
            );
            Ok(summary)
        }
    }
}

/// Element and condition types for a potential-flow mesh of the given
/// dimension. 2D meshes use the configured pair.
pub fn potential_flow_replacement(
    domain_size: usize,
    configured: &ElementReplaceSettings,
) -> SolverResult<ElementReplaceSettings> {
    match domain_size {
        2 => Ok(configured.clone()),
        3 => Ok(ElementReplaceSettings::new(ELEMENT_3D, CONDITION_3D)),
        _ => Err(SolverError::DomainSize { domain_size }),
    }
}

/// Swap element types and make sure the history buffer is deep enough.
pub fn finish_import(
    model_part: &mut ModelPart,
    replacement: Option<&ElementReplaceSettings>,
    minimum_buffer_size: usize,
) -> SolverResult<()> {
    if let Some(replacement) = replacement {
        replace_elements_and_conditions(model_part, replacement)?;
    }
    model_part.raise_buffer_size(minimum_buffer_size);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_mdpa_input_is_supported() {
        assert_eq!(InputKind::parse("mdpa").unwrap(), InputKind::Mdpa);
        let err = InputKind::parse("hdf5").unwrap_err();
        assert!(matches!(err, SolverError::NotImplemented { .. }));
    }

    #[test]
    fn replacement_follows_domain_size() {
        let configured = ElementReplaceSettings::new("A2D3N", "B2D2N");
        assert_eq!(potential_flow_replacement(2, &configured).unwrap(), configured);
        let three = potential_flow_replacement(3, &configured).unwrap();
        assert_eq!(three.element_name, ELEMENT_3D);
        assert_eq!(three.condition_name, CONDITION_3D);
        assert!(matches!(
            potential_flow_replacement(1, &configured),
            Err(SolverError::DomainSize { domain_size: 1 })
        ));
    }

    #[test]
    fn buffer_is_only_raised() {
        let mut mp = ModelPart::new("Main");
        mp.set_buffer_size(3);
        finish_import(&mut mp, None, 2).unwrap();
        assert_eq!(mp.buffer_size(), 3);
        finish_import(&mut mp, None, 4).unwrap();
        assert_eq!(mp.buffer_size(), 4);
    }
}
