//! Element orientation sanity check.
//!
//! Triangles must have positive area in the xy plane and tetrahedra positive
//! volume. Inverted elements either fail the check or are repaired in place by
//! swapping their last two nodes.

use mp_core::ElementId;

use crate::error::{ModelError, ModelResult};
use crate::model_part::{ModelPart, tetrahedron_volume, triangle_area};

const MAX_REPORTED_IDS: usize = 10;

/// What to do when an inverted element is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationPolicy {
    Raise,
    Repair,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrientationReport {
    pub checked: usize,
    pub skipped: usize,
    pub inverted: Vec<ElementId>,
    pub degenerate: Vec<ElementId>,
}

enum Shape {
    Triangle,
    Tetrahedron,
    Other,
}

fn shape_of(node_count: usize, domain_size: usize) -> Shape {
    match (node_count, domain_size) {
        (3, 2) => Shape::Triangle,
        (4, 3) => Shape::Tetrahedron,
        _ => Shape::Other,
    }
}

pub fn check_orientation(
    model_part: &mut ModelPart,
    policy: OrientationPolicy,
) -> ModelResult<OrientationReport> {
    let domain_size = model_part.process_info.domain_size;
    let mut report = OrientationReport::default();

    for element in model_part.elements() {
        let measure = match shape_of(element.nodes.len(), domain_size) {
            Shape::Other => {
                report.skipped += 1;
                continue;
            }
            Shape::Triangle => {
                let p = model_part.element_points(element)?;
                triangle_area(&p[0], &p[1], &p[2])
            }
            Shape::Tetrahedron => {
                let p = model_part.element_points(element)?;
                tetrahedron_volume(&p[0], &p[1], &p[2], &p[3])
            }
        };
        report.checked += 1;
        if measure == 0.0 {
            report.degenerate.push(element.id);
        } else if measure < 0.0 {
            report.inverted.push(element.id);
        }
    }

    if !report.degenerate.is_empty() {
        tracing::warn!(
            count = report.degenerate.len(),
            model_part = model_part.name(),
            "degenerate elements found"
        );
    }

    if report.inverted.is_empty() {
        return Ok(report);
    }

    match policy {
        OrientationPolicy::Raise => Err(ModelError::Orientation {
            count: report.inverted.len(),
            ids: report
                .inverted
                .iter()
                .take(MAX_REPORTED_IDS)
                .copied()
                .collect(),
        }),
        OrientationPolicy::Repair => {
            for id in &report.inverted {
                if let Some(element) = model_part.elements.get_mut(id) {
                    let n = element.nodes.len();
                    element.nodes.swap(n - 2, n - 1);
                }
            }
            tracing::info!(
                count = report.inverted.len(),
                model_part = model_part.name(),
                "repaired inverted elements"
            );
            Ok(report)
        }
    }
}
