//! Model part: nodes, elements, conditions and the solution-step history.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use mp_core::{ConditionId, ElementId, Id, NodeId, PropertiesId};
use nalgebra::{Matrix3, Point3};

use crate::error::{ModelError, ModelResult};
use crate::variables::Variable;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub coordinates: Point3<f64>,
    /// Per-variable history, newest value first. Length equals the buffer size.
    history: BTreeMap<Variable, VecDeque<f64>>,
    dofs: BTreeSet<Variable>,
}

impl Node {
    fn new(id: NodeId, coordinates: Point3<f64>) -> Self {
        Self {
            id,
            coordinates,
            history: BTreeMap::new(),
            dofs: BTreeSet::new(),
        }
    }

    /// Value of `variable` `step` solution steps back (0 is the current step).
    pub fn solution_step_value(&self, variable: Variable, step: usize) -> ModelResult<f64> {
        let history = self
            .history
            .get(&variable)
            .ok_or(ModelError::MissingVariable {
                variable: variable.name(),
                model_part: format!("node {}", self.id),
            })?;
        history.get(step).copied().ok_or(ModelError::BufferIndex {
            step,
            buffer_size: history.len(),
        })
    }

    pub fn set_solution_step_value(&mut self, variable: Variable, value: f64) -> ModelResult<()> {
        let front = self
            .history
            .get_mut(&variable)
            .and_then(VecDeque::front_mut)
            .ok_or(ModelError::MissingVariable {
                variable: variable.name(),
                model_part: format!("node {}", self.id),
            })?;
        *front = value;
        Ok(())
    }

    pub fn has_dof(&self, variable: Variable) -> bool {
        self.dofs.contains(&variable)
    }

    fn resize_history(&mut self, buffer_size: usize) {
        for history in self.history.values_mut() {
            history.resize(buffer_size, 0.0);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    pub properties_id: PropertiesId,
    pub nodes: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub id: ConditionId,
    pub name: String,
    pub properties_id: PropertiesId,
    pub nodes: Vec<NodeId>,
}

/// Named subset of the parent's entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubModelPart {
    pub name: String,
    pub nodes: BTreeSet<NodeId>,
    pub elements: BTreeSet<ElementId>,
    pub conditions: BTreeSet<ConditionId>,
    pub sub_model_parts: BTreeMap<String, SubModelPart>,
}

impl SubModelPart {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Resolve a dotted path ("Outer.Inner") below this sub-model part.
    pub fn find(&self, path: &str) -> Option<&SubModelPart> {
        match path.split_once('.') {
            Some((head, rest)) => self.sub_model_parts.get(head)?.find(rest),
            None => self.sub_model_parts.get(path),
        }
    }
}

/// Process-wide register shared by everything acting on one model part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessInfo {
    pub time: f64,
    pub delta_time: f64,
    pub step: usize,
    pub domain_size: usize,
    /// Free-form scalars, e.g. from a mesh file's `ModelPartData` block.
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelPart {
    name: String,
    buffer_size: usize,
    variables: BTreeSet<Variable>,
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) elements: BTreeMap<ElementId, Element>,
    pub(crate) conditions: BTreeMap<ConditionId, Condition>,
    pub properties: BTreeMap<PropertiesId, BTreeMap<String, String>>,
    pub sub_model_parts: BTreeMap<String, SubModelPart>,
    pub process_info: ProcessInfo,
}

impl ModelPart {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            buffer_size: 1,
            variables: BTreeSet::new(),
            nodes: BTreeMap::new(),
            elements: BTreeMap::new(),
            conditions: BTreeMap::new(),
            properties: BTreeMap::new(),
            sub_model_parts: BTreeMap::new(),
            process_info: ProcessInfo::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Set the history depth directly; histories are truncated or zero-padded.
    pub fn set_buffer_size(&mut self, buffer_size: usize) {
        let buffer_size = buffer_size.max(1);
        self.buffer_size = buffer_size;
        for node in self.nodes.values_mut() {
            node.resize_history(buffer_size);
        }
    }

    /// Raise the history depth to at least `minimum`. Never lowers it.
    ///
    /// Returns whether the depth changed.
    pub fn raise_buffer_size(&mut self, minimum: usize) -> bool {
        if minimum > self.buffer_size {
            tracing::debug!(
                model_part = %self.name,
                from = self.buffer_size,
                to = minimum,
                "raising buffer size"
            );
            self.set_buffer_size(minimum);
            true
        } else {
            false
        }
    }

    pub fn add_nodal_solution_step_variable(&mut self, variable: Variable) {
        if self.variables.insert(variable) {
            let depth = self.buffer_size;
            for node in self.nodes.values_mut() {
                node.history.insert(variable, VecDeque::from(vec![0.0; depth]));
            }
        }
    }

    pub fn has_nodal_solution_step_variable(&self, variable: Variable) -> bool {
        self.variables.contains(&variable)
    }

    pub fn solution_step_variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.variables.iter().copied()
    }

    /// Declare `variable` as a degree of freedom on every node.
    pub fn add_dof(&mut self, variable: Variable) -> ModelResult<()> {
        if !self.has_nodal_solution_step_variable(variable) {
            return Err(ModelError::MissingVariable {
                variable: variable.name(),
                model_part: self.name.clone(),
            });
        }
        for node in self.nodes.values_mut() {
            node.dofs.insert(variable);
        }
        Ok(())
    }

    pub fn create_new_node(&mut self, id: NodeId, x: f64, y: f64, z: f64) -> ModelResult<&mut Node> {
        if self.nodes.contains_key(&id) {
            return Err(ModelError::DuplicateId {
                what: "node",
                id,
                model_part: self.name.clone(),
            });
        }
        let mut node = Node::new(id, Point3::new(x, y, z));
        for variable in &self.variables {
            node.history
                .insert(*variable, VecDeque::from(vec![0.0; self.buffer_size]));
        }
        Ok(self.nodes.entry(id).or_insert(node))
    }

    fn check_nodes_exist(&self, nodes: &[NodeId]) -> ModelResult<()> {
        match nodes.iter().find(|n| !self.nodes.contains_key(*n)) {
            Some(missing) => Err(ModelError::UnknownId {
                what: "node",
                id: *missing,
                model_part: self.name.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn create_new_element(
        &mut self,
        name: &str,
        id: ElementId,
        properties_id: PropertiesId,
        nodes: Vec<NodeId>,
    ) -> ModelResult<()> {
        if self.elements.contains_key(&id) {
            return Err(ModelError::DuplicateId {
                what: "element",
                id,
                model_part: self.name.clone(),
            });
        }
        self.check_nodes_exist(&nodes)?;
        self.elements.insert(
            id,
            Element {
                id,
                name: name.to_string(),
                properties_id,
                nodes,
            },
        );
        Ok(())
    }

    pub fn create_new_condition(
        &mut self,
        name: &str,
        id: ConditionId,
        properties_id: PropertiesId,
        nodes: Vec<NodeId>,
    ) -> ModelResult<()> {
        if self.conditions.contains_key(&id) {
            return Err(ModelError::DuplicateId {
                what: "condition",
                id,
                model_part: self.name.clone(),
            });
        }
        self.check_nodes_exist(&nodes)?;
        self.conditions.insert(
            id,
            Condition {
                id,
                name: name.to_string(),
                properties_id,
                nodes,
            },
        );
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> ModelResult<&Node> {
        self.nodes.get(&id).ok_or_else(|| ModelError::UnknownId {
            what: "node",
            id,
            model_part: self.name.clone(),
        })
    }

    pub fn node_mut(&mut self, id: NodeId) -> ModelResult<&mut Node> {
        let name = &self.name;
        self.nodes.get_mut(&id).ok_or_else(|| ModelError::UnknownId {
            what: "node",
            id,
            model_part: name.clone(),
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.values()
    }

    pub fn has_node(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn has_element(&self, id: Id) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn has_condition(&self, id: Id) -> bool {
        self.conditions.contains_key(&id)
    }

    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn number_of_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn number_of_conditions(&self) -> usize {
        self.conditions.len()
    }

    /// Resolve a dotted sub-model part path relative to this model part.
    pub fn sub_model_part(&self, path: &str) -> Option<&SubModelPart> {
        match path.split_once('.') {
            Some((head, rest)) => self.sub_model_parts.get(head)?.find(rest),
            None => self.sub_model_parts.get(path),
        }
    }

    /// Advance to a new solution step at `time`.
    ///
    /// Every nodal history shifts back by one slot; the current slot starts
    /// as a copy of the previous one.
    pub fn clone_time_step(&mut self, time: f64) {
        let depth = self.buffer_size;
        for node in self.nodes.values_mut() {
            for history in node.history.values_mut() {
                let current = history.front().copied().unwrap_or(0.0);
                history.push_front(current);
                history.truncate(depth);
            }
        }
        let info = &mut self.process_info;
        info.delta_time = time - info.time;
        info.time = time;
        info.step += 1;
    }

    /// Node coordinates of an element, in connectivity order.
    pub fn element_points(&self, element: &Element) -> ModelResult<Vec<Point3<f64>>> {
        element
            .nodes
            .iter()
            .map(|id| self.node(*id).map(|n| n.coordinates))
            .collect()
    }

    /// Characteristic length of an element's geometry.
    ///
    /// Lines use their length, triangles and quadrilaterals the square root of
    /// their area, tetrahedra the cube root of their volume. Other shapes fall
    /// back to the longest edge between consecutive nodes.
    pub fn element_length(&self, element: &Element) -> ModelResult<f64> {
        let p = self.element_points(element)?;
        let length = match (p.len(), self.process_info.domain_size) {
            (2, _) => (p[1] - p[0]).norm(),
            (3, _) => (0.5 * (p[1] - p[0]).cross(&(p[2] - p[0])).norm()).sqrt(),
            (4, 3) => tetrahedron_volume(&p[0], &p[1], &p[2], &p[3]).abs().cbrt(),
            (4, _) => polygon_area_xy(&p).abs().sqrt(),
            _ => p
                .iter()
                .zip(p.iter().cycle().skip(1))
                .map(|(a, b)| (b - a).norm())
                .fold(0.0, f64::max),
        };
        Ok(length)
    }
}

/// Signed area of a triangle projected on the xy plane.
pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    0.5 * (ab.x * ac.y - ab.y * ac.x)
}

/// Signed volume of a tetrahedron; positive for right-handed node order.
pub fn tetrahedron_volume(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    let m = Matrix3::from_columns(&[b - a, c - a, d - a]);
    m.determinant() / 6.0
}

/// Signed shoelace area of a polygon projected on the xy plane.
pub fn polygon_area_xy(points: &[Point3<f64>]) -> f64 {
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let p = &points[i];
            let q = &points[(i + 1) % n];
            p.x * q.y - q.x * p.y
        })
        .sum();
    0.5 * twice
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::{DISTANCE, ERROR_X};

    fn id(v: u64) -> Id {
        Id::new(v).unwrap()
    }

    fn unit_triangle() -> ModelPart {
        let mut mp = ModelPart::new("Main");
        mp.create_new_node(id(1), 0.0, 0.0, 0.0).unwrap();
        mp.create_new_node(id(2), 1.0, 0.0, 0.0).unwrap();
        mp.create_new_node(id(3), 0.0, 1.0, 0.0).unwrap();
        mp.create_new_element("Element2D3N", id(1), 0, vec![id(1), id(2), id(3)])
            .unwrap();
        mp
    }

    #[test]
    fn history_follows_buffer_size() {
        let mut mp = unit_triangle();
        mp.add_nodal_solution_step_variable(ERROR_X);
        mp.set_buffer_size(2);

        mp.node_mut(id(1))
            .unwrap()
            .set_solution_step_value(ERROR_X, 4.0)
            .unwrap();
        mp.clone_time_step(0.5);
        mp.node_mut(id(1))
            .unwrap()
            .set_solution_step_value(ERROR_X, 5.0)
            .unwrap();

        let node = mp.node(id(1)).unwrap();
        assert_eq!(node.solution_step_value(ERROR_X, 0).unwrap(), 5.0);
        assert_eq!(node.solution_step_value(ERROR_X, 1).unwrap(), 4.0);
        assert!(node.solution_step_value(ERROR_X, 2).is_err());
        assert_eq!(mp.process_info.time, 0.5);
        assert_eq!(mp.process_info.delta_time, 0.5);
        assert_eq!(mp.process_info.step, 1);
    }

    #[test]
    fn raise_buffer_size_never_lowers() {
        let mut mp = ModelPart::new("Main");
        mp.set_buffer_size(3);
        assert!(!mp.raise_buffer_size(2));
        assert_eq!(mp.buffer_size(), 3);
        assert!(mp.raise_buffer_size(5));
        assert_eq!(mp.buffer_size(), 5);
    }

    #[test]
    fn dofs_require_registered_variable() {
        let mut mp = unit_triangle();
        assert!(matches!(
            mp.add_dof(DISTANCE),
            Err(ModelError::MissingVariable { .. })
        ));
        mp.add_nodal_solution_step_variable(DISTANCE);
        mp.add_dof(DISTANCE).unwrap();
        assert!(mp.nodes().all(|n| n.has_dof(DISTANCE)));
    }

    #[test]
    fn elements_need_existing_nodes() {
        let mut mp = unit_triangle();
        let err = mp
            .create_new_element("Element2D3N", id(2), 0, vec![id(1), id(2), id(9)])
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownId { what: "node", .. }));
        assert!(matches!(
            mp.create_new_element("Element2D3N", id(1), 0, vec![id(1), id(2), id(3)]),
            Err(ModelError::DuplicateId { .. })
        ));
    }

    #[test]
    fn geometry_lengths() {
        let mp = unit_triangle();
        let element = mp.elements().next().unwrap();
        let length = mp.element_length(element).unwrap();
        assert!((length - 0.5_f64.sqrt()).abs() < 1e-12);

        let o = Point3::new(0.0, 0.0, 0.0);
        let x = Point3::new(1.0, 0.0, 0.0);
        let y = Point3::new(0.0, 1.0, 0.0);
        let z = Point3::new(0.0, 0.0, 1.0);
        assert!((tetrahedron_volume(&o, &x, &y, &z) - 1.0 / 6.0).abs() < 1e-12);
        assert!(tetrahedron_volume(&o, &y, &x, &z) < 0.0);
    }
}
