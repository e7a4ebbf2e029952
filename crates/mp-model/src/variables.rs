//! Nodal variables known to the orchestration layer.

use core::fmt;

/// A named nodal quantity stored in the solution-step history.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(&'static str);

impl Variable {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(self) -> &'static str {
        self.0
    }

    /// Look up a known variable by name, as written in mesh files.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL.iter().copied().find(|v| v.0 == name)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable({})", self.0)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

// Potential flow
pub const VELOCITY_POTENTIAL: Variable = Variable::new("VELOCITY_POTENTIAL");
pub const AUXILIARY_VELOCITY_POTENTIAL: Variable = Variable::new("AUXILIARY_VELOCITY_POTENTIAL");
pub const VELOCITY_INFINITY: Variable = Variable::new("VELOCITY_INFINITY");
pub const VELOCITY_LOWER: Variable = Variable::new("VELOCITY_LOWER");
pub const PRESSURE_LOWER: Variable = Variable::new("PRESSURE_LOWER");
pub const POTENTIAL_JUMP: Variable = Variable::new("POTENTIAL_JUMP");
pub const WAKE: Variable = Variable::new("WAKE");
pub const KUTTA: Variable = Variable::new("KUTTA");
pub const TRAILING_EDGE: Variable = Variable::new("TRAILING_EDGE");
pub const UPPER_SURFACE: Variable = Variable::new("UPPER_SURFACE");
pub const LOWER_SURFACE: Variable = Variable::new("LOWER_SURFACE");
pub const DISTANCE: Variable = Variable::new("DISTANCE");

// Structural
pub const DISPLACEMENT_X: Variable = Variable::new("DISPLACEMENT_X");
pub const DISPLACEMENT_Y: Variable = Variable::new("DISPLACEMENT_Y");
pub const DISPLACEMENT_Z: Variable = Variable::new("DISPLACEMENT_Z");
pub const REACTION_X: Variable = Variable::new("REACTION_X");
pub const REACTION_Y: Variable = Variable::new("REACTION_Y");
pub const REACTION_Z: Variable = Variable::new("REACTION_Z");
pub const ROTATION_X: Variable = Variable::new("ROTATION_X");
pub const ROTATION_Y: Variable = Variable::new("ROTATION_Y");
pub const ROTATION_Z: Variable = Variable::new("ROTATION_Z");
pub const VELOCITY_X: Variable = Variable::new("VELOCITY_X");
pub const VELOCITY_Y: Variable = Variable::new("VELOCITY_Y");
pub const VELOCITY_Z: Variable = Variable::new("VELOCITY_Z");
pub const ACCELERATION_X: Variable = Variable::new("ACCELERATION_X");
pub const ACCELERATION_Y: Variable = Variable::new("ACCELERATION_Y");
pub const ACCELERATION_Z: Variable = Variable::new("ACCELERATION_Z");

// Error projection
pub const ERROR_X: Variable = Variable::new("ERROR_X");
pub const ERROR_Y: Variable = Variable::new("ERROR_Y");
pub const ERROR_Z: Variable = Variable::new("ERROR_Z");

pub const TEMPERATURE: Variable = Variable::new("TEMPERATURE");
pub const PRESSURE: Variable = Variable::new("PRESSURE");

const ALL: &[Variable] = &[
    VELOCITY_POTENTIAL,
    AUXILIARY_VELOCITY_POTENTIAL,
    VELOCITY_INFINITY,
    VELOCITY_LOWER,
    PRESSURE_LOWER,
    POTENTIAL_JUMP,
    WAKE,
    KUTTA,
    TRAILING_EDGE,
    UPPER_SURFACE,
    LOWER_SURFACE,
    DISTANCE,
    DISPLACEMENT_X,
    DISPLACEMENT_Y,
    DISPLACEMENT_Z,
    REACTION_X,
    REACTION_Y,
    REACTION_Z,
    ROTATION_X,
    ROTATION_Y,
    ROTATION_Z,
    VELOCITY_X,
    VELOCITY_Y,
    VELOCITY_Z,
    ACCELERATION_X,
    ACCELERATION_Y,
    ACCELERATION_Z,
    ERROR_X,
    ERROR_Y,
    ERROR_Z,
    TEMPERATURE,
    PRESSURE,
];
