//! Lifecycle state machine shared by every solver.
//!
//! `Constructed -> VariablesAdded -> DofsAdded -> Initialized -> Cleared`.
//! The model part is imported while variables are added and dofs are not,
//! so new nodes receive their history before their dofs. Solution steps run
//! only while `Initialized`. The strategy is built at most once.

use core::fmt;

use mp_model::ModelPart;

use crate::backend::Strategy;
use crate::error::{SolverError, SolverResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Constructed,
    VariablesAdded,
    DofsAdded,
    Initialized,
    Cleared,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DriverState::Constructed => "constructed",
            DriverState::VariablesAdded => "variables-added",
            DriverState::DofsAdded => "dofs-added",
            DriverState::Initialized => "initialized",
            DriverState::Cleared => "cleared",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub struct SolutionStepDriver {
    state: DriverState,
    imported: bool,
    strategy: Option<Box<dyn Strategy>>,
    echo_level: usize,
    steps_solved: usize,
}

impl SolutionStepDriver {
    pub fn new(echo_level: usize) -> Self {
        Self {
            state: DriverState::Constructed,
            imported: false,
            strategy: None,
            echo_level,
            steps_solved: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn steps_solved(&self) -> usize {
        self.steps_solved
    }

    pub fn echo_level(&self) -> usize {
        self.echo_level
    }

    fn require(&self, expected: DriverState, operation: &'static str) -> SolverResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SolverError::Lifecycle {
                operation,
                state: self.state,
            })
        }
    }

    pub fn variables_added(&mut self) -> SolverResult<()> {
        self.require(DriverState::Constructed, "add variables")?;
        self.state = DriverState::VariablesAdded;
        Ok(())
    }

    /// Guard for model import; the caller marks success with [`Self::imported`].
    /// The model part is imported at most once, between variables and dofs.
    pub fn begin_import(&self) -> SolverResult<()> {
        self.require(DriverState::VariablesAdded, "import the model part")?;
        if self.imported {
            return Err(SolverError::Lifecycle {
                operation: "import the model part twice",
                state: self.state,
            });
        }
        Ok(())
    }

    pub fn imported(&mut self) {
        self.imported = true;
    }

    pub fn is_imported(&self) -> bool {
        self.imported
    }

    pub fn dofs_added(&mut self) -> SolverResult<()> {
        self.require(DriverState::VariablesAdded, "add dofs")?;
        self.state = DriverState::DofsAdded;
        Ok(())
    }

    /// Build the strategy, apply the echo level and run its check.
    ///
    /// On a failed build or check the driver stays in `DofsAdded`.
    pub fn initialize(
        &mut self,
        model_part: &ModelPart,
        build: impl FnOnce() -> SolverResult<Box<dyn Strategy>>,
    ) -> SolverResult<()> {
        if matches!(self.state, DriverState::Initialized | DriverState::Cleared) {
            return Err(SolverError::AlreadyInitialized);
        }
        self.require(DriverState::DofsAdded, "initialize")?;

        let mut strategy = build()?;
        strategy.set_echo_level(self.echo_level);
        strategy.check(model_part)?;

        self.strategy = Some(strategy);
        self.state = DriverState::Initialized;
        Ok(())
    }

    pub fn check(&self, model_part: &ModelPart) -> SolverResult<()> {
        match (&self.strategy, self.state) {
            (Some(strategy), DriverState::Initialized) => strategy.check(model_part),
            _ => Err(SolverError::Lifecycle {
                operation: "check",
                state: self.state,
            }),
        }
    }

    pub fn solve_solution_step(&mut self, model_part: &mut ModelPart) -> SolverResult<()> {
        let state = self.state;
        let strategy = match (&mut self.strategy, state) {
            (Some(strategy), DriverState::Initialized) => strategy,
            _ => {
                return Err(SolverError::Lifecycle {
                    operation: "solve a solution step",
                    state,
                });
            }
        };
        strategy.solve(model_part)?;
        self.steps_solved += 1;
        Ok(())
    }

    pub fn set_echo_level(&mut self, level: usize) {
        self.echo_level = level;
        if let Some(strategy) = self.strategy.as_mut() {
            strategy.set_echo_level(level);
        }
    }

    /// Release the strategy. Safe to call in any state and more than once.
    pub fn clear(&mut self) {
        if let Some(mut strategy) = self.strategy.take() {
            strategy.clear();
        }
        if self.state == DriverState::Initialized {
            self.state = DriverState::Cleared;
        }
    }
}
