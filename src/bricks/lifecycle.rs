use crate::{Error, Result};
use std::fmt;

/// Defines the lifecycle state of a brick
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum BrickState {
    Constructed,
    Initialized,
    VariablesDeclared,
    TreatmentEnded,
}

impl BrickState {
    /// Returns the state reached by the next lifecycle step
    pub fn next(&self) -> Option<BrickState> {
        match self {
            BrickState::Constructed => Some(BrickState::Initialized),
            BrickState::Initialized => Some(BrickState::VariablesDeclared),
            BrickState::VariablesDeclared => Some(BrickState::TreatmentEnded),
            BrickState::TreatmentEnded => None,
        }
    }
}

impl fmt::Display for BrickState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BrickState::Constructed => "Constructed",
            BrickState::Initialized => "Initialized",
            BrickState::VariablesDeclared => "VariablesDeclared",
            BrickState::TreatmentEnded => "TreatmentEnded",
        };
        write!(f, "{}", s)
    }
}

/// Wraps a brick with its lifecycle state
///
/// Each lifecycle step must be preceded by a call to `advance` with the state
/// reached by the step; skipping or repeating a step is an error.
pub struct Staged<T> {
    /// Name used in error messages
    name: String,

    /// Current state
    state: BrickState,

    /// The brick
    inner: T,
}

impl<T> Staged<T> {
    /// Allocates a new instance in the Constructed state
    pub fn new(name: &str, inner: T) -> Self {
        Staged {
            name: name.to_string(),
            state: BrickState::Constructed,
            inner,
        }
    }

    /// Returns the name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current state
    pub fn state(&self) -> BrickState {
        self.state
    }

    /// Moves to the given state and returns the brick
    pub fn advance(&mut self, to: BrickState) -> Result<&mut T> {
        if self.state.next() != Some(to) {
            return Err(Error::Lifecycle {
                brick: self.name.clone(),
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        Ok(&mut self.inner)
    }

    /// Returns the brick
    pub fn get(&self) -> &T {
        &self.inner
    }

    /// Returns the brick (mutable)
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
