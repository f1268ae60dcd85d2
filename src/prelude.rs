//! Makes available common structures needed to compile a behaviour
//!
//! You may write `use mbgen::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{BehaviourDescription, Config, Hypothesis, OptionMap, OptionValue, Slot};
pub use crate::bricks::{PorosityUpdateState, Registries, StaggeredScheme, StaggeredSchemeParameters};
pub use crate::compiler::{BehaviourCompiler, BehaviourInput, GeneratedBehaviour, SampleInputs};
pub use crate::solver::NonLinearSolver;
pub use crate::{Error, Result};
