//! Implements the behaviour compiler and its input/output documents

mod behaviour_compiler;
mod input;
mod output;
mod samples;
pub use crate::compiler::behaviour_compiler::*;
pub use crate::compiler::input::*;
pub use crate::compiler::output::*;
pub use crate::compiler::samples::*;
