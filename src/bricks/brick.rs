use super::Registries;
use crate::base::{BehaviourDescription, OptionDescription, OptionMap};
use crate::solver::NonLinearSolver;
use crate::Result;

/// Holds the read-only data shared by all bricks during a compilation
pub struct BrickContext<'a> {
    /// Algorithm solving the implicit system
    pub solver: NonLinearSolver,

    /// Factories of bricks and brick components
    pub registries: &'a Registries,

    /// Prints one line per brick component and lifecycle step
    pub verbose: bool,
}

impl<'a> BrickContext<'a> {
    /// Allocates a new instance
    pub fn new(solver: NonLinearSolver, registries: &'a Registries) -> Self {
        BrickContext {
            solver,
            registries,
            verbose: false,
        }
    }

    /// Prints a message if verbose
    pub fn log(&self, brick: &str, message: &str) {
        if self.verbose {
            println!("{:>32} : {}", brick, message);
        }
    }
}

/// Defines the three-phase contract of a top-level brick
///
/// The compiler drives every brick through `initialize`, then every brick
/// through `complete_variable_declaration`, then every brick through
/// `end_treatment`. The behaviour description is only mutated through the
/// given handle.
pub trait BehaviourBrick {
    /// Returns the name of the brick
    fn name(&self) -> &'static str;

    /// Returns the schema of the options
    fn options(&self) -> Vec<OptionDescription>;

    /// Validates the options and declares the anchor variables
    fn initialize(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext, options: &OptionMap) -> Result<()>;

    /// Declares the remaining variables and parameters
    fn complete_variable_declaration(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext) -> Result<()>;

    /// Emits the code fragments
    fn end_treatment(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext) -> Result<()>;
}
