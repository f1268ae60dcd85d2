use super::BrickContext;
use crate::base::{BehaviourDescription, Hypothesis, OptionDescription, OptionMap};
use crate::solver::NonLinearSolver;
use crate::Result;

/// Defines the contract of a stress potential
///
/// A stress potential relates the stress to the elastic strain. It declares
/// the elastic strain as the first unknown of the implicit system; other
/// bricks build on the expressions it exposes.
pub trait StressPotential {
    /// Returns the name of the stress potential
    fn name(&self) -> &'static str;

    /// Returns the schema of the options
    fn options(&self) -> Vec<OptionDescription>;

    /// Returns the modelling hypotheses supported for a behaviour and a solver
    fn supported_hypotheses(&self, bd: &BehaviourDescription, solver: NonLinearSolver) -> Vec<Hypothesis>;

    /// Validates the options and declares the elastic strain
    fn initialize(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext, options: &OptionMap) -> Result<()>;

    /// Declares the remaining variables and parameters
    fn complete_variable_declaration(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext) -> Result<()>;

    /// Emits the stress computation, the residual contribution and the tangent operator
    fn end_treatment(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext) -> Result<()>;

    /// Returns an expression scaling stresses to dimensionless quantities
    fn stress_normalisation_factor(&self) -> String;

    /// Returns an expression of the lower bound of equivalent stresses
    fn equivalent_stress_lower_bound(&self) -> String;

    /// Returns the code computing the elastic prediction of the stress
    fn elastic_prediction_code(&self) -> String;

    /// Returns an expression of the derivative of the stress with respect to the elastic strain
    fn stress_derivative_wrt_elastic_strain(&self) -> String;
}
