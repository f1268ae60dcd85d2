use super::{BrickContext, Hooke, StressPotential};
use crate::base::{BehaviourDescription, Hypothesis, OptionDescription, OptionMap, ParameterValue};
use crate::base::{RegistrationStatus, Slot, Variable, VariableBounds, VariableKind};
use crate::solver::NonLinearSolver;
use crate::Result;

/// Implements Hooke's law degraded by an isotropic damage `d`
///
/// The damage is the second unknown of the implicit system (just after the
/// elastic strain); its evolution is given by the behaviour.
pub struct IsotropicDamageHooke {
    hooke: Hooke,
}

impl IsotropicDamageHooke {
    /// Allocates a new instance
    pub fn new() -> Self {
        IsotropicDamageHooke {
            hooke: Hooke::new_damaged("IsotropicDamageHooke"),
        }
    }
}

impl StressPotential for IsotropicDamageHooke {
    fn name(&self) -> &'static str {
        self.hooke.name()
    }

    fn options(&self) -> Vec<OptionDescription> {
        self.hooke.options()
    }

    fn supported_hypotheses(&self, bd: &BehaviourDescription, solver: NonLinearSolver) -> Vec<Hypothesis> {
        self.hooke.supported_hypotheses(bd, solver)
    }

    fn initialize(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext, options: &OptionMap) -> Result<()> {
        self.hooke.initialize(bd, ctx, options)?;
        bd.add_variable(
            Hypothesis::Undefined,
            VariableKind::StateVariable,
            Variable::scalar("d").with_external_name("Damage"),
            RegistrationStatus::Unregistered,
        )?;
        bd.set_bounds(Hypothesis::Undefined, "d", VariableBounds::between(0.0, 1.0))?;
        ctx.log(self.name(), "damage declared");
        Ok(())
    }

    fn complete_variable_declaration(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext) -> Result<()> {
        self.hooke.complete_variable_declaration(bd, ctx)?;
        bd.add_parameter(
            Hypothesis::Undefined,
            Variable::scalar("damage_threshold"),
            ParameterValue::Real(0.999999),
        )
    }

    fn end_treatment(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext) -> Result<()> {
        for h in bd.hypotheses() {
            bd.check_integration_variable_position(self.name(), h, "d", 1)?;
        }
        self.hooke.end_treatment(bd, ctx)?;
        if ctx.solver.requires_analytical_jacobian() {
            bd.append_code(
                Hypothesis::Undefined,
                Slot::Integrator,
                self.name(),
                "dfeel_ddd = Stensor(real(0));",
            )?;
        }
        bd.append_code(
            Hypothesis::Undefined,
            Slot::UpdateAuxiliaryStateVariables,
            self.name(),
            "this->d = min(this->d, this->damage_threshold);",
        )
    }

    fn stress_normalisation_factor(&self) -> String {
        self.hooke.stress_normalisation_factor()
    }

    fn equivalent_stress_lower_bound(&self) -> String {
        self.hooke.equivalent_stress_lower_bound()
    }

    fn elastic_prediction_code(&self) -> String {
        self.hooke.elastic_prediction_code()
    }

    fn stress_derivative_wrt_elastic_strain(&self) -> String {
        self.hooke.stress_derivative_wrt_elastic_strain()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
