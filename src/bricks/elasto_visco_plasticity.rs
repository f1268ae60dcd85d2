use super::{BehaviourBrick, BrickContext, BrickState, InelasticFlow, NucleationModel, PorosityEvolution};
use super::{PorosityEvolutionAlgorithm, PorosityUpdateState, Staged, StressPotential};
use super::{POROSITY_UPPER_BOUND, POROSITY_UPPER_BOUND_SAFETY_FACTOR};
use super::{POROSITY_UPPER_BOUND_SAFETY_FACTOR_FOR_FRACTURE_DETECTION, STAGGERED_SCHEME_MAXIMUM_NUMBER_OF_ITERATIONS};
use super::{STAGGERED_SCHEME_POROSITY_CRITERION, STAGGERED_SCHEME_RELAXATION_FACTOR};
use crate::base::{check_options, AttributeValue, BehaviourDescription, CodeBlockMode, CodeBlockPosition, Hypothesis};
use crate::base::LocalDataStructure;
use crate::base::{OptionDescription, OptionMap, OptionType, ParameterValue, RegistrationStatus, Slot, Variable};
use crate::base::{VariableBounds, VariableKind, VariableType};
use crate::base::{ATTRIBUTE_POROSITY_EVOLUTION_ALGORITHM, ATTRIBUTE_STAGGERED_SCHEME_ACCELERATION};
use crate::{Error, Result};

const NAME: &str = "StandardElastoViscoPlasticity";

/// Returns the ids of `n` components (empty for a single component)
fn ids(n: usize) -> Vec<String> {
    if n == 1 {
        vec![String::new()]
    } else {
        (0..n).map(|i| i.to_string()).collect()
    }
}

/// Assembles a stress potential, inelastic flows and porosity nucleation models
///
/// The components are driven through their lifecycle in declaration order:
/// the stress potential first, then the flows, then the nucleation models.
/// When the porosity evolves, this brick owns the porosity `f` and assembles
/// its residual from the contributions of the components.
pub struct ElastoViscoPlasticity {
    stress_potential: Option<Staged<Box<dyn StressPotential>>>,
    flows: Vec<Staged<Box<dyn InelasticFlow>>>,
    nucleation_models: Vec<Staged<Box<dyn NucleationModel>>>,
    porosity_evolution: Option<PorosityEvolution>,
    coupled: bool,
}

impl ElastoViscoPlasticity {
    /// Allocates a new instance
    pub fn new() -> Self {
        ElastoViscoPlasticity {
            stress_potential: None,
            flows: Vec::new(),
            nucleation_models: Vec::new(),
            porosity_evolution: None,
            coupled: false,
        }
    }

    /// Indicates that the porosity is an unknown of the behaviour
    ///
    /// True if a flow is coupled with the porosity, if a nucleation model is
    /// declared or if a `porosity_evolution` section is given.
    pub fn is_coupled_with_porosity_evolution(&self) -> bool {
        self.coupled
    }

    /// Returns the porosity evolution algorithm (if coupled)
    pub fn porosity_evolution_algorithm(&self) -> Option<PorosityEvolutionAlgorithm> {
        if self.coupled {
            Some(self.porosity_evolution.as_ref().map(|p| p.algorithm).unwrap_or_default())
        } else {
            None
        }
    }

    /// Returns the number of inelastic flows
    pub fn number_of_inelastic_flows(&self) -> usize {
        self.flows.len()
    }

    /// Returns the number of nucleation models
    pub fn number_of_nucleation_models(&self) -> usize {
        self.nucleation_models.len()
    }

    /// Returns the next estimate of the porosity increment
    ///
    /// Sums the elastic contribution and the contributions of the flows and
    /// of the nucleation models, all evaluated on the converged state.
    pub fn next_estimate_of_the_porosity_increment(&self, state: &PorosityUpdateState) -> Result<f64> {
        if state.flows.len() != self.flows.len() {
            return Err(Error::Numerical(format!(
                "{} flow increments given but {} inelastic flows are declared",
                state.flows.len(),
                self.flows.len()
            )));
        }
        let mut df = match &self.porosity_evolution {
            Some(pe) => pe.elastic_contribution(state),
            None => 0.0,
        };
        for (flow, inc) in self.flows.iter().zip(&state.flows) {
            df += flow.get().next_estimate_contribution(inc, state.f, state.df);
        }
        for (i, model) in self.nucleation_models.iter().enumerate() {
            let nucleated = state.nucleated.get(i).copied().unwrap_or(0.0);
            df += model.get().next_estimate_of_the_porosity_increment(state, nucleated)?;
        }
        Ok(df)
    }

    /// Returns the terms of the porosity growth
    fn porosity_growth_terms(&self, flow_ids: &[String]) -> Result<Vec<String>> {
        let mut terms = Vec::new();
        if self.porosity_evolution.as_ref().map(|p| p.elastic_contribution) == Some(true) {
            terms.push("(1-f_)*trace(this->deel)".to_string());
        }
        for (flow, id) in self.flows.iter().zip(flow_ids) {
            if let Some(term) = flow.get().porosity_growth_code(id) {
                terms.push(term);
            }
        }
        let model_ids = ids(self.nucleation_models.len());
        for (model, id) in self.nucleation_models.iter().zip(&model_ids) {
            terms.push(model.get().porosity_increment_code(id, flow_ids)?);
        }
        Ok(terms)
    }

    /// Returns the derivatives of the porosity growth terms
    fn porosity_growth_jacobian_code(&self, flow_ids: &[String], dsig_ddeel: &str) -> Result<String> {
        let mut code = String::new();
        if self.porosity_evolution.as_ref().map(|p| p.elastic_contribution) == Some(true) {
            code.push_str("dff_ddeel -= (1-f_)*Stensor::Id();\ndff_ddf += dfm_ddf*trace(this->deel);\n");
        }
        for (flow, id) in self.flows.iter().zip(flow_ids) {
            if let Some(j) = flow.get().porosity_growth_jacobian_code(id, dsig_ddeel) {
                code.push_str(&j);
                code.push('\n');
            }
        }
        let model_ids = ids(self.nucleation_models.len());
        for (model, id) in self.nucleation_models.iter().zip(&model_ids) {
            let j = model.get().porosity_increment_jacobian_code(id, flow_ids, dsig_ddeel)?;
            code.push_str(&j);
            code.push('\n');
        }
        Ok(code)
    }

    /// Returns the definition of the porosity seen by the flows during the iterations
    ///
    /// `f_` is the porosity at the middle of the time step. In the staggered
    /// scheme, the inner solve sees the porosity increment frozen by the
    /// outer loop. `dfm_ddf` is the derivative of `f_` with respect to the
    /// porosity increment.
    fn mid_step_porosity_code(algorithm: PorosityEvolutionAlgorithm, analytical_jacobian: bool) -> String {
        match algorithm {
            PorosityEvolutionAlgorithm::StandardImplicitScheme => {
                let mut code = "const auto f_ = this->f+(this->theta)*(this->df);".to_string();
                if analytical_jacobian {
                    code.push_str("\nconst auto dfm_ddf = this->theta;");
                }
                code
            }
            PorosityEvolutionAlgorithm::StaggeredScheme => {
                let mut code = "const auto f_ = (this->staggered_scheme.compute_standard_system) ?\n\
                                (this->f+(this->theta)*(this->df)) :\n\
                                (this->f+(this->theta)*(this->staggered_scheme.porosity_increment));"
                    .to_string();
                if analytical_jacobian {
                    code.push_str(
                        "\nconst auto dfm_ddf = (this->staggered_scheme.compute_standard_system) ? \
                         this->theta : real(0);",
                    );
                }
                code
            }
        }
    }

    fn staggered_scheme_reset_code() -> String {
        format!(
            "this->staggered_scheme.compute_standard_system = this->broken > 0.5;\n\
             this->staggered_scheme.porosity_increment = real(0);\n\
             this->staggered_scheme.lower_bound = -(this->f);\n\
             this->staggered_scheme.upper_bound = (this->{sf})*(this->{ub})-(this->f);\n\
             this->staggered_scheme.iteration = 0;\n\
             this->staggered_scheme.has_previous = false;",
            sf = POROSITY_UPPER_BOUND_SAFETY_FACTOR,
            ub = POROSITY_UPPER_BOUND,
        )
    }

    fn staggered_scheme_convergence_code(aitken: bool) -> String {
        let update = if aitken {
            "auto candidate = next;\n\
             if((ss.has_previous) && (r != ss.previous_residual)){\n\
             candidate = ss.porosity_increment-r*(ss.porosity_increment-ss.previous_increment)/(r-ss.previous_residual);\n\
             }"
            .to_string()
        } else {
            format!(
                "auto candidate = ss.porosity_increment+(this->{})*r;",
                STAGGERED_SCHEME_RELAXATION_FACTOR
            )
        };
        format!(
            "if((converged) && (!this->staggered_scheme.compute_standard_system)){{\n\
             auto& ss = this->staggered_scheme;\n\
             auto next = this->computeNextEstimateOfThePorosityIncrement();\n\
             if(next < ss.lower_bound){{\n\
             next = (ss.porosity_increment+ss.lower_bound)/2;\n\
             }} else if(next > ss.upper_bound){{\n\
             next = (ss.porosity_increment+ss.upper_bound)/2;\n\
             }}\n\
             const auto r = next-ss.porosity_increment;\n\
             if(abs(r) < this->{criterion}){{\n\
             ss.porosity_increment = next;\n\
             if(this->f+ss.porosity_increment > (this->{sfr})*(this->{ub})){{\n\
             this->broken = 1;\n\
             }}\n\
             ss.compute_standard_system = true;\n\
             }} else {{\n\
             ++(ss.iteration);\n\
             if(ss.iteration >= this->{max}){{\n\
             tfel::raise(\"staggered scheme: maximum number of iterations exceeded\");\n\
             }}\n\
             if(r > 0){{\n\
             ss.lower_bound = max(ss.lower_bound, ss.porosity_increment);\n\
             }} else {{\n\
             ss.upper_bound = min(ss.upper_bound, ss.porosity_increment);\n\
             }}\n\
             {update}\n\
             ss.previous_increment = ss.porosity_increment;\n\
             ss.previous_residual = r;\n\
             ss.has_previous = true;\n\
             if((candidate <= ss.lower_bound) || (candidate >= ss.upper_bound)){{\n\
             candidate = (ss.lower_bound+ss.upper_bound)/2;\n\
             }}\n\
             ss.porosity_increment = candidate;\n\
             }}\n\
             converged = false;\n\
             }}",
            criterion = STAGGERED_SCHEME_POROSITY_CRITERION,
            sfr = POROSITY_UPPER_BOUND_SAFETY_FACTOR_FOR_FRACTURE_DETECTION,
            ub = POROSITY_UPPER_BOUND,
            max = STAGGERED_SCHEME_MAXIMUM_NUMBER_OF_ITERATIONS,
            update = update,
        )
    }
}

impl BehaviourBrick for ElastoViscoPlasticity {
    fn name(&self) -> &'static str {
        NAME
    }

    fn options(&self) -> Vec<OptionDescription> {
        vec![
            OptionDescription::new("stress_potential", "stress potential", OptionType::DataStructure).mandatory(),
            OptionDescription::new("inelastic_flow", "inelastic flows", OptionType::DataStructures),
            OptionDescription::new("porosity_evolution", "porosity evolution", OptionType::DataMap),
        ]
    }

    fn initialize(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext, options: &OptionMap) -> Result<()> {
        check_options(NAME, options, &self.options())?;

        // allocate all components before touching the behaviour
        let porosity_evolution = match options.get("porosity_evolution").and_then(|v| v.as_map()) {
            Some(map) => Some(PorosityEvolution::from_map(NAME, map)?),
            None => None,
        };
        let sp = match options.get("stress_potential").and_then(|v| v.as_structure()) {
            Some(sp) => sp,
            None => {
                return Err(Error::MissingOption {
                    brick: NAME.to_string(),
                    option: "stress_potential".to_string(),
                })
            }
        };
        let potential = ctx.registries.stress_potentials.create(&sp.name, "stress_potential")?;
        let flow_structures = options
            .get("inelastic_flow")
            .and_then(|v| v.as_structures())
            .unwrap_or_default();
        let mut flows = Vec::new();
        for s in &flow_structures {
            flows.push(Staged::new(&s.name, ctx.registries.inelastic_flows.create(&s.name, "inelastic_flow")?));
        }
        let nucleation_structures = porosity_evolution
            .as_ref()
            .map(|pe| pe.nucleation_models.clone())
            .unwrap_or_default();
        let mut nucleation_models = Vec::new();
        for s in &nucleation_structures {
            nucleation_models.push(Staged::new(
                &s.name,
                ctx.registries.nucleation_models.create(&s.name, "nucleation_model")?,
            ));
        }

        // reject invalid component options before any declaration
        check_options(potential.name(), &sp.options, &potential.options())?;
        for (flow, s) in flows.iter().zip(&flow_structures) {
            check_options(flow.get().name(), &s.options, &flow.get().options())?;
        }
        for (model, s) in nucleation_models.iter().zip(&nucleation_structures) {
            check_options(model.get().name(), &s.options, &model.get().options())?;
        }

        // declarations are applied to a copy which is committed on success
        let mut work = bd.clone();
        let mut potential = Staged::new(&sp.name, potential);
        potential
            .advance(BrickState::Initialized)?
            .initialize(&mut work, ctx, &sp.options)
            .map_err(|e| e.in_brick(&sp.name))?;
        ctx.log(NAME, &format!("stress potential '{}' initialized", sp.name));
        let flow_ids = ids(flows.len());
        for ((flow, s), id) in flows.iter_mut().zip(&flow_structures).zip(&flow_ids) {
            flow.advance(BrickState::Initialized)?
                .initialize(&mut work, ctx, &s.options, id)
                .map_err(|e| e.in_brick(&s.name))?;
        }
        let model_ids = ids(nucleation_models.len());
        for ((model, s), id) in nucleation_models.iter_mut().zip(&nucleation_structures).zip(&model_ids) {
            model
                .advance(BrickState::Initialized)?
                .initialize(&mut work, ctx, &s.options, id)
                .map_err(|e| e.in_brick(&s.name))?;
        }

        self.coupled = flows.iter().any(|f| f.get().is_coupled_with_porosity_evolution())
            || !nucleation_models.is_empty()
            || porosity_evolution.is_some();
        self.stress_potential = Some(potential);
        self.flows = flows;
        self.nucleation_models = nucleation_models;
        self.porosity_evolution = porosity_evolution;

        if let Some(algorithm) = self.porosity_evolution_algorithm() {
            let h = Hypothesis::Undefined;
            work.add_state_variable(h, Variable::scalar("f").with_external_name("Porosity"))?;
            work.set_bounds(h, "f", VariableBounds::between(0.0, 1.0))?;
            work.set_attribute(
                h,
                ATTRIBUTE_POROSITY_EVOLUTION_ALGORITHM,
                AttributeValue::String(algorithm.name().to_string()),
                false,
            )?;
            if algorithm == PorosityEvolutionAlgorithm::StaggeredScheme {
                work.add_variable(
                    h,
                    VariableKind::AuxiliaryStateVariable,
                    Variable::scalar("broken").with_external_name("Broken"),
                    RegistrationStatus::Unregistered,
                )?;
                let structure = LocalDataStructure::new("staggered_scheme")
                    .with_member(VariableType::Boolean, "compute_standard_system")
                    .with_member(VariableType::Scalar, "porosity_increment")
                    .with_member(VariableType::Scalar, "lower_bound")
                    .with_member(VariableType::Scalar, "upper_bound")
                    .with_member(VariableType::UnsignedInteger, "iteration")
                    .with_member(VariableType::Boolean, "has_previous")
                    .with_member(VariableType::Scalar, "previous_increment")
                    .with_member(VariableType::Scalar, "previous_residual");
                work.add_local_data_structure(h, structure, RegistrationStatus::Unregistered)?;
                let acceleration = self.porosity_evolution.as_ref().map(|p| p.acceleration).unwrap_or_default();
                work.set_attribute(
                    h,
                    ATTRIBUTE_STAGGERED_SCHEME_ACCELERATION,
                    AttributeValue::String(acceleration.name().to_string()),
                    false,
                )?;
            }
            ctx.log(NAME, &format!("porosity declared ({})", algorithm));
        }
        *bd = work;
        Ok(())
    }

    fn complete_variable_declaration(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext) -> Result<()> {
        if self.flows.is_empty() && !self.nucleation_models.is_empty() {
            return Err(Error::ordering(NAME, "no inelastic flow declared"));
        }
        let potential = match self.stress_potential.as_mut() {
            Some(p) => p,
            None => return Err(Error::ordering(NAME, "no stress potential declared")),
        };
        let name = potential.get().name();
        potential
            .advance(BrickState::VariablesDeclared)?
            .complete_variable_declaration(bd, ctx)
            .map_err(|e| e.in_brick(name))?;
        let flow_ids = ids(self.flows.len());
        for (flow, id) in self.flows.iter_mut().zip(&flow_ids) {
            let name = flow.get().name();
            flow.advance(BrickState::VariablesDeclared)?
                .complete_variable_declaration(bd, ctx, id)
                .map_err(|e| e.in_brick(name))?;
        }
        let model_ids = ids(self.nucleation_models.len());
        for (model, id) in self.nucleation_models.iter_mut().zip(&model_ids) {
            let name = model.get().name();
            model
                .advance(BrickState::VariablesDeclared)?
                .complete_variable_declaration(bd, ctx, id, &flow_ids)
                .map_err(|e| e.in_brick(name))?;
        }
        if let Some(algorithm) = self.porosity_evolution_algorithm() {
            let h = Hypothesis::Undefined;
            let upper_bound = self
                .flows
                .iter()
                .filter_map(|f| f.get().porosity_upper_bound())
                .fold(1.0, f64::min);
            let real = |x: f64| ParameterValue::Real(x);
            bd.add_parameter(h, Variable::scalar(POROSITY_UPPER_BOUND), real(upper_bound))?;
            bd.add_parameter(h, Variable::scalar(POROSITY_UPPER_BOUND_SAFETY_FACTOR), real(0.985))?;
            bd.add_parameter(
                h,
                Variable::scalar(POROSITY_UPPER_BOUND_SAFETY_FACTOR_FOR_FRACTURE_DETECTION),
                real(0.984),
            )?;
            if algorithm == PorosityEvolutionAlgorithm::StaggeredScheme {
                let pe = self.porosity_evolution.clone().unwrap_or_default();
                bd.add_parameter(
                    h,
                    Variable::scalar(STAGGERED_SCHEME_POROSITY_CRITERION),
                    real(pe.convergence_criterion.unwrap_or(1e-8)),
                )?;
                bd.add_parameter(
                    h,
                    Variable::new(VariableType::UnsignedInteger, STAGGERED_SCHEME_MAXIMUM_NUMBER_OF_ITERATIONS),
                    ParameterValue::UnsignedInteger(pe.maximum_number_of_iterations.unwrap_or(100)),
                )?;
                bd.add_parameter(
                    h,
                    Variable::scalar(STAGGERED_SCHEME_RELAXATION_FACTOR),
                    real(pe.relaxation_factor.unwrap_or(1.0)),
                )?;
            }
        }
        ctx.log(NAME, "variables declared");
        Ok(())
    }

    fn end_treatment(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext) -> Result<()> {
        let algorithm = self.porosity_evolution_algorithm();
        let staged = match self.stress_potential.as_mut() {
            Some(p) => p,
            None => return Err(Error::ordering(NAME, "no stress potential declared")),
        };
        let name = staged.get().name();
        staged
            .advance(BrickState::TreatmentEnded)?
            .end_treatment(bd, ctx)
            .map_err(|e| e.in_brick(name))?;
        let potential: &dyn StressPotential = &**staged.get();
        let dsig_ddeel = potential.stress_derivative_wrt_elastic_strain();
        let flow_ids = ids(self.flows.len());
        for (flow, id) in self.flows.iter_mut().zip(&flow_ids) {
            let name = flow.get().name();
            flow.advance(BrickState::TreatmentEnded)?
                .end_treatment(bd, ctx, potential, id, algorithm)
                .map_err(|e| e.in_brick(name))?;
        }
        let model_ids = ids(self.nucleation_models.len());
        for (model, id) in self.nucleation_models.iter_mut().zip(&model_ids) {
            let name = model.get().name();
            model
                .advance(BrickState::TreatmentEnded)?
                .end_treatment(bd, ctx, id, &flow_ids)
                .map_err(|e| e.in_brick(name))?;
        }
        let algorithm = match algorithm {
            Some(a) => a,
            None => {
                ctx.log(NAME, "treatment ended");
                return Ok(());
            }
        };
        let h = Hypothesis::Undefined;
        let analytical_jacobian = ctx.solver.requires_analytical_jacobian();
        bd.set_code(
            h,
            Slot::Integrator,
            NAME,
            &Self::mid_step_porosity_code(algorithm, analytical_jacobian),
            CodeBlockMode::CreateOrAppend,
            CodeBlockPosition::AtBeginning,
        )?;
        let growth: String = self
            .porosity_growth_terms(&flow_ids)?
            .iter()
            .map(|t| format!("ff -= {};\n", t))
            .collect();
        let jacobian = if analytical_jacobian {
            self.porosity_growth_jacobian_code(&flow_ids, &dsig_ddeel)?
        } else {
            String::new()
        };
        match algorithm {
            PorosityEvolutionAlgorithm::StandardImplicitScheme => {
                bd.append_code(h, Slot::Integrator, NAME, &format!("{}{}", growth, jacobian))?;
            }
            PorosityEvolutionAlgorithm::StaggeredScheme => {
                let code = format!(
                    "if(this->staggered_scheme.compute_standard_system){{\n{}{}}} else {{\n\
                     ff -= this->staggered_scheme.porosity_increment;\n}}",
                    growth, jacobian
                );
                bd.append_code(h, Slot::Integrator, NAME, &code)?;
                bd.append_code(h, Slot::InitializeLocalVariables, NAME, &Self::staggered_scheme_reset_code())?;
                let aitken = bd.attribute::<String>(h, ATTRIBUTE_STAGGERED_SCHEME_ACCELERATION).as_deref() == Some("aitken");
                bd.append_code(
                    h,
                    Slot::AdditionalConvergenceChecks,
                    NAME,
                    &Self::staggered_scheme_convergence_code(aitken),
                )?;
            }
        }
        ctx.log(NAME, "treatment ended");
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::ElastoViscoPlasticity;
    use crate::base::{BehaviourDescription, BehaviourType, DataStructure, Hypothesis, IntegrationScheme};
    use crate::base::{OptionMap, OptionValue, ParameterValue, Slot, VariableKind};
    use crate::bricks::{BehaviourBrick, BrickContext, FlowIncrement, PorosityEvolutionAlgorithm};
    use crate::bricks::{PorosityUpdateState, Registries, StaggeredScheme, StaggeredSchemeParameters};
    use crate::solver::NonLinearSolver;
    use crate::{Error, Result};
    use russell_lab::approx_eq;

    fn behaviour() -> BehaviourDescription {
        BehaviourDescription::new(
            "Test",
            BehaviourType::StandardStrainBasedBehaviour,
            IntegrationScheme::Implicit,
        )
    }

    fn structure(name: &str, values: &[(&str, OptionValue)]) -> OptionValue {
        let mut options = OptionMap::new();
        for (key, value) in values {
            options.insert(key.to_string(), value.clone());
        }
        OptionValue::Structure(DataStructure::new(name, options))
    }

    fn hooke() -> OptionValue {
        structure(
            "Hooke",
            &[
                ("young_modulus", OptionValue::Real(200e9)),
                ("poisson_ratio", OptionValue::Real(0.3)),
            ],
        )
    }

    fn norton() -> OptionValue {
        structure(
            "Norton",
            &[
                ("criterion", OptionValue::from("Mises")),
                ("K", OptionValue::Real(100e6)),
                ("n", OptionValue::Real(5.0)),
            ],
        )
    }

    fn power_law() -> OptionValue {
        structure(
            "PowerLaw",
            &[
                ("An", OptionValue::Real(0.1)),
                ("pmin", OptionValue::Real(0.0)),
                ("m", OptionValue::Real(1.0)),
            ],
        )
    }

    /// Returns the position of the first use of a symbol
    fn first_use(code: &str, symbol: &str) -> Option<usize> {
        let is_identifier = |c: Option<char>| c.map_or(false, |c| c.is_alphanumeric() || c == '_');
        code.match_indices(symbol).map(|(i, _)| i).find(|&i| {
            !is_identifier(code[..i].chars().last()) && !is_identifier(code[i + symbol.len()..].chars().next())
        })
    }

    fn run(brick: &mut ElastoViscoPlasticity, bd: &mut BehaviourDescription, options: &OptionMap) -> Result<()> {
        let ctx = BrickContext::new(NonLinearSolver::NewtonRaphson, Registries::global()?);
        brick.initialize(bd, &ctx, options)?;
        brick.complete_variable_declaration(bd, &ctx)?;
        brick.end_treatment(bd, &ctx)
    }

    #[test]
    fn uncoupled_flow_works() -> Result<()> {
        let mut options = OptionMap::new();
        options.insert("stress_potential".to_string(), hooke());
        options.insert("inelastic_flow".to_string(), norton());
        let mut bd = behaviour();
        let mut brick = ElastoViscoPlasticity::new();
        run(&mut brick, &mut bd, &options)?;
        assert!(!brick.is_coupled_with_porosity_evolution());
        assert_eq!(brick.porosity_evolution_algorithm(), None);
        assert_eq!(brick.number_of_inelastic_flows(), 1);
        let h = Hypothesis::Tridimensional;
        assert!(bd.find_variable(h, "f").is_none());
        assert_eq!(bd.parameter_default(h, "porosity_upper_bound"), None);
        assert_eq!(bd.integration_variable_position(h, "eel"), Some(0));
        assert_eq!(bd.integration_variable_position(h, "p"), Some(1));
        assert!(!bd.code(h, Slot::Integrator).unwrap().contains("ff"));
        Ok(())
    }

    #[test]
    fn standard_porosity_evolution_works() -> Result<()> {
        let mut pe = OptionMap::new();
        pe.insert("nucleation_model".to_string(), power_law());
        let mut options = OptionMap::new();
        options.insert("stress_potential".to_string(), hooke());
        options.insert("inelastic_flow".to_string(), OptionValue::Array(vec![norton(), norton()]));
        options.insert("porosity_evolution".to_string(), OptionValue::Map(pe));
        let mut bd = behaviour();
        let mut brick = ElastoViscoPlasticity::new();
        run(&mut brick, &mut bd, &options)?;
        assert!(brick.is_coupled_with_porosity_evolution());
        assert_eq!(
            brick.porosity_evolution_algorithm(),
            Some(PorosityEvolutionAlgorithm::StandardImplicitScheme)
        );
        let h = Hypothesis::Tridimensional;
        assert_eq!(bd.integration_variable_position(h, "p0"), Some(1));
        assert_eq!(bd.integration_variable_position(h, "p1"), Some(2));
        assert_eq!(bd.integration_variable_position(h, "f"), Some(3));
        assert_eq!(bd.find_variable(h, "f").unwrap().1.external_name(), "Porosity");
        assert_eq!(bd.parameter_default(h, "porosity_upper_bound"), Some(ParameterValue::Real(1.0)));
        assert_eq!(
            bd.parameter_default(h, "porosity_upper_bound_safety_factor"),
            Some(ParameterValue::Real(0.985))
        );
        assert_eq!(
            bd.parameter_default(h, "porosity_upper_bound_safety_factor_for_fracture_detection"),
            Some(ParameterValue::Real(0.984))
        );
        assert!(bd.find_variable(h, "broken").is_none());
        let integrator = bd.code(h, Slot::Integrator).unwrap();
        assert!(integrator.starts_with(
            "const auto f_ = this->f+(this->theta)*(this->df);\nconst auto dfm_ddf = this->theta;\n"
        ));
        assert!(integrator.contains("this->dfn = ((this->powerlaw_An)"));
        assert!(integrator.contains("ff -= this->dfn;\n"));
        assert!(!integrator.contains("staggered_scheme"));

        // nucleation contributes to the porosity row of the jacobian
        assert!(integrator.contains("const auto dseq0_df = real(0);"));
        assert!(integrator.contains("dff_ddp0 -= (this->powerlaw_An)*(this->powerlaw_m)*pow("));
        assert!(integrator.contains("dff_ddp1 -= (this->powerlaw_An)*(this->powerlaw_m)*pow("));
        let growth = integrator.find("ff -= this->dfn;").unwrap();
        assert!(integrator.find("this->dfn = ").unwrap() < growth);
        assert!(integrator.find("dff_ddp0 -= ").unwrap() > growth);
        assert_eq!(bd.code(h, Slot::UpdateAuxiliaryStateVariables).unwrap(), "this->fn += this->dfn;\n");
        Ok(())
    }

    #[test]
    fn mid_step_porosity_is_defined_before_use() -> Result<()> {
        let gtn = structure(
            "Norton",
            &[
                (
                    "criterion",
                    structure(
                        "GursonTvergaardNeedleman1982",
                        &[
                            ("q_1", OptionValue::Real(1.5)),
                            ("q_2", OptionValue::Real(1.0)),
                            ("q_3", OptionValue::Real(2.25)),
                            ("f_c", OptionValue::Real(0.04)),
                            ("f_r", OptionValue::Real(0.2)),
                        ],
                    ),
                ),
                ("K", OptionValue::Real(100e6)),
                ("n", OptionValue::Real(5.0)),
            ],
        );
        for algorithm in ["standard_implicit_scheme", "staggered_scheme"] {
            let mut pe = OptionMap::new();
            pe.insert("algorithm".to_string(), OptionValue::from(algorithm));
            pe.insert("elastic_contribution".to_string(), OptionValue::Boolean(true));
            let mut options = OptionMap::new();
            options.insert("stress_potential".to_string(), hooke());
            options.insert("inelastic_flow".to_string(), gtn.clone());
            options.insert("porosity_evolution".to_string(), OptionValue::Map(pe));
            let mut bd = behaviour();
            let mut brick = ElastoViscoPlasticity::new();
            run(&mut brick, &mut bd, &options)?;
            let h = Hypothesis::Tridimensional;
            let integrator = bd.code(h, Slot::Integrator).unwrap();
            let definition = integrator.find("const auto f_ = ").unwrap();
            assert_eq!(first_use(&integrator, "f_"), Some(definition + "const auto ".len()));
            let definition = integrator.find("const auto dfm_ddf = ").unwrap();
            assert_eq!(first_use(&integrator, "dfm_ddf"), Some(definition + "const auto ".len()));
            for slot in [Slot::InitializeLocalVariables, Slot::UpdateAuxiliaryStateVariables] {
                if let Some(code) = bd.code(h, slot) {
                    assert_eq!(first_use(&code, "f_"), None);
                }
            }

            // porosity rows and columns of the jacobian
            assert!(integrator.contains("dfp_ddf = -(this->dt)*dvp*dseq_df*dfm_ddf;"));
            assert!(integrator.contains("dfeel_ddf += dfm_ddf*(this->dp)*dn_df;"));
            assert!(integrator.contains("dff_ddeel -= (1-f_)*Stensor::Id();\ndff_ddf += dfm_ddf*trace(this->deel);\n"));
            assert!(integrator.contains("dff_ddp -= (1-f_)*trace(n);\n"));
            assert!(integrator.contains("dff_ddeel -= (this->theta)*(1-f_)*(this->dp)*(Stensor::Id()|(dn_dsig*("));
        }
        Ok(())
    }

    #[test]
    fn staggered_scheme_freezes_the_porosity_of_the_inner_solve() -> Result<()> {
        let mut pe = OptionMap::new();
        pe.insert("algorithm".to_string(), OptionValue::from("staggered_scheme"));
        pe.insert("nucleation_model".to_string(), power_law());
        let mut options = OptionMap::new();
        options.insert("stress_potential".to_string(), hooke());
        options.insert("inelastic_flow".to_string(), norton());
        options.insert("porosity_evolution".to_string(), OptionValue::Map(pe));
        let mut bd = behaviour();
        let mut brick = ElastoViscoPlasticity::new();
        run(&mut brick, &mut bd, &options)?;
        let integrator = bd.code(Hypothesis::Tridimensional, Slot::Integrator).unwrap();
        assert!(integrator.starts_with(
            "const auto f_ = (this->staggered_scheme.compute_standard_system) ?\n\
             (this->f+(this->theta)*(this->df)) :\n\
             (this->f+(this->theta)*(this->staggered_scheme.porosity_increment));\n\
             const auto dfm_ddf = (this->staggered_scheme.compute_standard_system) ? this->theta : real(0);\n"
        ));
        // the porosity rows are only assembled by the full system
        let standard = integrator.find("if(this->staggered_scheme.compute_standard_system){").unwrap();
        assert!(integrator.find("dff_ddp -= ").unwrap() > standard);
        assert!(integrator.ends_with("} else {\nff -= this->staggered_scheme.porosity_increment;\n}\n"));
        Ok(())
    }

    #[test]
    fn staggered_scheme_works() -> Result<()> {
        let gtn = structure(
            "Plastic",
            &[
                (
                    "criterion",
                    structure(
                        "GursonTvergaardNeedleman1982",
                        &[
                            ("q_1", OptionValue::Real(1.5)),
                            ("q_2", OptionValue::Real(1.0)),
                            ("q_3", OptionValue::Real(2.25)),
                            ("f_c", OptionValue::Real(0.04)),
                            ("f_r", OptionValue::Real(0.2)),
                        ],
                    ),
                ),
                ("isotropic_hardening", structure("Linear", &[("R0", OptionValue::Real(200e6))])),
            ],
        );
        let mut pe = OptionMap::new();
        pe.insert("algorithm".to_string(), OptionValue::from("staggered_scheme"));
        pe.insert("maximum_number_of_iterations".to_string(), OptionValue::Integer(20));
        pe.insert("acceleration_algorithm".to_string(), OptionValue::from("aitken"));
        let mut options = OptionMap::new();
        options.insert("stress_potential".to_string(), hooke());
        options.insert("inelastic_flow".to_string(), gtn);
        options.insert("porosity_evolution".to_string(), OptionValue::Map(pe));
        let mut bd = behaviour();
        let mut brick = ElastoViscoPlasticity::new();
        run(&mut brick, &mut bd, &options)?;

        let h = Hypothesis::Tridimensional;
        assert_eq!(bd.parameter_default(h, "porosity_upper_bound"), Some(ParameterValue::Real(0.2)));
        assert_eq!(
            bd.parameter_default(h, "staggered_scheme_maximum_number_of_iterations"),
            Some(ParameterValue::UnsignedInteger(20))
        );
        assert_eq!(bd.find_variable(h, "broken").unwrap().0, VariableKind::AuxiliaryStateVariable);
        let integrator = bd.code(h, Slot::Integrator).unwrap();
        assert!(integrator.contains("if(this->staggered_scheme.compute_standard_system){\nff -= (1-f_)*(this->dp)*trace(n);"));
        assert!(bd
            .code(h, Slot::AdditionalConvergenceChecks)
            .unwrap()
            .contains("ss.previous_residual"));
        assert!(bd
            .code(h, Slot::InitializeLocalVariables)
            .unwrap()
            .contains("this->staggered_scheme.upper_bound = (this->porosity_upper_bound_safety_factor)"));

        let params = StaggeredSchemeParameters::from_description(&bd, h)?;
        assert_eq!(params.maximum_number_of_iterations, 20);
        approx_eq(params.upper_bound, 0.2, 1e-15);
        let mut scheme = StaggeredScheme::new(params)?;
        let res = scheme.run(
            0.01,
            false,
            |_, _| Ok(()),
            |df| {
                let state = PorosityUpdateState {
                    f: 0.01,
                    df,
                    flows: vec![FlowIncrement {
                        dp: 0.01,
                        trace_n: 1.0,
                        ..Default::default()
                    }],
                    ..Default::default()
                };
                brick.next_estimate_of_the_porosity_increment(&state)
            },
        )?;
        // Δf = (1 - f - Δf) tr(n) dp
        approx_eq(res.porosity_increment, 0.99 * 0.01 / 1.01, 1e-9);
        assert!(!res.broken);
        Ok(())
    }

    #[test]
    fn nucleation_without_flow_is_captured() -> Result<()> {
        let mut pe = OptionMap::new();
        pe.insert("nucleation_model".to_string(), power_law());
        let mut options = OptionMap::new();
        options.insert("stress_potential".to_string(), hooke());
        options.insert("porosity_evolution".to_string(), OptionValue::Map(pe));
        let ctx = BrickContext::new(NonLinearSolver::NewtonRaphson, Registries::global()?);
        let mut bd = behaviour();
        let mut brick = ElastoViscoPlasticity::new();
        brick.initialize(&mut bd, &ctx, &options)?;
        assert_eq!(
            brick.complete_variable_declaration(&mut bd, &ctx).err(),
            Some(Error::ordering("StandardElastoViscoPlasticity", "no inelastic flow declared"))
        );
        Ok(())
    }

    #[test]
    fn errors_are_captured() -> Result<()> {
        let ctx = BrickContext::new(NonLinearSolver::NewtonRaphson, Registries::global()?);
        let mut options = OptionMap::new();
        options.insert("inelastic_flow".to_string(), norton());
        let mut bd = behaviour();
        assert_eq!(
            ElastoViscoPlasticity::new().initialize(&mut bd, &ctx, &options).err(),
            Some(Error::MissingOption {
                brick: "StandardElastoViscoPlasticity".to_string(),
                option: "stress_potential".to_string()
            })
        );
        options.insert("stress_potential".to_string(), OptionValue::from("Hook"));
        assert_eq!(
            ElastoViscoPlasticity::new().initialize(&mut bd, &ctx, &options).err(),
            Some(Error::UnknownName {
                family: "stress potential".to_string(),
                name: "Hook".to_string(),
                entry: "stress_potential".to_string()
            })
        );
        // nothing is declared when an option is rejected
        assert!(bd.data(Hypothesis::Undefined).unwrap().all_variables().is_empty());

        // component options are checked before the stress potential declares anything
        let mut options = OptionMap::new();
        options.insert("stress_potential".to_string(), hooke());
        options.insert(
            "inelastic_flow".to_string(),
            structure("Norton", &[("criterion", OptionValue::from("Mises")), ("Q", OptionValue::Real(1.0))]),
        );
        assert_eq!(
            ElastoViscoPlasticity::new().initialize(&mut bd, &ctx, &options).err(),
            Some(Error::UnknownOption {
                brick: "Norton".to_string(),
                option: "Q".to_string()
            })
        );
        assert!(bd.data(Hypothesis::Undefined).unwrap().all_variables().is_empty());
        assert!(bd.find_variable(Hypothesis::Undefined, "eel").is_none());

        // a component failing after the schema check leaves the behaviour untouched as well
        let mut pe = OptionMap::new();
        pe.insert(
            "nucleation_model".to_string(),
            structure(
                "PowerLaw",
                &[
                    ("An", OptionValue::Real(0.1)),
                    ("pmin", OptionValue::Real(0.0)),
                    ("m", OptionValue::Real(1.0)),
                    ("fmax", OptionValue::Real(2.0)),
                ],
            ),
        );
        let mut options = OptionMap::new();
        options.insert("stress_potential".to_string(), hooke());
        options.insert("inelastic_flow".to_string(), norton());
        options.insert("porosity_evolution".to_string(), OptionValue::Map(pe));
        assert_eq!(
            ElastoViscoPlasticity::new().initialize(&mut bd, &ctx, &options).err(),
            Some(Error::unsupported("PowerLaw", "fmax must be in (0, 1]"))
        );
        assert!(bd.data(Hypothesis::Undefined).unwrap().all_variables().is_empty());

        let mut options = OptionMap::new();
        options.insert("stress_potential".to_string(), hooke());
        options.insert("inelastic_flow".to_string(), norton());
        let mut brick = ElastoViscoPlasticity::new();
        run(&mut brick, &mut bd, &options)?;
        assert_eq!(
            brick.end_treatment(&mut bd, &ctx).err(),
            Some(Error::Lifecycle {
                brick: "Hooke".to_string(),
                from: "TreatmentEnded".to_string(),
                to: "TreatmentEnded".to_string()
            })
        );
        let state = PorosityUpdateState::default();
        assert_eq!(
            brick.next_estimate_of_the_porosity_increment(&state).err(),
            Some(Error::Numerical(
                "0 flow increments given but 1 inelastic flows are declared".to_string()
            ))
        );
        Ok(())
    }
}
