use super::{BehaviourInput, GeneratedBehaviour};
use crate::base::{BehaviourDescription, Config, Hypothesis, OptionMap, ParameterValue, Variable, VariableType};
use crate::bricks::{BehaviourBrick, BrickContext, BrickState, Registries, Staged};
use crate::solver::NonLinearSolver;
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Holds the global parameters of the implicit scheme with their default values
const IMPLICIT_SCHEME_PARAMETERS: [(&str, ParameterValue); 3] = [
    ("theta", ParameterValue::Real(0.5)),
    ("epsilon", ParameterValue::Real(1e-14)),
    ("iterMax", ParameterValue::UnsignedInteger(100)),
];

/// Compiles behaviour descriptions by driving the bricks through their lifecycle
///
/// All bricks are initialized, then all bricks complete their variable
/// declaration, then the parameter overrides are applied, then all bricks
/// end their treatment. Any error aborts the whole compilation.
pub struct BehaviourCompiler<'a> {
    config: &'a Config,
    registries: &'a Registries,
}

impl<'a> BehaviourCompiler<'a> {
    /// Allocates a new instance using the built-in bricks
    pub fn new(config: &'a Config) -> Result<Self> {
        BehaviourCompiler::with_registries(config, Registries::global()?)
    }

    /// Allocates a new instance using the given registries
    pub fn with_registries(config: &'a Config, registries: &'a Registries) -> Result<Self> {
        if let Some(msg) = config.validate() {
            return Err(Error::InvalidConfig(msg));
        }
        Ok(BehaviourCompiler { config, registries })
    }

    /// Compiles a behaviour input
    pub fn compile(&self, input: &BehaviourInput) -> Result<GeneratedBehaviour> {
        let solver = input.solver()?.unwrap_or(self.config.solver);
        let mut bd = BehaviourDescription::new(&input.name, input.behaviour_type, input.integration_scheme);
        bd.elastic_symmetry = input.elastic_symmetry;
        if let Some(hypotheses) = input.hypotheses.as_ref().or(self.config.hypotheses.as_ref()) {
            bd.set_requested_hypotheses(hypotheses)?;
        }
        let mut bricks = Vec::new();
        for brick in &input.bricks {
            bricks.push((brick.name.clone(), brick.option_map()?));
        }
        self.compile_description(&mut bd, solver, &bricks, &input.parameters)?;
        GeneratedBehaviour::new(&bd, solver)
    }

    /// Runs the lifecycle of the given bricks on a behaviour description
    ///
    /// # Input
    ///
    /// * `bd` -- the behaviour under construction
    /// * `solver` -- the non-linear solver
    /// * `bricks` -- the (name, options) pairs of the top-level bricks, in application order
    /// * `parameters` -- overrides of parameter default values (applied after the configured ones)
    pub fn compile_description(
        &self,
        bd: &mut BehaviourDescription,
        solver: NonLinearSolver,
        bricks: &[(String, OptionMap)],
        parameters: &BTreeMap<String, f64>,
    ) -> Result<()> {
        let mut ctx = BrickContext::new(solver, self.registries);
        ctx.verbose = self.config.verbose_bricks;
        self.print_header(&bd.name, solver);

        // allocate all bricks before touching the behaviour
        let mut staged: Vec<Staged<Box<dyn BehaviourBrick>>> = Vec::new();
        for (name, _) in bricks {
            staged.push(Staged::new(name, self.registries.bricks.create(name, "bricks")?));
        }

        // solver
        for name in solver.reserved_names() {
            bd.reserve_name(name)?;
        }
        let h = Hypothesis::Undefined;
        for (name, value) in IMPLICIT_SCHEME_PARAMETERS.iter().copied().chain(solver.parameters()) {
            let variable = match value {
                ParameterValue::Real(..) => Variable::scalar(name),
                ParameterValue::UnsignedInteger(..) => Variable::new(VariableType::UnsignedInteger, name),
            };
            bd.add_parameter(h, variable, value)?;
        }

        // lifecycle
        for (brick, (name, options)) in staged.iter_mut().zip(bricks) {
            brick
                .advance(BrickState::Initialized)?
                .initialize(bd, &ctx, options)
                .map_err(|e| e.in_brick(name))?;
        }
        self.print_phase(BrickState::Initialized, staged.len());
        for (brick, (name, _)) in staged.iter_mut().zip(bricks) {
            brick
                .advance(BrickState::VariablesDeclared)?
                .complete_variable_declaration(bd, &ctx)
                .map_err(|e| e.in_brick(name))?;
        }
        self.print_phase(BrickState::VariablesDeclared, staged.len());
        for (name, value) in self.config.parameters.iter().chain(parameters) {
            override_parameter(bd, name, *value)?;
        }
        for (brick, (name, _)) in staged.iter_mut().zip(bricks) {
            brick
                .advance(BrickState::TreatmentEnded)?
                .end_treatment(bd, &ctx)
                .map_err(|e| e.in_brick(name))?;
        }
        self.print_phase(BrickState::TreatmentEnded, staged.len());
        Ok(())
    }

    fn print_header(&self, name: &str, solver: NonLinearSolver) {
        if self.config.verbose_phases {
            println!("behaviour {} (solver {})", name, solver);
            println!("{:>18} {:>8}", "phase", "bricks");
        }
    }

    fn print_phase(&self, state: BrickState, count: usize) {
        if self.config.verbose_phases {
            println!("{:>18} {:>8}", state, count);
        }
    }
}

/// Overrides the default value of a parameter
///
/// Integer parameters only accept non-negative integral values.
pub fn override_parameter(bd: &mut BehaviourDescription, name: &str, value: f64) -> Result<()> {
    let value = match bd.parameter_default(Hypothesis::Undefined, name) {
        None => return Err(Error::unknown_parameter(name)),
        Some(ParameterValue::Real(..)) => ParameterValue::Real(value),
        Some(ParameterValue::UnsignedInteger(..)) => {
            if value < 0.0 || value.fract() != 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "parameter '{}' must be a non-negative integer (got {:?})",
                    name, value
                )));
            }
            ParameterValue::UnsignedInteger(value as usize)
        }
    };
    bd.set_parameter_default(name, value)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{override_parameter, BehaviourCompiler};
    use crate::base::{BehaviourDescription, BehaviourType, Config, Hypothesis, IntegrationScheme, OptionMap};
    use crate::base::{ParameterValue, Slot, Variable};
    use crate::compiler::{BehaviourInput, SampleInputs};
    use crate::solver::NonLinearSolver;
    use crate::{Error, Result};
    use std::collections::BTreeMap;

    #[test]
    fn compile_works() -> Result<()> {
        let config = Config::new();
        let compiler = BehaviourCompiler::new(&config)?;
        let out = compiler.compile(&SampleInputs::norton())?;
        assert_eq!(out.solver, NonLinearSolver::NewtonRaphson);
        let h = out.hypothesis(Hypothesis::Tridimensional).unwrap();
        assert_eq!(h.integration_variables, &["eel", "p"]);
        assert_eq!(h.parameters.get("theta"), Some(&ParameterValue::Real(0.5)));
        assert_eq!(h.parameters.get("iterMax"), Some(&ParameterValue::UnsignedInteger(100)));
        assert_eq!(h.parameters.get("numerical_jacobian_epsilon"), None);
        assert!(h.code.iter().any(|(slot, _)| *slot == Slot::Integrator));
        Ok(())
    }

    #[test]
    fn overrides_work() -> Result<()> {
        let mut config = Config::new();
        config
            .set_solver(NonLinearSolver::NewtonRaphsonNumericalJacobian)?
            .set_parameter("theta", 1.0)?;
        let mut input = SampleInputs::norton();
        input.parameters.insert("iterMax".to_string(), 20.0);
        input.parameters.insert("theta".to_string(), 0.75);
        let out = BehaviourCompiler::new(&config)?.compile(&input)?;
        let h = out.hypothesis(Hypothesis::PlaneStrain).unwrap();
        // the input wins over the configuration
        assert_eq!(h.parameters.get("theta"), Some(&ParameterValue::Real(0.75)));
        assert_eq!(h.parameters.get("iterMax"), Some(&ParameterValue::UnsignedInteger(20)));
        assert_eq!(
            h.parameters.get("numerical_jacobian_epsilon"),
            Some(&ParameterValue::Real(1e-8))
        );
        Ok(())
    }

    #[test]
    fn override_parameter_captures_errors() -> Result<()> {
        let mut bd = BehaviourDescription::new(
            "Test",
            BehaviourType::StandardStrainBasedBehaviour,
            IntegrationScheme::Implicit,
        );
        let compiler_config = Config::new();
        let compiler = BehaviourCompiler::new(&compiler_config)?;
        compiler.compile_description(&mut bd, NonLinearSolver::Broyden, &[], &BTreeMap::new())?;
        assert_eq!(
            override_parameter(&mut bd, "Theta", 1.0).err(),
            Some(Error::unknown_parameter("Theta"))
        );
        assert_eq!(
            override_parameter(&mut bd, "iterMax", 2.5).err(),
            Some(Error::InvalidConfig(
                "parameter 'iterMax' must be a non-negative integer (got 2.5)".to_string()
            ))
        );
        override_parameter(&mut bd, "epsilon", 1e-10)?;
        assert_eq!(
            bd.parameter_default(Hypothesis::Tridimensional, "epsilon"),
            Some(ParameterValue::Real(1e-10))
        );
        assert!(bd.is_name_reserved("fzeros_previous"));
        Ok(())
    }

    #[test]
    fn compile_captures_errors() -> Result<()> {
        let mut config = Config::new();
        config.set_parameter("theta", 2.0)?;
        assert_eq!(
            BehaviourCompiler::new(&config).err(),
            Some(Error::InvalidConfig(
                "theta = 2.0 is incorrect; it must be in (0, 1]".to_string()
            ))
        );

        let config = Config::new();
        let compiler = BehaviourCompiler::new(&config)?;
        let input = BehaviourInput::from_json(r#"{"name": "A", "bricks": [{"name": "Elasticity"}]}"#)?;
        assert_eq!(
            compiler.compile(&input).err(),
            Some(Error::UnknownName {
                family: "brick".to_string(),
                name: "Elasticity".to_string(),
                entry: "bricks".to_string()
            })
        );

        let mut input = SampleInputs::norton();
        input.parameters.insert("porosity_upper_bound".to_string(), 0.5);
        assert_eq!(
            compiler.compile(&input).err(),
            Some(Error::unknown_parameter("porosity_upper_bound"))
        );

        let mut bd = BehaviourDescription::new(
            "Test",
            BehaviourType::StandardStrainBasedBehaviour,
            IntegrationScheme::Implicit,
        );
        let bricks = vec![("StandardElastoViscoPlasticity".to_string(), OptionMap::new())];
        assert_eq!(
            compiler
                .compile_description(&mut bd, NonLinearSolver::NewtonRaphson, &bricks, &BTreeMap::new())
                .err(),
            Some(Error::MissingOption {
                brick: "StandardElastoViscoPlasticity".to_string(),
                option: "stress_potential".to_string()
            })
        );
        Ok(())
    }

    #[test]
    fn compile_names_the_failing_brick() -> Result<()> {
        let config = Config::new();
        let compiler = BehaviourCompiler::new(&config)?;
        let input = SampleInputs::norton();
        let bricks = vec![(input.bricks[0].name.clone(), input.bricks[0].option_map()?)];

        // a name already used by the behaviour
        let mut bd = BehaviourDescription::new(
            "Test",
            BehaviourType::StandardStrainBasedBehaviour,
            IntegrationScheme::Implicit,
        );
        bd.add_local_variable(Hypothesis::Undefined, Variable::stensor("eel"))?;
        let err = compiler
            .compile_description(&mut bd, NonLinearSolver::NewtonRaphson, &bricks, &BTreeMap::new())
            .err();
        assert_eq!(
            err,
            Some(Error::VariableRedeclared {
                brick: Some("Hooke".to_string()),
                name: "eel".to_string(),
                kind: "a local variable".to_string(),
            })
        );
        assert_eq!(
            format!("{}", err.unwrap()),
            "Hooke: variable 'eel' is already declared as a local variable"
        );

        // a name reserved before the bricks run
        let mut bd = BehaviourDescription::new(
            "Test",
            BehaviourType::StandardStrainBasedBehaviour,
            IntegrationScheme::Implicit,
        );
        bd.reserve_name("eel")?;
        let err = compiler
            .compile_description(&mut bd, NonLinearSolver::NewtonRaphson, &bricks, &BTreeMap::new())
            .err()
            .unwrap();
        assert_eq!(
            err,
            Error::NameReserved {
                brick: Some("Hooke".to_string()),
                name: "eel".to_string(),
            }
        );
        Ok(())
    }
}
