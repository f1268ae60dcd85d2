use crate::base::{check_options, DataStructure, OptionDescription, OptionMap, OptionType, OptionValue};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Defines how the porosity evolution is coupled with the inelastic flows
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub enum PorosityEvolutionAlgorithm {
    /// The porosity is an unknown of the implicit system
    #[default]
    StandardImplicitScheme,

    /// The porosity increment is frozen during each inner solve and updated by a fixed-point loop
    StaggeredScheme,
}

impl PorosityEvolutionAlgorithm {
    /// Returns the name used in behaviour files
    pub fn name(&self) -> &'static str {
        match self {
            PorosityEvolutionAlgorithm::StandardImplicitScheme => "standard_implicit_scheme",
            PorosityEvolutionAlgorithm::StaggeredScheme => "staggered_scheme",
        }
    }
}

impl fmt::Display for PorosityEvolutionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for PorosityEvolutionAlgorithm {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard_implicit_scheme" => Ok(PorosityEvolutionAlgorithm::StandardImplicitScheme),
            "staggered_scheme" => Ok(PorosityEvolutionAlgorithm::StaggeredScheme),
            _ => Err(Error::UnknownName {
                family: "porosity evolution algorithm".to_string(),
                name: s.to_string(),
                entry: "algorithm".to_string(),
            }),
        }
    }
}

/// Defines the update of the porosity increment between two iterations of the staggered scheme
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub enum StaggeredSchemeAcceleration {
    /// Δf ← Δf + α (Δf_next - Δf)
    #[default]
    Relaxation,

    /// Secant (Aitken) extrapolation of the last two updates
    Aitken,
}

impl StaggeredSchemeAcceleration {
    /// Returns the name used in behaviour files
    pub fn name(&self) -> &'static str {
        match self {
            StaggeredSchemeAcceleration::Relaxation => "relaxation",
            StaggeredSchemeAcceleration::Aitken => "aitken",
        }
    }
}

impl fmt::Display for StaggeredSchemeAcceleration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for StaggeredSchemeAcceleration {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "relaxation" => Ok(StaggeredSchemeAcceleration::Relaxation),
            "aitken" => Ok(StaggeredSchemeAcceleration::Aitken),
            _ => Err(Error::UnknownName {
                family: "staggered scheme acceleration algorithm".to_string(),
                name: s.to_string(),
                entry: "acceleration_algorithm".to_string(),
            }),
        }
    }
}

/// Options which are only meaningful for the staggered scheme
const STAGGERED_SCHEME_OPTIONS: [&str; 4] = [
    "maximum_number_of_iterations",
    "convergence_criterion",
    "acceleration_algorithm",
    "relaxation_factor",
];

/// Holds the `porosity_evolution` section of the elasto-visco-plastic brick
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PorosityEvolution {
    /// Coupling algorithm
    pub algorithm: PorosityEvolutionAlgorithm,

    /// Accounts for the porosity growth due to the elastic dilatation
    pub elastic_contribution: bool,

    /// Nucleation models (in declaration order)
    pub nucleation_models: Vec<DataStructure>,

    /// Overrides the default maximum number of outer iterations
    pub maximum_number_of_iterations: Option<usize>,

    /// Overrides the default convergence criterion on the porosity increment
    pub convergence_criterion: Option<f64>,

    /// Update of the estimate between two outer iterations
    pub acceleration: StaggeredSchemeAcceleration,

    /// Overrides the default relaxation factor
    pub relaxation_factor: Option<f64>,
}

impl PorosityEvolution {
    /// Returns the schema of the options
    pub fn options() -> Vec<OptionDescription> {
        vec![
            OptionDescription::new("algorithm", "porosity evolution algorithm", OptionType::String),
            OptionDescription::new(
                "elastic_contribution",
                "take the elastic dilatation into account",
                OptionType::Boolean,
            ),
            OptionDescription::new("nucleation_model", "porosity nucleation models", OptionType::DataStructures),
            OptionDescription::new(
                "maximum_number_of_iterations",
                "maximum number of iterations of the staggered scheme",
                OptionType::Integer,
            ),
            OptionDescription::new(
                "convergence_criterion",
                "convergence criterion on the porosity increment",
                OptionType::Real,
            ),
            OptionDescription::new(
                "acceleration_algorithm",
                "update of the porosity increment between two iterations",
                OptionType::String,
            ),
            OptionDescription::new("relaxation_factor", "relaxation factor", OptionType::Real),
        ]
    }

    /// Allocates a new instance from the `porosity_evolution` map
    pub fn from_map(brick: &str, options: &OptionMap) -> Result<Self> {
        check_options(brick, options, &Self::options())?;
        let mut res = PorosityEvolution::default();
        if let Some(OptionValue::String(s)) = options.get("algorithm") {
            res.algorithm = s.parse()?;
        }
        if res.algorithm == PorosityEvolutionAlgorithm::StandardImplicitScheme {
            if let Some(key) = STAGGERED_SCHEME_OPTIONS.iter().find(|k| options.contains_key(**k)) {
                return Err(Error::unsupported(
                    brick,
                    &format!("option '{}' is only meaningful for the staggered scheme", key),
                ));
            }
        }
        if let Some(v) = options.get("elastic_contribution").and_then(|v| v.as_bool()) {
            res.elastic_contribution = v;
        }
        if let Some(v) = options.get("nucleation_model") {
            res.nucleation_models = v.as_structures().unwrap_or_default();
        }
        if let Some(n) = options.get("maximum_number_of_iterations").and_then(|v| v.as_integer()) {
            if n <= 0 {
                return Err(Error::unsupported(
                    brick,
                    "the maximum number of iterations of the staggered scheme must be positive",
                ));
            }
            res.maximum_number_of_iterations = Some(n as usize);
        }
        if let Some(eps) = options.get("convergence_criterion").and_then(|v| v.as_real()) {
            if eps <= 0.0 {
                return Err(Error::unsupported(brick, "the convergence criterion must be positive"));
            }
            res.convergence_criterion = Some(eps);
        }
        if let Some(OptionValue::String(s)) = options.get("acceleration_algorithm") {
            res.acceleration = s.parse()?;
        }
        if let Some(alpha) = options.get("relaxation_factor").and_then(|v| v.as_real()) {
            if res.acceleration == StaggeredSchemeAcceleration::Aitken {
                return Err(Error::unsupported(
                    brick,
                    "the relaxation factor is not used by the Aitken acceleration",
                ));
            }
            if alpha <= 0.0 || alpha > 1.0 {
                return Err(Error::unsupported(brick, "the relaxation factor must be in (0, 1]"));
            }
            res.relaxation_factor = Some(alpha);
        }
        Ok(res)
    }

    /// Returns the porosity increment due to the elastic dilatation
    pub fn elastic_contribution(&self, state: &PorosityUpdateState) -> f64 {
        if self.elastic_contribution {
            (1.0 - state.f - state.df) * state.elastic_strain_trace_increment
        } else {
            0.0
        }
    }
}

/// Holds the converged values of one inelastic flow after an inner solve
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlowIncrement {
    /// Equivalent plastic strain at the beginning of the time step
    pub p: f64,

    /// Increment of the equivalent plastic strain
    pub dp: f64,

    /// Trace of the flow direction
    pub trace_n: f64,

    /// Equivalent stress at the beginning of the time step
    pub seq: f64,

    /// Increment of the equivalent stress
    pub dseq: f64,
}

/// Holds the state from which the next estimate of the porosity increment is computed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PorosityUpdateState {
    /// Porosity at the beginning of the time step
    pub f: f64,

    /// Current estimate of the porosity increment
    pub df: f64,

    /// Trace of the increment of the elastic strain
    pub elastic_strain_trace_increment: f64,

    /// Flow increments (in declaration order)
    pub flows: Vec<FlowIncrement>,

    /// Porosity nucleated so far by each nucleation model (in declaration order)
    pub nucleated: Vec<f64>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
