use super::Hypothesis;
use crate::solver::NonLinearSolver;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Holds the settings of the behaviour compiler
pub struct Config {
    /// Non-linear solver used when the input does not select one
    pub solver: NonLinearSolver,

    /// Prints the lifecycle phases
    pub verbose_phases: bool,

    /// Prints one line per brick and phase
    pub verbose_bricks: bool,

    /// Modelling hypotheses used when the input does not select them
    pub hypotheses: Option<Vec<Hypothesis>>,

    /// Overrides of parameter default values (applied before the input's overrides)
    pub parameters: BTreeMap<String, f64>,
}

impl Config {
    /// Allocates a new instance
    pub fn new() -> Self {
        Config {
            solver: NonLinearSolver::NewtonRaphson,
            verbose_phases: false,
            verbose_bricks: false,
            hypotheses: None,
            parameters: BTreeMap::new(),
        }
    }

    /// Sets the non-linear solver
    pub fn set_solver(&mut self, solver: NonLinearSolver) -> Result<&mut Self> {
        self.solver = solver;
        Ok(self)
    }

    /// Sets the verbosity flags
    pub fn set_verbose(&mut self, phases: bool, bricks: bool) -> Result<&mut Self> {
        self.verbose_phases = phases;
        self.verbose_bricks = bricks;
        Ok(self)
    }

    /// Sets the modelling hypotheses
    pub fn set_hypotheses(&mut self, hypotheses: &[Hypothesis]) -> Result<&mut Self> {
        if hypotheses.is_empty() {
            return Err(Error::InvalidConfig("the list of modelling hypotheses is empty".to_string()));
        }
        if hypotheses.contains(&Hypothesis::Undefined) {
            return Err(Error::InvalidConfig(
                "the wildcard hypothesis cannot be requested".to_string(),
            ));
        }
        self.hypotheses = Some(hypotheses.to_vec());
        Ok(self)
    }

    /// Sets the default value of a parameter
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<&mut Self> {
        if !value.is_finite() {
            return Err(Error::InvalidConfig(format!("parameter '{}' must be finite", name)));
        }
        self.parameters.insert(name.to_string(), value);
        Ok(self)
    }

    /// Validates the overrides of well-known parameters
    ///
    /// Returns a message describing the first problem found, if any.
    pub fn validate(&self) -> Option<String> {
        for (name, value) in &self.parameters {
            let value = *value;
            match name.as_str() {
                "theta" => {
                    if value <= 0.0 || value > 1.0 {
                        return Some(format!("theta = {:?} is incorrect; it must be in (0, 1]", value));
                    }
                }
                "epsilon" | "staggered_scheme_porosity_criterion" | "numerical_jacobian_epsilon" => {
                    if value <= 0.0 {
                        return Some(format!("{} = {:?} is incorrect; it must be > 0", name, value));
                    }
                }
                "iterMax" | "staggered_scheme_maximum_number_of_iterations" => {
                    if value < 1.0 || value.fract() != 0.0 {
                        return Some(format!(
                            "{} = {:?} is incorrect; it must be a positive integer",
                            name, value
                        ));
                    }
                }
                "porosity_upper_bound_safety_factor"
                | "porosity_upper_bound_safety_factor_for_fracture_detection"
                | "damage_threshold" => {
                    if value <= 0.0 || value > 1.0 {
                        return Some(format!("{} = {:?} is incorrect; it must be in (0, 1]", name, value));
                    }
                }
                "staggered_scheme_relaxation_factor" => {
                    if value <= 0.0 || value > 1.0 {
                        return Some(format!(
                            "staggered_scheme_relaxation_factor = {:?} is incorrect; it must be in (0, 1]",
                            value
                        ));
                    }
                }
                _ => (),
            }
        }
        let sf = self.parameters.get("porosity_upper_bound_safety_factor");
        let sfr = self.parameters.get("porosity_upper_bound_safety_factor_for_fracture_detection");
        if let (Some(sf), Some(sfr)) = (sf, sfr) {
            if sfr > sf {
                return Some(format!(
                    "the safety factor for fracture detection ({:?}) must not exceed the porosity upper bound safety factor ({:?})",
                    sfr, sf
                ));
            }
        }
        None
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Compiler configuration\n")?;
        write!(f, "======================\n")?;
        write!(f, "solver = {}\n", self.solver)?;
        write!(f, "verbose_phases = {:?}\n", self.verbose_phases)?;
        write!(f, "verbose_bricks = {:?}\n", self.verbose_bricks)?;
        match &self.hypotheses {
            Some(list) => {
                let names: Vec<_> = list.iter().map(|h| h.name()).collect();
                write!(f, "hypotheses = {:?}\n", names)?;
            }
            None => write!(f, "hypotheses = all\n")?,
        }
        write!(f, "\nParameters\n")?;
        write!(f, "==========\n")?;
        for (name, value) in &self.parameters {
            write!(f, "{} = {:?}\n", name, value)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
