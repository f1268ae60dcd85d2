use crate::base::ParameterValue;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Defines the algorithm solving the implicit system
///
/// Bricks never depend on the concrete algorithm; they only consult the
/// capability facets to decide which derivative code is emitted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum NonLinearSolver {
    NewtonRaphson,
    NewtonRaphsonNumericalJacobian,
    PowellDogLegNewtonRaphson,
    PowellDogLegNewtonRaphsonNumericalJacobian,
    LevenbergMarquardt,
    LevenbergMarquardtNumericalJacobian,
    Broyden,
    PowellDogLegBroyden,
    Broyden2,
}

impl NonLinearSolver {
    /// Holds all solvers
    pub const ALL: [NonLinearSolver; 9] = [
        NonLinearSolver::NewtonRaphson,
        NonLinearSolver::NewtonRaphsonNumericalJacobian,
        NonLinearSolver::PowellDogLegNewtonRaphson,
        NonLinearSolver::PowellDogLegNewtonRaphsonNumericalJacobian,
        NonLinearSolver::LevenbergMarquardt,
        NonLinearSolver::LevenbergMarquardtNumericalJacobian,
        NonLinearSolver::Broyden,
        NonLinearSolver::PowellDogLegBroyden,
        NonLinearSolver::Broyden2,
    ];

    /// Returns the name used in behaviour files
    pub fn name(&self) -> &'static str {
        match self {
            NonLinearSolver::NewtonRaphson => "NewtonRaphson",
            NonLinearSolver::NewtonRaphsonNumericalJacobian => "NewtonRaphson_NumericalJacobian",
            NonLinearSolver::PowellDogLegNewtonRaphson => "PowellDogLeg_NewtonRaphson",
            NonLinearSolver::PowellDogLegNewtonRaphsonNumericalJacobian => {
                "PowellDogLeg_NewtonRaphson_NumericalJacobian"
            }
            NonLinearSolver::LevenbergMarquardt => "LevenbergMarquardt",
            NonLinearSolver::LevenbergMarquardtNumericalJacobian => "LevenbergMarquardt_NumericalJacobian",
            NonLinearSolver::Broyden => "Broyden",
            NonLinearSolver::PowellDogLegBroyden => "PowellDogLeg_Broyden",
            NonLinearSolver::Broyden2 => "Broyden2",
        }
    }

    /// Indicates that the solver uses the jacobian of the implicit system
    pub fn uses_jacobian(&self) -> bool {
        !matches!(self, NonLinearSolver::Broyden2)
    }

    /// Indicates that the solver uses an approximation of the inverse of the jacobian
    pub fn uses_inverted_jacobian(&self) -> bool {
        matches!(self, NonLinearSolver::Broyden2)
    }

    /// Indicates that the jacobian is computed by finite differences
    pub fn requires_numerical_jacobian(&self) -> bool {
        matches!(
            self,
            NonLinearSolver::NewtonRaphsonNumericalJacobian
                | NonLinearSolver::PowellDogLegNewtonRaphsonNumericalJacobian
                | NonLinearSolver::LevenbergMarquardtNumericalJacobian
        )
    }

    /// Indicates that the user may give an initial jacobian (or inverse)
    pub fn allows_jacobian_initialization(&self) -> bool {
        matches!(
            self,
            NonLinearSolver::Broyden | NonLinearSolver::PowellDogLegBroyden | NonLinearSolver::Broyden2
        )
    }

    /// Indicates that the jacobian is reset to the identity at each iteration
    pub fn requires_jacobian_reset_each_iteration(&self) -> bool {
        !self.allows_jacobian_initialization()
    }

    /// Indicates that bricks shall emit the analytical derivatives
    pub fn requires_analytical_jacobian(&self) -> bool {
        self.uses_jacobian() && !self.requires_numerical_jacobian()
    }

    /// Indicates a trust-region (dogleg) variant
    pub fn uses_powell_dogleg(&self) -> bool {
        matches!(
            self,
            NonLinearSolver::PowellDogLegNewtonRaphson
                | NonLinearSolver::PowellDogLegNewtonRaphsonNumericalJacobian
                | NonLinearSolver::PowellDogLegBroyden
        )
    }

    /// Indicates a Levenberg-Marquardt variant
    pub fn uses_levenberg_marquardt(&self) -> bool {
        matches!(
            self,
            NonLinearSolver::LevenbergMarquardt | NonLinearSolver::LevenbergMarquardtNumericalJacobian
        )
    }

    /// Returns the names used by the generated solver (unavailable to variables)
    pub fn reserved_names(&self) -> Vec<&'static str> {
        let mut names = vec!["fzeros", "zeros", "iter", "converged", "error"];
        if self.uses_jacobian() {
            names.push("jacobian");
        }
        if self.uses_inverted_jacobian() {
            names.push("inv_jacobian");
        }
        if self.requires_numerical_jacobian() {
            names.push("tjacobian");
            names.push("tfzeros");
        }
        if self.uses_powell_dogleg() {
            names.push("computePowellDogLegStep");
        }
        if self.uses_levenberg_marquardt() {
            names.push("levmar_mu");
        }
        if self.allows_jacobian_initialization() {
            names.push("fzeros_previous");
        }
        names
    }

    /// Returns the parameters of the solver with their default values
    pub fn parameters(&self) -> Vec<(&'static str, ParameterValue)> {
        let mut params = Vec::new();
        if self.requires_numerical_jacobian() {
            params.push(("numerical_jacobian_epsilon", ParameterValue::Real(1e-8)));
        }
        if self.uses_powell_dogleg() {
            params.push(("powell_dogleg_trust_region_size", ParameterValue::Real(1e-4)));
        }
        if self.uses_levenberg_marquardt() {
            params.push(("levenberg_marquardt_mu0", ParameterValue::Real(1e-6)));
        }
        params
    }
}

impl Default for NonLinearSolver {
    fn default() -> Self {
        NonLinearSolver::NewtonRaphson
    }
}

impl fmt::Display for NonLinearSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for NonLinearSolver {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match NonLinearSolver::ALL.iter().find(|a| a.name() == s) {
            Some(a) => Ok(*a),
            None => Err(Error::UnknownName {
                family: "non-linear solver".to_string(),
                name: s.to_string(),
                entry: "algorithm".to_string(),
            }),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
