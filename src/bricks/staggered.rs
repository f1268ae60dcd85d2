//! Staggered coupling between the porosity and the inner implicit system
//!
//! Each outer iteration solves the implicit system with a frozen porosity
//! increment, then computes a new estimate of the increment from the
//! converged state:
//!
//! ```text
//! Δf⁰ = 0
//! loop k = 0, 1, 2, ...
//!   1. solve the implicit system with Δfᵏ frozen
//!   2. Δf* = estimate(Δfᵏ), corrected by bisection to keep 0 ≤ f + Δf* ≤ sf·fᵤ
//!   3. |Δf* - Δfᵏ| < ε → one more solve with the standard system, then stop
//!   4. Δfᵏ⁺¹ = relaxation or Aitken update of Δfᵏ, kept inside the bracket
//! ```

use super::StaggeredSchemeAcceleration;
use crate::base::{BehaviourDescription, Hypothesis, ATTRIBUTE_STAGGERED_SCHEME_ACCELERATION};
use crate::{Error, Result};

/// Upper bound of the porosity
pub const POROSITY_UPPER_BOUND: &str = "porosity_upper_bound";

/// Safety factor applied to the upper bound of the porosity
pub const POROSITY_UPPER_BOUND_SAFETY_FACTOR: &str = "porosity_upper_bound_safety_factor";

/// Safety factor applied to the upper bound of the porosity to detect the fracture
pub const POROSITY_UPPER_BOUND_SAFETY_FACTOR_FOR_FRACTURE_DETECTION: &str =
    "porosity_upper_bound_safety_factor_for_fracture_detection";

/// Convergence criterion on the porosity increment
pub const STAGGERED_SCHEME_POROSITY_CRITERION: &str = "staggered_scheme_porosity_criterion";

/// Maximum number of outer iterations
pub const STAGGERED_SCHEME_MAXIMUM_NUMBER_OF_ITERATIONS: &str = "staggered_scheme_maximum_number_of_iterations";

/// Relaxation factor of the outer iterations
pub const STAGGERED_SCHEME_RELAXATION_FACTOR: &str = "staggered_scheme_relaxation_factor";

/// Holds the parameters of the staggered scheme
#[derive(Clone, Debug, PartialEq)]
pub struct StaggeredSchemeParameters {
    /// Convergence criterion on the porosity increment
    pub criterion: f64,

    /// Maximum number of outer iterations
    pub maximum_number_of_iterations: usize,

    /// Relaxation factor (used by the relaxation update)
    pub relaxation_factor: f64,

    /// Update of the estimate between two outer iterations
    pub acceleration: StaggeredSchemeAcceleration,

    /// Upper bound of the porosity
    pub upper_bound: f64,

    /// Safety factor applied to the upper bound
    pub safety_factor: f64,

    /// Safety factor applied to the upper bound to detect the fracture
    pub safety_factor_for_fracture_detection: f64,
}

impl Default for StaggeredSchemeParameters {
    fn default() -> Self {
        StaggeredSchemeParameters {
            criterion: 1e-8,
            maximum_number_of_iterations: 100,
            relaxation_factor: 1.0,
            acceleration: StaggeredSchemeAcceleration::Relaxation,
            upper_bound: 1.0,
            safety_factor: 0.985,
            safety_factor_for_fracture_detection: 0.984,
        }
    }
}

impl StaggeredSchemeParameters {
    /// Reads the parameters (default values) of a compiled behaviour
    pub fn from_description(bd: &BehaviourDescription, hypothesis: Hypothesis) -> Result<Self> {
        let get = |name: &str| {
            bd.parameter_default(hypothesis, name)
                .map(|v| v.as_f64())
                .ok_or_else(|| Error::unknown_parameter(name))
        };
        let acceleration = match bd.attribute::<String>(hypothesis, ATTRIBUTE_STAGGERED_SCHEME_ACCELERATION) {
            Some(name) => name.parse()?,
            None => StaggeredSchemeAcceleration::Relaxation,
        };
        Ok(StaggeredSchemeParameters {
            criterion: get(STAGGERED_SCHEME_POROSITY_CRITERION)?,
            maximum_number_of_iterations: get(STAGGERED_SCHEME_MAXIMUM_NUMBER_OF_ITERATIONS)? as usize,
            relaxation_factor: get(STAGGERED_SCHEME_RELAXATION_FACTOR)?,
            acceleration,
            upper_bound: get(POROSITY_UPPER_BOUND)?,
            safety_factor: get(POROSITY_UPPER_BOUND_SAFETY_FACTOR)?,
            safety_factor_for_fracture_detection: get(POROSITY_UPPER_BOUND_SAFETY_FACTOR_FOR_FRACTURE_DETECTION)?,
        })
    }

    /// Returns an error message if the parameters are inconsistent
    pub fn validate(&self) -> Option<String> {
        if self.criterion <= 0.0 {
            return Some(format!("criterion = {:?} is incorrect; it must be positive", self.criterion));
        }
        if self.maximum_number_of_iterations == 0 {
            return Some("maximum_number_of_iterations must be positive".to_string());
        }
        if self.relaxation_factor <= 0.0 || self.relaxation_factor > 1.0 {
            return Some(format!(
                "relaxation_factor = {:?} is incorrect; it must be in (0, 1]",
                self.relaxation_factor
            ));
        }
        if self.upper_bound <= 0.0 || self.upper_bound > 1.0 {
            return Some(format!(
                "upper_bound = {:?} is incorrect; it must be in (0, 1]",
                self.upper_bound
            ));
        }
        if self.safety_factor_for_fracture_detection > self.safety_factor {
            return Some("the safety factor for fracture detection must not exceed the safety factor".to_string());
        }
        None
    }
}

/// Holds the result of a staggered time step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaggeredOutcome {
    /// Converged porosity increment
    pub porosity_increment: f64,

    /// Number of outer iterations (updates of the estimate)
    pub iterations: usize,

    /// Indicates that the material is broken
    pub broken: bool,

    /// Number of inner solves (including the final standard solve)
    pub inner_solves: usize,
}

/// Implements the outer loop of the staggered scheme
#[derive(Clone, Debug)]
pub struct StaggeredScheme {
    params: StaggeredSchemeParameters,
    compute_standard_system: bool,
    broken: bool,
    current: f64,
    lower: f64,
    upper: f64,
    iteration: usize,
    previous: Option<(f64, f64)>,
}

impl StaggeredScheme {
    /// Allocates a new instance
    pub fn new(params: StaggeredSchemeParameters) -> Result<Self> {
        if let Some(message) = params.validate() {
            return Err(Error::InvalidConfig(message));
        }
        Ok(StaggeredScheme {
            params,
            compute_standard_system: false,
            broken: false,
            current: 0.0,
            lower: 0.0,
            upper: 0.0,
            iteration: 0,
            previous: None,
        })
    }

    /// Returns the parameters
    pub fn params(&self) -> &StaggeredSchemeParameters {
        &self.params
    }

    /// Prepares a new time step
    ///
    /// `f` is the porosity at the beginning of the step; a broken material
    /// skips the outer loop and goes straight to the standard system.
    pub fn reset(&mut self, f: f64, broken: bool) {
        self.broken = broken;
        self.compute_standard_system = broken;
        self.current = 0.0;
        self.lower = -f;
        self.upper = self.params.safety_factor * self.params.upper_bound - f;
        self.iteration = 0;
        self.previous = None;
    }

    /// Returns the current bracket of the porosity increment
    pub fn bracket(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// Keeps a raw estimate inside the admissible interval by bisection
    fn bisect(&self, estimate: f64) -> f64 {
        if estimate < self.lower {
            0.5 * (self.current + self.lower)
        } else if estimate > self.upper {
            0.5 * (self.current + self.upper)
        } else {
            estimate
        }
    }

    /// Runs the outer loop for one time step
    ///
    /// * `f` -- porosity at the beginning of the time step
    /// * `broken` -- indicates that the material is already broken
    /// * `inner_solve` -- solves the implicit system given the frozen porosity
    ///   increment; the flag requests the standard (fully coupled) system
    /// * `next_estimate` -- returns the next estimate of the porosity increment
    ///   from the state converged by the last inner solve
    pub fn run<S, E>(&mut self, f: f64, broken: bool, mut inner_solve: S, mut next_estimate: E) -> Result<StaggeredOutcome>
    where
        S: FnMut(f64, bool) -> Result<()>,
        E: FnMut(f64) -> Result<f64>,
    {
        self.reset(f, broken);
        let mut inner_solves = 0;
        loop {
            inner_solve(self.current, self.compute_standard_system)?;
            inner_solves += 1;
            if self.compute_standard_system {
                return Ok(StaggeredOutcome {
                    porosity_increment: self.current,
                    iterations: self.iteration,
                    broken: self.broken,
                    inner_solves,
                });
            }
            let next = self.bisect(next_estimate(self.current)?);
            let r = next - self.current;
            if f64::abs(r) < self.params.criterion {
                self.current = next;
                if f + self.current > self.params.safety_factor_for_fracture_detection * self.params.upper_bound {
                    self.broken = true;
                }
                self.compute_standard_system = true;
                continue;
            }
            self.iteration += 1;
            if self.iteration >= self.params.maximum_number_of_iterations {
                return Err(Error::MaximumIterationsExceeded {
                    iterations: self.params.maximum_number_of_iterations,
                });
            }
            if r > 0.0 {
                self.lower = f64::max(self.lower, self.current);
            } else {
                self.upper = f64::min(self.upper, self.current);
            }
            let candidate = match (self.params.acceleration, self.previous) {
                (StaggeredSchemeAcceleration::Aitken, Some((x0, r0))) if r != r0 => {
                    self.current - r * (self.current - x0) / (r - r0)
                }
                (StaggeredSchemeAcceleration::Aitken, _) => next,
                (StaggeredSchemeAcceleration::Relaxation, _) => self.current + self.params.relaxation_factor * r,
            };
            self.previous = Some((self.current, r));
            self.current = if candidate <= self.lower || candidate >= self.upper {
                0.5 * (self.lower + self.upper)
            } else {
                candidate
            };
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
