//! Implements the capability descriptors of the non-linear solvers

mod non_linear_solver;
pub use crate::solver::non_linear_solver::*;
