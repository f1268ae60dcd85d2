//! Brick composition and implicit-equation assembly for material behaviour generators
//!
//! A behaviour is assembled from bricks (stress potentials, inelastic flows,
//! porosity nucleation models and the elasto-visco-plastic orchestrator)
//! driven in lockstep through a three-phase lifecycle. The result is a set of
//! variables, parameters and ordered code fragments for every modelling
//! hypothesis.

pub mod error;
pub use crate::error::{Error, Result};

pub mod base;
pub mod bricks;
pub mod compiler;
pub mod prelude;
pub mod solver;
