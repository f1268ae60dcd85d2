//! Implements the behaviour bricks and their components

mod brick;
mod elasto_visco_plasticity;
mod hooke;
mod hyperbolic_sine;
mod inelastic_flow;
mod isotropic_damage_hooke;
mod isotropic_hardening;
mod kinematic_hardening;
mod lifecycle;
mod norton;
mod nucleation;
mod plastic;
mod porosity;
mod registry;
mod staggered;
mod stress_criterion;
mod stress_potential;
pub use crate::bricks::brick::*;
pub use crate::bricks::elasto_visco_plasticity::*;
pub use crate::bricks::hooke::*;
pub use crate::bricks::hyperbolic_sine::*;
pub use crate::bricks::inelastic_flow::*;
pub use crate::bricks::isotropic_damage_hooke::*;
pub use crate::bricks::isotropic_hardening::*;
pub use crate::bricks::kinematic_hardening::*;
pub use crate::bricks::lifecycle::*;
pub use crate::bricks::norton::*;
pub use crate::bricks::nucleation::*;
pub use crate::bricks::plastic::*;
pub use crate::bricks::porosity::*;
pub use crate::bricks::registry::*;
pub use crate::bricks::staggered::*;
pub use crate::bricks::stress_criterion::*;
pub use crate::bricks::stress_potential::*;
