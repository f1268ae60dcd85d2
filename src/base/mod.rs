//! Implements the option model and the behaviour model

mod attributes;
mod behaviour;
mod behaviour_data;
mod code_block;
mod config;
mod hypothesis;
mod material_property;
mod option_schema;
mod options;
mod variable;
pub use crate::base::attributes::*;
pub use crate::base::behaviour::*;
pub use crate::base::behaviour_data::*;
pub use crate::base::code_block::*;
pub use crate::base::config::*;
pub use crate::base::hypothesis::*;
pub use crate::base::material_property::*;
pub use crate::base::option_schema::*;
pub use crate::base::options::*;
pub use crate::base::variable::*;
