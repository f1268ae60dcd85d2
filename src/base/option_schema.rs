use super::{OptionMap, OptionValue};
use crate::{Error, Result};
use std::fmt;

/// Defines the declared type of an option
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OptionType {
    Boolean,
    Integer,
    Real,
    String,

    /// A literal real or integer, or a string holding a formula
    MaterialProperty,

    /// An array of material properties
    ArrayOfMaterialProperties,

    /// A non-empty array of non-negative integers (e.g. indices of inelastic flows)
    ArrayOfIndices,

    /// A map of options
    DataMap,

    /// A named structure (or a string naming a structure without options)
    DataStructure,

    /// A structure or an array of structures
    DataStructures,
}

impl OptionType {
    /// Indicates whether a value matches this type
    pub fn matches(&self, value: &OptionValue) -> bool {
        match self {
            OptionType::Boolean => matches!(value, OptionValue::Boolean(..)),
            OptionType::Integer => matches!(value, OptionValue::Integer(..)),
            OptionType::Real => matches!(value, OptionValue::Integer(..) | OptionValue::Real(..)),
            OptionType::String => matches!(value, OptionValue::String(..)),
            OptionType::MaterialProperty => is_material_property(value),
            OptionType::ArrayOfMaterialProperties => match value {
                OptionValue::Array(values) => values.iter().all(is_material_property),
                _ => false,
            },
            OptionType::ArrayOfIndices => match value {
                OptionValue::Array(values) => {
                    !values.is_empty() && values.iter().all(|v| matches!(v, OptionValue::Integer(i) if *i >= 0))
                }
                _ => false,
            },
            OptionType::DataMap => matches!(value, OptionValue::Map(..)),
            OptionType::DataStructure => value.as_structure().is_some(),
            OptionType::DataStructures => value.as_structures().is_some(),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OptionType::Boolean => "a boolean",
            OptionType::Integer => "an integer",
            OptionType::Real => "a real",
            OptionType::String => "a string",
            OptionType::MaterialProperty => "a material property",
            OptionType::ArrayOfMaterialProperties => "an array of material properties",
            OptionType::ArrayOfIndices => "an array of indices",
            OptionType::DataMap => "a map",
            OptionType::DataStructure => "a data structure",
            OptionType::DataStructures => "a data structure or an array of data structures",
        };
        write!(f, "{}", s)
    }
}

fn is_material_property(value: &OptionValue) -> bool {
    matches!(
        value,
        OptionValue::Integer(..) | OptionValue::Real(..) | OptionValue::String(..)
    )
}

/// Describes an option accepted by a brick
#[derive(Clone, Debug)]
pub struct OptionDescription {
    /// Name of the option
    pub name: String,

    /// Human readable description
    pub description: String,

    /// Declared type
    pub option_type: OptionType,

    /// The option must always be given
    pub mandatory: bool,

    /// Options which must be given if this one is present
    pub requires: Vec<String>,

    /// Options which must not be given if this one is present
    pub incompatible: Vec<String>,
}

impl OptionDescription {
    /// Allocates a new instance
    pub fn new(name: &str, description: &str, option_type: OptionType) -> Self {
        OptionDescription {
            name: name.to_string(),
            description: description.to_string(),
            option_type,
            mandatory: false,
            requires: Vec::new(),
            incompatible: Vec::new(),
        }
    }

    /// Marks the option as mandatory
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Sets the options required by this one
    pub fn requires(mut self, names: &[&str]) -> Self {
        self.requires.extend(names.iter().map(|n| n.to_string()));
        self
    }

    /// Sets the options incompatible with this one
    pub fn incompatible_with(mut self, names: &[&str]) -> Self {
        self.incompatible.extend(names.iter().map(|n| n.to_string()));
        self
    }
}

/// Validates an option map against a schema
///
/// Fails if an option is not in the schema, if a value does not match its
/// declared type, if a mandatory option is absent, or if a required or
/// incompatible constraint is violated. Options are visited in key order, so
/// the reported error is reproducible.
pub fn check_options(brick: &str, options: &OptionMap, schema: &[OptionDescription]) -> Result<()> {
    for (key, value) in options {
        let description = match schema.iter().find(|d| &d.name == key) {
            Some(d) => d,
            None => {
                return Err(Error::UnknownOption {
                    brick: brick.to_string(),
                    option: key.clone(),
                })
            }
        };
        if !description.option_type.matches(value) {
            return Err(Error::InvalidOptionType {
                brick: brick.to_string(),
                option: key.clone(),
                expected: description.option_type.to_string(),
            });
        }
    }
    for description in schema {
        if description.mandatory && !options.contains_key(&description.name) {
            return Err(Error::MissingOption {
                brick: brick.to_string(),
                option: description.name.clone(),
            });
        }
    }
    for description in schema {
        if !options.contains_key(&description.name) {
            continue;
        }
        for required in &description.requires {
            if !options.contains_key(required) {
                return Err(Error::MissingRequiredOption {
                    brick: brick.to_string(),
                    option: description.name.clone(),
                    required: required.clone(),
                });
            }
        }
        for other in &description.incompatible {
            if options.contains_key(other) {
                return Err(Error::IncompatibleOptions {
                    brick: brick.to_string(),
                    option: description.name.clone(),
                    other: other.clone(),
                });
            }
        }
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
