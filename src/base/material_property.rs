use super::{BehaviourDescription, Hypothesis, OptionMap, OptionValue, ParameterValue, RegistrationStatus};
use super::{Slot, Variable, VariableKind};
use crate::{Error, Result};

/// Holds the value given to an option of type material property
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialProperty {
    /// A literal value known at compile time
    Constant(f64),

    /// An expression evaluated by the generated code
    Formula(String),
}

impl MaterialProperty {
    /// Converts an option value
    pub fn from_option(brick: &str, option: &str, value: &OptionValue) -> Result<Self> {
        if let Some(x) = value.as_real() {
            return Ok(MaterialProperty::Constant(x));
        }
        match value.as_str() {
            Some(s) if !s.trim().is_empty() => Ok(MaterialProperty::Formula(s.to_string())),
            _ => Err(Error::InvalidOptionType {
                brick: brick.to_string(),
                option: option.to_string(),
                expected: "a material property".to_string(),
            }),
        }
    }

    /// Extracts an optional material property from an option map
    pub fn extract(brick: &str, options: &OptionMap, option: &str) -> Result<Option<Self>> {
        match options.get(option) {
            Some(value) => Ok(Some(MaterialProperty::from_option(brick, option, value)?)),
            None => Ok(None),
        }
    }

    /// Extracts a mandatory material property from an option map
    pub fn extract_mandatory(brick: &str, options: &OptionMap, option: &str) -> Result<Self> {
        match options.get(option) {
            Some(value) => MaterialProperty::from_option(brick, option, value),
            None => Err(Error::MissingOption {
                brick: brick.to_string(),
                option: option.to_string(),
            }),
        }
    }

    /// Returns the value if known at compile time
    pub fn constant_value(&self) -> Option<f64> {
        match self {
            MaterialProperty::Constant(x) => Some(*x),
            MaterialProperty::Formula(_) => None,
        }
    }
}

/// Declares the variable holding a material property
///
/// * absent: a material property of the behaviour (given by the calling solver)
/// * constant: a parameter whose default value is the constant
/// * formula: a local variable evaluated before the local variables are initialized
pub fn declare_material_property(
    bd: &mut BehaviourDescription,
    brick: &str,
    name: &str,
    external_name: &str,
    value: Option<&MaterialProperty>,
) -> Result<()> {
    let h = Hypothesis::Undefined;
    let variable = Variable::scalar(name).with_external_name(external_name);
    match value {
        None => bd.add_variable(h, VariableKind::MaterialProperty, variable, RegistrationStatus::Unregistered),
        Some(MaterialProperty::Constant(x)) => bd.add_parameter(h, variable, ParameterValue::Real(*x)),
        Some(MaterialProperty::Formula(formula)) => {
            bd.add_local_variable(h, Variable::scalar(name))?;
            bd.append_code(
                h,
                Slot::BeforeInitializeLocalVariables,
                brick,
                &format!("this->{} = {};", name, formula),
            )
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
