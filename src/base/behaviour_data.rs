use super::{Attributes, CodeBlock, CodeBlockMode, CodeBlockPosition, CodeFragment, Hypothesis, Slot};
use super::{LocalDataStructure, RegistrationStatus, Variable, VariableBounds, VariableKind};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Holds the default value of a parameter
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Real(f64),
    UnsignedInteger(usize),
}

impl ParameterValue {
    /// Returns the value as a real number
    pub fn as_f64(&self) -> f64 {
        match self {
            ParameterValue::Real(x) => *x,
            ParameterValue::UnsignedInteger(i) => *i as f64,
        }
    }
}

/// Holds the data of a behaviour for one modelling hypothesis
///
/// Variables are stored in declaration order; this order is significant for
/// integration variables since it defines the layout of the implicit system.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BehaviourData {
    /// All variables (with their kind) in declaration order
    variables: Vec<(VariableKind, Variable)>,

    /// Default values of parameters
    parameters: BTreeMap<String, ParameterValue>,

    /// Code blocks
    code_blocks: BTreeMap<Slot, CodeBlock>,

    /// Attributes
    attributes: Attributes,

    /// Local data structures
    local_data_structures: Vec<LocalDataStructure>,
}

impl BehaviourData {
    /// Allocates an empty instance
    pub fn new() -> Self {
        BehaviourData::default()
    }

    /// Declares a variable
    ///
    /// Names are unique across all kinds. Re-declaring an identical variable
    /// is a no-op if `status` is AlreadyRegistered.
    pub fn add_variable(&mut self, kind: VariableKind, variable: Variable, status: RegistrationStatus) -> Result<()> {
        if let Some((existing_kind, existing)) = self.find_variable(&variable.name) {
            if status == RegistrationStatus::AlreadyRegistered
                && existing_kind == kind
                && existing.same_declaration(&variable)
            {
                return Ok(());
            }
            return Err(Error::variable_redeclared(&variable.name, existing_kind.to_string()));
        }
        if self.local_data_structures.iter().any(|s| s.name == variable.name) {
            return Err(Error::variable_redeclared(&variable.name, "a local data structure"));
        }
        if let Some(external_name) = &variable.external_name {
            if let Some((k, _)) = self
                .variables
                .iter()
                .find(|(_, v)| v.external_name.as_deref() == Some(external_name.as_str()))
            {
                return Err(Error::variable_redeclared(external_name, k.to_string()));
            }
        }
        self.variables.push((kind, variable));
        Ok(())
    }

    /// Returns a variable and its kind
    pub fn find_variable(&self, name: &str) -> Option<(VariableKind, &Variable)> {
        self.variables
            .iter()
            .find(|(_, v)| v.name == name)
            .map(|(k, v)| (*k, v))
    }

    /// Indicates whether a name is used by a variable or a local data structure
    pub fn is_name_used(&self, name: &str) -> bool {
        self.find_variable(name).is_some() || self.local_data_structures.iter().any(|s| s.name == name)
    }

    /// Returns the variables of a given kind in declaration order
    pub fn variables(&self, kind: VariableKind) -> Vec<&Variable> {
        self.variables
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, v)| v)
            .collect()
    }

    /// Returns all variables with their kind in declaration order
    pub fn all_variables(&self) -> &[(VariableKind, Variable)] {
        &self.variables
    }

    /// Returns the unknowns of the implicit system in declaration order
    pub fn integration_variables(&self) -> Vec<&Variable> {
        self.variables
            .iter()
            .filter(|(k, _)| k.is_integration_variable())
            .map(|(_, v)| v)
            .collect()
    }

    /// Returns the position of an unknown of the implicit system
    pub fn integration_variable_position(&self, name: &str) -> Option<usize> {
        self.integration_variables().iter().position(|v| v.name == name)
    }

    /// Returns the offset of an unknown in the vector of unknowns (and in the jacobian)
    pub fn integration_variable_offset(&self, name: &str, hypothesis: Hypothesis) -> Result<usize> {
        let mut offset = 0;
        for variable in self.integration_variables() {
            if variable.name == name {
                return Ok(offset);
            }
            offset += variable.size(hypothesis).ok_or_else(|| {
                Error::Numerical(format!(
                    "the size of integration variable '{}' is undefined for hypothesis '{}'",
                    variable.name, hypothesis
                ))
            })?;
        }
        Err(Error::UnknownVariable(name.to_string()))
    }

    /// Sets the physical bounds of a variable
    pub fn set_bounds(&mut self, name: &str, bounds: VariableBounds) -> Result<()> {
        match self.variables.iter_mut().find(|(_, v)| v.name == name) {
            Some((_, v)) => {
                v.bounds = Some(bounds);
                Ok(())
            }
            None => Err(Error::UnknownVariable(name.to_string())),
        }
    }

    /// Declares a parameter with its default value
    pub fn add_parameter(&mut self, variable: Variable, value: ParameterValue, status: RegistrationStatus) -> Result<()> {
        let name = variable.name.clone();
        self.add_variable(VariableKind::Parameter, variable, status)?;
        self.parameters.insert(name, value);
        Ok(())
    }

    /// Changes the default value of a declared parameter
    pub fn set_parameter_default(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        match self.parameters.get_mut(name) {
            Some(v) => {
                *v = value;
                Ok(())
            }
            None => Err(Error::unknown_parameter(name)),
        }
    }

    /// Returns the default value of a parameter
    pub fn parameter_default(&self, name: &str) -> Option<ParameterValue> {
        self.parameters.get(name).copied()
    }

    /// Returns all parameters with their default values (sorted by name)
    pub fn parameters(&self) -> &BTreeMap<String, ParameterValue> {
        &self.parameters
    }

    /// Inserts a code fragment in a slot
    pub fn set_code(
        &mut self,
        hypothesis: Hypothesis,
        slot: Slot,
        fragment: CodeFragment,
        mode: CodeBlockMode,
        position: CodeBlockPosition,
    ) -> Result<()> {
        let block = self.code_blocks.entry(slot).or_default();
        match mode {
            CodeBlockMode::Create => {
                if !block.is_empty() {
                    return Err(Error::CodeBlockExists {
                        slot: slot.to_string(),
                        hypothesis: hypothesis.to_string(),
                    });
                }
                block.insert(fragment, CodeBlockPosition::AtEnd);
            }
            CodeBlockMode::CreateOrReplace => {
                block.clear();
                block.insert(fragment, CodeBlockPosition::AtEnd);
            }
            CodeBlockMode::CreateOrAppend => block.insert(fragment, position),
        }
        Ok(())
    }

    /// Returns the code block of a slot
    pub fn code(&self, slot: Slot) -> Option<&CodeBlock> {
        self.code_blocks.get(&slot).filter(|b| !b.is_empty())
    }

    /// Returns the attributes
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the attributes (mutable)
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Declares a local data structure
    pub fn add_local_data_structure(&mut self, structure: LocalDataStructure, status: RegistrationStatus) -> Result<()> {
        if let Some(existing) = self.local_data_structures.iter().find(|s| s.name == structure.name) {
            if status == RegistrationStatus::AlreadyRegistered && existing == &structure {
                return Ok(());
            }
            return Err(Error::variable_redeclared(&structure.name, "a local data structure"));
        }
        if let Some((kind, _)) = self.find_variable(&structure.name) {
            return Err(Error::variable_redeclared(&structure.name, kind.to_string()));
        }
        self.local_data_structures.push(structure);
        Ok(())
    }

    /// Returns the local data structures in declaration order
    pub fn local_data_structures(&self) -> &[LocalDataStructure] {
        &self.local_data_structures
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
