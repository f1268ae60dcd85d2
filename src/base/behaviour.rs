use super::{AttributeValue, BehaviourData, CodeBlockMode, CodeBlockPosition, CodeFragment, FromAttribute};
use super::{Hypothesis, HypothesisMap, LocalDataStructure, ParameterValue, RegistrationStatus, Slot};
use super::{Variable, VariableBounds, VariableKind};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Defines the type of behaviour
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum BehaviourType {
    /// Small strain behaviour: strain in, stress out
    StandardStrainBasedBehaviour,

    /// Finite strain behaviour: deformation gradient in, stress out
    StandardFiniteStrainBehaviour,

    /// Cohesive zone model: opening displacement in, traction out
    CohesiveZoneModel,

    /// Any other behaviour
    GeneralBehaviour,
}

/// Defines the time integration scheme
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum IntegrationScheme {
    Implicit,
    Explicit,
    Specific,
}

/// Defines the material (or elastic) symmetry
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum Symmetry {
    Isotropic,
    Orthotropic,
}

impl fmt::Display for Symmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symmetry::Isotropic => write!(f, "isotropic"),
            Symmetry::Orthotropic => write!(f, "orthotropic"),
        }
    }
}

/// Holds the behaviour under construction
///
/// Every per-hypothesis datum (variables, code blocks, attributes) lives in a
/// [BehaviourData] stored in a [HypothesisMap]. Mutations with
/// [Hypothesis::Undefined] apply to the wildcard data and to every
/// specialization; mutations with a specific hypothesis specialize it first.
/// Mutations are all-or-nothing.
#[derive(Clone, Debug)]
pub struct BehaviourDescription {
    /// Name of the behaviour
    pub name: String,

    /// Type of behaviour
    pub behaviour_type: BehaviourType,

    /// Time integration scheme
    pub integration_scheme: IntegrationScheme,

    /// Material symmetry
    pub symmetry: Symmetry,

    /// Elastic symmetry
    pub elastic_symmetry: Symmetry,

    /// Modelling hypotheses (None until requested or restricted by a brick)
    hypotheses: Option<BTreeSet<Hypothesis>>,

    /// The hypotheses have been requested by the user
    user_defined_hypotheses: bool,

    /// Per-hypothesis data
    data: HypothesisMap<BehaviourData>,

    /// Names which cannot be used by variables
    reserved_names: BTreeSet<String>,
}

impl BehaviourDescription {
    /// Allocates a new instance
    pub fn new(name: &str, behaviour_type: BehaviourType, integration_scheme: IntegrationScheme) -> Self {
        BehaviourDescription {
            name: name.to_string(),
            behaviour_type,
            integration_scheme,
            symmetry: Symmetry::Isotropic,
            elastic_symmetry: Symmetry::Isotropic,
            hypotheses: None,
            user_defined_hypotheses: false,
            data: HypothesisMap::with_default(BehaviourData::new()),
            reserved_names: BTreeSet::new(),
        }
    }

    /// Sets the modelling hypotheses requested by the user
    pub fn set_requested_hypotheses(&mut self, hypotheses: &[Hypothesis]) -> Result<()> {
        if hypotheses.is_empty() {
            return Err(Error::InvalidConfig("the list of modelling hypotheses is empty".to_string()));
        }
        if hypotheses.contains(&Hypothesis::Undefined) {
            return Err(Error::InvalidConfig(
                "the wildcard hypothesis cannot be requested".to_string(),
            ));
        }
        self.hypotheses = Some(hypotheses.iter().copied().collect());
        self.user_defined_hypotheses = true;
        Ok(())
    }

    /// Restricts the modelling hypotheses to those supported by a brick
    ///
    /// Hypotheses requested by the user must all be supported, otherwise the
    /// brick cannot be used. Hypotheses set by other bricks are intersected.
    pub fn restrict_hypotheses(&mut self, brick: &str, supported: &[Hypothesis]) -> Result<()> {
        let supported: BTreeSet<_> = supported.iter().copied().collect();
        let restricted = match &self.hypotheses {
            Some(current) => {
                if self.user_defined_hypotheses {
                    if let Some(h) = current.iter().find(|h| !supported.contains(h)) {
                        return Err(Error::UnsupportedHypothesis {
                            brick: brick.to_string(),
                            hypothesis: h.to_string(),
                        });
                    }
                    current.clone()
                } else {
                    current.intersection(&supported).copied().collect()
                }
            }
            None => supported,
        };
        if restricted.is_empty() {
            return Err(Error::unsupported(brick, "no modelling hypothesis is left"));
        }
        self.hypotheses = Some(restricted);
        Ok(())
    }

    /// Returns the modelling hypotheses (all of them if none has been set yet)
    pub fn hypotheses(&self) -> Vec<Hypothesis> {
        match &self.hypotheses {
            Some(set) => set.iter().copied().collect(),
            None => Hypothesis::ALL.to_vec(),
        }
    }

    /// Indicates whether a hypothesis is handled by the behaviour
    pub fn is_hypothesis_handled(&self, hypothesis: Hypothesis) -> bool {
        match &self.hypotheses {
            Some(set) => set.contains(&hypothesis),
            None => true,
        }
    }

    /// Returns the data for a hypothesis (falling back to the wildcard data)
    pub fn data(&self, hypothesis: Hypothesis) -> Option<&BehaviourData> {
        self.data.get(hypothesis)
    }

    /// Returns the hypotheses with specialized data
    pub fn specialized_hypotheses(&self) -> Vec<Hypothesis> {
        self.data.specialized_hypotheses()
    }

    /// Reserves a name
    pub fn reserve_name(&mut self, name: &str) -> Result<()> {
        if !self.reserved_names.insert(name.to_string()) {
            return Err(Error::name_reserved(name));
        }
        Ok(())
    }

    /// Indicates whether a name is reserved
    pub fn is_name_reserved(&self, name: &str) -> bool {
        self.reserved_names.contains(name)
    }

    /// Declares a variable
    pub fn add_variable(
        &mut self,
        hypothesis: Hypothesis,
        kind: VariableKind,
        variable: Variable,
        status: RegistrationStatus,
    ) -> Result<()> {
        if self.reserved_names.contains(&variable.name) {
            return Err(Error::name_reserved(&variable.name));
        }
        self.data
            .try_update(hypothesis, |d| d.add_variable(kind, variable.clone(), status))
    }

    /// Declares a state variable (unknown of the implicit system stored between steps)
    pub fn add_state_variable(&mut self, hypothesis: Hypothesis, variable: Variable) -> Result<()> {
        self.add_variable(
            hypothesis,
            VariableKind::StateVariable,
            variable,
            RegistrationStatus::Unregistered,
        )
    }

    /// Declares a local variable
    ///
    /// Local variables may be requested by several bricks, hence re-declaring
    /// the same local variable is allowed.
    pub fn add_local_variable(&mut self, hypothesis: Hypothesis, variable: Variable) -> Result<()> {
        self.add_variable(
            hypothesis,
            VariableKind::LocalVariable,
            variable,
            RegistrationStatus::AlreadyRegistered,
        )
    }

    /// Declares a parameter with its default value
    pub fn add_parameter(&mut self, hypothesis: Hypothesis, variable: Variable, value: ParameterValue) -> Result<()> {
        if self.reserved_names.contains(&variable.name) {
            return Err(Error::name_reserved(&variable.name));
        }
        self.data.try_update(hypothesis, |d| {
            d.add_parameter(variable.clone(), value, RegistrationStatus::Unregistered)
        })
    }

    /// Overrides the default value of a parameter for all hypotheses
    pub fn set_parameter_default(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        let mut found = false;
        self.data.try_update(Hypothesis::Undefined, |d| {
            if d.parameter_default(name).is_some() {
                found = true;
                d.set_parameter_default(name, value)?;
            }
            Ok(())
        })?;
        if !found {
            return Err(Error::unknown_parameter(name));
        }
        Ok(())
    }

    /// Returns the default value of a parameter
    pub fn parameter_default(&self, hypothesis: Hypothesis, name: &str) -> Option<ParameterValue> {
        self.data(hypothesis).and_then(|d| d.parameter_default(name))
    }

    /// Returns a variable and its kind
    pub fn find_variable(&self, hypothesis: Hypothesis, name: &str) -> Option<(VariableKind, Variable)> {
        self.data(hypothesis)
            .and_then(|d| d.find_variable(name))
            .map(|(k, v)| (k, v.clone()))
    }

    /// Indicates whether a name is used by a variable for a hypothesis
    pub fn is_name_used(&self, hypothesis: Hypothesis, name: &str) -> bool {
        self.data(hypothesis).map(|d| d.is_name_used(name)).unwrap_or(false)
    }

    /// Sets the physical bounds of a variable
    pub fn set_bounds(&mut self, hypothesis: Hypothesis, name: &str, bounds: VariableBounds) -> Result<()> {
        self.data.try_update(hypothesis, |d| d.set_bounds(name, bounds))
    }

    /// Returns the position of an unknown of the implicit system
    pub fn integration_variable_position(&self, hypothesis: Hypothesis, name: &str) -> Option<usize> {
        self.data(hypothesis)
            .and_then(|d| d.integration_variable_position(name))
    }

    /// Checks that an unknown is at the given position of the implicit system
    pub fn check_integration_variable_position(
        &self,
        brick: &str,
        hypothesis: Hypothesis,
        name: &str,
        expected: usize,
    ) -> Result<()> {
        match self.integration_variable_position(hypothesis, name) {
            Some(p) if p == expected => Ok(()),
            Some(p) => Err(Error::MisplacedVariable {
                brick: brick.to_string(),
                variable: name.to_string(),
                expected,
                found: p.to_string(),
            }),
            None => Err(Error::MisplacedVariable {
                brick: brick.to_string(),
                variable: name.to_string(),
                expected,
                found: "none".to_string(),
            }),
        }
    }

    /// Returns the offset of an unknown in the vector of unknowns
    pub fn integration_variable_offset(&self, hypothesis: Hypothesis, name: &str) -> Result<usize> {
        match self.data(hypothesis) {
            Some(d) => d.integration_variable_offset(name, hypothesis),
            None => Err(Error::UnknownVariable(name.to_string())),
        }
    }

    /// Inserts a code fragment in a slot
    pub fn set_code(
        &mut self,
        hypothesis: Hypothesis,
        slot: Slot,
        origin: &str,
        text: &str,
        mode: CodeBlockMode,
        position: CodeBlockPosition,
    ) -> Result<()> {
        let fragment = CodeFragment {
            origin: origin.to_string(),
            text: text.to_string(),
        };
        self.data
            .try_update(hypothesis, |d| d.set_code(hypothesis, slot, fragment.clone(), mode, position))
    }

    /// Appends a code fragment at the end of a slot
    pub fn append_code(&mut self, hypothesis: Hypothesis, slot: Slot, origin: &str, text: &str) -> Result<()> {
        self.set_code(
            hypothesis,
            slot,
            origin,
            text,
            CodeBlockMode::CreateOrAppend,
            CodeBlockPosition::AtEnd,
        )
    }

    /// Returns the rendered content of a slot
    pub fn code(&self, hypothesis: Hypothesis, slot: Slot) -> Option<String> {
        self.data(hypothesis)
            .and_then(|d| d.code(slot))
            .map(|b| b.render())
    }

    /// Returns the rendered content of all non-empty slots
    pub fn render(&self, hypothesis: Hypothesis) -> BTreeMap<Slot, String> {
        let mut slots = BTreeMap::new();
        for slot in Slot::ALL {
            if let Some(code) = self.code(hypothesis, slot) {
                slots.insert(slot, code);
            }
        }
        slots
    }

    /// Sets an attribute
    pub fn set_attribute(
        &mut self,
        hypothesis: Hypothesis,
        key: &str,
        value: AttributeValue,
        allow_override: bool,
    ) -> Result<()> {
        self.data.try_update(hypothesis, |d| {
            d.attributes_mut().set(key, value.clone(), allow_override)
        })
    }

    /// Returns an attribute
    pub fn attribute<T: FromAttribute>(&self, hypothesis: Hypothesis, key: &str) -> Option<T> {
        self.data(hypothesis).and_then(|d| d.attributes().get::<T>(key))
    }

    /// Returns a boolean attribute, or false if absent
    pub fn flag(&self, hypothesis: Hypothesis, key: &str) -> bool {
        self.attribute::<bool>(hypothesis, key).unwrap_or(false)
    }

    /// Declares a local data structure
    pub fn add_local_data_structure(
        &mut self,
        hypothesis: Hypothesis,
        structure: LocalDataStructure,
        status: RegistrationStatus,
    ) -> Result<()> {
        if self.reserved_names.contains(&structure.name) {
            return Err(Error::name_reserved(&structure.name));
        }
        self.data
            .try_update(hypothesis, |d| d.add_local_data_structure(structure.clone(), status))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
