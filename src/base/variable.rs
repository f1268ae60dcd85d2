use super::Hypothesis;
use serde::Serialize;
use std::fmt;

/// Defines the semantic type of a variable
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum VariableType {
    Scalar,
    Vector,
    Stensor,
    Tensor,
    Boolean,
    UnsignedInteger,

    /// A named composite (e.g. a local data structure)
    Composite(String),
}

impl VariableType {
    /// Returns the number of scalar components for a hypothesis
    ///
    /// Returns None for the wildcard, booleans, integers and composites.
    pub fn size(&self, hypothesis: Hypothesis) -> Option<usize> {
        match self {
            VariableType::Scalar => Some(1),
            VariableType::Vector => hypothesis.space_dimension(),
            VariableType::Stensor => hypothesis.stensor_size(),
            VariableType::Tensor => hypothesis.tensor_size(),
            _ => None,
        }
    }

    /// Returns the name used in the generated code
    pub fn code_name(&self) -> String {
        match self {
            VariableType::Scalar => "real".to_string(),
            VariableType::Vector => "TVector".to_string(),
            VariableType::Stensor => "Stensor".to_string(),
            VariableType::Tensor => "Tensor".to_string(),
            VariableType::Boolean => "bool".to_string(),
            VariableType::UnsignedInteger => "unsigned short".to_string(),
            VariableType::Composite(name) => name.clone(),
        }
    }
}

/// Defines the kind of a variable
///
/// Integration variables are the unknowns of the implicit system; state
/// variables are integration variables which are also stored between time
/// steps.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize)]
pub enum VariableKind {
    MaterialProperty,
    Parameter,
    StateVariable,
    AuxiliaryStateVariable,
    IntegrationVariable,
    ExternalStateVariable,
    LocalVariable,
}

impl VariableKind {
    /// Holds all kinds in declaration-report order
    pub const ALL: [VariableKind; 7] = [
        VariableKind::MaterialProperty,
        VariableKind::Parameter,
        VariableKind::StateVariable,
        VariableKind::AuxiliaryStateVariable,
        VariableKind::IntegrationVariable,
        VariableKind::ExternalStateVariable,
        VariableKind::LocalVariable,
    ];

    /// Indicates an unknown of the implicit system
    pub fn is_integration_variable(&self) -> bool {
        matches!(self, VariableKind::StateVariable | VariableKind::IntegrationVariable)
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VariableKind::MaterialProperty => "a material property",
            VariableKind::Parameter => "a parameter",
            VariableKind::StateVariable => "a state variable",
            VariableKind::AuxiliaryStateVariable => "an auxiliary state variable",
            VariableKind::IntegrationVariable => "an integration variable",
            VariableKind::ExternalStateVariable => "an external state variable",
            VariableKind::LocalVariable => "a local variable",
        };
        write!(f, "{}", s)
    }
}

/// Defines how a variable declaration treats an existing declaration
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RegistrationStatus {
    /// The name must not be used yet
    Unregistered,

    /// The same declaration may already exist (the call is then a no-op)
    AlreadyRegistered,
}

/// Holds the physical bounds of a variable
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VariableBounds {
    /// Lower bound
    pub lower: Option<f64>,

    /// Upper bound
    pub upper: Option<f64>,
}

impl VariableBounds {
    /// Returns bounds within [lower, upper]
    pub fn between(lower: f64, upper: f64) -> Self {
        VariableBounds {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Returns a lower bound only
    pub fn lower(lower: f64) -> Self {
        VariableBounds {
            lower: Some(lower),
            upper: None,
        }
    }
}

/// Holds a variable of the behaviour
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Variable {
    /// Semantic type
    pub variable_type: VariableType,

    /// Name in the generated code
    pub name: String,

    /// Glossary or entry name used for cross-referencing
    pub external_name: Option<String>,

    /// Array size (1 for plain variables)
    pub array_size: usize,

    /// Physical bounds
    pub bounds: Option<VariableBounds>,
}

impl Variable {
    /// Allocates a new instance
    pub fn new(variable_type: VariableType, name: &str) -> Self {
        Variable {
            variable_type,
            name: name.to_string(),
            external_name: None,
            array_size: 1,
            bounds: None,
        }
    }

    /// Allocates a scalar variable
    pub fn scalar(name: &str) -> Self {
        Variable::new(VariableType::Scalar, name)
    }

    /// Allocates a symmetric tensor variable
    pub fn stensor(name: &str) -> Self {
        Variable::new(VariableType::Stensor, name)
    }

    /// Sets the external (glossary or entry) name
    pub fn with_external_name(mut self, external_name: &str) -> Self {
        self.external_name = Some(external_name.to_string());
        self
    }

    /// Sets the array size
    pub fn with_array_size(mut self, array_size: usize) -> Self {
        self.array_size = array_size;
        self
    }

    /// Returns the external name, or the name if no external name is set
    pub fn external_name(&self) -> &str {
        match &self.external_name {
            Some(n) => n.as_str(),
            None => self.name.as_str(),
        }
    }

    /// Returns the number of scalar components for a hypothesis
    pub fn size(&self, hypothesis: Hypothesis) -> Option<usize> {
        self.variable_type.size(hypothesis).map(|s| s * self.array_size)
    }

    /// Indicates whether two declarations are identical (bounds excepted)
    pub fn same_declaration(&self, other: &Variable) -> bool {
        self.variable_type == other.variable_type
            && self.name == other.name
            && self.array_size == other.array_size
            && (self.external_name.is_none() || other.external_name.is_none() || self.external_name == other.external_name)
    }
}

/// Holds a named bag of local variables materialized once per hypothesis
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocalDataStructure {
    /// Name of the instance in the generated code
    pub name: String,

    /// Members of the structure
    pub members: Vec<Variable>,
}

impl LocalDataStructure {
    /// Allocates a new instance
    pub fn new(name: &str) -> Self {
        LocalDataStructure {
            name: name.to_string(),
            members: Vec::new(),
        }
    }

    /// Adds a member
    pub fn with_member(mut self, variable_type: VariableType, name: &str) -> Self {
        self.members.push(Variable::new(variable_type, name));
        self
    }

    /// Returns the name of the composite type
    pub fn type_name(&self) -> String {
        format!("{}_type", self.name)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
