//! Defines the errors raised while assembling a behaviour

use thiserror::Error;

/// Defines a result type alias using the crate's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Holds all errors that abort the compilation of a behaviour
///
/// The variants follow three groups: configuration errors (raised while
/// initializing bricks or completing the variable declaration), ordering and
/// invariant errors (raised while ending the treatment), and numerical-loop
/// errors (raised by the staggered porosity scheme).
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Error {
    /// An option is not declared in the brick's schema
    #[error("{brick}: unknown option '{option}'")]
    UnknownOption { brick: String, option: String },

    /// An option value does not match its declared type
    #[error("{brick}: option '{option}' must be {expected}")]
    InvalidOptionType {
        brick: String,
        option: String,
        expected: String,
    },

    /// A mandatory option has not been given
    #[error("{brick}: option '{option}' is mandatory")]
    MissingOption { brick: String, option: String },

    /// An option requires another one which has not been given
    #[error("{brick}: option '{option}' requires option '{required}'")]
    MissingRequiredOption {
        brick: String,
        option: String,
        required: String,
    },

    /// Two options cannot be used together
    #[error("{brick}: option '{option}' is incompatible with option '{other}'")]
    IncompatibleOptions {
        brick: String,
        option: String,
        other: String,
    },

    /// A registry has no entry with the requested name
    #[error("unknown {family} '{name}' (requested by '{entry}')")]
    UnknownName {
        family: String,
        name: String,
        entry: String,
    },

    /// A registry already holds an entry with the given name
    #[error("{family} '{name}' is already registered")]
    DuplicateName { family: String, name: String },

    /// A brick does not support one of the requested modelling hypotheses
    #[error("{brick}: modelling hypothesis '{hypothesis}' is not supported")]
    UnsupportedHypothesis { brick: String, hypothesis: String },

    /// A brick cannot handle the behaviour's configuration
    #[error("{brick}: {message}")]
    UnsupportedConfiguration { brick: String, message: String },

    /// The compiler configuration is inconsistent
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A variable name is already used by a different declaration
    #[error("{}variable '{name}' is already declared as {kind}", brick_prefix(.brick))]
    VariableRedeclared {
        brick: Option<String>,
        name: String,
        kind: String,
    },

    /// A name has been reserved by another brick
    #[error("{}name '{name}' is reserved", brick_prefix(.brick))]
    NameReserved { brick: Option<String>, name: String },

    /// A variable has not been declared
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// A parameter has not been declared
    #[error("{}unknown parameter '{name}'", brick_prefix(.brick))]
    UnknownParameter { brick: Option<String>, name: String },

    /// A code block already has some content
    #[error("code block '{slot}' is already defined for hypothesis '{hypothesis}'")]
    CodeBlockExists { slot: String, hypothesis: String },

    /// An attribute is already defined
    #[error("attribute '{0}' is already defined")]
    AttributeExists(String),

    /// A brick required by another one is absent or declared in the wrong order
    #[error("{brick}: {message}")]
    Ordering { brick: String, message: String },

    /// A variable is not at the position required by the generated code
    #[error("{brick}: variable '{variable}' must be integration variable #{expected} (found {found})")]
    MisplacedVariable {
        brick: String,
        variable: String,
        expected: usize,
        found: String,
    },

    /// A brick has been driven through an invalid lifecycle transition
    #[error("{brick}: invalid lifecycle transition from {from} to {to}")]
    Lifecycle { brick: String, from: String, to: String },

    /// The staggered porosity scheme did not converge
    #[error("staggered scheme: maximum number of iterations ({iterations}) exceeded")]
    MaximumIterationsExceeded { iterations: usize },

    /// A value cannot be evaluated numerically
    #[error("{0}")]
    Numerical(String),

    /// The input document cannot be read or parsed
    #[error("invalid input: {0}")]
    Input(String),
}

impl Error {
    /// Returns an UnsupportedConfiguration error
    pub fn unsupported(brick: &str, message: impl Into<String>) -> Self {
        Error::UnsupportedConfiguration {
            brick: brick.to_string(),
            message: message.into(),
        }
    }

    /// Returns an Ordering error
    pub fn ordering(brick: &str, message: impl Into<String>) -> Self {
        Error::Ordering {
            brick: brick.to_string(),
            message: message.into(),
        }
    }

    /// Returns a VariableRedeclared error not yet attributed to a brick
    pub fn variable_redeclared(name: &str, kind: impl Into<String>) -> Self {
        Error::VariableRedeclared {
            brick: None,
            name: name.to_string(),
            kind: kind.into(),
        }
    }

    /// Returns a NameReserved error not yet attributed to a brick
    pub fn name_reserved(name: &str) -> Self {
        Error::NameReserved {
            brick: None,
            name: name.to_string(),
        }
    }

    /// Returns an UnknownParameter error not yet attributed to a brick
    pub fn unknown_parameter(name: &str) -> Self {
        Error::UnknownParameter {
            brick: None,
            name: name.to_string(),
        }
    }

    /// Attributes an error raised by the behaviour description to a brick
    ///
    /// The innermost brick wins: an error already naming a brick is returned unchanged.
    pub fn in_brick(self, name: &str) -> Self {
        match self {
            Error::VariableRedeclared { brick: None, name: v, kind } => Error::VariableRedeclared {
                brick: Some(name.to_string()),
                name: v,
                kind,
            },
            Error::NameReserved { brick: None, name: v } => Error::NameReserved {
                brick: Some(name.to_string()),
                name: v,
            },
            Error::UnknownParameter { brick: None, name: v } => Error::UnknownParameter {
                brick: Some(name.to_string()),
                name: v,
            },
            other => other,
        }
    }
}

fn brick_prefix(brick: &Option<String>) -> String {
    match brick {
        Some(name) => format!("{}: ", name),
        None => String::new(),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn display_works() {
        let e = Error::UnknownOption {
            brick: "Norton".to_string(),
            option: "k".to_string(),
        };
        assert_eq!(format!("{}", e), "Norton: unknown option 'k'");

        let e = Error::UnknownName {
            family: "inelastic flow".to_string(),
            name: "Nortn".to_string(),
            entry: "inelastic_flow".to_string(),
        };
        assert_eq!(
            format!("{}", e),
            "unknown inelastic flow 'Nortn' (requested by 'inelastic_flow')"
        );

        let e = Error::MisplacedVariable {
            brick: "IsotropicDamageHooke".to_string(),
            variable: "d".to_string(),
            expected: 1,
            found: "2".to_string(),
        };
        assert_eq!(
            format!("{}", e),
            "IsotropicDamageHooke: variable 'd' must be integration variable #1 (found 2)"
        );

        let e = Error::MaximumIterationsExceeded { iterations: 5 };
        assert_eq!(
            format!("{}", e),
            "staggered scheme: maximum number of iterations (5) exceeded"
        );
    }

    #[test]
    fn helpers_work() {
        assert_eq!(
            Error::unsupported("Hooke", "orthotropic elasticity requires an orthotropic behaviour"),
            Error::UnsupportedConfiguration {
                brick: "Hooke".to_string(),
                message: "orthotropic elasticity requires an orthotropic behaviour".to_string(),
            }
        );
        assert_eq!(
            format!("{}", Error::ordering("StandardElastoViscoPlasticity", "no inelastic flow declared")),
            "StandardElastoViscoPlasticity: no inelastic flow declared"
        );
    }

    #[test]
    fn in_brick_works() {
        let e = Error::variable_redeclared("eel", "a state variable");
        assert_eq!(format!("{}", e), "variable 'eel' is already declared as a state variable");
        let e = e.in_brick("Hooke");
        assert_eq!(
            e,
            Error::VariableRedeclared {
                brick: Some("Hooke".to_string()),
                name: "eel".to_string(),
                kind: "a state variable".to_string(),
            }
        );
        assert_eq!(
            format!("{}", e.in_brick("StandardElastoViscoPlasticity")),
            "Hooke: variable 'eel' is already declared as a state variable"
        );

        let e = Error::name_reserved("computeElasticPrediction").in_brick("Norton");
        assert_eq!(format!("{}", e), "Norton: name 'computeElasticPrediction' is reserved");

        let e = Error::unknown_parameter("theta");
        assert_eq!(format!("{}", e), "unknown parameter 'theta'");
        assert_eq!(
            format!("{}", e.in_brick("Plastic")),
            "Plastic: unknown parameter 'theta'"
        );

        let e = Error::ordering("Hooke", "no stress potential").in_brick("Norton");
        assert_eq!(format!("{}", e), "Hooke: no stress potential");
    }
}
