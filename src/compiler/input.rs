use crate::base::{BehaviourType, Hypothesis, IntegrationScheme, OptionMap, OptionValue, Symmetry};
use crate::solver::NonLinearSolver;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Holds a top-level brick requested by the input
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BrickInput {
    /// Name of the brick in the brick registry
    pub name: String,

    /// Options of the brick (JSON object)
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl BrickInput {
    /// Converts the JSON options into an option map
    ///
    /// Objects with a `"$name"` key become named structures.
    pub fn option_map(&self) -> Result<OptionMap> {
        let mut map = OptionMap::new();
        for (key, value) in &self.options {
            let value = OptionValue::try_from(value.clone())
                .map_err(|e| Error::Input(format!("brick '{}', option '{}': {}", self.name, key, e)))?;
            map.insert(key.clone(), value);
        }
        Ok(map)
    }
}

fn default_behaviour_type() -> BehaviourType {
    BehaviourType::StandardStrainBasedBehaviour
}

fn default_integration_scheme() -> IntegrationScheme {
    IntegrationScheme::Implicit
}

fn default_symmetry() -> Symmetry {
    Symmetry::Isotropic
}

/// Holds the description of a behaviour to be compiled
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BehaviourInput {
    /// Name of the behaviour
    pub name: String,

    /// Type of behaviour
    #[serde(default = "default_behaviour_type")]
    pub behaviour_type: BehaviourType,

    /// Time integration scheme
    #[serde(default = "default_integration_scheme")]
    pub integration_scheme: IntegrationScheme,

    /// Elastic symmetry
    #[serde(default = "default_symmetry")]
    pub elastic_symmetry: Symmetry,

    /// Requested modelling hypotheses (all supported ones if None)
    #[serde(default)]
    pub hypotheses: Option<Vec<Hypothesis>>,

    /// Name of the non-linear solver (the configured one if None)
    #[serde(default)]
    pub solver: Option<String>,

    /// Overrides of parameter default values
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,

    /// Top-level bricks, in application order
    pub bricks: Vec<BrickInput>,
}

impl BehaviourInput {
    /// Parses a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Input(format!("cannot parse JSON: {}", e)))
    }

    /// Reads a JSON file
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(&path).map_err(|_| Error::Input(format!("cannot open file {:?}", path)))?;
        let buffered = BufReader::new(file);
        serde_json::from_reader(buffered).map_err(|e| Error::Input(format!("cannot parse JSON file: {}", e)))
    }

    /// Returns the non-linear solver selected by the input
    pub fn solver(&self) -> Result<Option<NonLinearSolver>> {
        match &self.solver {
            Some(name) => Ok(Some(name.parse()?)),
            None => Ok(None),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
