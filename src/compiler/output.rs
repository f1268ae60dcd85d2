use crate::base::{AttributeValue, BehaviourDescription, BehaviourType, Hypothesis, IntegrationScheme};
use crate::base::{LocalDataStructure, ParameterValue, Slot, Symmetry, Variable, VariableKind};
use crate::solver::NonLinearSolver;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File};
use std::path::Path;

/// Holds a declared variable and its kind
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeclaredVariable {
    /// Kind of the variable
    pub kind: VariableKind,

    /// The variable
    #[serde(flatten)]
    pub variable: Variable,
}

/// Holds the compiled behaviour for one modelling hypothesis
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HypothesisOutput {
    /// The modelling hypothesis
    pub hypothesis: Hypothesis,

    /// Unknowns of the implicit system (in order)
    pub integration_variables: Vec<String>,

    /// All variables in declaration order
    pub variables: Vec<DeclaredVariable>,

    /// Parameters and their default values
    pub parameters: BTreeMap<String, ParameterValue>,

    /// Attributes
    pub attributes: BTreeMap<String, AttributeValue>,

    /// Local data structures
    pub local_data_structures: Vec<LocalDataStructure>,

    /// Rendered code, by slot (in execution order)
    pub code: Vec<(Slot, String)>,
}

/// Holds the result of a compilation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeneratedBehaviour {
    /// Name of the behaviour
    pub name: String,

    /// Type of behaviour
    pub behaviour_type: BehaviourType,

    /// Time integration scheme
    pub integration_scheme: IntegrationScheme,

    /// Elastic symmetry
    pub elastic_symmetry: Symmetry,

    /// Non-linear solver
    pub solver: NonLinearSolver,

    /// One entry per modelling hypothesis (in increasing order)
    pub hypotheses: Vec<HypothesisOutput>,
}

impl GeneratedBehaviour {
    /// Collects the compiled data of a behaviour description
    pub fn new(bd: &BehaviourDescription, solver: NonLinearSolver) -> Result<Self> {
        let mut hypotheses = Vec::new();
        for h in bd.hypotheses() {
            let data = bd
                .data(h)
                .ok_or_else(|| Error::InvalidConfig(format!("no data for hypothesis {}", h)))?;
            hypotheses.push(HypothesisOutput {
                hypothesis: h,
                integration_variables: data.integration_variables().iter().map(|v| v.name.clone()).collect(),
                variables: data
                    .all_variables()
                    .iter()
                    .map(|(kind, variable)| DeclaredVariable {
                        kind: *kind,
                        variable: variable.clone(),
                    })
                    .collect(),
                parameters: data.parameters().clone(),
                attributes: data
                    .attributes()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                local_data_structures: data.local_data_structures().to_vec(),
                code: bd.render(h).into_iter().collect(),
            });
        }
        Ok(GeneratedBehaviour {
            name: bd.name.clone(),
            behaviour_type: bd.behaviour_type,
            integration_scheme: bd.integration_scheme,
            elastic_symmetry: bd.elastic_symmetry,
            solver,
            hypotheses,
        })
    }

    /// Returns the output of a modelling hypothesis
    pub fn hypothesis(&self, hypothesis: Hypothesis) -> Option<&HypothesisOutput> {
        self.hypotheses.iter().find(|o| o.hypothesis == hypothesis)
    }

    /// Returns a pretty-printed JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Input(format!("cannot write JSON: {}", e)))
    }

    /// Writes a JSON file
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<()>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| Error::Input("cannot create directory".to_string()))?;
        }
        let mut file = File::create(&path).map_err(|_| Error::Input("cannot create file".to_string()))?;
        serde_json::to_writer_pretty(&mut file, &self).map_err(|_| Error::Input("cannot write file".to_string()))?;
        Ok(())
    }
}

impl fmt::Display for GeneratedBehaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "@Behaviour {}", self.name)?;
        writeln!(f, "@Solver {}", self.solver)?;
        for out in &self.hypotheses {
            let title = format!("{}", out.hypothesis);
            writeln!(f, "\n{}\n{:=^2$}", title, "", title.len())?;
            writeln!(f, "unknowns = [{}]", out.integration_variables.join(", "))?;
            for (name, value) in &out.parameters {
                match value {
                    ParameterValue::Real(x) => writeln!(f, "@Parameter {} = {:?};", name, x)?,
                    ParameterValue::UnsignedInteger(n) => writeln!(f, "@Parameter {} = {};", name, n)?,
                }
            }
            for (slot, code) in &out.code {
                writeln!(f, "@{} {{\n{}}}", slot, code)?;
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
