use serde::Serialize;
use std::fmt;

/// Defines the attachment points of the generated integration procedure
///
/// The order of the variants is the order in which the slots are executed
/// by the generated procedure.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize)]
pub enum Slot {
    BeforeInitializeLocalVariables,
    InitializeLocalVariables,
    AfterInitializeLocalVariables,
    InitializeJacobian,
    ComputePredictionOperator,
    ComputeStress,
    Integrator,
    ProcessNewEstimate,
    AdditionalConvergenceChecks,
    ComputeFinalStress,
    UpdateAuxiliaryStateVariables,
    ComputeTangentOperator,
}

impl Slot {
    /// Holds all slots in execution order
    pub const ALL: [Slot; 12] = [
        Slot::BeforeInitializeLocalVariables,
        Slot::InitializeLocalVariables,
        Slot::AfterInitializeLocalVariables,
        Slot::InitializeJacobian,
        Slot::ComputePredictionOperator,
        Slot::ComputeStress,
        Slot::Integrator,
        Slot::ProcessNewEstimate,
        Slot::AdditionalConvergenceChecks,
        Slot::ComputeFinalStress,
        Slot::UpdateAuxiliaryStateVariables,
        Slot::ComputeTangentOperator,
    ];

    /// Returns the name of the slot
    pub fn name(&self) -> &'static str {
        match self {
            Slot::BeforeInitializeLocalVariables => "before-initialize-local-variables",
            Slot::InitializeLocalVariables => "initialize-local-variables",
            Slot::AfterInitializeLocalVariables => "after-initialize-local-variables",
            Slot::InitializeJacobian => "initialize-jacobian",
            Slot::ComputePredictionOperator => "compute-prediction-operator",
            Slot::ComputeStress => "compute-stress",
            Slot::Integrator => "integrator",
            Slot::ProcessNewEstimate => "process-new-estimate",
            Slot::AdditionalConvergenceChecks => "additional-convergence-checks",
            Slot::ComputeFinalStress => "compute-final-stress",
            Slot::UpdateAuxiliaryStateVariables => "update-auxiliary-state-variables",
            Slot::ComputeTangentOperator => "compute-tangent-operator",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Defines how a code fragment is inserted in a slot
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CodeBlockMode {
    /// Fails if the slot already has some content
    Create,

    /// Replaces any existing content
    CreateOrReplace,

    /// Appends to (or prepends to) any existing content
    CreateOrAppend,
}

/// Defines where an appended fragment is placed
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CodeBlockPosition {
    AtBeginning,
    AtEnd,
}

/// Holds a piece of generated code and the brick which contributed it
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CodeFragment {
    /// Name of the contributing brick
    pub origin: String,

    /// Opaque code text
    pub text: String,
}

/// Holds the ordered fragments of a slot
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CodeBlock {
    fragments: Vec<CodeFragment>,
}

impl CodeBlock {
    /// Allocates an empty block
    pub fn new() -> Self {
        CodeBlock { fragments: Vec::new() }
    }

    /// Indicates whether the block has no content
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Returns the fragments in final order
    pub fn fragments(&self) -> &[CodeFragment] {
        &self.fragments
    }

    /// Inserts a fragment
    pub fn insert(&mut self, fragment: CodeFragment, position: CodeBlockPosition) {
        match position {
            CodeBlockPosition::AtBeginning => self.fragments.insert(0, fragment),
            CodeBlockPosition::AtEnd => self.fragments.push(fragment),
        }
    }

    /// Removes all fragments
    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    /// Returns the concatenation of all fragments
    pub fn render(&self) -> String {
        let mut code = String::new();
        for fragment in &self.fragments {
            code.push_str(&fragment.text);
            if !fragment.text.ends_with('\n') {
                code.push('\n');
            }
        }
        code
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
