use mbgen::base::{BehaviourType, IntegrationScheme, VariableKind};
use mbgen::bricks::{BehaviourBrick, BrickContext, ElastoViscoPlasticity};
use mbgen::prelude::*;
use serde_json::json;

// Symbols used by the code of the nucleation models
//
// TEST GOAL
//
// Verifies that every member (`this->x`) referenced by the integrator and
// auxiliary state variables update code of each nucleation law is declared
// by the behaviour, either directly or as the increment `dx` of a state
// variable. The members of the implicit scheme (`dt`, `theta`) are implicit.
//
// CONFIGURATION
//
// * Stress potential: isotropic Hooke
// * Inelastic flow: Norton with the von Mises criterion
// * Nucleation: ChuNeedleman, PowerLaw and ChuNeedlemanStressBased (each with fmax)
// * Solver: NewtonRaphson (analytical jacobian)

const IMPLICIT_SCHEME_MEMBERS: [&str; 2] = ["dt", "theta"];

fn compile(nucleation_model: serde_json::Value) -> Result<BehaviourDescription> {
    let input = SampleInputs::elasto_visco_plasticity(
        "Nucleation",
        json!({
            "stress_potential": SampleInputs::hooke(),
            "inelastic_flow": {"$name": "Norton", "criterion": "Mises", "K": 100e6, "n": 5.0},
            "porosity_evolution": {"nucleation_model": nucleation_model},
        }),
    );
    let options = input.bricks[0].option_map()?;
    let mut bd = BehaviourDescription::new(
        "Nucleation",
        BehaviourType::StandardStrainBasedBehaviour,
        IntegrationScheme::Implicit,
    );
    let ctx = BrickContext::new(NonLinearSolver::NewtonRaphson, Registries::global()?);
    let mut brick = ElastoViscoPlasticity::new();
    brick.initialize(&mut bd, &ctx, &options)?;
    brick.complete_variable_declaration(&mut bd, &ctx)?;
    brick.end_treatment(&mut bd, &ctx)?;
    Ok(bd)
}

fn members(code: &str) -> Vec<String> {
    code.split("this->")
        .skip(1)
        .map(|s| s.chars().take_while(|c| c.is_ascii_alphanumeric() || *c == '_').collect())
        .collect()
}

fn is_declared(bd: &BehaviourDescription, name: &str) -> bool {
    let h = Hypothesis::Tridimensional;
    if IMPLICIT_SCHEME_MEMBERS.contains(&name) || bd.find_variable(h, name).is_some() {
        return true;
    }
    match name.strip_prefix('d').and_then(|x| bd.find_variable(h, x)) {
        Some((kind, _)) => kind == VariableKind::StateVariable,
        None => false,
    }
}

fn check_symbols(model: &str, nucleation_model: serde_json::Value) -> Result<()> {
    let bd = compile(nucleation_model)?;
    let data = bd.data(Hypothesis::Tridimensional).unwrap();
    let mut count = 0;
    for slot in [Slot::Integrator, Slot::UpdateAuxiliaryStateVariables] {
        let fragments = data.code(slot).unwrap().fragments();
        for fragment in fragments.iter().filter(|f| f.origin == model) {
            for name in members(&fragment.text) {
                assert!(is_declared(&bd, &name), "{}: undeclared member '{}'", model, name);
                count += 1;
            }
        }
    }
    assert!(count > 0, "{}: no code generated", model);
    Ok(())
}

#[test]
fn test_nucleation_symbols_chu_needleman() -> Result<()> {
    check_symbols(
        "ChuNeedleman",
        json!({"$name": "ChuNeedleman", "An": 0.04, "pn": 0.3, "sn": 0.1, "fmax": 0.04}),
    )
}

#[test]
fn test_nucleation_symbols_power_law() -> Result<()> {
    check_symbols(
        "PowerLaw",
        json!({"$name": "PowerLaw", "An": 0.1, "pmin": 0.01, "m": 2.0, "fmax": 0.05}),
    )
}

#[test]
fn test_nucleation_symbols_stress_based() -> Result<()> {
    check_symbols(
        "ChuNeedlemanStressBased",
        json!({"$name": "ChuNeedlemanStressBased", "An": 0.01, "sigm": 500e6, "sn": 50e6, "fmax": 0.1}),
    )?;
    let bd = compile(json!({"$name": "ChuNeedlemanStressBased", "An": 0.01, "sigm": 500e6, "sn": 50e6}))?;
    let (kind, _) = bd.find_variable(Hypothesis::Tridimensional, "seq_bts").unwrap();
    assert_eq!(kind, VariableKind::AuxiliaryStateVariable);
    let (kind, _) = bd.find_variable(Hypothesis::Tridimensional, "seq_ets").unwrap();
    assert_eq!(kind, VariableKind::LocalVariable);
    Ok(())
}

#[test]
fn test_nucleation_symbols_detects_undeclared_members() -> Result<()> {
    let bd = compile(json!({"$name": "PowerLaw", "An": 0.1, "pmin": 0.01, "m": 2.0}))?;
    assert_eq!(members("this->fn += this->dfn;"), &["fn", "dfn"]);
    assert!(is_declared(&bd, "dp"));
    assert!(is_declared(&bd, "theta"));
    assert!(!is_declared(&bd, "dfn_unknown"));
    assert!(!is_declared(&bd, "seq_bts"));
    Ok(())
}
