use mbgen::base::{VariableKind, ATTRIBUTE_POROSITY_EVOLUTION_ALGORITHM};
use mbgen::prelude::*;

// Norton viscoplasticity without porosity
//
// TEST GOAL
//
// Verifies that a behaviour made of an isotropic Hooke stress potential and
// a single Norton flow is not coupled with the porosity evolution: no
// porosity variable, parameter or attribute is created. Verifies also that
// repeated compilations produce identical outputs.
//
// CONFIGURATION
//
// * Stress potential: isotropic Hooke, E = 150 GPa, ν = 0.3
// * Inelastic flow: Norton, von Mises criterion, K = 100 MPa, n = 5

const POROSITY_PARAMETERS: [&str; 6] = [
    "porosity_upper_bound",
    "porosity_upper_bound_safety_factor",
    "porosity_upper_bound_safety_factor_for_fracture_detection",
    "staggered_scheme_porosity_criterion",
    "staggered_scheme_maximum_number_of_iterations",
    "staggered_scheme_relaxation_factor",
];

#[test]
fn test_norton_uncoupled() -> Result<()> {
    let config = Config::new();
    let compiler = BehaviourCompiler::new(&config)?;
    let input = BehaviourInput::read_json("data/norton.json")?;
    let out = compiler.compile(&input)?;

    // requested hypotheses only
    let hypotheses: Vec<_> = out.hypotheses.iter().map(|o| o.hypothesis).collect();
    assert_eq!(
        hypotheses,
        &[Hypothesis::Axisymmetrical, Hypothesis::PlaneStrain, Hypothesis::Tridimensional]
    );

    for o in &out.hypotheses {
        assert_eq!(o.integration_variables, &["eel", "p"]);
        assert!(o.variables.iter().all(|v| v.variable.name != "f"));
        for name in POROSITY_PARAMETERS {
            assert!(!o.parameters.contains_key(name), "{}", name);
        }
        assert!(!o.attributes.contains_key(ATTRIBUTE_POROSITY_EVOLUTION_ALGORITHM));
        assert!(o.local_data_structures.is_empty());

        // Norton coefficients are constants, hence parameters
        let kinds: Vec<_> = o
            .variables
            .iter()
            .filter(|v| v.variable.name.starts_with("norton_"))
            .map(|v| v.kind)
            .collect();
        assert_eq!(kinds, &[VariableKind::Parameter; 3]);
        let integrator = &o.code.iter().find(|(slot, _)| *slot == Slot::Integrator).unwrap().1;
        assert!(integrator.contains("feel += (this->dp)*n;"));
        assert!(!integrator.contains("ff"));
    }

    // deterministic
    let again = compiler.compile(&input)?;
    assert_eq!(out, again);
    assert_eq!(out.to_json()?, again.to_json()?);
    assert_eq!(format!("{}", out), format!("{}", again));
    Ok(())
}

#[test]
fn test_norton_plane_stress() -> Result<()> {
    let mut config = Config::new();
    config.set_hypotheses(&[Hypothesis::PlaneStress])?;
    let out = BehaviourCompiler::new(&config)?.compile(&SampleInputs::norton())?;
    assert_eq!(out.hypotheses.len(), 1);
    let o = &out.hypotheses[0];
    assert_eq!(o.hypothesis, Hypothesis::PlaneStress);
    assert_eq!(o.integration_variables, &["eel", "etozz", "p"]);
    Ok(())
}
