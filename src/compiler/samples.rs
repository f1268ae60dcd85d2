use super::{BehaviourInput, BrickInput};
use crate::base::{BehaviourType, IntegrationScheme, Symmetry};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Holds some sample behaviour inputs
pub struct SampleInputs;

impl SampleInputs {
    /// Returns a behaviour input with a single elasto-visco-plastic brick
    pub fn elasto_visco_plasticity(name: &str, options: Value) -> BehaviourInput {
        let options = match options {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        BehaviourInput {
            name: name.to_string(),
            behaviour_type: BehaviourType::StandardStrainBasedBehaviour,
            integration_scheme: IntegrationScheme::Implicit,
            elastic_symmetry: Symmetry::Isotropic,
            hypotheses: None,
            solver: None,
            parameters: BTreeMap::new(),
            bricks: vec![BrickInput {
                name: "StandardElastoViscoPlasticity".to_string(),
                options,
            }],
        }
    }

    /// Returns the options of an isotropic Hooke stress potential (steel-like, SI units)
    pub fn hooke() -> Value {
        json!({
            "$name": "Hooke",
            "young_modulus": 150e9, // Pa
            "poisson_ratio": 0.3,   // [-]
        })
    }

    /// Returns a Norton viscoplastic behaviour based on the von Mises stress
    pub fn norton() -> BehaviourInput {
        SampleInputs::elasto_visco_plasticity(
            "Norton",
            json!({
                "stress_potential": SampleInputs::hooke(),
                "inelastic_flow": {
                    "$name": "Norton",
                    "criterion": "Mises",
                    "K": 100e6, // Pa
                    "n": 5.0,
                },
            }),
        )
    }

    /// Returns a plastic behaviour with combined isotropic and kinematic hardening
    pub fn plasticity_with_hardening() -> BehaviourInput {
        SampleInputs::elasto_visco_plasticity(
            "CombinedHardening",
            json!({
                "stress_potential": SampleInputs::hooke(),
                "inelastic_flow": {
                    "$name": "Plastic",
                    "criterion": "Mises",
                    "isotropic_hardening": [
                        {"$name": "Linear", "R0": 200e6, "H": 1e9},
                        {"$name": "Voce", "R0": 0.0, "Rinf": 100e6, "b": 20.0},
                    ],
                    "kinematic_hardening": {"$name": "ArmstrongFrederick", "C": 1e9, "D": 100.0},
                },
            }),
        )
    }

    /// Returns a porous plastic behaviour (Gurson-Tvergaard-Needleman) with strain-based nucleation
    ///
    /// # Input
    ///
    /// * `algorithm` -- name of the porosity evolution algorithm
    /// * `maximum_number_of_iterations` -- overrides the staggered scheme default (staggered scheme only)
    pub fn gurson_tvergaard_needleman(algorithm: &str, maximum_number_of_iterations: Option<i64>) -> BehaviourInput {
        let mut porosity_evolution = json!({
            "algorithm": algorithm,
            "nucleation_model": {
                "$name": "ChuNeedleman",
                "An": 0.04,
                "pn": 0.3,
                "sn": 0.1,
                "fmax": 0.04,
            },
        });
        if let (Some(n), Value::Object(map)) = (maximum_number_of_iterations, &mut porosity_evolution) {
            map.insert("maximum_number_of_iterations".to_string(), json!(n));
        }
        SampleInputs::elasto_visco_plasticity(
            "GursonTvergaardNeedleman",
            json!({
                "stress_potential": SampleInputs::hooke(),
                "inelastic_flow": {
                    "$name": "Plastic",
                    "criterion": {
                        "$name": "GursonTvergaardNeedleman1982",
                        "q_1": 1.5,
                        "q_2": 1.0,
                        "q_3": 2.25,
                        "f_c": 0.01,
                        "f_r": 0.2,
                    },
                    "isotropic_hardening": {"$name": "Voce", "R0": 200e6, "Rinf": 400e6, "b": 10.0},
                },
                "porosity_evolution": porosity_evolution,
            }),
        )
    }

    /// Returns an elastic behaviour with isotropic damage
    pub fn isotropic_damage() -> BehaviourInput {
        SampleInputs::elasto_visco_plasticity(
            "IsotropicDamage",
            json!({
                "stress_potential": {
                    "$name": "IsotropicDamageHooke",
                    "young_modulus": 150e9, // Pa
                    "poisson_ratio": 0.3,   // [-]
                },
            }),
        )
    }

    /// Returns an (invalid) behaviour declaring a nucleation model but no inelastic flow
    pub fn nucleation_without_flow() -> BehaviourInput {
        SampleInputs::elasto_visco_plasticity(
            "NucleationWithoutFlow",
            json!({
                "stress_potential": SampleInputs::hooke(),
                "porosity_evolution": {
                    "nucleation_model": {"$name": "PowerLaw", "An": 0.1, "pmin": 0.0, "m": 1.0},
                },
            }),
        )
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::SampleInputs;
    use crate::base::OptionValue;
    use crate::Result;

    #[test]
    fn samples_work() -> Result<()> {
        let norton = SampleInputs::norton();
        assert_eq!(norton.bricks.len(), 1);
        let options = norton.bricks[0].option_map()?;
        assert_eq!(
            options.get("stress_potential").unwrap().as_structure().unwrap().name,
            "Hooke"
        );
        let gtn = SampleInputs::gurson_tvergaard_needleman("staggered_scheme", Some(5));
        let options = gtn.bricks[0].option_map()?;
        let pe = options.get("porosity_evolution").unwrap().as_map().unwrap();
        assert_eq!(pe.get("maximum_number_of_iterations"), Some(&OptionValue::Integer(5)));
        let gtn = SampleInputs::gurson_tvergaard_needleman("standard_implicit_scheme", None);
        let options = gtn.bricks[0].option_map()?;
        let pe = options.get("porosity_evolution").unwrap().as_map().unwrap();
        assert_eq!(pe.get("maximum_number_of_iterations"), None);
        Ok(())
    }
}
