use crate::base::{check_options, declare_material_property, BehaviourDescription, DataStructure, MaterialProperty};
use crate::base::{OptionDescription, OptionType, Symmetry};
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Defines the stress criteria available to inelastic flows
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StressCriterionKind {
    Mises,
    Hill,
    Hosford,
    Drucker1921,
    Gurson,
    GursonTvergaardNeedleman1982,
}

impl StressCriterionKind {
    /// Holds all criteria
    pub const ALL: [StressCriterionKind; 6] = [
        StressCriterionKind::Mises,
        StressCriterionKind::Hill,
        StressCriterionKind::Hosford,
        StressCriterionKind::Drucker1921,
        StressCriterionKind::Gurson,
        StressCriterionKind::GursonTvergaardNeedleman1982,
    ];

    /// Returns the name used in behaviour files
    pub fn name(&self) -> &'static str {
        match self {
            StressCriterionKind::Mises => "Mises",
            StressCriterionKind::Hill => "Hill",
            StressCriterionKind::Hosford => "Hosford",
            StressCriterionKind::Drucker1921 => "Drucker1921",
            StressCriterionKind::Gurson => "Gurson",
            StressCriterionKind::GursonTvergaardNeedleman1982 => "GursonTvergaardNeedleman1982",
        }
    }

    /// Returns the schema of the criterion's parameters
    fn options(&self) -> Vec<OptionDescription> {
        let mp = |name: &str, description: &str| {
            OptionDescription::new(name, description, OptionType::MaterialProperty).mandatory()
        };
        match self {
            StressCriterionKind::Mises | StressCriterionKind::Gurson => Vec::new(),
            StressCriterionKind::Hill => vec![
                mp("F", "Hill coefficient F"),
                mp("G", "Hill coefficient G"),
                mp("H", "Hill coefficient H"),
                mp("L", "Hill coefficient L"),
                mp("M", "Hill coefficient M"),
                mp("N", "Hill coefficient N"),
            ],
            StressCriterionKind::Hosford => vec![mp("a", "Hosford exponent")],
            StressCriterionKind::Drucker1921 => vec![mp("c", "Drucker coefficient")],
            StressCriterionKind::GursonTvergaardNeedleman1982 => vec![
                mp("q_1", "first Tvergaard coefficient"),
                mp("q_2", "second Tvergaard coefficient"),
                mp("q_3", "third Tvergaard coefficient"),
                mp("f_c", "critical porosity"),
                OptionDescription::new("f_r", "fracture porosity", OptionType::Real).mandatory(),
            ],
        }
    }
}

impl fmt::Display for StressCriterionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for StressCriterionKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match StressCriterionKind::ALL.iter().find(|k| k.name() == s) {
            Some(k) => Ok(*k),
            None => Err(Error::UnknownName {
                family: "stress criterion".to_string(),
                name: s.to_string(),
                entry: "criterion".to_string(),
            }),
        }
    }
}

/// Holds a stress criterion (or a flow criterion) of an inelastic flow
#[derive(Clone, Debug)]
pub struct StressCriterion {
    /// Kind of criterion
    pub kind: StressCriterionKind,

    /// Parameters (option name and value) in schema order
    parameters: Vec<(String, MaterialProperty)>,

    /// Fracture porosity
    fracture_porosity: Option<f64>,
}

impl StressCriterion {
    /// Allocates a new instance from a structure such as `Hosford { a: 8 }`
    ///
    /// `entry` names the option holding the structure.
    pub fn from_structure(brick: &str, entry: &str, structure: &DataStructure) -> Result<Self> {
        let kind: StressCriterionKind = structure.name.parse().map_err(|_| Error::UnknownName {
            family: "stress criterion".to_string(),
            name: structure.name.clone(),
            entry: entry.to_string(),
        })?;
        let context = format!("{} ({})", brick, kind);
        let schema = kind.options();
        check_options(&context, &structure.options, &schema)?;
        let mut parameters = Vec::new();
        let mut fracture_porosity = None;
        for description in &schema {
            if description.option_type == OptionType::Real {
                let fr = structure.options.get(&description.name).and_then(|v| v.as_real());
                if let Some(fr) = fr {
                    if fr <= 0.0 || fr > 1.0 {
                        return Err(Error::unsupported(&context, "the fracture porosity must be in (0, 1]"));
                    }
                }
                fracture_porosity = fr;
            } else {
                let value = MaterialProperty::extract_mandatory(&context, &structure.options, &description.name)?;
                parameters.push((description.name.clone(), value));
            }
        }
        Ok(StressCriterion {
            kind,
            parameters,
            fracture_porosity,
        })
    }

    /// Allocates a criterion without parameters
    pub fn new(kind: StressCriterionKind) -> Result<Self> {
        Self::from_structure("", "criterion", &DataStructure::new(kind.name(), Default::default()))
    }

    /// Indicates that the criterion depends on the porosity
    pub fn is_coupled_with_porosity_evolution(&self) -> bool {
        matches!(
            self.kind,
            StressCriterionKind::Gurson | StressCriterionKind::GursonTvergaardNeedleman1982
        )
    }

    /// Indicates that the criterion is insensitive to the hydrostatic pressure
    pub fn is_isochoric(&self) -> bool {
        !self.is_coupled_with_porosity_evolution()
    }

    /// Returns the upper bound of the porosity imposed by the criterion
    pub fn porosity_upper_bound(&self) -> Option<f64> {
        self.fracture_porosity
    }

    /// Checks that the criterion is compatible with the behaviour's symmetry
    pub fn check_symmetry(&self, brick: &str, bd: &BehaviourDescription) -> Result<()> {
        if self.kind == StressCriterionKind::Hill && bd.symmetry != Symmetry::Orthotropic {
            return Err(Error::unsupported(brick, "the Hill criterion requires an orthotropic behaviour"));
        }
        Ok(())
    }

    /// Returns the name of the variable holding a parameter
    fn variable_name(&self, prefix: &str, parameter: &str, id: &str) -> String {
        format!("{}{}_{}{}", prefix, self.kind.name().to_lowercase(), parameter, id)
    }

    /// Declares the parameters of the criterion
    ///
    /// `prefix` distinguishes the stress criterion ("sc_") from the flow criterion ("fc_").
    pub fn declare(&self, bd: &mut BehaviourDescription, brick: &str, prefix: &str, id: &str) -> Result<()> {
        for (parameter, value) in &self.parameters {
            let name = self.variable_name(prefix, parameter, id);
            let external_name = format!("{}{}{}", self.kind.name(), parameter.replace('_', ""), id);
            let external_name = if prefix.is_empty() {
                external_name
            } else {
                format!("{}{}", prefix.trim_end_matches('_'), external_name)
            };
            declare_material_property(bd, brick, &name, &external_name, Some(value))?;
        }
        Ok(())
    }

    fn arguments(&self, prefix: &str, id: &str, stress: &str, porosity: &str, lower_bound: &str) -> String {
        let mut args = vec![stress.to_string()];
        if self.is_coupled_with_porosity_evolution() {
            args.push(porosity.to_string());
        }
        args.push(lower_bound.to_string());
        args.extend(
            self.parameters
                .iter()
                .map(|(p, _)| format!("this->{}", self.variable_name(prefix, p, id))),
        );
        args.join(", ")
    }

    /// Returns the code computing the equivalent stress and its normal
    ///
    /// `porosity` is the expression of the porosity seen by the criterion; it
    /// is ignored by criteria which do not depend on the porosity.
    /// `outputs` holds the names of the equivalent stress and of the normal.
    pub fn equivalent_stress_code(
        &self,
        prefix: &str,
        id: &str,
        stress: &str,
        porosity: &str,
        lower_bound: &str,
        outputs: [&str; 2],
    ) -> String {
        format!(
            "const auto [{}, {}] = compute{}StressNormal({});",
            outputs[0],
            outputs[1],
            self.kind.name(),
            self.arguments(prefix, id, stress, porosity, lower_bound)
        )
    }

    /// Returns the code computing the porosity derivative of the equivalent
    /// stress and the derivatives of the normal
    ///
    /// `outputs` holds the names of the derivative of the equivalent stress
    /// with respect to the porosity, of the derivative of the normal with
    /// respect to the stress and of the derivative of the normal with respect
    /// to the porosity. Returns None if the criterion does not depend on the porosity.
    pub fn porosity_derivatives_code(
        &self,
        prefix: &str,
        id: &str,
        stress: &str,
        porosity: &str,
        lower_bound: &str,
        outputs: [&str; 3],
    ) -> Option<String> {
        if !self.is_coupled_with_porosity_evolution() {
            return None;
        }
        Some(format!(
            "const auto [{}, {}, {}] = compute{}StressSecondDerivative({});",
            outputs[0],
            outputs[1],
            outputs[2],
            self.kind.name(),
            self.arguments(prefix, id, stress, porosity, lower_bound)
        ))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{StressCriterion, StressCriterionKind};
    use crate::base::{BehaviourDescription, BehaviourType, DataStructure, Hypothesis, IntegrationScheme};
    use crate::base::{OptionMap, OptionValue, ParameterValue, Symmetry};
    use crate::{Error, Result};

    fn gtn(f_r: f64) -> DataStructure {
        let mut options = OptionMap::new();
        for (name, value) in [("q_1", 2.0), ("q_2", 1.0), ("q_3", 4.0), ("f_c", 0.01)] {
            options.insert(name.to_string(), OptionValue::Real(value));
        }
        options.insert("f_r".to_string(), OptionValue::Real(f_r));
        DataStructure::new("GursonTvergaardNeedleman1982", options)
    }

    #[test]
    fn from_structure_works() -> Result<()> {
        let c = StressCriterion::new(StressCriterionKind::Mises)?;
        assert!(!c.is_coupled_with_porosity_evolution());
        assert!(c.is_isochoric());
        assert_eq!(c.porosity_upper_bound(), None);

        let c = StressCriterion::from_structure("Plastic", "criterion", &gtn(0.25))?;
        assert!(c.is_coupled_with_porosity_evolution());
        assert_eq!(c.porosity_upper_bound(), Some(0.25));
        assert_eq!(
            StressCriterion::from_structure("Plastic", "criterion", &gtn(1.5)).err(),
            Some(Error::unsupported(
                "Plastic (GursonTvergaardNeedleman1982)",
                "the fracture porosity must be in (0, 1]"
            ))
        );
        Ok(())
    }

    #[test]
    fn from_structure_captures_errors() {
        assert_eq!(
            StressCriterion::from_structure("Norton", "criterion", &DataStructure::new("Tresca", OptionMap::new())).err(),
            Some(Error::UnknownName {
                family: "stress criterion".to_string(),
                name: "Tresca".to_string(),
                entry: "criterion".to_string()
            })
        );
        assert_eq!(
            StressCriterion::from_structure("Norton", "criterion", &DataStructure::new("Hosford", OptionMap::new())).err(),
            Some(Error::MissingOption {
                brick: "Norton (Hosford)".to_string(),
                option: "a".to_string()
            })
        );
        let mut options = OptionMap::new();
        options.insert("a".to_string(), OptionValue::Real(8.0));
        assert_eq!(
            StressCriterion::from_structure("Norton", "criterion", &DataStructure::new("Mises", options)).err(),
            Some(Error::UnknownOption {
                brick: "Norton (Mises)".to_string(),
                option: "a".to_string()
            })
        );
    }

    #[test]
    fn declare_and_code_work() -> Result<()> {
        let mut bd = BehaviourDescription::new(
            "Test",
            BehaviourType::StandardStrainBasedBehaviour,
            IntegrationScheme::Implicit,
        );
        let mut options = OptionMap::new();
        options.insert("a".to_string(), OptionValue::Real(8.0));
        let c = StressCriterion::from_structure("Norton", "criterion", &DataStructure::new("Hosford", options))?;
        c.declare(&mut bd, "Norton", "", "1")?;
        assert_eq!(
            bd.parameter_default(Hypothesis::Tridimensional, "hosford_a1"),
            Some(ParameterValue::Real(8.0))
        );
        assert_eq!(
            c.equivalent_stress_code("", "1", "sig", "f_", "seps", ["seq1", "n1"]),
            "const auto [seq1, n1] = computeHosfordStressNormal(sig, seps, this->hosford_a1);"
        );
        assert_eq!(
            c.porosity_derivatives_code("", "1", "sig", "f_", "seps", ["dseq1_df", "dn1_dsig", "dn1_df"]),
            None
        );
        let c = StressCriterion::from_structure("Plastic", "criterion", &gtn(0.25))?;
        assert!(c
            .equivalent_stress_code("fc_", "", "sig", "f_", "seps", ["seq", "n"])
            .starts_with("const auto [seq, n] = computeGursonTvergaardNeedleman1982StressNormal(sig, f_, seps, this->fc_gursontvergaardneedleman1982_q_1"));
        assert!(c
            .equivalent_stress_code("", "", "sigel", "this->f", "seps", ["seqel", "nel"])
            .starts_with("const auto [seqel, nel] = computeGursonTvergaardNeedleman1982StressNormal(sigel, this->f, seps, "));
        assert_eq!(
            c.porosity_derivatives_code("", "", "sig", "f_", "seps", ["dseq_df", "dn_dsig", "dn_df"]),
            Some(
                "const auto [dseq_df, dn_dsig, dn_df] = computeGursonTvergaardNeedleman1982StressSecondDerivative(\
                 sig, f_, seps, this->gursontvergaardneedleman1982_q_1, this->gursontvergaardneedleman1982_q_2, \
                 this->gursontvergaardneedleman1982_q_3, this->gursontvergaardneedleman1982_f_c);"
                    .to_string()
            )
        );

        let hill = DataStructure::new("Hill", OptionMap::new());
        let mut options = OptionMap::new();
        for name in ["F", "G", "H", "L", "M", "N"] {
            options.insert(name.to_string(), OptionValue::Real(0.5));
        }
        let hill = DataStructure::new(&hill.name, options);
        let c = StressCriterion::from_structure("Plastic", "criterion", &hill)?;
        assert_eq!(
            c.check_symmetry("Plastic", &bd).err(),
            Some(Error::unsupported("Plastic", "the Hill criterion requires an orthotropic behaviour"))
        );
        bd.symmetry = Symmetry::Orthotropic;
        c.check_symmetry("Plastic", &bd)?;
        Ok(())
    }
}
