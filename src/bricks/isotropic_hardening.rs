use crate::base::{check_options, declare_material_property, BehaviourDescription, DataStructure, MaterialProperty};
use crate::base::{OptionDescription, OptionType};
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Defines the isotropic hardening rules
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IsotropicHardeningKind {
    /// R = R0 + H p
    Linear,

    /// R = R∞ + (R0 - R∞) exp(-b p)
    Voce,

    /// R = R0 ((p0 + p) / p0)ⁿ
    Swift,

    /// R = R0 (p + p0)ⁿ
    Power,
}

impl IsotropicHardeningKind {
    /// Holds all rules
    pub const ALL: [IsotropicHardeningKind; 4] = [
        IsotropicHardeningKind::Linear,
        IsotropicHardeningKind::Voce,
        IsotropicHardeningKind::Swift,
        IsotropicHardeningKind::Power,
    ];

    /// Returns the name used in behaviour files
    pub fn name(&self) -> &'static str {
        match self {
            IsotropicHardeningKind::Linear => "Linear",
            IsotropicHardeningKind::Voce => "Voce",
            IsotropicHardeningKind::Swift => "Swift",
            IsotropicHardeningKind::Power => "Power",
        }
    }

    /// Returns the parameters (name, mandatory)
    fn parameters(&self) -> &'static [(&'static str, bool)] {
        match self {
            IsotropicHardeningKind::Linear => &[("R0", true), ("H", false)],
            IsotropicHardeningKind::Voce => &[("R0", true), ("Rinf", true), ("b", true)],
            IsotropicHardeningKind::Swift => &[("R0", true), ("p0", true), ("n", true)],
            IsotropicHardeningKind::Power => &[("R0", true), ("p0", false), ("n", true)],
        }
    }
}

impl fmt::Display for IsotropicHardeningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for IsotropicHardeningKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match IsotropicHardeningKind::ALL.iter().find(|k| k.name() == s) {
            Some(k) => Ok(*k),
            None => Err(Error::UnknownName {
                family: "isotropic hardening rule".to_string(),
                name: s.to_string(),
                entry: "isotropic_hardening".to_string(),
            }),
        }
    }
}

/// Holds an isotropic hardening rule of an inelastic flow
#[derive(Clone, Debug)]
pub struct IsotropicHardeningRule {
    /// Kind of rule
    pub kind: IsotropicHardeningKind,

    /// Given parameters (name and value)
    parameters: Vec<(&'static str, MaterialProperty)>,
}

impl IsotropicHardeningRule {
    /// Allocates a new instance from a structure such as `Voce { R0: 200e6, Rinf: 500e6, b: 20 }`
    pub fn from_structure(brick: &str, structure: &DataStructure) -> Result<Self> {
        let kind: IsotropicHardeningKind = structure.name.parse()?;
        let context = format!("{} ({})", brick, kind);
        let schema: Vec<_> = kind
            .parameters()
            .iter()
            .map(|(name, mandatory)| {
                let d = OptionDescription::new(name, name, OptionType::MaterialProperty);
                if *mandatory {
                    d.mandatory()
                } else {
                    d
                }
            })
            .collect();
        check_options(&context, &structure.options, &schema)?;
        let mut parameters = Vec::new();
        for (name, _) in kind.parameters() {
            if let Some(value) = MaterialProperty::extract(&context, &structure.options, name)? {
                parameters.push((*name, value));
            }
        }
        Ok(IsotropicHardeningRule { kind, parameters })
    }

    /// Returns the name of the variable holding a parameter
    fn variable_name(parameter: &str, flow_id: &str, index: usize) -> String {
        if flow_id.is_empty() {
            format!("{}_ih{}", parameter, index)
        } else {
            format!("{}_ih{}_{}", parameter, flow_id, index)
        }
    }

    /// Declares the parameters
    pub fn declare(&self, bd: &mut BehaviourDescription, brick: &str, flow_id: &str, index: usize) -> Result<()> {
        for (parameter, value) in &self.parameters {
            let name = Self::variable_name(parameter, flow_id, index);
            let external_name = format!("{}Hardening{}{}_{}", self.kind, parameter, flow_id, index);
            declare_material_property(bd, brick, &name, &external_name, Some(value))?;
        }
        Ok(())
    }

    /// Returns the value of a parameter (or the default value)
    fn get(&self, parameter: &str) -> Option<&MaterialProperty> {
        self.parameters.iter().find(|(p, _)| *p == parameter).map(|(_, v)| v)
    }

    /// Returns the code adding the rule's contribution to `R` and `dR_dp`
    pub fn code(&self, flow_id: &str, index: usize, p: &str) -> String {
        let v = |name: &str| match self.get(name) {
            Some(_) => format!("this->{}", Self::variable_name(name, flow_id, index)),
            None => "0".to_string(),
        };
        let r = format!("R{}", flow_id);
        let dr = format!("dR{}_dp{}", flow_id, flow_id);
        match self.kind {
            IsotropicHardeningKind::Linear => {
                format!("{} += {}+({})*({});\n{} += {};", r, v("R0"), v("H"), p, dr, v("H"))
            }
            IsotropicHardeningKind::Voce => format!(
                "{{\nconst auto e = exp(-({})*({}));\n{} += {}+({}-{})*e;\n{} += ({})*({}-{})*e;\n}}",
                v("b"),
                p,
                r,
                v("Rinf"),
                v("R0"),
                v("Rinf"),
                dr,
                v("b"),
                v("Rinf"),
                v("R0")
            ),
            IsotropicHardeningKind::Swift => format!(
                "{{\nconst auto rp = (({})+({}))/({});\n{} += ({})*pow(rp, {});\n{} += ({})*({})/({})*pow(rp, {}-1);\n}}",
                v("p0"),
                p,
                v("p0"),
                r,
                v("R0"),
                v("n"),
                dr,
                v("n"),
                v("R0"),
                v("p0"),
                v("n")
            ),
            IsotropicHardeningKind::Power => format!(
                "{{\nconst auto rp = ({})+({});\n{} += ({})*pow(rp, {});\n{} += ({})*({})*pow(rp, {}-1);\n}}",
                p,
                v("p0"),
                r,
                v("R0"),
                v("n"),
                dr,
                v("n"),
                v("R0"),
                v("n")
            ),
        }
    }

    /// Evaluates the radius of the elastic domain and its derivative
    ///
    /// Requires all parameters to be known at compile time.
    pub fn evaluate(&self, p: f64) -> Result<(f64, f64)> {
        let v = |name: &str| -> Result<f64> {
            match self.get(name) {
                Some(mp) => mp.constant_value().ok_or_else(|| {
                    Error::Numerical(format!(
                        "{} hardening: parameter '{}' is not a constant",
                        self.kind, name
                    ))
                }),
                None => Ok(0.0),
            }
        };
        let r0 = v("R0")?;
        match self.kind {
            IsotropicHardeningKind::Linear => {
                let h = v("H")?;
                Ok((r0 + h * p, h))
            }
            IsotropicHardeningKind::Voce => {
                let (rinf, b) = (v("Rinf")?, v("b")?);
                let e = f64::exp(-b * p);
                Ok((rinf + (r0 - rinf) * e, b * (rinf - r0) * e))
            }
            IsotropicHardeningKind::Swift => {
                let (p0, n) = (v("p0")?, v("n")?);
                if p0 <= 0.0 {
                    return Err(Error::Numerical("Swift hardening: p0 must be positive".to_string()));
                }
                let rp = (p0 + p) / p0;
                Ok((r0 * f64::powf(rp, n), n * r0 / p0 * f64::powf(rp, n - 1.0)))
            }
            IsotropicHardeningKind::Power => {
                let (p0, n) = (v("p0")?, v("n")?);
                let rp = p + p0;
                if rp <= 0.0 && n < 1.0 {
                    return Err(Error::Numerical(
                        "Power hardening: the derivative is undefined for p + p0 = 0".to_string(),
                    ));
                }
                Ok((r0 * f64::powf(rp, n), n * r0 * f64::powf(rp, n - 1.0)))
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{IsotropicHardeningKind, IsotropicHardeningRule};
    use crate::base::{BehaviourDescription, BehaviourType, DataStructure, Hypothesis, IntegrationScheme};
    use crate::base::{OptionMap, OptionValue, VariableKind};
    use crate::{Error, Result};
    use russell_lab::approx_eq;

    fn rule(name: &str, values: &[(&str, f64)]) -> DataStructure {
        let mut options = OptionMap::new();
        for (key, value) in values {
            options.insert(key.to_string(), OptionValue::Real(*value));
        }
        DataStructure::new(name, options)
    }

    #[test]
    fn evaluate_works() -> Result<()> {
        let linear = IsotropicHardeningRule::from_structure("Plastic", &rule("Linear", &[("R0", 9.0), ("H", 800.0)]))?;
        let (r, dr) = linear.evaluate(0.01)?;
        approx_eq(r, 17.0, 1e-13);
        approx_eq(dr, 800.0, 1e-15);

        let voce = IsotropicHardeningRule::from_structure(
            "Plastic",
            &rule("Voce", &[("R0", 200.0), ("Rinf", 500.0), ("b", 20.0)]),
        )?;
        let (r, dr) = voce.evaluate(0.0)?;
        approx_eq(r, 200.0, 1e-13);
        approx_eq(dr, 6000.0, 1e-12);
        let (r, _) = voce.evaluate(10.0)?;
        approx_eq(r, 500.0, 1e-10);

        let swift = IsotropicHardeningRule::from_structure(
            "Plastic",
            &rule("Swift", &[("R0", 100.0), ("p0", 0.5), ("n", 2.0)]),
        )?;
        let (r, dr) = swift.evaluate(0.5)?;
        approx_eq(r, 400.0, 1e-12);
        approx_eq(dr, 800.0, 1e-12);

        let power = IsotropicHardeningRule::from_structure("Plastic", &rule("Power", &[("R0", 100.0), ("n", 0.5)]))?;
        let (r, dr) = power.evaluate(4.0)?;
        approx_eq(r, 200.0, 1e-12);
        approx_eq(dr, 25.0, 1e-12);
        assert!(power.evaluate(0.0).is_err());
        Ok(())
    }

    #[test]
    fn from_structure_captures_errors() {
        assert_eq!(
            IsotropicHardeningRule::from_structure("Plastic", &rule("Ludwik", &[])).err(),
            Some(Error::UnknownName {
                family: "isotropic hardening rule".to_string(),
                name: "Ludwik".to_string(),
                entry: "isotropic_hardening".to_string()
            })
        );
        assert_eq!(
            IsotropicHardeningRule::from_structure("Plastic", &rule("Voce", &[("R0", 1.0)])).err(),
            Some(Error::MissingOption {
                brick: "Plastic (Voce)".to_string(),
                option: "Rinf".to_string()
            })
        );
        assert_eq!("Swift".parse::<IsotropicHardeningKind>().unwrap(), IsotropicHardeningKind::Swift);
    }

    #[test]
    fn declare_and_code_work() -> Result<()> {
        let mut bd = BehaviourDescription::new(
            "Test",
            BehaviourType::StandardStrainBasedBehaviour,
            IntegrationScheme::Implicit,
        );
        let mut ds = rule("Linear", &[("R0", 9.0)]);
        ds.options.insert("H".to_string(), OptionValue::from("800*(1-T/1000)"));
        let linear = IsotropicHardeningRule::from_structure("Plastic", &ds)?;
        linear.declare(&mut bd, "Plastic", "", 0)?;
        let h = Hypothesis::Tridimensional;
        assert_eq!(bd.find_variable(h, "R0_ih0").unwrap().0, VariableKind::Parameter);
        assert_eq!(bd.find_variable(h, "H_ih0").unwrap().0, VariableKind::LocalVariable);
        assert_eq!(
            linear.code("", 0, "p_"),
            "R += this->R0_ih0+(this->H_ih0)*(p_);\ndR_dp += this->H_ih0;"
        );
        assert_eq!(
            linear.evaluate(0.0).err(),
            Some(Error::Numerical("Linear hardening: parameter 'H' is not a constant".to_string()))
        );
        let without_h = IsotropicHardeningRule::from_structure("Plastic", &rule("Linear", &[("R0", 9.0)]))?;
        assert_eq!(without_h.code("1", 2, "p1_"), "R1 += this->R0_ih1_2+(0)*(p1_);\ndR1_dp1 += 0;");
        Ok(())
    }
}
