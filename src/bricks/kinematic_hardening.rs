use crate::base::{check_options, declare_material_property, BehaviourDescription, DataStructure, Hypothesis};
use crate::base::{MaterialProperty, OptionDescription, OptionType, Variable};
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Defines the kinematic hardening rules
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KinematicHardeningKind {
    /// X = 2/3 C a with ȧ = ṗ n
    Prager,

    /// X = 2/3 C a with ȧ = ṗ (n - D a)
    ArmstrongFrederick,
}

impl KinematicHardeningKind {
    /// Returns the name used in behaviour files
    pub fn name(&self) -> &'static str {
        match self {
            KinematicHardeningKind::Prager => "Prager",
            KinematicHardeningKind::ArmstrongFrederick => "ArmstrongFrederick",
        }
    }

    fn parameters(&self) -> &'static [&'static str] {
        match self {
            KinematicHardeningKind::Prager => &["C"],
            KinematicHardeningKind::ArmstrongFrederick => &["C", "D"],
        }
    }
}

impl fmt::Display for KinematicHardeningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for KinematicHardeningKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Prager" => Ok(KinematicHardeningKind::Prager),
            "ArmstrongFrederick" => Ok(KinematicHardeningKind::ArmstrongFrederick),
            _ => Err(Error::UnknownName {
                family: "kinematic hardening rule".to_string(),
                name: s.to_string(),
                entry: "kinematic_hardening".to_string(),
            }),
        }
    }
}

/// Holds a kinematic hardening rule of an inelastic flow
///
/// Each rule owns a back-strain `a` declared as an unknown of the implicit system.
#[derive(Clone, Debug)]
pub struct KinematicHardeningRule {
    /// Kind of rule
    pub kind: KinematicHardeningKind,

    parameters: Vec<(&'static str, MaterialProperty)>,
}

impl KinematicHardeningRule {
    /// Allocates a new instance from a structure such as `Prager { C: 1e9 }`
    pub fn from_structure(brick: &str, structure: &DataStructure) -> Result<Self> {
        let kind: KinematicHardeningKind = structure.name.parse()?;
        let context = format!("{} ({})", brick, kind);
        let schema: Vec<_> = kind
            .parameters()
            .iter()
            .map(|name| OptionDescription::new(name, name, OptionType::MaterialProperty).mandatory())
            .collect();
        check_options(&context, &structure.options, &schema)?;
        let mut parameters = Vec::new();
        for name in kind.parameters() {
            parameters.push((*name, MaterialProperty::extract_mandatory(&context, &structure.options, name)?));
        }
        Ok(KinematicHardeningRule { kind, parameters })
    }

    /// Returns the name of the back-strain
    pub fn back_strain(flow_id: &str, index: usize) -> String {
        if flow_id.is_empty() {
            format!("a{}", index)
        } else {
            format!("a{}_{}", flow_id, index)
        }
    }

    fn variable_name(parameter: &str, flow_id: &str, index: usize) -> String {
        format!("kh_{}{}", parameter, &Self::back_strain(flow_id, index)[1..])
    }

    /// Declares the back-strain and the parameters
    pub fn declare(&self, bd: &mut BehaviourDescription, brick: &str, flow_id: &str, index: usize) -> Result<()> {
        let a = Self::back_strain(flow_id, index);
        let suffix = &a[1..];
        bd.add_state_variable(
            Hypothesis::Undefined,
            Variable::stensor(&a).with_external_name(&format!("BackStrain{}", suffix)),
        )?;
        for (parameter, value) in &self.parameters {
            let name = Self::variable_name(parameter, flow_id, index);
            let external_name = format!("{}{}{}", self.kind, parameter, suffix);
            declare_material_property(bd, brick, &name, &external_name, Some(value))?;
        }
        Ok(())
    }

    /// Returns the expression of the back-stress at the middle of the time step
    pub fn back_stress(&self, flow_id: &str, index: usize) -> String {
        let a = Self::back_strain(flow_id, index);
        format!(
            "(2*(this->{})/3)*(this->{}+(this->theta)*(this->d{}))",
            Self::variable_name("C", flow_id, index),
            a,
            a
        )
    }

    /// Returns the residual of the back-strain
    ///
    /// `dp` and `n` are the increment of the equivalent plastic strain and the flow direction.
    pub fn residual_code(&self, flow_id: &str, index: usize, dp: &str, n: &str) -> String {
        let a = Self::back_strain(flow_id, index);
        match self.kind {
            KinematicHardeningKind::Prager => format!("f{} -= ({})*({});", a, dp, n),
            KinematicHardeningKind::ArmstrongFrederick => format!(
                "f{} -= ({})*(({})-(this->{})*(this->{}+(this->theta)*(this->d{})));",
                a,
                dp,
                n,
                Self::variable_name("D", flow_id, index),
                a,
                a
            ),
        }
    }

    /// Returns the derivative of the back-strain residual with respect to the back-strain
    pub fn jacobian_code(&self, flow_id: &str, index: usize, dp: &str) -> String {
        let a = Self::back_strain(flow_id, index);
        match self.kind {
            KinematicHardeningKind::Prager => String::new(),
            KinematicHardeningKind::ArmstrongFrederick => format!(
                "df{}_dd{} += (this->theta)*(this->{})*({})*Stensor4::Id();",
                a,
                a,
                Self::variable_name("D", flow_id, index),
                dp
            ),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
