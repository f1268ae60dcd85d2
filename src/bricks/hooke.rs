use super::{BrickContext, StressPotential};
use crate::base::{check_options, declare_material_property, AttributeValue, BehaviourDescription, Hypothesis};
use crate::base::{MaterialProperty, OptionDescription, OptionMap, OptionType, ParameterValue, RegistrationStatus};
use crate::base::{Slot, Symmetry, Variable, VariableKind, VariableType};
use crate::base::{ATTRIBUTE_ELASTIC_PREDICTION, ATTRIBUTE_HANDLES_THERMAL_EXPANSION};
use crate::base::ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR;
use crate::solver::NonLinearSolver;
use crate::{Error, Result};
use russell_tensor::LinElasticity;

/// Defines the names of the orthotropic elastic properties (option, variable, external name)
const ORTHOTROPIC_PROPERTIES: [(&str, &str, &str); 9] = [
    ("young_modulus1", "young1", "YoungModulus1"),
    ("young_modulus2", "young2", "YoungModulus2"),
    ("young_modulus3", "young3", "YoungModulus3"),
    ("poisson_ratio12", "nu12", "PoissonRatio12"),
    ("poisson_ratio23", "nu23", "PoissonRatio23"),
    ("poisson_ratio13", "nu13", "PoissonRatio13"),
    ("shear_modulus12", "mu12", "ShearModulus12"),
    ("shear_modulus23", "mu23", "ShearModulus23"),
    ("shear_modulus13", "mu13", "ShearModulus13"),
];

/// Defines the names of the orthotropic thermal expansion coefficients
const ORTHOTROPIC_THERMAL_EXPANSIONS: [(&str, &str, &str); 3] = [
    ("thermal_expansion1", "alpha1", "ThermalExpansion1"),
    ("thermal_expansion2", "alpha2", "ThermalExpansion2"),
    ("thermal_expansion3", "alpha3", "ThermalExpansion3"),
];

/// Defines the elastic properties given to the stress potential
#[derive(Clone, Debug, PartialEq)]
enum ElasticProperties {
    /// The stiffness tensor is given by the calling solver
    StiffnessTensor,

    /// Young's modulus and Poisson's ratio
    Isotropic(MaterialProperty, MaterialProperty),

    /// Three Young's moduli, three Poisson's ratios and three shear moduli
    Orthotropic(Vec<MaterialProperty>),
}

/// Implements Hooke's law (possibly degraded by an isotropic damage)
pub struct Hooke {
    /// Name of the brick (Hooke or IsotropicDamageHooke)
    name: &'static str,

    /// The stress is degraded by the damage variable `d`
    damaged: bool,

    /// Elastic properties
    elastic: ElasticProperties,

    /// Lamé coefficients (λ, μ) when known at compile time
    lame: Option<(f64, f64)>,

    /// Thermal expansion coefficient(s)
    thermal_expansion: Vec<MaterialProperty>,

    /// Reference temperature for the thermal expansion
    reference_temperature: f64,

    /// Handles plane stress through the axial strain unknown
    plane_stress_support: bool,
}

impl Hooke {
    /// Allocates a new instance
    pub fn new() -> Self {
        Hooke {
            name: "Hooke",
            damaged: false,
            elastic: ElasticProperties::StiffnessTensor,
            lame: None,
            thermal_expansion: Vec::new(),
            reference_temperature: 293.15,
            plane_stress_support: true,
        }
    }

    /// Allocates an instance whose stress is degraded by the damage variable
    pub(crate) fn new_damaged(name: &'static str) -> Self {
        Hooke {
            name,
            damaged: true,
            plane_stress_support: false,
            ..Hooke::new()
        }
    }

    /// Returns the Lamé coefficients (λ, μ) when evaluated at compile time
    pub fn lame_coefficients(&self) -> Option<(f64, f64)> {
        self.lame
    }

    /// Indicates that the stiffness tensor is given by the calling solver
    pub fn requires_stiffness_tensor(&self) -> bool {
        self.elastic == ElasticProperties::StiffnessTensor
    }

    /// Indicates isotropic elasticity with Young's modulus and Poisson's ratio
    fn is_isotropic(&self) -> bool {
        matches!(self.elastic, ElasticProperties::Isotropic(..))
    }

    /// Returns the expression of the stress for a given elastic strain expression
    fn stress_expression(&self, strain: &str) -> String {
        let undamaged = if self.is_isotropic() {
            format!(
                "(this->lambda)*trace({})*Stensor::Id()+2*(this->mu)*({})",
                strain, strain
            )
        } else {
            format!("(this->D)*({})", strain)
        };
        if self.damaged {
            format!("(1-d_)*({})", undamaged)
        } else {
            undamaged
        }
    }

    /// Returns the expression of the undamaged elastic stiffness
    fn stiffness_expression(&self) -> String {
        if self.is_isotropic() {
            "(this->lambda)*Stensor4::IxI()+2*(this->mu)*Stensor4::Id()".to_string()
        } else {
            "this->D".to_string()
        }
    }

    /// Parses the options
    fn parse_options(&mut self, bd: &BehaviourDescription, options: &OptionMap) -> Result<()> {
        let young = MaterialProperty::extract(self.name, options, "young_modulus")?;
        let poisson = MaterialProperty::extract(self.name, options, "poisson_ratio")?;
        if let (Some(young), Some(poisson)) = (young, poisson) {
            if bd.elastic_symmetry != Symmetry::Isotropic {
                return Err(Error::unsupported(
                    self.name,
                    "isotropic elastic properties given for an orthotropic elastic symmetry",
                ));
            }
            if let (Some(e), Some(nu)) = (young.constant_value(), poisson.constant_value()) {
                if e <= 0.0 {
                    return Err(Error::unsupported(self.name, "the Young modulus must be positive"));
                }
                if nu <= -1.0 || nu >= 0.5 {
                    return Err(Error::unsupported(self.name, "the Poisson ratio must be in (-1, 0.5)"));
                }
                let (kk, gg) = LinElasticity::new(e, nu, false, false).get_bulk_shear();
                self.lame = Some((kk - 2.0 * gg / 3.0, gg));
            }
            self.elastic = ElasticProperties::Isotropic(young, poisson);
        }
        if options.contains_key(ORTHOTROPIC_PROPERTIES[0].0) {
            if bd.elastic_symmetry != Symmetry::Orthotropic {
                return Err(Error::unsupported(
                    self.name,
                    "orthotropic elastic properties require an orthotropic elastic symmetry",
                ));
            }
            if self.damaged {
                return Err(Error::unsupported(self.name, "orthotropic elasticity is not supported"));
            }
            let mut values = Vec::new();
            for (option, _, _) in &ORTHOTROPIC_PROPERTIES {
                values.push(MaterialProperty::extract_mandatory(self.name, options, option)?);
            }
            self.elastic = ElasticProperties::Orthotropic(values);
        }
        if let Some(alpha) = MaterialProperty::extract(self.name, options, "thermal_expansion")? {
            self.thermal_expansion = vec![alpha];
        }
        if options.contains_key(ORTHOTROPIC_THERMAL_EXPANSIONS[0].0) {
            if bd.symmetry != Symmetry::Orthotropic {
                return Err(Error::unsupported(
                    self.name,
                    "orthotropic thermal expansion requires an orthotropic behaviour",
                ));
            }
            self.thermal_expansion.clear();
            for (option, _, _) in &ORTHOTROPIC_THERMAL_EXPANSIONS {
                self.thermal_expansion
                    .push(MaterialProperty::extract_mandatory(self.name, options, option)?);
            }
        }
        if let Some(value) = options.get("thermal_expansion_reference_temperature") {
            if self.thermal_expansion.is_empty() {
                return Err(Error::MissingRequiredOption {
                    brick: self.name.to_string(),
                    option: "thermal_expansion_reference_temperature".to_string(),
                    required: "thermal_expansion".to_string(),
                });
            }
            self.reference_temperature = value.as_real().unwrap_or(self.reference_temperature);
        }
        if let Some(flag) = options.get("plane_stress_support").and_then(|v| v.as_bool()) {
            if flag && self.damaged {
                return Err(Error::unsupported(self.name, "plane stress is not supported"));
            }
            self.plane_stress_support = flag;
        }
        Ok(())
    }

    /// Declares the elastic properties
    fn declare_elastic_properties(&self, bd: &mut BehaviourDescription) -> Result<()> {
        match &self.elastic {
            ElasticProperties::StiffnessTensor => bd.set_attribute(
                Hypothesis::Undefined,
                ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR,
                AttributeValue::Boolean(true),
                false,
            ),
            ElasticProperties::Isotropic(young, poisson) => {
                declare_material_property(bd, self.name, "young", "YoungModulus", Some(young))?;
                declare_material_property(bd, self.name, "nu", "PoissonRatio", Some(poisson))
            }
            ElasticProperties::Orthotropic(values) => {
                for ((_, name, external_name), value) in ORTHOTROPIC_PROPERTIES.iter().zip(values) {
                    declare_material_property(bd, self.name, name, external_name, Some(value))?;
                }
                Ok(())
            }
        }
    }

    /// Declares the thermal expansion coefficients
    fn declare_thermal_expansion(&self, bd: &mut BehaviourDescription) -> Result<()> {
        match self.thermal_expansion.len() {
            0 => return Ok(()),
            1 => declare_material_property(
                bd,
                self.name,
                "alpha",
                "ThermalExpansion",
                Some(&self.thermal_expansion[0]),
            )?,
            _ => {
                for ((_, name, external_name), value) in
                    ORTHOTROPIC_THERMAL_EXPANSIONS.iter().zip(&self.thermal_expansion)
                {
                    declare_material_property(bd, self.name, name, external_name, Some(value))?;
                }
            }
        }
        bd.set_attribute(
            Hypothesis::Undefined,
            ATTRIBUTE_HANDLES_THERMAL_EXPANSION,
            AttributeValue::Boolean(true),
            false,
        )
    }

    /// Returns the code initializing the elastic coefficients
    fn initialize_local_variables_code(&self) -> Option<String> {
        match &self.elastic {
            ElasticProperties::StiffnessTensor => None,
            ElasticProperties::Isotropic(..) => Some(match self.lame {
                Some((lambda, mu)) => format!("this->lambda = {:e};\nthis->mu = {:e};", lambda, mu),
                None => "this->lambda = computeLambda(this->young, this->nu);\n\
                         this->mu = computeMu(this->young, this->nu);"
                    .to_string(),
            }),
            ElasticProperties::Orthotropic(..) => Some(
                "this->D = computeOrthotropicStiffnessTensor(this->young1, this->young2, this->young3, \
                 this->nu12, this->nu23, this->nu13, this->mu12, this->mu23, this->mu13);"
                    .to_string(),
            ),
        }
    }

    /// Returns the residual contribution of the thermal expansion
    fn thermal_expansion_code(&self) -> Option<String> {
        match self.thermal_expansion.len() {
            0 => None,
            1 => Some("feel += (this->alpha)*(this->dT)*Stensor::Id();".to_string()),
            _ => Some(
                "feel += (this->dT)*Stensor::buildFromDiagonal(this->alpha1, this->alpha2, this->alpha3);"
                    .to_string(),
            ),
        }
    }

    /// Emits the plane stress treatment for a hypothesis
    fn plane_stress_code(&self, bd: &mut BehaviourDescription, ctx: &BrickContext, h: Hypothesis) -> Result<()> {
        let factor = self.stress_normalisation_factor();
        let mut code = format!(
            "feel(2) -= this->detozz;\nfetozz = (this->sig(2))/({});",
            factor
        );
        if ctx.solver.requires_analytical_jacobian() {
            code.push_str(&format!(
                "\ndfeel_ddetozz(2) = -1;\ndfetozz_ddeel = (this->theta)*(({})(2))/({});",
                self.stiffness_expression(),
                factor
            ));
        }
        bd.append_code(h, Slot::Integrator, self.name, &code)
    }
}

impl StressPotential for Hooke {
    fn name(&self) -> &'static str {
        self.name
    }

    fn options(&self) -> Vec<OptionDescription> {
        let mut options = vec![
            OptionDescription::new("young_modulus", "Young's modulus", OptionType::MaterialProperty)
                .requires(&["poisson_ratio"])
                .incompatible_with(&["young_modulus1"]),
            OptionDescription::new("poisson_ratio", "Poisson's ratio", OptionType::MaterialProperty)
                .requires(&["young_modulus"]),
        ];
        for (option, _, external_name) in &ORTHOTROPIC_PROPERTIES {
            let requires: Vec<&str> = ORTHOTROPIC_PROPERTIES
                .iter()
                .map(|(o, _, _)| *o)
                .filter(|o| o != option)
                .collect();
            options.push(
                OptionDescription::new(option, external_name, OptionType::MaterialProperty)
                    .requires(&requires)
                    .incompatible_with(&["young_modulus", "poisson_ratio"]),
            );
        }
        options.push(
            OptionDescription::new("thermal_expansion", "thermal expansion", OptionType::MaterialProperty)
                .incompatible_with(&["thermal_expansion1", "thermal_expansion2", "thermal_expansion3"]),
        );
        for (option, _, external_name) in &ORTHOTROPIC_THERMAL_EXPANSIONS {
            let requires: Vec<&str> = ORTHOTROPIC_THERMAL_EXPANSIONS
                .iter()
                .map(|(o, _, _)| *o)
                .filter(|o| o != option)
                .collect();
            options.push(OptionDescription::new(option, external_name, OptionType::MaterialProperty).requires(&requires));
        }
        options.push(OptionDescription::new(
            "thermal_expansion_reference_temperature",
            "reference temperature for the thermal expansion",
            OptionType::Real,
        ));
        options.push(OptionDescription::new(
            "plane_stress_support",
            "handles the plane stress modelling hypotheses",
            OptionType::Boolean,
        ));
        options
    }

    fn supported_hypotheses(&self, _bd: &BehaviourDescription, _solver: NonLinearSolver) -> Vec<Hypothesis> {
        Hypothesis::ALL
            .iter()
            .copied()
            .filter(|h| self.plane_stress_support || !h.is_plane_stress_like())
            .collect()
    }

    fn initialize(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext, options: &OptionMap) -> Result<()> {
        check_options(self.name, options, &self.options())?;
        self.parse_options(bd, options)?;
        bd.restrict_hypotheses(self.name, &self.supported_hypotheses(bd, ctx.solver))?;
        bd.add_variable(
            Hypothesis::Undefined,
            VariableKind::StateVariable,
            Variable::stensor("eel").with_external_name("ElasticStrain"),
            RegistrationStatus::Unregistered,
        )?;
        for h in bd.hypotheses() {
            if h.is_plane_stress_like() {
                bd.add_variable(
                    h,
                    VariableKind::IntegrationVariable,
                    Variable::scalar("etozz").with_external_name("AxialStrain"),
                    RegistrationStatus::Unregistered,
                )?;
            }
        }
        bd.reserve_name("computeElasticPrediction")?;
        bd.set_attribute(
            Hypothesis::Undefined,
            ATTRIBUTE_ELASTIC_PREDICTION,
            AttributeValue::Boolean(true),
            false,
        )?;
        self.declare_elastic_properties(bd)?;
        self.declare_thermal_expansion(bd)?;
        ctx.log(self.name, "elastic strain declared");
        Ok(())
    }

    fn complete_variable_declaration(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext) -> Result<()> {
        let h = Hypothesis::Undefined;
        bd.add_parameter(
            h,
            Variable::scalar("relative_value_for_the_equivalent_stress_lower_bound"),
            ParameterValue::Real(1e-12),
        )?;
        match self.elastic {
            ElasticProperties::Isotropic(..) => {
                bd.add_local_variable(h, Variable::scalar("lambda"))?;
                bd.add_local_variable(h, Variable::scalar("mu"))?;
            }
            ElasticProperties::Orthotropic(..) => {
                bd.add_local_variable(h, Variable::new(VariableType::Composite("Stensor4".to_string()), "D"))?;
            }
            ElasticProperties::StiffnessTensor => (),
        }
        if !self.thermal_expansion.is_empty() {
            bd.add_parameter(
                h,
                Variable::scalar("Tref").with_external_name("ThermalExpansionReferenceTemperature"),
                ParameterValue::Real(self.reference_temperature),
            )?;
        }
        ctx.log(self.name, "elastic coefficients declared");
        Ok(())
    }

    fn end_treatment(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext) -> Result<()> {
        for h in bd.hypotheses() {
            bd.check_integration_variable_position(self.name, h, "eel", 0)?;
        }
        let h = Hypothesis::Undefined;
        if let Some(code) = self.initialize_local_variables_code() {
            bd.append_code(h, Slot::InitializeLocalVariables, self.name, &code)?;
        }
        let damage = if self.damaged {
            "const auto d_ = min(this->d+(this->theta)*(this->dd), this->damage_threshold);\n"
        } else {
            ""
        };
        bd.append_code(
            h,
            Slot::ComputeStress,
            self.name,
            &format!(
                "{}this->sig = {};",
                damage,
                self.stress_expression("this->eel+(this->theta)*(this->deel)")
            ),
        )?;
        let damage = if self.damaged {
            "const auto d_ = min(this->d, this->damage_threshold);\n"
        } else {
            ""
        };
        bd.append_code(
            h,
            Slot::ComputeFinalStress,
            self.name,
            &format!("{}this->sig = {};", damage, self.stress_expression("this->eel")),
        )?;
        bd.append_code(h, Slot::Integrator, self.name, "feel -= this->deto;")?;
        if let Some(code) = self.thermal_expansion_code() {
            bd.append_code(h, Slot::Integrator, self.name, &code)?;
        }
        for hypothesis in bd.hypotheses() {
            if hypothesis.is_plane_stress_like() {
                self.plane_stress_code(bd, ctx, hypothesis)?;
            }
        }
        bd.append_code(
            h,
            Slot::ComputePredictionOperator,
            self.name,
            &format!("this->Dt = {};", self.stress_derivative_wrt_elastic_strain()),
        )?;
        let tangent = if ctx.solver.uses_jacobian() {
            format!(
                "Stensor4 iJe;\ngetPartialJacobianInvert(iJe);\nthis->Dt = ({})*iJe;",
                self.stress_derivative_wrt_elastic_strain()
            )
        } else {
            format!(
                "this->Dt = ({})*(this->inv_jacobian_eel_eel);",
                self.stress_derivative_wrt_elastic_strain()
            )
        };
        bd.append_code(h, Slot::ComputeTangentOperator, self.name, &tangent)?;
        ctx.log(self.name, "stress computation emitted");
        Ok(())
    }

    fn stress_normalisation_factor(&self) -> String {
        match self.elastic {
            ElasticProperties::StiffnessTensor => "this->D(0,0)".to_string(),
            ElasticProperties::Isotropic(..) => "this->young".to_string(),
            ElasticProperties::Orthotropic(..) => "this->young1".to_string(),
        }
    }

    fn equivalent_stress_lower_bound(&self) -> String {
        format!(
            "(this->relative_value_for_the_equivalent_stress_lower_bound)*({})",
            self.stress_normalisation_factor()
        )
    }

    fn elastic_prediction_code(&self) -> String {
        format!(
            "const auto sigel = computeElasticPrediction();\n// sigel = {}",
            self.stress_expression("this->eel+this->deto")
        )
    }

    fn stress_derivative_wrt_elastic_strain(&self) -> String {
        if self.damaged {
            format!("(1-d_)*({})", self.stiffness_expression())
        } else {
            self.stiffness_expression()
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Hooke;
    use crate::base::{BehaviourDescription, BehaviourType, Hypothesis, IntegrationScheme, OptionMap, OptionValue};
    use crate::base::{ParameterValue, Slot, Symmetry, VariableKind, ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR};
    use crate::bricks::{BrickContext, Registries, StressPotential};
    use crate::solver::NonLinearSolver;
    use crate::{Error, Result};
    use russell_lab::approx_eq;

    fn behaviour() -> BehaviourDescription {
        BehaviourDescription::new(
            "Test",
            BehaviourType::StandardStrainBasedBehaviour,
            IntegrationScheme::Implicit,
        )
    }

    fn isotropic(young: f64, poisson: f64) -> OptionMap {
        let mut options = OptionMap::new();
        options.insert("young_modulus".to_string(), OptionValue::Real(young));
        options.insert("poisson_ratio".to_string(), OptionValue::Real(poisson));
        options
    }

    fn run(hooke: &mut Hooke, bd: &mut BehaviourDescription, options: &OptionMap) -> Result<()> {
        let ctx = BrickContext::new(NonLinearSolver::NewtonRaphson, Registries::global()?);
        hooke.initialize(bd, &ctx, options)?;
        hooke.complete_variable_declaration(bd, &ctx)?;
        hooke.end_treatment(bd, &ctx)
    }

    #[test]
    fn constant_lame_coefficients_work() -> Result<()> {
        let mut bd = behaviour();
        let mut hooke = Hooke::new();
        run(&mut hooke, &mut bd, &isotropic(1.0, 0.25))?;
        let (lambda, mu) = hooke.lame_coefficients().unwrap();
        approx_eq(lambda, 0.4, 1e-15);
        approx_eq(mu, 0.4, 1e-15);
        let h = Hypothesis::Tridimensional;
        assert_eq!(bd.find_variable(h, "eel").unwrap().0, VariableKind::StateVariable);
        assert_eq!(bd.find_variable(h, "young").unwrap().0, VariableKind::Parameter);
        assert_eq!(bd.parameter_default(h, "nu"), Some(ParameterValue::Real(0.25)));
        assert_eq!(bd.find_variable(h, "lambda").unwrap().0, VariableKind::LocalVariable);
        assert!(bd.code(h, Slot::InitializeLocalVariables).unwrap().starts_with("this->lambda = "));
        assert_eq!(bd.code(h, Slot::Integrator).unwrap(), "feel -= this->deto;\n");
        assert!(!bd.flag(h, ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR));
        assert!(bd.is_name_reserved("computeElasticPrediction"));
        assert_eq!(hooke.stress_normalisation_factor(), "this->young");
        assert_eq!(
            hooke.equivalent_stress_lower_bound(),
            "(this->relative_value_for_the_equivalent_stress_lower_bound)*(this->young)"
        );
        Ok(())
    }

    #[test]
    fn plane_stress_works() -> Result<()> {
        let mut bd = behaviour();
        let mut hooke = Hooke::new();
        let mut options = isotropic(200e9, 0.3);
        options.insert("young_modulus".to_string(), OptionValue::from("200e9*(1-1e-4*T)"));
        run(&mut hooke, &mut bd, &options)?;
        assert_eq!(hooke.lame_coefficients(), None);
        let ps = Hypothesis::PlaneStress;
        assert_eq!(bd.integration_variable_position(ps, "etozz"), Some(1));
        assert_eq!(bd.integration_variable_position(Hypothesis::PlaneStrain, "etozz"), None);
        assert_eq!(bd.find_variable(ps, "young").unwrap().0, VariableKind::LocalVariable);
        let code = bd.code(ps, Slot::Integrator).unwrap();
        assert!(code.starts_with("feel -= this->deto;\nfeel(2) -= this->detozz;\n"));
        assert!(code.contains("dfetozz_ddeel"));
        assert_eq!(bd.code(Hypothesis::PlaneStrain, Slot::Integrator).unwrap(), "feel -= this->deto;\n");
        Ok(())
    }

    #[test]
    fn stiffness_tensor_and_thermal_expansion_work() -> Result<()> {
        let mut bd = behaviour();
        let mut hooke = Hooke::new();
        let mut options = OptionMap::new();
        options.insert("thermal_expansion".to_string(), OptionValue::Real(1e-5));
        options.insert("thermal_expansion_reference_temperature".to_string(), OptionValue::Real(273.15));
        options.insert("plane_stress_support".to_string(), OptionValue::Boolean(false));
        run(&mut hooke, &mut bd, &options)?;
        let h = Hypothesis::Tridimensional;
        assert!(hooke.requires_stiffness_tensor());
        assert!(bd.flag(h, ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR));
        assert_eq!(bd.parameter_default(h, "Tref"), Some(ParameterValue::Real(273.15)));
        assert!(!bd.is_hypothesis_handled(Hypothesis::PlaneStress));
        assert!(bd.code(h, Slot::Integrator).unwrap().contains("this->alpha"));
        assert_eq!(hooke.stress_normalisation_factor(), "this->D(0,0)");
        Ok(())
    }

    #[test]
    fn orthotropic_works() -> Result<()> {
        let mut bd = behaviour();
        bd.symmetry = Symmetry::Orthotropic;
        bd.elastic_symmetry = Symmetry::Orthotropic;
        let mut options = OptionMap::new();
        for (name, value) in [
            ("young_modulus1", 200e9),
            ("young_modulus2", 150e9),
            ("young_modulus3", 100e9),
            ("poisson_ratio12", 0.3),
            ("poisson_ratio23", 0.25),
            ("poisson_ratio13", 0.2),
            ("shear_modulus12", 70e9),
            ("shear_modulus23", 60e9),
            ("shear_modulus13", 50e9),
        ] {
            options.insert(name.to_string(), OptionValue::Real(value));
        }
        let mut hooke = Hooke::new();
        run(&mut hooke, &mut bd, &options)?;
        let h = Hypothesis::Tridimensional;
        assert_eq!(bd.parameter_default(h, "mu13"), Some(ParameterValue::Real(50e9)));
        assert!(bd.code(h, Slot::ComputeFinalStress).unwrap().contains("(this->D)*(this->eel)"));

        options.remove("shear_modulus13");
        let mut bd = behaviour();
        bd.elastic_symmetry = Symmetry::Orthotropic;
        assert_eq!(
            run(&mut Hooke::new(), &mut bd, &options).err(),
            Some(Error::MissingRequiredOption {
                brick: "Hooke".to_string(),
                option: "young_modulus1".to_string(),
                required: "shear_modulus13".to_string(),
            })
        );
        Ok(())
    }

    #[test]
    fn initialize_captures_errors() {
        let mut bd = behaviour();
        bd.elastic_symmetry = Symmetry::Orthotropic;
        assert_eq!(
            run(&mut Hooke::new(), &mut bd, &isotropic(1.0, 0.3)).err(),
            Some(Error::unsupported(
                "Hooke",
                "isotropic elastic properties given for an orthotropic elastic symmetry"
            ))
        );
        let mut bd = behaviour();
        assert_eq!(
            run(&mut Hooke::new(), &mut bd, &isotropic(1.0, 0.5)).err(),
            Some(Error::unsupported("Hooke", "the Poisson ratio must be in (-1, 0.5)"))
        );
        let mut options = OptionMap::new();
        options.insert("young_modulus".to_string(), OptionValue::Real(1.0));
        let mut bd = behaviour();
        assert_eq!(
            run(&mut Hooke::new(), &mut bd, &options).err(),
            Some(Error::MissingRequiredOption {
                brick: "Hooke".to_string(),
                option: "young_modulus".to_string(),
                required: "poisson_ratio".to_string(),
            })
        );
        let mut options = OptionMap::new();
        options.insert("thermal_expansion_reference_temperature".to_string(), OptionValue::Real(1.0));
        let mut bd = behaviour();
        assert_eq!(
            run(&mut Hooke::new(), &mut bd, &options).err(),
            Some(Error::MissingRequiredOption {
                brick: "Hooke".to_string(),
                option: "thermal_expansion_reference_temperature".to_string(),
                required: "thermal_expansion".to_string(),
            })
        );
    }
}
