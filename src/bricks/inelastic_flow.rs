use super::{BrickContext, FlowIncrement, IsotropicHardeningRule, KinematicHardeningRule, PorosityEvolutionAlgorithm};
use super::{StressCriterion, StressPotential};
use crate::base::{check_options, BehaviourDescription, Hypothesis, OptionDescription, OptionMap, OptionType};
use crate::base::{RegistrationStatus, Slot, Variable, VariableBounds, VariableKind, VariableType};
use crate::{Error, Result};

/// Defines the contract of an inelastic flow
///
/// Flows are identified by `id`: an empty string when the behaviour has a
/// single flow, the index of the flow otherwise. The suffix is appended to
/// every variable name declared by the flow.
pub trait InelasticFlow {
    /// Returns the name of the flow
    fn name(&self) -> &'static str;

    /// Returns the schema of the options
    fn options(&self) -> Vec<OptionDescription>;

    /// Validates the options and declares the equivalent plastic strain
    fn initialize(
        &mut self,
        bd: &mut BehaviourDescription,
        ctx: &BrickContext,
        options: &OptionMap,
        id: &str,
    ) -> Result<()>;

    /// Declares the parameters of the criteria, hardening rules and flow law
    fn complete_variable_declaration(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext, id: &str) -> Result<()>;

    /// Emits the residuals of the flow and its contribution to the elastic strain residual
    ///
    /// `porosity` is the porosity evolution algorithm if the porosity is an unknown of the behaviour.
    fn end_treatment(
        &mut self,
        bd: &mut BehaviourDescription,
        ctx: &BrickContext,
        potential: &dyn StressPotential,
        id: &str,
        porosity: Option<PorosityEvolutionAlgorithm>,
    ) -> Result<()>;

    /// Indicates that the flow makes the porosity grow
    fn is_coupled_with_porosity_evolution(&self) -> bool;

    /// Indicates that the flow is activated by the elastic prediction of the stress
    fn requires_activation_state(&self) -> bool;

    /// Returns the upper bound of the porosity imposed by the flow
    fn porosity_upper_bound(&self) -> Option<f64>;

    /// Returns the expression of the porosity growth due to the flow (if coupled)
    fn porosity_growth_code(&self, id: &str) -> Option<String>;

    /// Returns the derivatives of the porosity growth due to the flow (if coupled)
    ///
    /// The code updates the blocks `dff_ddp{id}`, `dff_ddf` and `dff_ddeel` of
    /// the porosity residual. `dsig_ddeel` is the derivative of the stress
    /// with respect to the elastic strain.
    fn porosity_growth_jacobian_code(&self, id: &str, dsig_ddeel: &str) -> Option<String>;

    /// Returns the porosity increment due to the flow given a converged inner solve
    fn next_estimate_contribution(&self, flow: &FlowIncrement, f: f64, df: f64) -> f64;
}

/// Defines the evolution law of the equivalent plastic strain of a standard flow
///
/// The law sees the equivalent stress `seq{id}`, the radius of the elastic
/// domain `R{id}` and its derivative `dR{id}_dp{id}` computed by the standard flow.
pub trait FlowLaw: Default + 'static {
    /// Returns the name of the flow
    fn name(&self) -> &'static str;

    /// Returns the schema of the options specific to the law
    fn options(&self) -> Vec<OptionDescription> {
        Vec::new()
    }

    /// Reads the options specific to the law
    fn parse(&mut self, _brick: &str, _options: &OptionMap) -> Result<()> {
        Ok(())
    }

    /// Declares the parameters of the law
    fn declare(&self, _bd: &mut BehaviourDescription, _brick: &str, _id: &str) -> Result<()> {
        Ok(())
    }

    /// Indicates that the law is activated by the elastic prediction of the stress
    fn requires_activation_state(&self) -> bool {
        false
    }

    /// Returns the residual of the equivalent plastic strain
    fn residual_code(&self, id: &str, normalisation: &str) -> String;

    /// Returns the derivatives of the residual of the equivalent plastic strain
    fn jacobian_code(&self, id: &str, normalisation: &str, dsig_ddeel: &str) -> String;

    /// Returns the derivative of the residual of the equivalent plastic strain with respect to the porosity
    ///
    /// The code sees `dseq{id}_df`, the derivative of the equivalent stress
    /// with respect to the porosity, and `dfm_ddf`, the derivative of the
    /// porosity seen by the criteria with respect to the porosity increment.
    fn porosity_jacobian_code(&self, id: &str, normalisation: &str) -> String;
}

/// Returns the name of a variable holding a parameter of a flow law
pub fn flow_law_parameter(law: &str, parameter: &str, id: &str) -> String {
    format!("{}_{}{}", law.to_lowercase(), parameter, id)
}

/// Implements an inelastic flow driven by a stress criterion with optional hardening rules
pub struct StandardInelasticFlow<L> {
    law: L,
    criterion: Option<StressCriterion>,
    flow_criterion: Option<StressCriterion>,
    isotropic_hardening: Vec<IsotropicHardeningRule>,
    kinematic_hardening: Vec<KinematicHardeningRule>,
    save_porosity_increase: bool,
}

impl<L: FlowLaw> StandardInelasticFlow<L> {
    /// Allocates a new instance
    pub fn new() -> Self {
        StandardInelasticFlow {
            law: L::default(),
            criterion: None,
            flow_criterion: None,
            isotropic_hardening: Vec::new(),
            kinematic_hardening: Vec::new(),
            save_porosity_increase: false,
        }
    }

    /// Returns the stress criterion (available after initialize)
    pub fn criterion(&self) -> Option<&StressCriterion> {
        self.criterion.as_ref()
    }

    /// Returns the isotropic hardening rules
    pub fn isotropic_hardening(&self) -> &[IsotropicHardeningRule] {
        &self.isotropic_hardening
    }

    /// Returns the kinematic hardening rules
    pub fn kinematic_hardening(&self) -> &[KinematicHardeningRule] {
        &self.kinematic_hardening
    }

    fn criteria(&self) -> impl Iterator<Item = &StressCriterion> {
        self.criterion.iter().chain(self.flow_criterion.iter())
    }

    /// Indicates that the flow direction depends on the porosity
    fn normal_depends_on_porosity(&self) -> bool {
        match (&self.flow_criterion, &self.criterion) {
            (Some(c), _) | (None, Some(c)) => c.is_coupled_with_porosity_evolution(),
            (None, None) => false,
        }
    }

    /// Returns the derivatives of the residuals with respect to the porosity
    ///
    /// Also defines `dn{id}_dsig` and `dn{id}_df` when the flow direction depends on the porosity.
    fn porosity_jacobian_code(&self, criterion: &StressCriterion, id: &str, stress: &str, normalisation: &str) -> String {
        let seps = format!("seps{id}");
        let derivatives = criterion.porosity_derivatives_code(
            "",
            id,
            stress,
            "f_",
            &seps,
            [
                format!("dseq{id}_df").as_str(),
                format!("d2seq{id}_dsigdsig").as_str(),
                format!("d2seq{id}_dsigdf").as_str(),
            ],
        );
        let mut code = match derivatives {
            Some(c) => format!("{}\n{}\n", c, self.law.porosity_jacobian_code(id, normalisation)),
            None => format!("const auto dseq{id}_df = real(0);\n"),
        };
        match &self.flow_criterion {
            Some(fc) => {
                let derivatives = fc.porosity_derivatives_code(
                    "fc_",
                    id,
                    stress,
                    "f_",
                    &seps,
                    [
                        format!("dseqf{id}_df").as_str(),
                        format!("dn{id}_dsig").as_str(),
                        format!("dn{id}_df").as_str(),
                    ],
                );
                if let Some(c) = derivatives {
                    code.push_str(&c);
                    code.push('\n');
                }
            }
            None => {
                if criterion.is_coupled_with_porosity_evolution() {
                    code.push_str(&format!(
                        "const auto& dn{id}_dsig = d2seq{id}_dsigdsig;\nconst auto& dn{id}_df = d2seq{id}_dsigdf;\n"
                    ));
                }
            }
        }
        if self.normal_depends_on_porosity() {
            code.push_str(&format!("dfeel_ddf += dfm_ddf*(this->dp{id})*dn{id}_df;"));
        }
        code.trim_end().to_string()
    }

    /// Returns the code computing the radius of the elastic domain at the given equivalent plastic strain
    fn hardening_code(&self, id: &str, p: &str) -> String {
        let mut code = format!("auto R{id} = real(0);\nauto dR{id}_dp{id} = real(0);\n");
        for (i, rule) in self.isotropic_hardening.iter().enumerate() {
            code.push_str(&rule.code(id, i, p));
            code.push('\n');
        }
        code
    }

    /// Returns the stress entering the criteria (shifted by the back-stresses)
    fn effective_stress_code(&self, id: &str, stress: &str) -> (String, String) {
        if self.kinematic_hardening.is_empty() {
            return (String::new(), stress.to_string());
        }
        let x: Vec<_> = self
            .kinematic_hardening
            .iter()
            .enumerate()
            .map(|(i, rule)| rule.back_stress(id, i))
            .collect();
        (
            format!("const auto X{id} = {};\n", x.join("+")),
            format!("{}-X{id}", stress),
        )
    }

    fn activation_code(&self, potential: &dyn StressPotential, criterion: &StressCriterion, id: &str) -> String {
        let (back_stress, stress) = self.effective_stress_code(id, "sigel");
        format!(
            "{{\n{}\nconst auto seps{id} = {};\n{}{}\n{}this->bpl{id} = seqel{id} > R{id};\n}}",
            potential.elastic_prediction_code(),
            potential.equivalent_stress_lower_bound(),
            back_stress,
            criterion.equivalent_stress_code(
                "",
                id,
                &stress,
                "this->f",
                &format!("seps{id}"),
                [format!("seqel{id}").as_str(), format!("nel{id}").as_str()]
            ),
            self.hardening_code(id, &format!("this->p{id}"))
        )
    }
}

impl<L: FlowLaw> InelasticFlow for StandardInelasticFlow<L> {
    fn name(&self) -> &'static str {
        self.law.name()
    }

    fn options(&self) -> Vec<OptionDescription> {
        let mut options = vec![
            OptionDescription::new("criterion", "stress criterion", OptionType::DataStructure).mandatory(),
            OptionDescription::new("flow_criterion", "flow criterion (non associated flow)", OptionType::DataStructure),
            OptionDescription::new("isotropic_hardening", "isotropic hardening rules", OptionType::DataStructures),
            OptionDescription::new("kinematic_hardening", "kinematic hardening rules", OptionType::DataStructures),
            OptionDescription::new(
                "save_porosity_increase",
                "save the porosity increase due to the flow",
                OptionType::Boolean,
            ),
        ];
        options.extend(self.law.options());
        options
    }

    fn initialize(
        &mut self,
        bd: &mut BehaviourDescription,
        ctx: &BrickContext,
        options: &OptionMap,
        id: &str,
    ) -> Result<()> {
        let name = self.name();
        check_options(name, options, &self.options())?;
        let structure = |key: &str| options.get(key).and_then(|v| v.as_structure());
        let structures = |key: &str| options.get(key).and_then(|v| v.as_structures()).unwrap_or_default();
        let criterion = match structure("criterion") {
            Some(s) => StressCriterion::from_structure(name, "criterion", &s)?,
            None => {
                return Err(Error::MissingOption {
                    brick: name.to_string(),
                    option: "criterion".to_string(),
                })
            }
        };
        criterion.check_symmetry(name, bd)?;
        if let Some(s) = structure("flow_criterion") {
            let flow_criterion = StressCriterion::from_structure(name, "flow_criterion", &s)?;
            flow_criterion.check_symmetry(name, bd)?;
            self.flow_criterion = Some(flow_criterion);
        }
        self.criterion = Some(criterion);
        self.isotropic_hardening = structures("isotropic_hardening")
            .iter()
            .map(|s| IsotropicHardeningRule::from_structure(name, s))
            .collect::<Result<Vec<_>>>()?;
        self.kinematic_hardening = structures("kinematic_hardening")
            .iter()
            .map(|s| KinematicHardeningRule::from_structure(name, s))
            .collect::<Result<Vec<_>>>()?;
        self.save_porosity_increase = options
            .get("save_porosity_increase")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if self.save_porosity_increase && !self.is_coupled_with_porosity_evolution() {
            return Err(Error::unsupported(
                name,
                "saving the porosity increase requires a criterion coupled with the porosity",
            ));
        }
        self.law.parse(name, options)?;
        let h = Hypothesis::Undefined;
        let p = format!("p{}", id);
        bd.add_state_variable(
            h,
            Variable::scalar(&p).with_external_name(&format!("EquivalentPlasticStrain{}", id)),
        )?;
        bd.set_bounds(h, &p, VariableBounds::lower(0.0))?;
        if self.requires_activation_state() {
            bd.add_local_variable(h, Variable::new(VariableType::Boolean, &format!("bpl{}", id)))?;
        }
        ctx.log(name, &format!("flow '{}' initialized", id));
        Ok(())
    }

    fn complete_variable_declaration(&mut self, bd: &mut BehaviourDescription, ctx: &BrickContext, id: &str) -> Result<()> {
        let name = self.name();
        if let Some(c) = &self.criterion {
            c.declare(bd, name, "", id)?;
        }
        if let Some(c) = &self.flow_criterion {
            c.declare(bd, name, "fc_", id)?;
        }
        for (i, rule) in self.isotropic_hardening.iter().enumerate() {
            rule.declare(bd, name, id, i)?;
        }
        for (i, rule) in self.kinematic_hardening.iter().enumerate() {
            rule.declare(bd, name, id, i)?;
        }
        if self.save_porosity_increase {
            bd.add_variable(
                Hypothesis::Undefined,
                VariableKind::AuxiliaryStateVariable,
                Variable::scalar(&format!("fg{}", id))
                    .with_external_name(&format!("PorosityIncreaseDueToInelasticFlow{}", id)),
                RegistrationStatus::Unregistered,
            )?;
            bd.add_local_variable(Hypothesis::Undefined, Variable::scalar(&format!("dfg{}", id)))?;
        }
        self.law.declare(bd, name, id)?;
        ctx.log(name, &format!("flow '{}' variables declared", id));
        Ok(())
    }

    fn end_treatment(
        &mut self,
        bd: &mut BehaviourDescription,
        ctx: &BrickContext,
        potential: &dyn StressPotential,
        id: &str,
        porosity: Option<PorosityEvolutionAlgorithm>,
    ) -> Result<()> {
        let name = self.name();
        let h = Hypothesis::Undefined;
        let criterion = match &self.criterion {
            Some(c) => c,
            None => return Err(Error::ordering(name, "the flow is not initialized")),
        };
        if self.requires_activation_state() {
            let code = self.activation_code(potential, criterion, id);
            bd.append_code(h, Slot::InitializeLocalVariables, name, &code)?;
        }
        let normalisation = potential.stress_normalisation_factor();
        let (back_stress, stress) = self.effective_stress_code(id, "sig");
        let mut code = format!(
            "const auto seps{id} = {};\n{}{}\n",
            potential.equivalent_stress_lower_bound(),
            back_stress,
            criterion.equivalent_stress_code(
                "",
                id,
                &stress,
                "f_",
                &format!("seps{id}"),
                [format!("seq{id}").as_str(), format!("dseq{id}_dsig").as_str()]
            )
        );
        match &self.flow_criterion {
            Some(fc) => {
                code.push_str(&fc.equivalent_stress_code(
                    "fc_",
                    id,
                    &stress,
                    "f_",
                    &format!("seps{id}"),
                    [format!("seqf{id}").as_str(), format!("n{id}").as_str()],
                ));
                code.push('\n');
            }
            None => code.push_str(&format!("const auto& n{id} = dseq{id}_dsig;\n")),
        }
        code.push_str(&self.hardening_code(id, &format!("this->p{id}+(this->theta)*(this->dp{id})")));
        code.push_str(&self.law.residual_code(id, &normalisation));
        code.push_str(&format!("\nfeel += (this->dp{id})*n{id};"));
        for (i, rule) in self.kinematic_hardening.iter().enumerate() {
            code.push('\n');
            code.push_str(&rule.residual_code(id, i, &format!("this->dp{id}"), &format!("n{id}")));
        }
        if self.save_porosity_increase && porosity.is_some() {
            if let Some(growth) = self.porosity_growth_code(id) {
                code.push_str(&format!("\nthis->dfg{id} = {};", growth));
            }
        }
        bd.append_code(h, Slot::Integrator, name, &code)?;
        if ctx.solver.requires_analytical_jacobian() {
            let dsig_ddeel = potential.stress_derivative_wrt_elastic_strain();
            let mut jacobian = format!("dfeel_ddp{id} = n{id};\n");
            jacobian.push_str(&self.law.jacobian_code(id, &normalisation, &dsig_ddeel));
            for (i, rule) in self.kinematic_hardening.iter().enumerate() {
                let j = rule.jacobian_code(id, i, &format!("this->dp{id}"));
                if !j.is_empty() {
                    jacobian.push('\n');
                    jacobian.push_str(&j);
                }
            }
            if porosity.is_some() {
                jacobian.push('\n');
                jacobian.push_str(&self.porosity_jacobian_code(criterion, id, &stress, &normalisation));
            }
            bd.append_code(h, Slot::Integrator, name, &jacobian)?;
        }
        if self.save_porosity_increase && porosity.is_some() {
            bd.append_code(
                h,
                Slot::UpdateAuxiliaryStateVariables,
                name,
                &format!("this->fg{id} += this->dfg{id};"),
            )?;
        }
        ctx.log(name, &format!("flow '{}' treatment ended", id));
        Ok(())
    }

    fn is_coupled_with_porosity_evolution(&self) -> bool {
        self.criteria().any(|c| c.is_coupled_with_porosity_evolution())
    }

    fn requires_activation_state(&self) -> bool {
        self.law.requires_activation_state()
    }

    fn porosity_upper_bound(&self) -> Option<f64> {
        self.criteria()
            .filter_map(|c| c.porosity_upper_bound())
            .fold(None, |acc: Option<f64>, b| Some(acc.map_or(b, |a| a.min(b))))
    }

    fn porosity_growth_code(&self, id: &str) -> Option<String> {
        if self.is_coupled_with_porosity_evolution() {
            Some(format!("(1-f_)*(this->dp{id})*trace(n{id})"))
        } else {
            None
        }
    }

    fn porosity_growth_jacobian_code(&self, id: &str, dsig_ddeel: &str) -> Option<String> {
        if !self.is_coupled_with_porosity_evolution() {
            return None;
        }
        let mut code = format!(
            "dff_ddp{id} -= (1-f_)*trace(n{id});\n\
             dff_ddf += dfm_ddf*(this->dp{id})*trace(n{id});"
        );
        if self.normal_depends_on_porosity() {
            code.push_str(&format!(
                "\ndff_ddf -= (1-f_)*dfm_ddf*(this->dp{id})*trace(dn{id}_df);\n\
                 dff_ddeel -= (this->theta)*(1-f_)*(this->dp{id})*(Stensor::Id()|(dn{id}_dsig*({dsig_ddeel})));"
            ));
        }
        Some(code)
    }

    fn next_estimate_contribution(&self, flow: &FlowIncrement, f: f64, df: f64) -> f64 {
        if self.is_coupled_with_porosity_evolution() {
            (1.0 - f - df) * flow.trace_n * flow.dp
        } else {
            0.0
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
