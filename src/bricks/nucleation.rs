use super::{BrickContext, FlowIncrement, PorosityUpdateState};
use crate::base::{check_options, declare_material_property, BehaviourDescription, Hypothesis, MaterialProperty};
use crate::base::{OptionDescription, OptionMap, OptionType, OptionValue, RegistrationStatus, Slot, Variable};
use crate::base::{VariableBounds, VariableKind};
use crate::{Error, Result};
use std::f64::consts::PI;

/// Defines the contract of a porosity nucleation model
///
/// Models are identified by `id` the same way as inelastic flows. The
/// driving flows are given by their ids.
pub trait NucleationModel {
    /// Returns the name of the model
    fn name(&self) -> &'static str;

    /// Returns the schema of the options
    fn options(&self) -> Vec<OptionDescription>;

    /// Validates the options
    fn initialize(
        &mut self,
        bd: &mut BehaviourDescription,
        ctx: &BrickContext,
        options: &OptionMap,
        id: &str,
    ) -> Result<()>;

    /// Declares the parameters, the nucleated porosity and its increment
    fn complete_variable_declaration(
        &mut self,
        bd: &mut BehaviourDescription,
        ctx: &BrickContext,
        id: &str,
        flow_ids: &[String],
    ) -> Result<()>;

    /// Emits the computation of the nucleated porosity increment and the update of the nucleated porosity
    ///
    /// The increment is computed by the integrator, after the flows.
    fn end_treatment(
        &mut self,
        bd: &mut BehaviourDescription,
        ctx: &BrickContext,
        id: &str,
        flow_ids: &[String],
    ) -> Result<()>;

    /// Returns the expression of the nucleated porosity over the time step
    fn porosity_increment_code(&self, id: &str, flow_ids: &[String]) -> Result<String>;

    /// Returns the derivatives of the nucleated porosity increment
    ///
    /// The code updates the blocks of the porosity residual. `dsig_ddeel` is
    /// the derivative of the stress with respect to the elastic strain.
    fn porosity_increment_jacobian_code(&self, id: &str, flow_ids: &[String], dsig_ddeel: &str) -> Result<String>;

    /// Returns the bound on the cumulated nucleated porosity
    fn maximum_nucleated_porosity(&self) -> Option<f64>;

    /// Returns the porosity nucleated over the time step given a converged inner solve
    ///
    /// `nucleated` is the porosity nucleated by this model before the time step.
    /// This function has no side effect.
    fn next_estimate_of_the_porosity_increment(&self, state: &PorosityUpdateState, nucleated: f64) -> Result<f64>;
}

/// Returns the names of the equivalent stresses at the beginning and at the end of the time step
///
/// These variables are declared by the nucleation models driven by the
/// equivalent stress of the flow `fid`.
pub fn equivalent_stress_history(fid: &str, id: &str) -> (String, String) {
    (format!("seq{fid}_bts{id}"), format!("seq{fid}_ets{id}"))
}

/// Defines the nucleation rate of a standard nucleation model
pub trait NucleationLaw: Default + 'static {
    /// Returns the name of the model
    fn name(&self) -> &'static str;

    /// Returns the parameters (all mandatory material properties)
    fn parameters(&self) -> &'static [&'static str];

    /// Indicates that the law is driven by the equivalent stress of the flows
    ///
    /// The model then stores the equivalent stress at the beginning of the
    /// time step and estimates its value at the end of the time step (see
    /// [equivalent_stress_history]).
    fn is_stress_based(&self) -> bool {
        false
    }

    /// Returns the expression of the porosity nucleated by one flow
    ///
    /// `v` returns the expression of a parameter.
    fn increment_code(&self, v: &dyn Fn(&str) -> String, fid: &str, id: &str) -> String;

    /// Returns the derivatives of the porosity residual due to the porosity nucleated by one flow
    fn jacobian_code(&self, v: &dyn Fn(&str) -> String, fid: &str, id: &str, dsig_ddeel: &str) -> String;

    /// Returns the porosity nucleated by one flow (parameters in declaration order)
    fn increment(&self, values: &[f64], flow: &FlowIncrement) -> f64;
}

/// Implements a nucleation model driven by a selection of inelastic flows
pub struct StandardNucleationModel<L> {
    law: L,
    parameters: Vec<(&'static str, MaterialProperty)>,
    fmax: Option<f64>,
    flows: Option<Vec<usize>>,
}

impl<L: NucleationLaw> StandardNucleationModel<L> {
    /// Allocates a new instance
    pub fn new() -> Self {
        StandardNucleationModel {
            law: L::default(),
            parameters: Vec::new(),
            fmax: None,
            flows: None,
        }
    }

    fn variable_name(&self, parameter: &str, id: &str) -> String {
        format!("{}_{}{}", self.law.name().to_lowercase(), parameter, id)
    }

    /// Returns the ids of the driving flows
    fn selected_flows<'a>(&self, flow_ids: &'a [String]) -> Result<Vec<(usize, &'a String)>> {
        match &self.flows {
            None => Ok(flow_ids.iter().enumerate().collect()),
            Some(selection) => selection
                .iter()
                .map(|i| match flow_ids.get(*i) {
                    Some(fid) => Ok((*i, fid)),
                    None => Err(Error::unsupported(
                        self.name(),
                        format!("invalid inelastic flow index {} ({} flows declared)", i, flow_ids.len()),
                    )),
                })
                .collect(),
        }
    }

    /// Returns the admissible nucleated porosity increment
    fn remaining_porosity_code(fmax: f64, id: &str) -> String {
        format!("max({:e}-this->fn{id}, real(0))", fmax)
    }
}

impl<L: NucleationLaw> NucleationModel for StandardNucleationModel<L> {
    fn name(&self) -> &'static str {
        self.law.name()
    }

    fn options(&self) -> Vec<OptionDescription> {
        let mut options: Vec<_> = self
            .law
            .parameters()
            .iter()
            .map(|p| OptionDescription::new(p, p, OptionType::MaterialProperty).mandatory())
            .collect();
        options.push(OptionDescription::new(
            "fmax",
            "maximum value of the nucleated porosity",
            OptionType::Real,
        ));
        options.push(OptionDescription::new(
            "inelastic_flows",
            "indices of the inelastic flows driving the nucleation",
            OptionType::ArrayOfIndices,
        ));
        options
    }

    fn initialize(
        &mut self,
        _bd: &mut BehaviourDescription,
        ctx: &BrickContext,
        options: &OptionMap,
        id: &str,
    ) -> Result<()> {
        let name = self.name();
        check_options(name, options, &self.options())?;
        self.parameters = self
            .law
            .parameters()
            .iter()
            .map(|p| Ok((*p, MaterialProperty::extract_mandatory(name, options, p)?)))
            .collect::<Result<Vec<_>>>()?;
        if let Some(fmax) = options.get("fmax").and_then(|v| v.as_real()) {
            if fmax <= 0.0 || fmax > 1.0 {
                return Err(Error::unsupported(name, "fmax must be in (0, 1]"));
            }
            self.fmax = Some(fmax);
        }
        if let Some(OptionValue::Array(values)) = options.get("inelastic_flows") {
            self.flows = Some(
                values
                    .iter()
                    .filter_map(|v| v.as_integer())
                    .map(|i| i as usize)
                    .collect(),
            );
        }
        ctx.log(name, &format!("nucleation model '{}' initialized", id));
        Ok(())
    }

    fn complete_variable_declaration(
        &mut self,
        bd: &mut BehaviourDescription,
        ctx: &BrickContext,
        id: &str,
        flow_ids: &[String],
    ) -> Result<()> {
        let name = self.name();
        for (parameter, value) in &self.parameters {
            let external_name = format!("{}Nucleation{}{}", name, parameter, id);
            declare_material_property(bd, name, &self.variable_name(parameter, id), &external_name, Some(value))?;
        }
        let h = Hypothesis::Undefined;
        let fname = format!("fn{}", id);
        bd.add_variable(
            h,
            VariableKind::AuxiliaryStateVariable,
            Variable::scalar(&fname).with_external_name(&format!("NucleatedPorosity{}{}", name, id)),
            RegistrationStatus::Unregistered,
        )?;
        bd.set_bounds(h, &fname, VariableBounds::between(0.0, self.fmax.unwrap_or(1.0)))?;
        bd.add_local_variable(h, Variable::scalar(&format!("dfn{}", id)))?;
        if self.law.is_stress_based() {
            for (_, fid) in self.selected_flows(flow_ids)? {
                let (bts, ets) = equivalent_stress_history(fid, id);
                bd.add_variable(
                    h,
                    VariableKind::AuxiliaryStateVariable,
                    Variable::scalar(&bts).with_external_name(&format!("{}EquivalentStress{}{}", name, fid, id)),
                    RegistrationStatus::Unregistered,
                )?;
                bd.add_local_variable(h, Variable::scalar(&ets))?;
            }
        }
        ctx.log(name, &format!("nucleation model '{}' variables declared", id));
        Ok(())
    }

    fn end_treatment(
        &mut self,
        bd: &mut BehaviourDescription,
        ctx: &BrickContext,
        id: &str,
        flow_ids: &[String],
    ) -> Result<()> {
        let name = self.name();
        let h = Hypothesis::Undefined;
        let selected = self.selected_flows(flow_ids)?;
        let mut integrator = String::new();
        let mut update = format!("this->fn{id} += this->dfn{id};");
        if self.law.is_stress_based() {
            // seq{fid} is evaluated at the middle of the time step
            for (_, fid) in &selected {
                let (bts, ets) = equivalent_stress_history(fid, id);
                integrator.push_str(&format!(
                    "this->{ets} = this->{bts}+(seq{fid}-this->{bts})/(this->theta);\n"
                ));
                update.push_str(&format!("\nthis->{bts} = this->{ets};"));
            }
        }
        let v = |p: &str| format!("this->{}", self.variable_name(p, id));
        let terms: Vec<_> = selected
            .iter()
            .map(|(_, fid)| format!("({})", self.law.increment_code(&v, fid, id)))
            .collect();
        let sum = if terms.is_empty() {
            "real(0)".to_string()
        } else {
            terms.join("+")
        };
        integrator.push_str(&format!("this->dfn{id} = {};", sum));
        if let Some(fmax) = self.fmax {
            let remaining = Self::remaining_porosity_code(fmax, id);
            integrator.push_str(&format!(
                "\nconst auto dfn{id}_bounded = this->dfn{id} > {remaining};\n\
                 if(dfn{id}_bounded){{\nthis->dfn{id} = {remaining};\n}}"
            ));
        }
        bd.append_code(h, Slot::Integrator, name, &integrator)?;
        bd.append_code(h, Slot::UpdateAuxiliaryStateVariables, name, &update)?;
        ctx.log(name, &format!("nucleation model '{}' treatment ended", id));
        Ok(())
    }

    fn porosity_increment_code(&self, id: &str, flow_ids: &[String]) -> Result<String> {
        self.selected_flows(flow_ids)?;
        Ok(format!("this->dfn{id}"))
    }

    fn porosity_increment_jacobian_code(&self, id: &str, flow_ids: &[String], dsig_ddeel: &str) -> Result<String> {
        let v = |p: &str| format!("this->{}", self.variable_name(p, id));
        let code: Vec<_> = self
            .selected_flows(flow_ids)?
            .iter()
            .map(|(_, fid)| self.law.jacobian_code(&v, fid, id, dsig_ddeel))
            .collect();
        let code = code.join("\n");
        Ok(match self.fmax {
            // the bounded increment does not depend on the unknowns
            Some(_) => format!("if(!dfn{id}_bounded){{\n{}\n}}", code),
            None => code,
        })
    }

    fn maximum_nucleated_porosity(&self) -> Option<f64> {
        self.fmax
    }

    fn next_estimate_of_the_porosity_increment(&self, state: &PorosityUpdateState, nucleated: f64) -> Result<f64> {
        let values = self
            .parameters
            .iter()
            .map(|(p, mp)| {
                mp.constant_value().ok_or_else(|| {
                    Error::Numerical(format!("{}: parameter '{}' is not a constant", self.name(), p))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let ids: Vec<String> = (0..state.flows.len()).map(|i| i.to_string()).collect();
        let mut dfn = 0.0;
        for (i, _) in self.selected_flows(&ids)? {
            dfn += self.law.increment(&values, &state.flows[i]);
        }
        Ok(match self.fmax {
            Some(fmax) => f64::min(dfn, f64::max(fmax - nucleated, 0.0)),
            None => dfn,
        })
    }
}

/// Returns the Gaussian density used by the Chu-Needleman models
fn gaussian(x: f64, mean: f64, deviation: f64) -> f64 {
    let r = (x - mean) / deviation;
    f64::exp(-0.5 * r * r) / (deviation * f64::sqrt(2.0 * PI))
}

/// Implements the strain-based Chu-Needleman nucleation
///
/// `dfn = An gauss(p, pn, sn) dp`, the density being evaluated at the middle of the time step.
#[derive(Clone, Debug, Default)]
pub struct ChuNeedlemanLaw;

/// Defines the strain-based Chu-Needleman nucleation model
pub type ChuNeedlemanNucleation = StandardNucleationModel<ChuNeedlemanLaw>;

impl NucleationLaw for ChuNeedlemanLaw {
    fn name(&self) -> &'static str {
        "ChuNeedleman"
    }

    fn parameters(&self) -> &'static [&'static str] {
        &["An", "pn", "sn"]
    }

    fn increment_code(&self, v: &dyn Fn(&str) -> String, fid: &str, _id: &str) -> String {
        format!(
            "({an})/(({sn})*sqrt(2*M_PI))*exp(-power<2>((this->p{fid}+(this->dp{fid})/2-({pn}))/({sn}))/2)*(this->dp{fid})",
            an = v("An"),
            pn = v("pn"),
            sn = v("sn"),
        )
    }

    fn jacobian_code(&self, v: &dyn Fn(&str) -> String, fid: &str, _id: &str, _dsig_ddeel: &str) -> String {
        format!(
            "dff_ddp{fid} -= ({an})/(({sn})*sqrt(2*M_PI))*exp(-power<2>((this->p{fid}+(this->dp{fid})/2-({pn}))/({sn}))/2)*\
             (1-(this->p{fid}+(this->dp{fid})/2-({pn}))*(this->dp{fid})/(2*power<2>({sn})));",
            an = v("An"),
            pn = v("pn"),
            sn = v("sn"),
        )
    }

    fn increment(&self, values: &[f64], flow: &FlowIncrement) -> f64 {
        let (an, pn, sn) = (values[0], values[1], values[2]);
        an * gaussian(flow.p + flow.dp / 2.0, pn, sn) * flow.dp
    }
}

/// Implements the power-law nucleation `fn = An ⟨p - pmin⟩ᵐ`
#[derive(Clone, Debug, Default)]
pub struct PowerLawLaw;

/// Defines the power-law nucleation model
pub type PowerLawNucleation = StandardNucleationModel<PowerLawLaw>;

impl NucleationLaw for PowerLawLaw {
    fn name(&self) -> &'static str {
        "PowerLaw"
    }

    fn parameters(&self) -> &'static [&'static str] {
        &["An", "pmin", "m"]
    }

    fn increment_code(&self, v: &dyn Fn(&str) -> String, fid: &str, _id: &str) -> String {
        format!(
            "({an})*(pow(max(this->p{fid}+this->dp{fid}-({pmin}), real(0)), {m})-pow(max(this->p{fid}-({pmin}), real(0)), {m}))",
            an = v("An"),
            pmin = v("pmin"),
            m = v("m"),
        )
    }

    fn jacobian_code(&self, v: &dyn Fn(&str) -> String, fid: &str, _id: &str, _dsig_ddeel: &str) -> String {
        format!(
            "if(this->p{fid}+this->dp{fid} > {pmin}){{\n\
             dff_ddp{fid} -= ({an})*({m})*pow(this->p{fid}+this->dp{fid}-({pmin}), ({m})-1);\n\
             }}",
            an = v("An"),
            pmin = v("pmin"),
            m = v("m"),
        )
    }

    fn increment(&self, values: &[f64], flow: &FlowIncrement) -> f64 {
        let (an, pmin, m) = (values[0], values[1], values[2]);
        let g = |p: f64| f64::powf(f64::max(p - pmin, 0.0), m);
        an * (g(flow.p + flow.dp) - g(flow.p))
    }
}

/// Implements the stress-based Chu-Needleman nucleation
///
/// `dfn = An gauss(seq + dseq, sigm, sn) ⟨dseq⟩` where `seq` is the equivalent
/// stress at the beginning of the time step: only increasing stresses nucleate voids.
#[derive(Clone, Debug, Default)]
pub struct ChuNeedlemanStressBasedLaw;

/// Defines the stress-based Chu-Needleman nucleation model
pub type ChuNeedlemanStressBasedNucleation = StandardNucleationModel<ChuNeedlemanStressBasedLaw>;

impl NucleationLaw for ChuNeedlemanStressBasedLaw {
    fn name(&self) -> &'static str {
        "ChuNeedlemanStressBased"
    }

    fn parameters(&self) -> &'static [&'static str] {
        &["An", "sigm", "sn"]
    }

    fn is_stress_based(&self) -> bool {
        true
    }

    fn increment_code(&self, v: &dyn Fn(&str) -> String, fid: &str, id: &str) -> String {
        let (bts, ets) = equivalent_stress_history(fid, id);
        format!(
            "({an})/(({sn})*sqrt(2*M_PI))*exp(-power<2>((this->{ets}-({sigm}))/({sn}))/2)*max(this->{ets}-this->{bts}, real(0))",
            an = v("An"),
            sigm = v("sigm"),
            sn = v("sn"),
        )
    }

    fn jacobian_code(&self, v: &dyn Fn(&str) -> String, fid: &str, id: &str, dsig_ddeel: &str) -> String {
        let (bts, ets) = equivalent_stress_history(fid, id);
        format!(
            "if(this->{ets} > this->{bts}){{\n\
             const auto r = (this->{ets}-({sigm}))/({sn});\n\
             const auto dfn_dseq = ({an})/(({sn})*sqrt(2*M_PI))*exp(-r*r/2)*(1-r*(this->{ets}-this->{bts})/({sn}));\n\
             dff_ddeel -= dfn_dseq*(dseq{fid}_dsig|({dsig_ddeel}));\n\
             dff_ddf -= dfn_dseq*dseq{fid}_df*dfm_ddf/(this->theta);\n\
             }}",
            an = v("An"),
            sigm = v("sigm"),
            sn = v("sn"),
        )
    }

    fn increment(&self, values: &[f64], flow: &FlowIncrement) -> f64 {
        let (an, sigm, sn) = (values[0], values[1], values[2]);
        if flow.dseq <= 0.0 {
            return 0.0;
        }
        an * gaussian(flow.seq + flow.dseq, sigm, sn) * flow.dseq
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
