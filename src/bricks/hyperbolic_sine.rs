use super::{flow_law_parameter, FlowLaw, StandardInelasticFlow};
use crate::base::{declare_material_property, BehaviourDescription, MaterialProperty, OptionDescription, OptionMap};
use crate::base::OptionType;
use crate::Result;

/// Implements the viscoplastic law `vp = A sinh(⟨seq - R⟩/K)`
#[derive(Clone, Debug, Default)]
pub struct HyperbolicSineLaw {
    parameters: Vec<(&'static str, MaterialProperty)>,
}

/// Defines an inelastic flow following a hyperbolic sine law
pub type HyperbolicSine = StandardInelasticFlow<HyperbolicSineLaw>;

impl FlowLaw for HyperbolicSineLaw {
    fn name(&self) -> &'static str {
        "HyperbolicSine"
    }

    fn options(&self) -> Vec<OptionDescription> {
        vec![
            OptionDescription::new("A", "strain rate factor", OptionType::MaterialProperty).mandatory(),
            OptionDescription::new("K", "stress normalisation", OptionType::MaterialProperty).mandatory(),
        ]
    }

    fn parse(&mut self, brick: &str, options: &OptionMap) -> Result<()> {
        self.parameters = vec![
            ("A", MaterialProperty::extract_mandatory(brick, options, "A")?),
            ("K", MaterialProperty::extract_mandatory(brick, options, "K")?),
        ];
        Ok(())
    }

    fn declare(&self, bd: &mut BehaviourDescription, brick: &str, id: &str) -> Result<()> {
        for (parameter, value) in &self.parameters {
            let name = flow_law_parameter(self.name(), parameter, id);
            let external_name = format!("HyperbolicSine{}{}", parameter, id);
            declare_material_property(bd, brick, &name, &external_name, Some(value))?;
        }
        Ok(())
    }

    fn residual_code(&self, id: &str, _normalisation: &str) -> String {
        let v = |p: &str| format!("this->{}", flow_law_parameter(self.name(), p, id));
        format!(
            "const auto vp{id} = ({})*sinh(max(seq{id}-R{id}, real(0))/({}));\nfp{id} -= (this->dt)*vp{id};",
            v("A"),
            v("K")
        )
    }

    fn jacobian_code(&self, id: &str, _normalisation: &str, dsig_ddeel: &str) -> String {
        let v = |p: &str| format!("this->{}", flow_law_parameter(self.name(), p, id));
        format!(
            "const auto dvp{id} = ({})*cosh(max(seq{id}-R{id}, real(0))/({}))/({});\n\
             dfp{id}_ddeel = -(this->dt)*(this->theta)*dvp{id}*(dseq{id}_dsig|({dsig_ddeel}));\n\
             dfp{id}_ddp{id} += (this->dt)*(this->theta)*dvp{id}*dR{id}_dp{id};",
            v("A"),
            v("K"),
            v("K")
        )
    }

    fn porosity_jacobian_code(&self, id: &str, _normalisation: &str) -> String {
        format!("dfp{id}_ddf = -(this->dt)*dvp{id}*dseq{id}_df*dfm_ddf;")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
