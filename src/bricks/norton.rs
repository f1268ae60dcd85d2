use super::{flow_law_parameter, FlowLaw, StandardInelasticFlow};
use crate::base::{declare_material_property, BehaviourDescription, MaterialProperty, OptionDescription, OptionMap};
use crate::base::OptionType;
use crate::Result;

/// Implements Norton's viscoplastic law `vp = A ⟨(seq - R)/K⟩ⁿ`
#[derive(Clone, Debug, Default)]
pub struct NortonLaw {
    parameters: Vec<(&'static str, MaterialProperty)>,
}

/// Defines an inelastic flow following Norton's law
pub type Norton = StandardInelasticFlow<NortonLaw>;

impl FlowLaw for NortonLaw {
    fn name(&self) -> &'static str {
        "Norton"
    }

    fn options(&self) -> Vec<OptionDescription> {
        vec![
            OptionDescription::new("K", "Norton coefficient", OptionType::MaterialProperty).mandatory(),
            OptionDescription::new("n", "Norton exponent", OptionType::MaterialProperty).mandatory(),
            OptionDescription::new("A", "Norton factor", OptionType::MaterialProperty),
        ]
    }

    fn parse(&mut self, brick: &str, options: &OptionMap) -> Result<()> {
        self.parameters = vec![
            ("K", MaterialProperty::extract_mandatory(brick, options, "K")?),
            ("n", MaterialProperty::extract_mandatory(brick, options, "n")?),
            (
                "A",
                MaterialProperty::extract(brick, options, "A")?.unwrap_or(MaterialProperty::Constant(1.0)),
            ),
        ];
        Ok(())
    }

    fn declare(&self, bd: &mut BehaviourDescription, brick: &str, id: &str) -> Result<()> {
        for (parameter, value) in &self.parameters {
            let name = flow_law_parameter(self.name(), parameter, id);
            let external_name = format!("Norton{}{}", parameter, id);
            declare_material_property(bd, brick, &name, &external_name, Some(value))?;
        }
        Ok(())
    }

    fn residual_code(&self, id: &str, _normalisation: &str) -> String {
        let v = |p: &str| format!("this->{}", flow_law_parameter(self.name(), p, id));
        format!(
            "const auto vp{id} = ({})*pow(max(seq{id}-R{id}, real(0))/({}), {});\nfp{id} -= (this->dt)*vp{id};",
            v("A"),
            v("K"),
            v("n")
        )
    }

    fn jacobian_code(&self, id: &str, _normalisation: &str, dsig_ddeel: &str) -> String {
        let n = format!("this->{}", flow_law_parameter(self.name(), "n", id));
        format!(
            "const auto dvp{id} = ({n})*vp{id}/max(seq{id}-R{id}, seps{id});\n\
             dfp{id}_ddeel = -(this->dt)*(this->theta)*dvp{id}*(dseq{id}_dsig|({dsig_ddeel}));\n\
             dfp{id}_ddp{id} += (this->dt)*(this->theta)*dvp{id}*dR{id}_dp{id};"
        )
    }

    fn porosity_jacobian_code(&self, id: &str, _normalisation: &str) -> String {
        format!("dfp{id}_ddf = -(this->dt)*dvp{id}*dseq{id}_df*dfm_ddf;")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
