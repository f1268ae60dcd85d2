use super::{FlowLaw, StandardInelasticFlow};

/// Implements the rate-independent plastic flow
///
/// The consistency condition `seq - R = 0` is only enforced when the elastic
/// prediction lies outside the elastic domain; otherwise `dp` stays null.
#[derive(Clone, Debug, Default)]
pub struct PlasticLaw;

/// Defines the rate-independent plastic flow
pub type Plastic = StandardInelasticFlow<PlasticLaw>;

impl FlowLaw for PlasticLaw {
    fn name(&self) -> &'static str {
        "Plastic"
    }

    fn requires_activation_state(&self) -> bool {
        true
    }

    fn residual_code(&self, id: &str, normalisation: &str) -> String {
        format!("if(this->bpl{id}){{\nfp{id} = (seq{id}-R{id})/({normalisation});\n}}")
    }

    fn jacobian_code(&self, id: &str, normalisation: &str, dsig_ddeel: &str) -> String {
        format!(
            "if(this->bpl{id}){{\n\
             dfp{id}_ddeel = (this->theta)*(dseq{id}_dsig|({dsig_ddeel}))/({normalisation});\n\
             dfp{id}_ddp{id} = -(this->theta)*dR{id}_dp{id}/({normalisation});\n\
             }}"
        )
    }

    fn porosity_jacobian_code(&self, id: &str, normalisation: &str) -> String {
        format!("if(this->bpl{id}){{\ndfp{id}_ddf = dseq{id}_df*dfm_ddf/({normalisation});\n}}")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::PlasticLaw;
    use crate::bricks::FlowLaw;

    #[test]
    fn code_works() {
        let law = PlasticLaw;
        assert_eq!(law.name(), "Plastic");
        assert!(law.requires_activation_state());
        assert!(law.options().is_empty());
        assert_eq!(
            law.residual_code("2", "this->young"),
            "if(this->bpl2){\nfp2 = (seq2-R2)/(this->young);\n}"
        );
        assert_eq!(
            law.jacobian_code("", "this->young", "D"),
            "if(this->bpl){\n\
             dfp_ddeel = (this->theta)*(dseq_dsig|(D))/(this->young);\n\
             dfp_ddp = -(this->theta)*dR_dp/(this->young);\n\
             }"
        );
        assert_eq!(
            law.porosity_jacobian_code("1", "this->young"),
            "if(this->bpl1){\ndfp1_ddf = dseq1_df*dfm_ddf/(this->young);\n}"
        );
    }
}
