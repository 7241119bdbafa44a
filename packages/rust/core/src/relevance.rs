//! Per-profile relevance rules. Pure: identical inputs always yield the
//! identical verdict.

use orgsift_llm::Decision;
use orgsift_shared::{BusinessModel, IsoCategory, MarketFocus, Profile};

/// Service terms that qualify an ISO/MSP company as in-scope.
const ISO_SERVICE_TERMS: [&str; 8] = [
    "processing",
    "merchant",
    "gateway",
    "pos",
    "risk",
    "settlement",
    "acquiring",
    "chargeback",
];

/// Decide whether the enriched company is relevant for the profile.
/// `has_software` is the fused verdict, not the raw decision flag.
pub fn evaluate_relevance(profile: Profile, decision: &Decision, has_software: bool) -> bool {
    match profile {
        Profile::Software => {
            has_software
                && matches!(
                    decision.business_model,
                    BusinessModel::Product | BusinessModel::Platform | BusinessModel::Hybrid
                )
                && matches!(
                    decision.market_focus,
                    MarketFocus::B2B | MarketFocus::B2B2C | MarketFocus::B2G
                )
        }
        Profile::IsoMsp => {
            let in_scope_category = matches!(
                decision.category,
                IsoCategory::PaymentProcessor
                    | IsoCategory::PaymentServiceProvider
                    | IsoCategory::IsoMsp
                    | IsoCategory::Acquirer
                    | IsoCategory::Hybrid
            );
            let services_text = decision.services.join(" ").to_lowercase();
            in_scope_category
                && has_software
                && ISO_SERVICE_TERMS.iter().any(|term| services_text.contains(term))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn software_requires_flag_model_and_focus() {
        let decision = Decision {
            business_model: BusinessModel::Platform,
            market_focus: MarketFocus::B2B,
            ..Decision::default()
        };
        assert!(evaluate_relevance(Profile::Software, &decision, true));
        assert!(!evaluate_relevance(Profile::Software, &decision, false));

        let service = Decision {
            business_model: BusinessModel::Service,
            market_focus: MarketFocus::B2B,
            ..Decision::default()
        };
        assert!(!evaluate_relevance(Profile::Software, &service, true));

        let consumer = Decision {
            business_model: BusinessModel::Product,
            market_focus: MarketFocus::B2C,
            ..Decision::default()
        };
        assert!(!evaluate_relevance(Profile::Software, &consumer, true));
    }

    #[test]
    fn iso_requires_category_software_and_service_terms() {
        let decision = Decision {
            category: IsoCategory::PaymentProcessor,
            services: vec!["Payment processing".into()],
            ..Decision::default()
        };
        assert!(evaluate_relevance(Profile::IsoMsp, &decision, true));
        assert!(!evaluate_relevance(Profile::IsoMsp, &decision, false));

        let gateway_only = Decision {
            category: IsoCategory::PaymentGateway,
            services: vec!["Payment processing".into()],
            ..Decision::default()
        };
        assert!(!evaluate_relevance(Profile::IsoMsp, &gateway_only, true));

        let off_topic_services = Decision {
            category: IsoCategory::Acquirer,
            services: vec!["Consulting".into()],
            ..Decision::default()
        };
        assert!(!evaluate_relevance(Profile::IsoMsp, &off_topic_services, true));
    }

    #[test]
    fn relevance_is_deterministic() {
        let decision = Decision {
            category: IsoCategory::IsoMsp,
            services: vec!["Merchant account setup".into()],
            ..Decision::default()
        };
        let first = evaluate_relevance(Profile::IsoMsp, &decision, true);
        for _ in 0..3 {
            assert_eq!(evaluate_relevance(Profile::IsoMsp, &decision, true), first);
        }
        assert!(first);
    }
}
