//! Offline decision heuristic, the cascade's terminal strategy.
//!
//! Deterministic keyword scans over the gathered material. Never fails; a
//! company with no signal at all still gets a usable (if thin) decision.

use orgsift_shared::{
    BusinessModel, IsoCategory, MarketFocus, Profile, collect_candidate_products,
    detect_keywords, filter_software_candidates, truncate_text,
};

use crate::context::DecisionContext;
use crate::parse::Decision;

const GENERIC_SUMMARY_CAP: usize = 500;
const ISO_SUMMARY_CAP: usize = 400;
const PRODUCT_CAP: usize = 5;

/// Headline keywords suggesting momentum.
const MOMENTUM_KEYWORDS: [&str; 4] = ["launch", "partnership", "funding", "growth"];

/// Ordered category keyword chains; first hit wins.
const CATEGORY_CHAINS: [(&[&str], IsoCategory); 5] = [
    (
        &["payment processor", "card processor", "merchant processor", "processing network"],
        IsoCategory::PaymentProcessor,
    ),
    (&["payment gateway", "gateway provider"], IsoCategory::PaymentGateway),
    (&["service provider", "psp"], IsoCategory::PaymentServiceProvider),
    (&["independent sales", "iso"], IsoCategory::IsoMsp),
    (&["acquirer", "acquiring", "merchant acquirer"], IsoCategory::Acquirer),
];

/// Ordered service keyword → label table.
const SERVICE_LABELS: [(&str, &str); 9] = [
    ("payment processing", "Payment processing"),
    ("gateway", "Payment gateway"),
    ("pos", "POS systems"),
    ("terminal", "Hardware/terminals"),
    ("fraud", "Fraud/Risk management"),
    ("merchant account", "Merchant account setup"),
    ("settlement", "Settlement & funding"),
    ("acquiring", "Acquiring services"),
    ("chargeback", "Chargeback management"),
];

const SEGMENT_LABELS: [(&str, &str); 7] = [
    ("retail", "Retail"),
    ("restaurant", "Restaurant"),
    ("ecommerce", "Ecommerce"),
    ("healthcare", "Healthcare"),
    ("hospitality", "Hospitality"),
    ("nonprofit", "Nonprofit"),
    ("education", "Education"),
];

const PARTNER_LABELS: [(&str, &str); 9] = [
    ("visa", "Visa"),
    ("mastercard", "Mastercard"),
    ("american express", "American Express"),
    ("discover", "Discover"),
    ("stripe", "Stripe"),
    ("adyen", "Adyen"),
    ("fiserv", "Fiserv"),
    ("fis", "FIS"),
    ("global payments", "Global Payments"),
];

const SOFTWARE_TERMS: [&str; 5] = ["portal", "platform", "software", "saas", "dashboard"];

/// Produce a decision from the gathered material alone.
pub fn heuristic_decision(profile: Profile, context: &DecisionContext) -> Decision {
    match profile {
        Profile::Software => generic_decision(context),
        Profile::IsoMsp => iso_decision(context),
    }
}

fn generic_decision(context: &DecisionContext) -> Decision {
    let news_text = context.news_titles();
    let posts_text = context.post_texts();

    let combined = [
        context.site_text.as_str(),
        context.serp_overview.as_str(),
        news_text.as_str(),
        posts_text.as_str(),
    ]
    .join(" ")
    .trim()
    .to_string();

    let summary = if combined.is_empty() {
        "No data gathered.".to_string()
    } else {
        truncate_text(&combined, GENERIC_SUMMARY_CAP)
    };

    let insights = if detect_keywords([news_text.as_str()], &MOMENTUM_KEYWORDS) {
        "Key headlines indicate momentum."
    } else {
        "Limited public signals detected."
    };

    let mut products = filter_software_candidates(collect_candidate_products([
        context.site_text.as_str(),
        posts_text.as_str(),
    ]));
    products.truncate(PRODUCT_CAP);

    Decision {
        summary,
        insights: insights.to_string(),
        has_software: !products.is_empty(),
        software_products: products,
        business_model: BusinessModel::Other,
        market_focus: MarketFocus::Other,
        ..Decision::default()
    }
}

fn iso_decision(context: &DecisionContext) -> Decision {
    let text = context.site_text.to_lowercase();

    let summary = if context.site_text.trim().is_empty() {
        "Summary unavailable.".to_string()
    } else {
        truncate_text(&context.site_text, ISO_SUMMARY_CAP)
    };

    let category = CATEGORY_CHAINS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(_, category)| *category)
        .unwrap_or(IsoCategory::None);

    let services: Vec<String> = SERVICE_LABELS
        .iter()
        .filter(|(kw, _)| text.contains(kw))
        .map(|(_, label)| label.to_string())
        .collect();
    let merchant_segments: Vec<String> = SEGMENT_LABELS
        .iter()
        .filter(|(kw, _)| text.contains(kw))
        .map(|(_, label)| label.to_string())
        .collect();
    let partnerships: Vec<String> = PARTNER_LABELS
        .iter()
        .filter(|(kw, _)| text.contains(kw))
        .map(|(_, label)| label.to_string())
        .collect();

    Decision {
        summary,
        insights: "Limited structured data detected.".to_string(),
        has_software: SOFTWARE_TERMS.iter().any(|term| text.contains(term)),
        software_products: Vec::new(),
        business_model: BusinessModel::Service,
        market_focus: MarketFocus::B2B,
        category,
        services,
        merchant_segments,
        partnerships,
    }
}
