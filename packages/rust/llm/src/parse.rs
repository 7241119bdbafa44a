//! Decision parsing and normalization.
//!
//! Providers are asked for strict JSON but drift anyway: code fences,
//! renamed keys, scalars where lists belong. Normalization tolerates the
//! known variants; in strict mode an undecodable payload fails the provider
//! so the cascade can move on.

use serde_json::{Map, Value};

use orgsift_shared::{
    BusinessModel, IsoCategory, MarketFocus, OrgsiftError, Profile, Result,
    filter_software_candidates,
};

/// Cap on every list field of a decision.
const LIST_CAP: usize = 8;

/// Normalized reconciliation verdict for one company.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub summary: String,
    pub insights: String,
    pub has_software: bool,
    pub software_products: Vec<String>,
    pub business_model: BusinessModel,
    pub market_focus: MarketFocus,

    // ISO/MSP profile fields; empty defaults for the software profile.
    pub category: IsoCategory,
    pub services: Vec<String>,
    pub merchant_segments: Vec<String>,
    pub partnerships: Vec<String>,
}

impl Default for Decision {
    fn default() -> Self {
        Self {
            summary: String::new(),
            insights: String::new(),
            has_software: false,
            software_products: Vec::new(),
            business_model: BusinessModel::Other,
            market_focus: MarketFocus::Other,
            category: IsoCategory::None,
            services: Vec::new(),
            merchant_segments: Vec::new(),
            partnerships: Vec::new(),
        }
    }
}

/// Parse provider output into a [`Decision`].
///
/// Strict mode turns an undecodable payload into a `Parse` error; lenient
/// mode normalizes from an empty payload, yielding the default decision.
pub fn parse_decision(profile: Profile, raw: &str, strict: bool) -> Result<Decision> {
    let stripped = strip_code_fences(raw);
    let payload: Map<String, Value> = match serde_json::from_str(&stripped) {
        Ok(Value::Object(map)) => map,
        Ok(_) if strict => {
            return Err(OrgsiftError::parse("decision payload is not a JSON object"));
        }
        Err(e) if strict => {
            return Err(OrgsiftError::parse(format!("decision payload: {e}")));
        }
        _ => Map::new(),
    };

    Ok(match profile {
        Profile::Software => normalize_software(&payload),
        Profile::IsoMsp => normalize_iso(&payload),
    })
}

fn normalize_software(payload: &Map<String, Value>) -> Decision {
    let mut products = coerce_list(
        payload
            .get("software_products")
            .or_else(|| payload.get("product_names")),
    );
    products = filter_software_candidates(products);
    products.truncate(LIST_CAP);

    let has_software = coerce_bool(payload.get("has_software"))
        || coerce_bool(payload.get("has_products"))
        || !products.is_empty();

    Decision {
        summary: string_or(payload, "summary", "Summary unavailable."),
        insights: string_or(payload, "insights", "No insights returned."),
        has_software,
        software_products: products,
        business_model: BusinessModel::parse(&string_or(payload, "business_model", "other")),
        market_focus: MarketFocus::parse(&string_or(payload, "market_focus", "Other")),
        ..Decision::default()
    }
}

fn normalize_iso(payload: &Map<String, Value>) -> Decision {
    let mut services = coerce_list(payload.get("services"));
    services.truncate(LIST_CAP);

    let raw_category = payload
        .get("category")
        .or_else(|| payload.get("iso_category"))
        .and_then(Value::as_str)
        .unwrap_or("NO");
    let mut category = IsoCategory::normalize(raw_category);
    // Providers often bury the role in the service list instead.
    if category == IsoCategory::None && !services.is_empty() {
        category = IsoCategory::normalize(&services.join(" "));
    }

    let mut segments = coerce_list(
        payload
            .get("merchant_segments")
            .or_else(|| payload.get("target_merchants")),
    );
    segments.truncate(LIST_CAP);

    let mut partnerships = coerce_list(payload.get("partnerships"));
    partnerships.truncate(LIST_CAP);

    let mut products = filter_software_candidates(coerce_list(payload.get("software_products")));
    products.truncate(LIST_CAP);

    let has_software = coerce_bool(payload.get("has_software"))
        || coerce_bool(payload.get("offers_software"))
        || !products.is_empty();

    Decision {
        summary: string_or(payload, "summary", "Summary unavailable."),
        insights: string_or(payload, "insights", "No insights returned."),
        has_software,
        software_products: products,
        business_model: BusinessModel::parse(&string_or(payload, "business_model", "service")),
        market_focus: MarketFocus::parse(&string_or(payload, "market_focus", "B2B")),
        category,
        services,
        merchant_segments: segments,
        partnerships,
    }
}

/// Drop a leading ``` line and trailing ``` lines around a JSON payload.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    lines.remove(0);
    while matches!(lines.last(), Some(last) if last.trim().starts_with("```")) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Coerce a JSON value into a list of trimmed non-empty strings. A bare
/// string scalar becomes a single-element list.
pub fn coerce_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            let s = s.trim().to_lowercase();
            !s.is_empty() && s != "false" && s != "no" && s != "0"
        }
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

fn string_or(payload: &Map<String, Value>, field: &str, default: &str) -> String {
    payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped_before_decode() {
        let raw = "```json\n{\"summary\": \"Acme builds software.\"}\n```";
        let decision = parse_decision(Profile::Software, raw, true).expect("parse");
        assert_eq!(decision.summary, "Acme builds software.");
    }

    #[test]
    fn strict_mode_rejects_undecodable_payload() {
        let err = parse_decision(Profile::Software, "not json at all", true).unwrap_err();
        assert!(matches!(err, OrgsiftError::Parse { .. }));

        let err = parse_decision(Profile::Software, "[1, 2]", true).unwrap_err();
        assert!(matches!(err, OrgsiftError::Parse { .. }));
    }

    #[test]
    fn lenient_mode_yields_defaults() {
        let decision = parse_decision(Profile::Software, "garbage", false).expect("lenient");
        assert_eq!(decision.summary, "Summary unavailable.");
        assert_eq!(decision.insights, "No insights returned.");
        assert!(!decision.has_software);
        assert_eq!(decision.business_model, BusinessModel::Other);
    }

    #[test]
    fn software_products_accept_fallback_key_and_scalar() {
        let raw = r#"{"product_names": "Acme Analytics", "business_model": "Platform"}"#;
        let decision = parse_decision(Profile::Software, raw, true).expect("parse");
        assert_eq!(decision.software_products, vec!["Acme Analytics"]);
        assert!(decision.has_software);
        assert_eq!(decision.business_model, BusinessModel::Platform);
    }

    #[test]
    fn software_filter_drops_non_software_products() {
        let raw = r#"{"software_products": ["Acme Portal", "Consulting Retainer"]}"#;
        let decision = parse_decision(Profile::Software, raw, true).expect("parse");
        assert_eq!(decision.software_products, vec!["Acme Portal"]);
    }

    #[test]
    fn iso_category_falls_back_to_services() {
        let raw = r#"{"category": "unsure", "services": ["payment gateway hosting"]}"#;
        let decision = parse_decision(Profile::IsoMsp, raw, true).expect("parse");
        assert_eq!(decision.category, IsoCategory::PaymentGateway);
    }

    #[test]
    fn iso_defaults_differ_from_software() {
        let decision = parse_decision(Profile::IsoMsp, "{}", true).expect("parse");
        assert_eq!(decision.business_model, BusinessModel::Service);
        assert_eq!(decision.market_focus, MarketFocus::B2B);
        assert_eq!(decision.category, IsoCategory::None);
    }

    #[test]
    fn iso_lists_are_capped() {
        let services: Vec<String> = (0..12).map(|i| format!("service {i}")).collect();
        let raw = serde_json::json!({"services": services}).to_string();
        let decision = parse_decision(Profile::IsoMsp, &raw, true).expect("parse");
        assert_eq!(decision.services.len(), 8);
    }

    #[test]
    fn bool_coercion_handles_strings_and_numbers() {
        let raw = r#"{"has_software": "yes"}"#;
        let decision = parse_decision(Profile::Software, raw, true).expect("parse");
        assert!(decision.has_software);

        let raw = r#"{"has_software": "false"}"#;
        let decision = parse_decision(Profile::Software, raw, true).expect("parse");
        assert!(!decision.has_software);

        let raw = r#"{"has_software": 1}"#;
        let decision = parse_decision(Profile::Software, raw, true).expect("parse");
        assert!(decision.has_software);
    }
}
