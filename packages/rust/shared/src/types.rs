//! Core domain types for the enrichment pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::text::slugify;

/// Reserved addressing key identifying a row's position in the backing
/// store. Present on every row read from the store; never written back.
pub const ROW_KEY: &str = "__row";

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// One organization's record: an ordered mapping of field name → value.
///
/// Outside the fields the pipeline writes, the mapping is an opaque
/// pass-through container: unknown columns survive a run untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub serde_json::Map<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self(serde_json::Map::new())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String value of a field, or `""` when absent or non-string.
    pub fn get_str(&self, field: &str) -> &str {
        self.0.get(field).and_then(Value::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    pub fn set_str(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), Value::String(value.into()));
    }

    /// Addressing key, falling back to `index + 1` when the store did not
    /// stamp one (matches the sheet's 1-based data rows).
    pub fn key_or(&self, index: usize) -> u64 {
        match self.0.get(ROW_KEY) {
            Some(Value::Number(n)) => n.as_u64().unwrap_or((index + 1) as u64),
            Some(Value::String(s)) => s.trim().parse().unwrap_or((index + 1) as u64),
            _ => (index + 1) as u64,
        }
    }

    /// Copy of the row without the addressing key, for persistence.
    pub fn without_key(&self) -> serde_json::Map<String, Value> {
        let mut fields = self.0.clone();
        fields.remove(ROW_KEY);
        fields
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// CompanyRecord
// ---------------------------------------------------------------------------

/// Typed identity derived from a raw row. `name` and `domain` may both be
/// empty, in which case no network fetch is attempted for the company.
#[derive(Debug, Clone)]
pub struct CompanyRecord<'a> {
    pub raw: &'a Row,
    pub name: String,
    pub domain: String,
    pub row_index: usize,
}

const NAME_FIELDS: [&str; 5] = ["company", "Company", "name", "Name", "organization"];
const DOMAIN_FIELDS: [&str; 5] = ["domain", "Domain", "website", "Website", "url"];

impl<'a> CompanyRecord<'a> {
    /// Display label for logs and prompts.
    pub fn label(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.domain.is_empty() {
            &self.domain
        } else {
            "Unknown company"
        }
    }

    /// Candidate base URLs for the site scraper. Empty when the record has
    /// neither a domain nor a usable name.
    pub fn candidate_urls(&self, max_candidates: usize) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();

        let domain = self.domain.trim();
        if !domain.is_empty() {
            if domain.starts_with("http") {
                urls.push(domain.to_string());
            } else {
                urls.push(format!("https://{domain}"));
                urls.push(format!("http://{domain}"));
            }
        }

        if urls.is_empty() && !self.name.is_empty() {
            let slug = slugify(&self.name);
            if !slug.is_empty() {
                urls.push(format!("https://{slug}.com"));
            }
        }

        let mut deduped: Vec<String> = Vec::new();
        for url in urls {
            if !deduped.contains(&url) {
                deduped.push(url);
            }
        }
        deduped.truncate(max_candidates);
        deduped
    }
}

/// Derive a [`CompanyRecord`] from a raw row.
pub fn normalize_company(row: &Row, index: usize) -> CompanyRecord<'_> {
    let name = first_non_empty(row, &NAME_FIELDS)
        .or_else(|| first_non_empty(row, &DOMAIN_FIELDS))
        .unwrap_or_default();
    let domain = first_non_empty(row, &DOMAIN_FIELDS).unwrap_or_default();

    CompanyRecord {
        raw: row,
        name: name.trim().to_string(),
        domain: domain.trim().to_string(),
        row_index: index,
    }
}

fn first_non_empty(row: &Row, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| {
        row.get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    })
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Enrichment profile: which field set and relevance rules a run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Software,
    IsoMsp,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Software => "software",
            Self::IsoMsp => "iso_msp",
        }
    }
}

// ---------------------------------------------------------------------------
// Categorical enums with fixed normalization
// ---------------------------------------------------------------------------

/// Business model, case-folded on parse; unrecognized values become `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessModel {
    Product,
    Service,
    Platform,
    Marketplace,
    Hybrid,
    Other,
}

impl BusinessModel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "product" => Self::Product,
            "service" => Self::Service,
            "platform" => Self::Platform,
            "marketplace" => Self::Marketplace,
            "hybrid" => Self::Hybrid,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Service => "service",
            Self::Platform => "platform",
            Self::Marketplace => "marketplace",
            Self::Hybrid => "hybrid",
            Self::Other => "other",
        }
    }
}

/// Market focus, upper-cased on parse; unrecognized values become `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketFocus {
    B2B,
    B2C,
    B2B2C,
    B2G,
    Mixed,
    Other,
}

impl MarketFocus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "B2B" => Self::B2B,
            "B2C" => Self::B2C,
            "B2B2C" => Self::B2B2C,
            "B2G" => Self::B2G,
            "MIXED" => Self::Mixed,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::B2B => "B2B",
            Self::B2C => "B2C",
            Self::B2B2C => "B2B2C",
            Self::B2G => "B2G",
            Self::Mixed => "MIXED",
            Self::Other => "OTHER",
        }
    }
}

/// ISO/MSP category, normalized through an ordered keyword table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IsoCategory {
    PaymentProcessor,
    PaymentGateway,
    PaymentServiceProvider,
    IsoMsp,
    Acquirer,
    Hybrid,
    None,
}

/// Keyword → category table. Order matters for substring matching: the
/// first entry whose key is contained in the raw value wins.
const ISO_CATEGORY_TABLE: [(&str, IsoCategory); 24] = [
    ("processor", IsoCategory::PaymentProcessor),
    ("payment processor", IsoCategory::PaymentProcessor),
    ("card processor", IsoCategory::PaymentProcessor),
    ("merchant processor", IsoCategory::PaymentProcessor),
    ("processing network", IsoCategory::PaymentProcessor),
    ("issuing processor", IsoCategory::PaymentProcessor),
    ("payment gateway", IsoCategory::PaymentGateway),
    ("gateway", IsoCategory::PaymentGateway),
    ("gateway provider", IsoCategory::PaymentGateway),
    ("checkout", IsoCategory::PaymentGateway),
    ("payment service provider", IsoCategory::PaymentServiceProvider),
    ("psp", IsoCategory::PaymentServiceProvider),
    ("merchant service provider", IsoCategory::PaymentServiceProvider),
    ("payment solution provider", IsoCategory::PaymentServiceProvider),
    ("iso", IsoCategory::IsoMsp),
    ("msp", IsoCategory::IsoMsp),
    ("iso/msp", IsoCategory::IsoMsp),
    ("independent sales organization", IsoCategory::IsoMsp),
    ("independent sales organisations", IsoCategory::IsoMsp),
    ("acquirer", IsoCategory::Acquirer),
    ("merchant acquirer", IsoCategory::Acquirer),
    ("acquiring", IsoCategory::Acquirer),
    ("hybrid", IsoCategory::Hybrid),
    ("aggregator", IsoCategory::PaymentGateway),
];

impl IsoCategory {
    /// Normalize a raw category value. Exact matches take priority over
    /// substring matches; none-like values map to [`IsoCategory::None`].
    pub fn normalize(raw: &str) -> Self {
        let value = raw.trim().to_lowercase();
        if matches!(value.as_str(), "" | "none" | "no" | "n/a" | "na" | "null") {
            return Self::None;
        }

        for (key, category) in ISO_CATEGORY_TABLE {
            if key == value {
                return category;
            }
        }
        for (key, category) in ISO_CATEGORY_TABLE {
            if value.contains(key) {
                return category;
            }
        }
        Self::None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentProcessor => "Payment Processor",
            Self::PaymentGateway => "Payment Gateway",
            Self::PaymentServiceProvider => "Payment Service Provider",
            Self::IsoMsp => "ISO/MSP",
            Self::Acquirer => "Acquirer",
            Self::Hybrid => "Hybrid",
            Self::None => "NO",
        }
    }
}

// ---------------------------------------------------------------------------
// Source snapshots
// ---------------------------------------------------------------------------

/// One scraped page: url, title, extracted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    pub text: String,
}

/// Result of a site scrape, owned by the call that produced it.
#[derive(Debug, Clone, Default)]
pub struct SiteSnapshot {
    pub pages: Vec<PageSnapshot>,
}

impl SiteSnapshot {
    pub fn empty() -> Self {
        Self { pages: Vec::new() }
    }

    /// All page texts joined, capped at `max_chars` characters.
    pub fn combined_text(&self, max_chars: usize) -> String {
        let payload = self
            .pages
            .iter()
            .filter(|p| !p.text.is_empty())
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        payload.chars().take(max_chars).collect()
    }
}

/// A news/search article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: Option<String>,
    pub summary: Option<String>,
}

/// A social (LinkedIn) post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPost {
    pub title: String,
    pub text: String,
    pub url: String,
    pub author: Option<String>,
    pub published_at: Option<String>,
}

/// Search-engine overview plus any news articles found alongside it.
#[derive(Debug, Clone, Default)]
pub struct SerpResult {
    pub overview: String,
    pub articles: Vec<NewsArticle>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(fields: &[(&str, Value)]) -> Row {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn normalize_prefers_name_fields_over_domain() {
        let r = row(&[
            ("Company", json!("Acme Corp")),
            ("website", json!("acme.example")),
        ]);
        let company = normalize_company(&r, 0);
        assert_eq!(company.name, "Acme Corp");
        assert_eq!(company.domain, "acme.example");
    }

    #[test]
    fn normalize_falls_back_to_domain_as_name() {
        let r = row(&[("url", json!("https://acme.example"))]);
        let company = normalize_company(&r, 2);
        assert_eq!(company.name, "https://acme.example");
        assert_eq!(company.row_index, 2);
    }

    #[test]
    fn candidate_urls_for_bare_domain() {
        let r = row(&[("domain", json!("acme.example"))]);
        let company = normalize_company(&r, 0);
        assert_eq!(
            company.candidate_urls(4),
            vec!["https://acme.example", "http://acme.example"]
        );
    }

    #[test]
    fn candidate_urls_keep_schemed_domain_as_is() {
        let r = row(&[("website", json!("https://acme.example"))]);
        let company = normalize_company(&r, 0);
        assert_eq!(company.candidate_urls(4), vec!["https://acme.example"]);
    }

    #[test]
    fn candidate_urls_slugify_name_when_no_domain() {
        let r = row(&[("name", json!("Acme Payment Co."))]);
        let company = normalize_company(&r, 0);
        assert_eq!(
            company.candidate_urls(4),
            vec!["https://acmepaymentco.com"]
        );
    }

    #[test]
    fn empty_identity_yields_no_candidates() {
        let r = row(&[("Company", json!("")), ("website", json!("  "))]);
        let company = normalize_company(&r, 0);
        assert!(company.name.is_empty());
        assert!(company.domain.is_empty());
        assert!(company.candidate_urls(4).is_empty());
    }

    #[test]
    fn row_key_fallback_and_parse() {
        let r = row(&[("__row", json!(7))]);
        assert_eq!(r.key_or(0), 7);

        let r = row(&[("__row", json!("12"))]);
        assert_eq!(r.key_or(0), 12);

        let r = row(&[("name", json!("x"))]);
        assert_eq!(r.key_or(4), 5);
    }

    #[test]
    fn row_without_key_strips_addressing_key_only() {
        let r = row(&[("__row", json!(3)), ("name", json!("Acme"))]);
        let persisted = r.without_key();
        assert!(!persisted.contains_key(ROW_KEY));
        assert_eq!(persisted.get("name"), Some(&json!("Acme")));
    }

    #[test]
    fn business_model_case_folds_and_defaults() {
        assert_eq!(BusinessModel::parse("Platform"), BusinessModel::Platform);
        assert_eq!(BusinessModel::parse("HYBRID"), BusinessModel::Hybrid);
        assert_eq!(BusinessModel::parse("franchise"), BusinessModel::Other);
    }

    #[test]
    fn market_focus_uppercases_and_defaults() {
        assert_eq!(MarketFocus::parse("b2b"), MarketFocus::B2B);
        assert_eq!(MarketFocus::parse("mixed"), MarketFocus::Mixed);
        assert_eq!(MarketFocus::parse("consumer"), MarketFocus::Other);
        assert_eq!(MarketFocus::Mixed.as_str(), "MIXED");
    }

    #[test]
    fn iso_category_exact_match_first() {
        assert_eq!(IsoCategory::normalize("PSP"), IsoCategory::PaymentServiceProvider);
        assert_eq!(IsoCategory::normalize("iso/msp"), IsoCategory::IsoMsp);
        assert_eq!(IsoCategory::normalize("Aggregator"), IsoCategory::PaymentGateway);
    }

    #[test]
    fn iso_category_substring_order_is_pinned() {
        // "payment processor and gateway" contains both; "processor" is
        // listed first in the table, so it wins.
        assert_eq!(
            IsoCategory::normalize("payment processor and gateway"),
            IsoCategory::PaymentProcessor
        );
        assert_eq!(
            IsoCategory::normalize("global gateway services"),
            IsoCategory::PaymentGateway
        );
    }

    #[test]
    fn iso_category_none_like_values() {
        for raw in ["", "none", "NO", "n/a", "NA", "null", "  "] {
            assert_eq!(IsoCategory::normalize(raw), IsoCategory::None, "{raw:?}");
        }
        assert_eq!(IsoCategory::normalize("bakery"), IsoCategory::None);
    }

    #[test]
    fn combined_text_caps_length() {
        let site = SiteSnapshot {
            pages: vec![
                PageSnapshot {
                    url: "https://a.example".into(),
                    title: "A".into(),
                    text: "x".repeat(6000),
                },
                PageSnapshot {
                    url: "https://a.example/about".into(),
                    title: "About".into(),
                    text: "y".repeat(6000),
                },
            ],
        };
        assert_eq!(site.combined_text(8000).chars().count(), 8000);
    }
}
