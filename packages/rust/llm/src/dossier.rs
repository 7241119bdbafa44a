//! Risk/opportunity dossier via Perplexity's search-grounded chat.
//!
//! Unlike the decision cascade, the dossier has no offline fallback: three
//! attempts with linear backoff, then the error propagates so the caller
//! can record it on the row.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::warn;

use orgsift_shared::{CompanyRecord, EnrichConfig, OrgsiftError, Result};

use crate::parse::{coerce_list, strip_code_fences};
use crate::provider::perplexity_chat;

/// Sentinel summary written when the provider found nothing.
pub const EMPTY_DOSSIER_SUMMARY: &str = "No dossier insights found.";

const DOSSIER_ATTEMPTS: u32 = 3;

const DOSSIER_SYSTEM_PROMPT: &str =
    "You are an analyst generating risk/opportunity dossiers. Respond with valid JSON only. \
     Cite trustworthy sources and prefer verifiable facts.";

/// Structured dossier for one company.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dossier {
    pub summary: String,
    pub wins: Vec<String>,
    pub setbacks: Vec<String>,
    pub workforce_changes: Vec<String>,
    pub regulatory: Vec<String>,
    pub notable_quotes: Vec<String>,
    pub sources: Vec<String>,
}

impl Dossier {
    /// True when the provider answered but found nothing: sentinel summary
    /// and every list empty.
    pub fn is_empty(&self) -> bool {
        self.summary == EMPTY_DOSSIER_SUMMARY
            && self.wins.is_empty()
            && self.setbacks.is_empty()
            && self.workforce_changes.is_empty()
            && self.regulatory.is_empty()
            && self.notable_quotes.is_empty()
            && self.sources.is_empty()
    }
}

/// Build a dossier for the company, retrying with linear backoff.
///
/// Sleeps `dossier_backoff_secs * attempt` after every failed attempt, then
/// returns [`OrgsiftError::Dossier`] carrying the last provider error.
pub async fn build_dossier(
    company: &CompanyRecord<'_>,
    config: &EnrichConfig,
) -> Result<Dossier> {
    if config.perplexity_api_key.is_none() {
        return Err(OrgsiftError::config(
            "dossier collection requires a Perplexity API key",
        ));
    }

    let prompt = dossier_prompt(company.label());
    let mut last_error = String::new();

    for attempt in 1..=DOSSIER_ATTEMPTS {
        match perplexity_chat(config, DOSSIER_SYSTEM_PROMPT, &prompt, 0.0, Some("web")).await {
            Ok(content) => return Ok(parse_dossier(&content)),
            Err(e) => {
                warn!(company = %company.label(), attempt, error = %e, "dossier attempt failed");
                last_error = e.to_string();
                tokio::time::sleep(backoff_delay(config.dossier_backoff_secs, attempt)).await;
            }
        }
    }

    Err(OrgsiftError::Dossier {
        company: company.label().to_string(),
        message: last_error,
    })
}

/// Linear backoff: `base * attempt` seconds.
pub fn backoff_delay(base_secs: f64, attempt: u32) -> Duration {
    Duration::from_secs_f64(base_secs.max(0.0) * f64::from(attempt))
}

/// Lenient dossier parse: fences stripped, undecodable payloads become the
/// empty dossier, lists tolerate scalar values.
pub fn parse_dossier(raw: &str) -> Dossier {
    let stripped = strip_code_fences(raw);
    let payload: Map<String, Value> = match serde_json::from_str(&stripped) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let summary = payload
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(EMPTY_DOSSIER_SUMMARY)
        .to_string();

    Dossier {
        summary,
        wins: coerce_list(payload.get("wins")),
        setbacks: coerce_list(payload.get("setbacks")),
        workforce_changes: coerce_list(payload.get("workforce_changes")),
        regulatory: coerce_list(payload.get("regulatory")),
        notable_quotes: coerce_list(payload.get("notable_quotes")),
        sources: coerce_list(payload.get("sources")),
    }
}

fn dossier_prompt(company_label: &str) -> String {
    format!(
        "Build a risk/opportunity dossier for the company \"{company_label}\" covering the \
         last 18 months. Respond with strict JSON containing exactly these keys: \
         summary (string), wins (list of strings), setbacks (list of strings), \
         workforce_changes (list of strings), regulatory (list of strings), \
         notable_quotes (list of strings), sources (list of source URLs)."
    )
}
