//! Stage entry points: profile, media, and dossier passes over one row.
//!
//! Each returns a fully-formed updated row ready for merge. Outside the
//! fields a stage writes, the row passes through untouched.

use chrono::{SecondsFormat, Utc};
use tracing::{info, instrument};

use orgsift_llm::{DecisionContext, build_dossier, decide};
use orgsift_shared::{EnrichConfig, OrgsiftError, Profile, Result, Row, normalize_company};
use orgsift_sources::{
    BrowserFetch, fetch_news_articles, fetch_serp_overview, fetch_social_posts, scrape_site,
};

use crate::fusion::fuse_software;
use crate::relevance::evaluate_relevance;
use crate::stage_marker::mark_stage;

/// Items joined into a comma-separated row field.
const FIELD_LIST_CAP: usize = 10;

/// Items kept per highlight field.
const HIGHLIGHT_CAP: usize = 3;

/// Items kept per reconstructed dossier list.
const RECONSTRUCTED_LIST_CAP: usize = 6;

const PROFILE_STAGE: &str = "1";
const MEDIA_STAGE: &str = "2";
const DOSSIER_STAGE: &str = "3";

// ---------------------------------------------------------------------------
// Stage 1: profile
// ---------------------------------------------------------------------------

/// Profile pass: scrape the site and search overview, run the decision
/// cascade, fuse software signals, and write the core profile fields.
#[instrument(skip_all, fields(row = index, profile = profile.as_str()))]
pub async fn collect_profile(
    row: &Row,
    config: &EnrichConfig,
    profile: Profile,
    index: usize,
    browser: Option<&dyn BrowserFetch>,
) -> Result<Row> {
    let company = normalize_company(row, index);

    let (site, serp) = tokio::join!(
        scrape_site(&company, config, browser),
        fetch_serp_overview(&company, config),
    );
    let context = DecisionContext::from_signals(&site, serp, Vec::new(), Vec::new());
    let decision = decide(profile, &company, &context, config).await;

    // The software profile fuses the cascade verdict with a direct scan of
    // the gathered text; the ISO profile trusts the decision as-is.
    let (has_software, products) = match profile {
        Profile::Software => {
            let verdict = fuse_software(&decision, &context);
            (verdict.has_software, verdict.products)
        }
        Profile::IsoMsp => (decision.has_software, decision.software_products.clone()),
    };
    let is_relevant = evaluate_relevance(profile, &decision, has_software);

    let mut updated = row.clone();
    updated.set_str("baseline_summary", &decision.summary);
    updated.set_str("insight_bullet", &decision.insights);
    updated.set("has_software", has_software.into());
    updated.set_str("software_products", join_field(&products));
    updated.set_str("business_model", decision.business_model.as_str());
    updated.set_str("market_focus", decision.market_focus.as_str());
    if profile == Profile::IsoMsp {
        updated.set_str("category", decision.category.as_str());
        updated.set_str("services", join_field(&decision.services));
        updated.set_str("merchant_segments", join_field(&decision.merchant_segments));
        updated.set_str("partnerships", join_field(&decision.partnerships));
    }
    updated.set("is_relevant", is_relevant.into());
    stamp(&mut updated, PROFILE_STAGE);

    info!(company = %company.label(), is_relevant, "profile stage complete");
    Ok(updated)
}

// ---------------------------------------------------------------------------
// Stage 2: media
// ---------------------------------------------------------------------------

/// Media pass: gather search articles, news, and social posts, and write
/// the highlight fields plus a coarse signal-confidence grade.
#[instrument(skip_all, fields(row = index, profile = profile.as_str()))]
pub async fn collect_media(
    row: &Row,
    config: &EnrichConfig,
    profile: Profile,
    index: usize,
) -> Result<Row> {
    let company = normalize_company(row, index);

    let (serp, news, posts) = tokio::join!(
        fetch_serp_overview(&company, config),
        fetch_news_articles(&company, config),
        fetch_social_posts(&company, config),
    );

    let populated = [!news.is_empty(), !serp.articles.is_empty(), !posts.is_empty()]
        .into_iter()
        .filter(|p| *p)
        .count();
    let confidence = match populated {
        0 => "low",
        1 => "medium",
        _ => "high",
    };

    let mut updated = row.clone();
    updated.set_str(
        "news_highlight",
        highlight(news.iter().map(|a| (a.title.as_str(), a.source.as_str()))),
    );
    updated.set_str(
        "article_highlight",
        highlight(serp.articles.iter().map(|a| (a.title.as_str(), a.source.as_str()))),
    );
    updated.set_str(
        "linkedin_highlight",
        highlight(posts.iter().map(|p| {
            (p.title.as_str(), p.author.as_deref().unwrap_or("LinkedIn"))
        })),
    );
    updated.set_str("signal_confidence", confidence);
    stamp(&mut updated, MEDIA_STAGE);

    info!(company = %company.label(), confidence, "media stage complete");
    Ok(updated)
}

// ---------------------------------------------------------------------------
// Stage 3: dossier
// ---------------------------------------------------------------------------

/// Dossier pass: provider-built risk/opportunity dossier with retry.
///
/// An empty provider payload is reconstructed locally from the row's cached
/// media highlights, with the reason recorded in `dossier_error`. Retry
/// exhaustion also lands in `dossier_error`, but withholds the stage marker
/// so a resumed run selects the row again.
#[instrument(skip_all, fields(row = index))]
pub async fn collect_dossier(row: &Row, config: &EnrichConfig, index: usize) -> Result<Row> {
    let company = normalize_company(row, index);
    let mut updated = row.clone();

    match build_dossier(&company, config).await {
        Ok(dossier) if !dossier.is_empty() => {
            updated.set_str("dossier_summary", &dossier.summary);
            updated.set_str("dossier_wins", dossier.wins.join("; "));
            updated.set_str("dossier_setbacks", dossier.setbacks.join("; "));
            updated.set_str("dossier_workforce", dossier.workforce_changes.join("; "));
            updated.set_str("dossier_regulatory", dossier.regulatory.join("; "));
            updated.set_str("dossier_quotes", dossier.notable_quotes.join("; "));
            updated.set_str("dossier_sources", dossier.sources.join("; "));
            updated.set_str("dossier_error", "");
            stamp(&mut updated, DOSSIER_STAGE);
            info!(company = %company.label(), "dossier stage complete");
        }
        Ok(_) => {
            let reconstructed = reconstruct_from_highlights(row);
            updated.set_str("dossier_summary", "Reconstructed from cached media highlights.");
            updated.set_str("dossier_wins", reconstructed.wins.join("; "));
            updated.set_str("dossier_setbacks", reconstructed.setbacks.join("; "));
            updated.set_str("dossier_workforce", reconstructed.workforce.join("; "));
            updated.set_str("dossier_regulatory", reconstructed.regulatory.join("; "));
            updated.set_str("dossier_quotes", reconstructed.quotes.join("; "));
            updated.set_str("dossier_sources", "");
            updated.set_str(
                "dossier_error",
                "provider returned an empty dossier; reconstructed from cached media highlights",
            );
            stamp(&mut updated, DOSSIER_STAGE);
            info!(company = %company.label(), "dossier stage reconstructed locally");
        }
        Err(e @ OrgsiftError::Dossier { .. }) => {
            updated.set_str("dossier_error", e.to_string());
            updated.set_str("last_updated", now_rfc3339());
            info!(company = %company.label(), error = %e, "dossier stage failed; row left unmarked");
        }
        Err(e) => return Err(e),
    }

    Ok(updated)
}

#[derive(Debug, Default, PartialEq)]
struct ReconstructedDossier {
    wins: Vec<String>,
    setbacks: Vec<String>,
    workforce: Vec<String>,
    regulatory: Vec<String>,
    quotes: Vec<String>,
}

const WORKFORCE_TERMS: [&str; 7] =
    ["layoff", "hire", "hiring", "appoint", "resign", "ceo", "cfo"];
const REGULATORY_TERMS: [&str; 4] = ["regulat", "compliance", "license", "fined"];
const SETBACK_TERMS: [&str; 7] =
    ["lawsuit", "breach", "outage", "decline", "drop", "recall", "loss"];
const WIN_TERMS: [&str; 9] = [
    "launch", "partner", "funding", "award", "expan", "growth", "record", "acqui", "milestone",
];

/// Classify the row's cached highlight strings into dossier lists.
fn reconstruct_from_highlights(row: &Row) -> ReconstructedDossier {
    let mut result = ReconstructedDossier::default();
    let mut seen: Vec<String> = Vec::new();

    for field in ["news_highlight", "article_highlight", "linkedin_highlight"] {
        for item in row.get_str(field).split("; ") {
            let item = item.trim();
            if item.is_empty() || seen.iter().any(|s| s == item) {
                continue;
            }
            seen.push(item.to_string());
            let lower = item.to_lowercase();

            let bucket = if item.contains('"') || item.contains('\u{201c}') {
                &mut result.quotes
            } else if REGULATORY_TERMS.iter().any(|t| lower.contains(t)) {
                &mut result.regulatory
            } else if WORKFORCE_TERMS.iter().any(|t| lower.contains(t)) {
                &mut result.workforce
            } else if SETBACK_TERMS.iter().any(|t| lower.contains(t)) {
                &mut result.setbacks
            } else if WIN_TERMS.iter().any(|t| lower.contains(t)) {
                &mut result.wins
            } else {
                continue;
            };
            if bucket.len() < RECONSTRUCTED_LIST_CAP {
                bucket.push(item.to_string());
            }
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn join_field(items: &[String]) -> String {
    items
        .iter()
        .take(FIELD_LIST_CAP)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn highlight<'a>(items: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    items
        .take(HIGHLIGHT_CAP)
        .map(|(title, source)| {
            if source.is_empty() {
                title.to_string()
            } else {
                format!("{title} — {source}")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn stamp(row: &mut Row, stage: &str) {
    let marker = mark_stage(row.get("updated_stages"), stage);
    row.set_str("updated_stages", marker);
    row.set_str("last_updated", now_rfc3339());
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn empty_row() -> Row {
        [
            ("company".to_string(), json!("")),
            ("website".to_string(), json!("")),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn profile_stage_offline_writes_defaults_and_marker() {
        let row = empty_row();
        let updated = collect_profile(&row, &EnrichConfig::default(), Profile::Software, 0, None)
            .await
            .expect("profile stage");

        assert_eq!(updated.get_str("baseline_summary"), "No data gathered.");
        assert_eq!(updated.get("has_software"), Some(&json!(false)));
        assert_eq!(updated.get("is_relevant"), Some(&json!(false)));
        assert_eq!(updated.get_str("updated_stages"), "1");
        assert!(!updated.get_str("last_updated").is_empty());
        // Software profile never writes ISO fields.
        assert!(updated.get("category").is_none());
    }

    #[tokio::test]
    async fn profile_stage_iso_writes_category_fields() {
        let row = empty_row();
        let updated = collect_profile(&row, &EnrichConfig::default(), Profile::IsoMsp, 0, None)
            .await
            .expect("profile stage");

        assert_eq!(updated.get_str("category"), "NO");
        assert_eq!(updated.get_str("business_model"), "service");
        assert_eq!(updated.get_str("market_focus"), "B2B");
        assert_eq!(updated.get_str("updated_stages"), "1");
    }

    #[tokio::test]
    async fn profile_stage_preserves_unknown_columns() {
        let row: Row = [
            ("company".to_string(), json!("")),
            ("custom_note".to_string(), json!("keep me")),
        ]
        .into_iter()
        .collect();
        let updated = collect_profile(&row, &EnrichConfig::default(), Profile::Software, 0, None)
            .await
            .expect("profile stage");
        assert_eq!(updated.get_str("custom_note"), "keep me");
    }

    #[tokio::test]
    async fn media_stage_without_credentials_is_low_confidence() {
        let row = empty_row();
        let updated = collect_media(&row, &EnrichConfig::default(), Profile::Software, 0)
            .await
            .expect("media stage");

        assert_eq!(updated.get_str("signal_confidence"), "low");
        assert_eq!(updated.get_str("news_highlight"), "");
        assert_eq!(updated.get_str("updated_stages"), "2");
    }

    #[tokio::test]
    async fn media_stage_marks_second_stage_after_first() {
        let row: Row = [
            ("company".to_string(), json!("")),
            ("updated_stages".to_string(), json!("1")),
        ]
        .into_iter()
        .collect();
        let updated = collect_media(&row, &EnrichConfig::default(), Profile::Software, 0)
            .await
            .expect("media stage");
        assert_eq!(updated.get_str("updated_stages"), "1,2");
    }

    #[test]
    fn highlight_formats_and_caps() {
        let items = [
            ("Acme raises", "Example Wire"),
            ("Acme expands", ""),
            ("Acme hires", "Daily"),
            ("Acme fourth", "Dropped"),
        ];
        let formatted = highlight(items.iter().map(|(t, s)| (*t, *s)));
        assert_eq!(
            formatted,
            "Acme raises — Example Wire; Acme expands; Acme hires — Daily"
        );
    }

    #[test]
    fn reconstruction_classifies_and_dedupes() {
        let row: Row = [
            (
                "news_highlight".to_string(),
                json!("Acme launches new portal — Wire; Acme faces lawsuit — Daily"),
            ),
            (
                "article_highlight".to_string(),
                json!("Acme launches new portal — Wire; Acme appoints CFO — Daily"),
            ),
            (
                "linkedin_highlight".to_string(),
                json!("\"We are thrilled\" says CEO of growth"),
            ),
        ]
        .into_iter()
        .collect();

        let reconstructed = reconstruct_from_highlights(&row);
        assert_eq!(reconstructed.wins, vec!["Acme launches new portal — Wire"]);
        assert_eq!(reconstructed.setbacks, vec!["Acme faces lawsuit — Daily"]);
        assert_eq!(reconstructed.workforce, vec!["Acme appoints CFO — Daily"]);
        assert_eq!(
            reconstructed.quotes,
            vec!["\"We are thrilled\" says CEO of growth"]
        );
        assert!(reconstructed.regulatory.is_empty());
    }

    fn dossier_config(server: &MockServer) -> EnrichConfig {
        EnrichConfig {
            perplexity_api_key: Some("pplx-test".into()),
            perplexity_base: server.uri(),
            dossier_backoff_secs: 0.0,
            ..EnrichConfig::default()
        }
    }

    fn chat_response(content: &str) -> serde_json::Value {
        json!({"choices": [{"message": {"content": content}}]})
    }

    #[tokio::test]
    async fn dossier_stage_writes_fields_and_marker() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(
                r#"{"summary": "Strong year.", "wins": ["New market", "Big deal"],
                    "sources": ["https://news.example/a"]}"#,
            )))
            .mount(&server)
            .await;

        let row: Row = [("company".to_string(), json!("Acme"))].into_iter().collect();
        let updated = collect_dossier(&row, &dossier_config(&server), 0)
            .await
            .expect("dossier stage");

        assert_eq!(updated.get_str("dossier_summary"), "Strong year.");
        assert_eq!(updated.get_str("dossier_wins"), "New market; Big deal");
        assert_eq!(updated.get_str("dossier_error"), "");
        assert_eq!(updated.get_str("updated_stages"), "3");
    }

    #[tokio::test]
    async fn empty_dossier_is_reconstructed_and_still_marked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("{}")))
            .mount(&server)
            .await;

        let row: Row = [
            ("company".to_string(), json!("Acme")),
            ("news_highlight".to_string(), json!("Acme launches portal — Wire")),
        ]
        .into_iter()
        .collect();
        let updated = collect_dossier(&row, &dossier_config(&server), 0)
            .await
            .expect("dossier stage");

        assert_eq!(updated.get_str("dossier_wins"), "Acme launches portal — Wire");
        assert!(updated.get_str("dossier_error").contains("empty dossier"));
        assert_eq!(updated.get_str("updated_stages"), "3");
    }

    #[tokio::test]
    async fn exhausted_dossier_records_error_without_marker() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let row: Row = [("company".to_string(), json!("Acme"))].into_iter().collect();
        let updated = collect_dossier(&row, &dossier_config(&server), 0)
            .await
            .expect("dossier stage returns the row");

        assert!(updated.get_str("dossier_error").contains("Acme"));
        assert_eq!(updated.get_str("updated_stages"), "");
        assert!(!updated.get_str("last_updated").is_empty());
    }
}
