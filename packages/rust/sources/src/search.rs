//! Search-overview adapter (SerpAPI).
//!
//! One knowledge-graph query; when it carries no news results, a second
//! `google_news` query fills in articles. Any HTTP failure degrades the
//! whole call to an empty [`SerpResult`].

use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use orgsift_shared::{CompanyRecord, EnrichConfig, NewsArticle, SerpResult};

/// Articles kept from the search result.
const MAX_ARTICLES: usize = 5;

/// Fetch a search overview and related news articles for the company.
/// Missing credential or any transport failure returns the empty result.
pub async fn fetch_serp_overview(
    company: &CompanyRecord<'_>,
    config: &EnrichConfig,
) -> SerpResult {
    let Some(api_key) = config.serpapi_key.as_deref() else {
        return SerpResult::default();
    };

    let client = match Client::builder().timeout(config.http_timeout).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "failed to build HTTP client for search");
            return SerpResult::default();
        }
    };

    match fetch_inner(&client, company, config, api_key).await {
        Ok(result) => result,
        Err(e) => {
            warn!(company = %company.label(), error = %e, "search overview request failed");
            SerpResult::default()
        }
    }
}

async fn fetch_inner(
    client: &Client,
    company: &CompanyRecord<'_>,
    config: &EnrichConfig,
    api_key: &str,
) -> reqwest::Result<SerpResult> {
    let endpoint = format!("{}/search", config.serpapi_base.trim_end_matches('/'));

    let overview_query = format!("{} company overview", company.name);
    let payload: Value = client
        .get(&endpoint)
        .query(&[
            ("engine", "google"),
            ("q", overview_query.as_str()),
            ("hl", "en"),
            ("gl", "us"),
            ("api_key", api_key),
            ("num", "5"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let mut overview = payload["knowledge_graph"]["description"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    if overview.is_empty() {
        overview = payload["organic_results"][0]["snippet"]
            .as_str()
            .unwrap_or_default()
            .to_string();
    }

    let mut articles = parse_articles(payload.get("news_results"));

    if articles.is_empty() {
        let news_query = if company.domain.is_empty() {
            company.name.clone()
        } else {
            format!("{} OR {}", company.name, company.domain)
        };
        let news_payload: Value = client
            .get(&endpoint)
            .query(&[
                ("engine", "google_news"),
                ("q", news_query.as_str()),
                ("api_key", api_key),
                ("gl", "us"),
                ("hl", "en"),
                ("num", "5"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let fallback_items = news_payload
            .get("articles")
            .filter(|v| !v.as_array().map(Vec::is_empty).unwrap_or(true))
            .or_else(|| news_payload.get("news_results"));
        articles.extend(parse_articles(fallback_items));
    }

    articles.truncate(MAX_ARTICLES);
    Ok(SerpResult { overview, articles })
}

/// Parse raw search items into articles, tolerating the field-name variants
/// the search service uses across engines.
fn parse_articles(raw_items: Option<&Value>) -> Vec<NewsArticle> {
    let Some(items) = raw_items.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut articles = Vec::new();
    for item in items {
        let title = item["title"]
            .as_str()
            .or_else(|| item["news_title"].as_str())
            .unwrap_or_default();
        let link = item["link"]
            .as_str()
            .or_else(|| item["url"].as_str())
            .unwrap_or_default();
        if title.is_empty() || link.is_empty() {
            continue;
        }
        articles.push(NewsArticle {
            title: title.to_string(),
            url: link.to_string(),
            source: item["source"]
                .as_str()
                .or_else(|| item["publisher"]["name"].as_str())
                .unwrap_or_default()
                .to_string(),
            published_at: item["date"]
                .as_str()
                .or_else(|| item["published_date"].as_str())
                .or_else(|| item["time_ago"].as_str())
                .map(str::to_string),
            summary: item["snippet"]
                .as_str()
                .or_else(|| item["excerpt"].as_str())
                .map(str::to_string),
        });
    }
    articles
}
