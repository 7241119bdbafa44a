//! News adapter (NewsAPI `everything` endpoint).

use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use orgsift_shared::{CompanyRecord, EnrichConfig, NewsArticle};

/// Articles kept per company.
const MAX_ARTICLES: usize = 10;

/// Fetch recent news articles mentioning the company by exact name.
/// Missing credential or any transport failure returns no articles.
pub async fn fetch_news_articles(
    company: &CompanyRecord<'_>,
    config: &EnrichConfig,
) -> Vec<NewsArticle> {
    let Some(api_key) = config.newsapi_key.as_deref() else {
        return Vec::new();
    };

    let client = match Client::builder().timeout(config.http_timeout).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "failed to build HTTP client for news");
            return Vec::new();
        }
    };

    let endpoint = format!(
        "{}/v2/everything",
        config.newsapi_base.trim_end_matches('/')
    );
    let payload: Value = match request(&client, &endpoint, company, api_key).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(company = %company.label(), error = %e, "news request failed");
            return Vec::new();
        }
    };

    let Some(items) = payload["articles"].as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .take(MAX_ARTICLES)
        .map(|article| NewsArticle {
            title: article["title"].as_str().unwrap_or_default().to_string(),
            url: article["url"].as_str().unwrap_or_default().to_string(),
            source: article["source"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            published_at: article["publishedAt"].as_str().map(str::to_string),
            summary: article["description"].as_str().map(str::to_string),
        })
        .collect()
}

async fn request(
    client: &Client,
    endpoint: &str,
    company: &CompanyRecord<'_>,
    api_key: &str,
) -> reqwest::Result<Value> {
    let query = format!("\"{}\"", company.name);
    client
        .get(endpoint)
        .query(&[
            ("q", query.as_str()),
            ("language", "en"),
            ("pageSize", "10"),
            ("sortBy", "publishedAt"),
            ("apiKey", api_key),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}
