//! Social-post adapter (Apify LinkedIn company-posts actor).
//!
//! Starts an actor run for the row's LinkedIn URL, then reads the default
//! dataset. Posts are kept only when they plausibly concern the company
//! (slug, name, or domain label appears in the post source/author/text).

use reqwest::Client;
use serde_json::{Value, json};
use tracing::warn;
use url::Url;

use orgsift_shared::{CompanyRecord, EnrichConfig, SocialPost};

/// Actor used to collect company posts.
const ACTOR_PATH: &str = "/v2/acts/apimaestro~linkedin-company-posts/runs";

/// Fetch recent LinkedIn posts for the company. Missing token, missing
/// LinkedIn URL on the row, or any transport failure yields no posts.
pub async fn fetch_social_posts(
    company: &CompanyRecord<'_>,
    config: &EnrichConfig,
) -> Vec<SocialPost> {
    let Some(token) = config.apify_token.as_deref() else {
        return Vec::new();
    };

    let linkedin_url = company.raw.get_str("linkedin").trim().to_string();
    if linkedin_url.is_empty() {
        return Vec::new();
    }
    let slug = extract_company_slug(&linkedin_url);

    let client = match Client::builder().timeout(config.http_timeout).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "failed to build HTTP client for social posts");
            return Vec::new();
        }
    };

    let items = match fetch_dataset_items(&client, config, token, &linkedin_url).await {
        Ok(items) => items,
        Err(e) => {
            warn!(company = %company.label(), error = %e, "social post request failed");
            return Vec::new();
        }
    };

    let mut posts: Vec<SocialPost> = Vec::new();
    let mut seen_urls: Vec<String> = Vec::new();
    for item in items.iter().take(config.social_posts_limit) {
        if !is_relevant_post(item, company, slug.as_deref()) {
            continue;
        }
        let text = item["text"].as_str().unwrap_or_default().to_string();
        let title = match item["title"].as_str().filter(|t| !t.is_empty()) {
            Some(title) => title.to_string(),
            None if text.chars().count() > 100 => {
                format!("{}...", text.chars().take(97).collect::<String>())
            }
            None => text.clone(),
        };
        let url = item["url"]
            .as_str()
            .or_else(|| item["link"].as_str())
            .or_else(|| item["post_url"].as_str())
            .unwrap_or_default()
            .to_string();
        if seen_urls.contains(&url) {
            continue;
        }
        seen_urls.push(url.clone());

        posts.push(SocialPost {
            title: if title.is_empty() {
                "LinkedIn Post".into()
            } else {
                title
            },
            text,
            url,
            author: item["author"]["name"]
                .as_str()
                .or_else(|| item["profileName"].as_str())
                .map(str::to_string),
            published_at: item["publishedAt"]
                .as_str()
                .or_else(|| item["posted_at"]["date"].as_str())
                .or_else(|| item["timeAgo"].as_str())
                .map(str::to_string),
        });
    }

    posts
}

/// Start an actor run and read its default dataset.
async fn fetch_dataset_items(
    client: &Client,
    config: &EnrichConfig,
    token: &str,
    linkedin_url: &str,
) -> reqwest::Result<Vec<Value>> {
    let base = config.apify_base.trim_end_matches('/');

    let run: Value = client
        .post(format!("{base}{ACTOR_PATH}"))
        .query(&[("token", token), ("waitForFinish", "120")])
        .json(&json!({
            "linkedinCompanyUrls": [linkedin_url],
            "maxItems": config.social_posts_limit.max(1),
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let Some(dataset_id) = run["data"]["defaultDatasetId"].as_str() else {
        return Ok(Vec::new());
    };

    let items: Value = client
        .get(format!("{base}/v2/datasets/{dataset_id}/items"))
        .query(&[("token", token), ("clean", "1")])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(items.as_array().cloned().unwrap_or_default())
}

/// Company slug from a LinkedIn URL: the last path segment that is not a
/// structural one (`company`, `posts`, `update`).
fn extract_company_slug(raw_url: &str) -> Option<String> {
    let parsed = Url::parse(raw_url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(str::to_lowercase)
        .find(|segment| !matches!(segment.as_str(), "company" | "posts" | "update"))
}

/// Keep only posts that mention the company somewhere recognizable.
fn is_relevant_post(item: &Value, company: &CompanyRecord<'_>, slug: Option<&str>) -> bool {
    let source = item["source_company"].as_str().unwrap_or_default().to_lowercase();
    let author = item["author"]["name"].as_str().unwrap_or_default().to_lowercase();
    let text = item["text"].as_str().unwrap_or_default().to_lowercase();

    let mut candidates: Vec<String> = Vec::new();
    if let Some(slug) = slug {
        candidates.push(slug.to_string());
    }
    if !company.name.is_empty() {
        candidates.push(company.name.to_lowercase());
    }
    if !company.domain.is_empty() {
        if let Some(label) = company.domain.to_lowercase().split('.').next() {
            candidates.push(label.to_string());
        }
    }
    for token in candidates.clone() {
        if token.len() > 4 && token.ends_with(".com") {
            candidates.push(token[..token.len() - 4].to_string());
        }
    }

    candidates.iter().any(|token| {
        !token.is_empty()
            && (source.contains(token) || author.contains(token) || text.contains(token))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgsift_shared::{Row, normalize_company};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn company_row(linkedin: &str) -> Row {
        [
            ("company".to_string(), json!("Acme")),
            ("domain".to_string(), json!("acme.example")),
            ("linkedin".to_string(), json!(linkedin)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn slug_skips_structural_segments() {
        assert_eq!(
            extract_company_slug("https://www.linkedin.com/company/acme-payments/posts"),
            Some("acme-payments".into())
        );
        assert_eq!(
            extract_company_slug("https://www.linkedin.com/company"),
            None
        );
    }

    #[test]
    fn relevance_matches_slug_name_or_domain_label() {
        let row = company_row("https://www.linkedin.com/company/acme-payments");
        let company = normalize_company(&row, 0);

        let hit = json!({"text": "Proud day at acme-payments!", "author": {"name": "Someone"}});
        assert!(is_relevant_post(&hit, &company, Some("acme-payments")));

        let by_name = json!({"source_company": "ACME", "text": "launch"});
        assert!(is_relevant_post(&by_name, &company, None));

        let miss = json!({"text": "unrelated reshare", "author": {"name": "Stranger"}});
        assert!(!is_relevant_post(&miss, &company, Some("acme-payments")));
    }

    #[tokio::test]
    async fn missing_token_or_linkedin_url_short_circuits() {
        let row = company_row("https://www.linkedin.com/company/acme");
        let company = normalize_company(&row, 0);
        assert!(fetch_social_posts(&company, &EnrichConfig::default()).await.is_empty());

        let bare: Row = [("company".to_string(), json!("Acme"))].into_iter().collect();
        let company = normalize_company(&bare, 0);
        let config = EnrichConfig {
            apify_token: Some("tok".into()),
            ..EnrichConfig::default()
        };
        assert!(fetch_social_posts(&company, &config).await.is_empty());
    }

    #[tokio::test]
    async fn run_and_dataset_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ACTOR_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"defaultDatasetId": "ds-1"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/datasets/ds-1/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"text": "Acme ships a new merchant portal", "url": "https://li.example/p1",
                 "author": {"name": "Acme"}, "publishedAt": "2026-08-10"},
                {"text": "Acme ships a new merchant portal", "url": "https://li.example/p1"},
                {"text": "unrelated post", "url": "https://li.example/p2"}
            ])))
            .mount(&server)
            .await;

        let config = EnrichConfig {
            apify_token: Some("tok".into()),
            apify_base: server.uri(),
            ..EnrichConfig::default()
        };
        let row = company_row("https://www.linkedin.com/company/acme");
        let company = normalize_company(&row, 0);

        let posts = fetch_social_posts(&company, &config).await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Acme ships a new merchant portal");
        assert_eq!(posts[0].author.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn run_without_dataset_yields_no_posts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ACTOR_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {}})))
            .mount(&server)
            .await;

        let config = EnrichConfig {
            apify_token: Some("tok".into()),
            apify_base: server.uri(),
            ..EnrichConfig::default()
        };
        let row = company_row("https://www.linkedin.com/company/acme");
        let company = normalize_company(&row, 0);
        assert!(fetch_social_posts(&company, &config).await.is_empty());
    }
}
