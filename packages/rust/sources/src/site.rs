//! Company-site scraper.
//!
//! Tries a small set of path suffixes across up to two candidate base URLs,
//! fetching concurrently with one bounded HTTP client. When nothing could
//! be fetched and a browser fallback is registered and enabled, the first
//! candidate is retried through the headless browser.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use orgsift_shared::{CompanyRecord, EnrichConfig, PageSnapshot, Result, SiteSnapshot};

/// Browser-like User-Agent; some company sites gate plain clients.
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118 Safari/537.36";

/// Path suffixes probed on each candidate base URL.
const PATH_SUFFIXES: [&str; 6] = ["", "about", "solutions", "products", "platform", "news"];

/// Cap on snapshot pages per company.
const MAX_PAGES: usize = 6;

/// Candidate base URLs considered per company.
const MAX_CANDIDATES: usize = 4;

/// Concurrent page fetches per scrape call.
const FETCH_CONCURRENCY: usize = 4;

/// Headless-browser collaborator for JavaScript-rendered sites. Injected by
/// the embedding application; the scraper itself stays HTTP-only.
#[async_trait]
pub trait BrowserFetch: Send + Sync {
    /// Fetch fully-rendered HTML for `url`.
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

/// Scrape the company's site into a [`SiteSnapshot`].
///
/// Never fails for expected reasons: no candidate URLs, transport errors,
/// and browser-fallback failures all degrade to fewer (or zero) pages.
pub async fn scrape_site(
    company: &CompanyRecord<'_>,
    config: &EnrichConfig,
    browser: Option<&dyn BrowserFetch>,
) -> SiteSnapshot {
    let candidates = company.candidate_urls(MAX_CANDIDATES);
    if candidates.is_empty() {
        return SiteSnapshot::empty();
    }
    debug!(company = %company.label(), candidates = candidates.len(), "scraping candidate urls");

    let client = match Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(config.http_timeout)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!(company = %company.label(), error = %e, "failed to build HTTP client");
            return SiteSnapshot::empty();
        }
    };

    // Probe suffixes on the first two candidates, deduplicated, keeping
    // the probe order so snapshots come out home-page first.
    let mut urls: Vec<String> = Vec::new();
    for base in candidates.iter().take(2) {
        for suffix in PATH_SUFFIXES {
            let target = join_url(base, suffix);
            if !urls.contains(&target) {
                urls.push(target);
            }
        }
    }

    let semaphore = Arc::new(Semaphore::new(FETCH_CONCURRENCY));
    let mut handles = Vec::with_capacity(urls.len());
    for url in &urls {
        let client = client.clone();
        let sem = semaphore.clone();
        let url = url.clone();
        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire().await.expect("semaphore closed");
            fetch_html(&client, &url).await
        }));
    }

    let mut pages: Vec<PageSnapshot> = Vec::new();
    for (url, handle) in urls.iter().zip(handles) {
        let html = match handle.await {
            Ok(Some(html)) => html,
            Ok(None) => continue,
            Err(e) => {
                warn!(%url, error = %e, "fetch task panicked");
                continue;
            }
        };
        if pages.len() >= MAX_PAGES {
            break;
        }
        if let Some(snapshot) = html_to_snapshot(url, &html) {
            pages.push(snapshot);
        }
    }

    if pages.is_empty() && config.enable_browser_fallback {
        if let Some(browser) = browser {
            match browser.fetch_html(&candidates[0]).await {
                Ok(html) => {
                    if let Some(snapshot) = html_to_snapshot(&candidates[0], &html) {
                        pages.push(snapshot);
                    }
                }
                Err(e) => {
                    warn!(url = %candidates[0], error = %e, "browser fallback failed");
                }
            }
        }
    }

    pages.truncate(MAX_PAGES);
    SiteSnapshot { pages }
}

/// Fetch one page, returning `None` on any expected failure.
async fn fetch_html(client: &Client, url: &str) -> Option<String> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(%url, error = %e, "HTTP fetch failed");
            return None;
        }
    };
    if !response.status().is_success() {
        debug!(%url, status = %response.status(), "HTTP fetch failed");
        return None;
    }
    match response.text().await {
        Ok(body) => Some(body),
        Err(e) => {
            debug!(%url, error = %e, "body read failed");
            None
        }
    }
}

/// Parse HTML into a page snapshot; `None` when the page has no text.
fn html_to_snapshot(url: &str, html: &str) -> Option<PageSnapshot> {
    let doc = Html::parse_document(html);

    let title_sel = Selector::parse("title").expect("valid selector");
    let title = doc
        .select(&title_sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let text = doc
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return None;
    }

    Some(PageSnapshot {
        url: url.to_string(),
        title,
        text,
    })
}

fn join_url(base: &str, suffix: &str) -> String {
    let base = base.trim_end_matches('/');
    if suffix.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{suffix}")
    }
}
