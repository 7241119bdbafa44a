//! Decision context: the gathered signals handed to the cascade.

use orgsift_shared::{NewsArticle, SerpResult, SiteSnapshot, SocialPost};

/// Character cap applied to the combined site text.
const SITE_TEXT_CAP: usize = 8000;

/// Everything the cascade may look at for one company. Built once per row
/// from whatever the source adapters managed to fetch; empty fields are
/// normal and mean the signal was unavailable.
#[derive(Debug, Clone, Default)]
pub struct DecisionContext {
    pub site_text: String,
    pub serp_overview: String,
    pub serp_articles: Vec<NewsArticle>,
    pub news: Vec<NewsArticle>,
    pub linkedin_posts: Vec<SocialPost>,
}

impl DecisionContext {
    /// Assemble a context from source snapshots.
    pub fn from_signals(
        site: &SiteSnapshot,
        serp: SerpResult,
        news: Vec<NewsArticle>,
        posts: Vec<SocialPost>,
    ) -> Self {
        Self {
            site_text: site.combined_text(SITE_TEXT_CAP),
            serp_overview: serp.overview,
            serp_articles: serp.articles,
            news,
            linkedin_posts: posts,
        }
    }

    /// News titles joined for keyword scans.
    pub fn news_titles(&self) -> String {
        self.news
            .iter()
            .map(|a| a.title.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Post texts joined for keyword and product scans.
    pub fn post_texts(&self) -> String {
        self.linkedin_posts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
