//! Source adapters: independent fetchers for company signals.
//!
//! Each adapter follows the same contract: `fetch(company, config)` returns
//! a typed snapshot, and a missing credential or transport failure degrades
//! to an empty result (logged, never propagated). The pipeline proceeds
//! with whatever signal survived.

pub mod news;
pub mod search;
pub mod site;
pub mod social;

pub use news::fetch_news_articles;
pub use search::fetch_serp_overview;
pub use site::{BrowserFetch, scrape_site};
pub use social::fetch_social_posts;
