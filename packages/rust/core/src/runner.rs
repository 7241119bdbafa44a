//! Bounded-concurrency stage runner and row merge.
//!
//! Workers return `(row key, result)` pairs; only the collection loop that
//! drains completed tasks writes the update map. A failed row is logged and
//! excluded from the map, leaving it untouched by this run.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use orgsift_shared::{EnrichConfig, OrgsiftError, Profile, Result, Row};
use orgsift_sources::BrowserFetch;

use crate::stages::{collect_dossier, collect_media, collect_profile};

/// Updated rows keyed by addressing key.
pub type UpdateMap = BTreeMap<u64, Row>;

/// Which enrichment pass a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Profile(Profile),
    Media(Profile),
    Dossier,
}

/// Counts reported after a run: rows submitted vs. rows that produced an
/// update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub processed: usize,
    pub updated: usize,
}

/// Drives one stage over a row batch with a bounded worker pool.
pub struct StageRunner {
    config: EnrichConfig,
    browser: Option<Arc<dyn BrowserFetch>>,
}

impl StageRunner {
    pub fn new(config: EnrichConfig) -> Self {
        Self {
            config,
            browser: None,
        }
    }

    /// Register a headless-browser collaborator for the site scraper.
    pub fn with_browser(mut self, browser: Arc<dyn BrowserFetch>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Run `stage` over `rows`. Per-row failures are isolated; only a fatal
    /// configuration problem (checked before any row is processed) fails
    /// the whole run.
    pub async fn run(&self, rows: &[Row], stage: Stage) -> Result<(UpdateMap, RunReport)> {
        if stage == Stage::Dossier && self.config.perplexity_api_key.is_none() {
            return Err(OrgsiftError::config(
                "dossier stage requires a Perplexity API key",
            ));
        }

        let semaphore = Arc::new(Semaphore::new(self.config.worker_count));
        let mut tasks = JoinSet::new();
        for (index, row) in rows.iter().enumerate() {
            let row = row.clone();
            let config = self.config.clone();
            let browser = self.browser.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                let key = row.key_or(index);
                let result = match stage {
                    Stage::Profile(profile) => {
                        collect_profile(&row, &config, profile, index, browser.as_deref()).await
                    }
                    Stage::Media(profile) => collect_media(&row, &config, profile, index).await,
                    Stage::Dossier => collect_dossier(&row, &config, index).await,
                };
                (key, result)
            });
        }

        // Single collection loop: the only writer of the update map.
        let mut results: Vec<(u64, Result<Row>)> = Vec::with_capacity(rows.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(pair) => results.push(pair),
                Err(e) => warn!(error = %e, "row task panicked"),
            }
        }

        let updates = collect_updates(results);
        let report = RunReport {
            processed: rows.len(),
            updated: updates.len(),
        };
        info!(
            processed = report.processed,
            updated = report.updated,
            "stage run complete"
        );
        Ok((updates, report))
    }
}

/// Build the update map from worker results, dropping failed rows.
pub fn collect_updates(results: impl IntoIterator<Item = (u64, Result<Row>)>) -> UpdateMap {
    let mut updates = UpdateMap::new();
    for (key, result) in results {
        match result {
            Ok(row) => {
                updates.insert(key, row);
            }
            Err(e) => {
                warn!(row = key, error = %e, "row enrichment failed; row left unchanged");
            }
        }
    }
    updates
}

/// Substitute updated rows into the original batch, preserving order and
/// count regardless of which subset succeeded.
pub fn merge_rows(all_rows: &[Row], updates: &UpdateMap) -> Vec<Row> {
    all_rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            updates
                .get(&row.key_or(index))
                .cloned()
                .unwrap_or_else(|| row.clone())
        })
        .collect()
}
