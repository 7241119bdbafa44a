//! Application configuration for orgsift.
//!
//! User config lives at `~/.orgsift/orgsift.toml`. The file stores env var
//! *names* for API keys, never the keys themselves. [`EnrichConfig`] is the
//! resolved runtime value passed explicitly into every adapter, cascade,
//! and runner call; nothing reads ambient state after startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OrgsiftError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "orgsift.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".orgsift";

// ---------------------------------------------------------------------------
// Config structs (matching orgsift.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// AI provider settings.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Data source (search/news/social) settings.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Pipeline/runner settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// `[providers]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Env var holding the OpenAI API key.
    #[serde(default = "default_openai_key_env")]
    pub openai_api_key_env: String,

    /// OpenAI model used for enrichment decisions.
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Env var holding the Perplexity API key.
    #[serde(default = "default_perplexity_key_env")]
    pub perplexity_api_key_env: String,

    /// Perplexity model used for decisions and dossiers.
    #[serde(default = "default_perplexity_model")]
    pub perplexity_model: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_api_key_env: default_openai_key_env(),
            openai_model: default_openai_model(),
            perplexity_api_key_env: default_perplexity_key_env(),
            perplexity_model: default_perplexity_model(),
        }
    }
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_openai_model() -> String {
    "gpt-4o-mini".into()
}
fn default_perplexity_key_env() -> String {
    "PERPLEXITY_API_KEY".into()
}
fn default_perplexity_model() -> String {
    "sonar".into()
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Env var holding the SerpAPI key.
    #[serde(default = "default_serpapi_key_env")]
    pub serpapi_key_env: String,

    /// Env var holding the NewsAPI key.
    #[serde(default = "default_newsapi_key_env")]
    pub newsapi_key_env: String,

    /// Env var holding the Apify API token.
    #[serde(default = "default_apify_token_env")]
    pub apify_token_env: String,

    /// Maximum social posts kept per company.
    #[serde(default = "default_social_posts_limit")]
    pub social_posts_limit: usize,

    /// Whether the site scraper may use a registered headless-browser
    /// fallback when no page fetch succeeds.
    #[serde(default = "default_true")]
    pub enable_browser_fallback: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            serpapi_key_env: default_serpapi_key_env(),
            newsapi_key_env: default_newsapi_key_env(),
            apify_token_env: default_apify_token_env(),
            social_posts_limit: default_social_posts_limit(),
            enable_browser_fallback: true,
        }
    }
}

fn default_serpapi_key_env() -> String {
    "SERPAPI_KEY".into()
}
fn default_newsapi_key_env() -> String {
    "NEWSAPI_KEY".into()
}
fn default_apify_token_env() -> String {
    "APIFY_API_TOKEN".into()
}
fn default_social_posts_limit() -> usize {
    5
}
fn default_true() -> bool {
    true
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Concurrent row workers (clamped to 1..=16).
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Per-call HTTP timeout in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: f64,

    /// Base for the dossier retry backoff: sleep `base * attempt` seconds.
    #[serde(default = "default_dossier_backoff_secs")]
    pub dossier_backoff_secs: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            http_timeout_secs: default_http_timeout_secs(),
            dossier_backoff_secs: default_dossier_backoff_secs(),
        }
    }
}

fn default_worker_count() -> usize {
    3
}
fn default_http_timeout_secs() -> f64 {
    15.0
}
fn default_dossier_backoff_secs() -> f64 {
    1.5
}

// ---------------------------------------------------------------------------
// Runtime config (resolved keys + endpoints, passed into every call)
// ---------------------------------------------------------------------------

/// Resolved runtime configuration: immutable, passed explicitly everywhere.
///
/// A `None` credential disables that provider/source (not an error: the
/// adapter returns an empty result, the cascade skips the provider).
/// Endpoint bases default to the real services; tests point them at a
/// mock server.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub perplexity_api_key: Option<String>,
    pub perplexity_model: String,
    pub serpapi_key: Option<String>,
    pub newsapi_key: Option<String>,
    pub apify_token: Option<String>,

    pub social_posts_limit: usize,
    pub enable_browser_fallback: bool,
    pub worker_count: usize,
    pub http_timeout: Duration,
    pub dossier_backoff_secs: f64,

    pub openai_base: String,
    pub perplexity_base: String,
    pub serpapi_base: String,
    pub newsapi_base: String,
    pub apify_base: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: default_openai_model(),
            perplexity_api_key: None,
            perplexity_model: default_perplexity_model(),
            serpapi_key: None,
            newsapi_key: None,
            apify_token: None,
            social_posts_limit: default_social_posts_limit(),
            enable_browser_fallback: true,
            worker_count: default_worker_count(),
            http_timeout: Duration::from_secs_f64(default_http_timeout_secs()),
            dossier_backoff_secs: default_dossier_backoff_secs(),
            openai_base: "https://api.openai.com".into(),
            perplexity_base: "https://api.perplexity.ai".into(),
            serpapi_base: "https://serpapi.com".into(),
            newsapi_base: "https://newsapi.org".into(),
            apify_base: "https://api.apify.com".into(),
        }
    }
}

impl EnrichConfig {
    /// Resolve an [`AppConfig`] against the process environment.
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            openai_api_key: env_key(&config.providers.openai_api_key_env),
            openai_model: config.providers.openai_model.clone(),
            perplexity_api_key: env_key(&config.providers.perplexity_api_key_env),
            perplexity_model: config.providers.perplexity_model.clone(),
            serpapi_key: env_key(&config.sources.serpapi_key_env),
            newsapi_key: env_key(&config.sources.newsapi_key_env),
            apify_token: env_key(&config.sources.apify_token_env),
            social_posts_limit: config.sources.social_posts_limit.max(1),
            enable_browser_fallback: config.sources.enable_browser_fallback,
            worker_count: config.pipeline.worker_count.clamp(1, 16),
            http_timeout: Duration::from_secs_f64(config.pipeline.http_timeout_secs.max(1.0)),
            dossier_backoff_secs: config.pipeline.dossier_backoff_secs.max(0.0),
            ..Self::default()
        }
    }

    /// True when at least one AI provider is configured.
    pub fn has_provider(&self) -> bool {
        self.openai_api_key.is_some() || self.perplexity_api_key.is_some()
    }
}

/// Read an env var, treating empty values as unset.
fn env_key(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.orgsift/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| OrgsiftError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.orgsift/orgsift.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| OrgsiftError::config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| OrgsiftError::config(format!("failed to parse {}: {e}", path.display())))
}
