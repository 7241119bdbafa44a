//! Shared types, error model, and configuration for orgsift.
//!
//! This crate is the foundation depended on by all other orgsift crates.
//! It provides:
//! - [`OrgsiftError`], the unified error type
//! - Domain types ([`Row`], [`CompanyRecord`], profile enums, source records)
//! - Configuration ([`AppConfig`], [`EnrichConfig`], config loading)
//! - Text/signal utilities used by adapters and the decision cascade

pub mod config;
pub mod error;
pub mod text;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, EnrichConfig, PipelineConfig, ProvidersConfig, SourcesConfig, config_dir,
    config_file_path, load_config, load_config_from,
};
pub use error::{OrgsiftError, Result};
pub use text::{
    collect_candidate_products, detect_keywords, filter_software_candidates, slugify,
    truncate_text,
};
pub use types::{
    BusinessModel, CompanyRecord, IsoCategory, MarketFocus, NewsArticle, PageSnapshot, Profile,
    ROW_KEY, Row, SerpResult, SiteSnapshot, SocialPost, normalize_company,
};
