//! Enrichment pipeline core: stage entry points, signal fusion, relevance
//! rules, the stage marker, and the bounded-concurrency stage runner.
//!
//! The store adapter, dashboard, and CLI are external collaborators; they
//! hand batches of rows to [`StageRunner::run`] and persist the output of
//! [`merge_rows`] through a [`RowStore`] implementation.

pub mod fusion;
pub mod relevance;
pub mod runner;
pub mod stage_marker;
pub mod stages;
pub mod store;

pub use fusion::{SoftwareVerdict, fuse_software};
pub use relevance::evaluate_relevance;
pub use runner::{RunReport, Stage, StageRunner, UpdateMap, collect_updates, merge_rows};
pub use stage_marker::mark_stage;
pub use stages::{collect_dossier, collect_media, collect_profile};
pub use store::RowStore;
