//! Reconciliation layer: turns gathered signals into a typed decision.
//!
//! [`decide`] runs an ordered provider cascade (OpenAI, then Perplexity,
//! then a deterministic offline heuristic), so a decision always comes back.
//! [`build_dossier`] is the one operation that can exhaust its retries and
//! fail; callers record the failure on the row instead of aborting the run.

pub mod cascade;
pub mod context;
pub mod dossier;
pub mod heuristic;
pub mod parse;
pub mod prompts;
pub mod provider;

pub use cascade::decide;
pub use context::DecisionContext;
pub use dossier::{Dossier, EMPTY_DOSSIER_SUMMARY, backoff_delay, build_dossier, parse_dossier};
pub use heuristic::heuristic_decision;
pub use parse::{Decision, parse_decision};
