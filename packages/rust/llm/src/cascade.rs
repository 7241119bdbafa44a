//! Provider cascade: OpenAI, then Perplexity, then the offline heuristic.

use tracing::{debug, warn};

use orgsift_shared::{CompanyRecord, EnrichConfig, Profile, Result};

use crate::context::DecisionContext;
use crate::heuristic::heuristic_decision;
use crate::parse::{Decision, parse_decision};
use crate::prompts::{DECISION_SYSTEM_PROMPT, build_prompt};
use crate::provider::{openai_chat, perplexity_chat};

/// Perplexity decision temperature (dossiers use 0.0 separately).
const PERPLEXITY_DECISION_TEMPERATURE: f64 = 0.2;

/// Decide on the company from the gathered material.
///
/// Tries each configured provider in order. A provider fails on transport
/// error or when its payload does not strictly parse; the failure is logged
/// and the next strategy runs. The heuristic terminates the cascade, so a
/// decision always comes back.
pub async fn decide(
    profile: Profile,
    company: &CompanyRecord<'_>,
    context: &DecisionContext,
    config: &EnrichConfig,
) -> Decision {
    let prompt = build_prompt(profile, company.label(), context);

    if config.openai_api_key.is_some() {
        match openai_decision(profile, config, &prompt).await {
            Ok(decision) => {
                debug!(company = %company.label(), "decision from openai");
                return decision;
            }
            Err(e) => {
                warn!(company = %company.label(), error = %e, "openai decision failed");
            }
        }
    }

    if config.perplexity_api_key.is_some() {
        match perplexity_decision(profile, config, &prompt).await {
            Ok(decision) => {
                debug!(company = %company.label(), "decision from perplexity");
                return decision;
            }
            Err(e) => {
                warn!(company = %company.label(), error = %e, "perplexity decision failed");
            }
        }
    }

    debug!(company = %company.label(), "decision from offline heuristic");
    heuristic_decision(profile, context)
}

async fn openai_decision(
    profile: Profile,
    config: &EnrichConfig,
    prompt: &str,
) -> Result<Decision> {
    let content = openai_chat(config, DECISION_SYSTEM_PROMPT, prompt).await?;
    parse_decision(profile, &content, true)
}

async fn perplexity_decision(
    profile: Profile,
    config: &EnrichConfig,
    prompt: &str,
) -> Result<Decision> {
    let content = perplexity_chat(
        config,
        DECISION_SYSTEM_PROMPT,
        prompt,
        PERPLEXITY_DECISION_TEMPERATURE,
        None,
    )
    .await?;
    parse_decision(profile, &content, true)
}
