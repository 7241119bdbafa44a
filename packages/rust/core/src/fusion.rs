//! Software-signal fusion.
//!
//! The decision cascade and a direct keyword scan of the gathered material
//! each produce a software signal. Fusion unions them; neither source can
//! veto the other.

use orgsift_llm::{Decision, DecisionContext};
use orgsift_shared::{collect_candidate_products, filter_software_candidates};

/// Fused "has software" verdict with the combined product list.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftwareVerdict {
    pub has_software: bool,
    pub products: Vec<String>,
}

/// Fuse the cascade's decision with an independent scan of the source text.
///
/// The product list is the sorted, deduplicated union of both signals, so
/// the result is independent of source ordering.
pub fn fuse_software(decision: &Decision, context: &DecisionContext) -> SoftwareVerdict {
    let news_summaries = context
        .news
        .iter()
        .filter_map(|a| a.summary.as_deref())
        .collect::<Vec<_>>()
        .join("\n");
    let post_texts = context
        .linkedin_posts
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let scanned = filter_software_candidates(collect_candidate_products([
        context.site_text.as_str(),
        context.serp_overview.as_str(),
        news_summaries.as_str(),
        post_texts.as_str(),
    ]));

    let mut products: Vec<String> = scanned
        .into_iter()
        .chain(decision.software_products.iter().cloned())
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    products.sort();
    products.dedup();

    SoftwareVerdict {
        has_software: decision.has_software || !products.is_empty(),
        products,
    }
}
