//! Prompt assembly for the decision providers.

use serde_json::json;

use orgsift_shared::{NewsArticle, Profile, SocialPost, truncate_text};

use crate::context::DecisionContext;

/// System message shared by the decision providers.
pub const DECISION_SYSTEM_PROMPT: &str =
    "You are a research assistant that produces JSON only.";

const SITE_SECTION_CAP: usize = 4000;
const SECTION_CAP: usize = 1500;
const SECTION_ITEM_CAP: usize = 5;

/// Build the user prompt for a decision: profile-specific instruction plus
/// the gathered material, each section truncated to keep the request small.
pub fn build_prompt(profile: Profile, company_label: &str, context: &DecisionContext) -> String {
    let instruction = match profile {
        Profile::Software => format!(
            "Research the company \"{company_label}\" and decide whether it offers \
             software products. Respond with strict JSON containing exactly these keys: \
             summary (string), insights (string), has_software (boolean), \
             software_products (list of strings), \
             business_model (product|service|platform|marketplace|hybrid|other), \
             market_focus (B2B|B2C|B2B2C|B2G|MIXED). Use provided material only."
        ),
        Profile::IsoMsp => format!(
            "Research the company \"{company_label}\" and classify its role in the \
             payments ecosystem. Respond with strict JSON containing exactly these keys: \
             summary (string), insights (string), \
             category (Payment Processor|Payment Gateway|Payment Service Provider|ISO/MSP|Acquirer|Hybrid|NO), \
             services (list of strings), merchant_segments (list of strings), \
             partnerships (list of strings), has_software (boolean), \
             software_products (list of strings), \
             business_model (product|service|platform|marketplace|hybrid|other), \
             market_focus (B2B|B2C|B2B2C|B2G|MIXED). Use provided material only."
        ),
    };

    format!(
        "{instruction}\n\n\
         Website content:\n{site}\n\n\
         Search overview:\n{overview}\n\n\
         Search articles:\n{serp_articles}\n\n\
         News articles:\n{news}\n\n\
         LinkedIn posts:\n{posts}",
        site = truncate_text(&context.site_text, SITE_SECTION_CAP),
        overview = truncate_text(&context.serp_overview, SECTION_CAP),
        serp_articles = articles_section(&context.serp_articles),
        news = articles_section(&context.news),
        posts = posts_section(&context.linkedin_posts),
    )
}

fn articles_section(articles: &[NewsArticle]) -> String {
    let items: Vec<_> = articles
        .iter()
        .take(SECTION_ITEM_CAP)
        .map(|a| {
            json!({
                "title": a.title,
                "source": a.source,
                "summary": a.summary,
            })
        })
        .collect();
    truncate_text(&json!(items).to_string(), SECTION_CAP)
}

fn posts_section(posts: &[SocialPost]) -> String {
    let items: Vec<_> = posts
        .iter()
        .take(SECTION_ITEM_CAP)
        .map(|p| {
            json!({
                "title": p.title,
                "text": p.text,
            })
        })
        .collect();
    truncate_text(&json!(items).to_string(), SECTION_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn software_prompt_names_company_and_keys() {
        let ctx = DecisionContext {
            site_text: "Acme builds payment software.".into(),
            ..DecisionContext::default()
        };
        let prompt = build_prompt(Profile::Software, "Acme", &ctx);
        assert!(prompt.contains("\"Acme\""));
        assert!(prompt.contains("has_software"));
        assert!(prompt.contains("Website content:\nAcme builds payment software."));
        assert!(!prompt.contains("merchant_segments"));
    }

    #[test]
    fn iso_prompt_carries_category_vocabulary() {
        let prompt = build_prompt(Profile::IsoMsp, "Acme", &DecisionContext::default());
        assert!(prompt.contains("ISO/MSP"));
        assert!(prompt.contains("merchant_segments"));
    }

    #[test]
    fn long_site_text_is_truncated() {
        let ctx = DecisionContext {
            site_text: "z".repeat(10_000),
            ..DecisionContext::default()
        };
        let prompt = build_prompt(Profile::Software, "Acme", &ctx);
        assert!(prompt.len() < 8000);
    }
}
