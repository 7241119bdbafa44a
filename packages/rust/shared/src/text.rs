//! Text/signal utilities: truncation, keyword scans, and the
//! software-product candidate filters shared by the cascade heuristic and
//! signal fusion.

use std::sync::OnceLock;

use regex::Regex;

/// Identifier-like line shape for product candidates: word characters,
/// hyphens, and spaces, 3–60 chars.
fn candidate_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w\-\s]{3,60}$").expect("valid candidate regex"))
}

/// Tokens that mark a line as describing an offering.
const PRODUCT_TOKENS: [&str; 4] = ["product", "platform", "solution", "suite"];

/// Keywords that mark a candidate as software-like.
const SOFTWARE_KEYWORDS: [&str; 14] = [
    "software",
    "platform",
    "app",
    "application",
    "tool",
    "suite",
    "system",
    "saas",
    "cloud",
    "portal",
    "engine",
    "dashboard",
    "studio",
    "analytics",
];

/// Trim and cap `payload` at `limit` characters, appending `...` within the
/// limit when truncated.
pub fn truncate_text(payload: &str, limit: usize) -> String {
    let payload = payload.trim();
    if payload.chars().count() <= limit {
        return payload.to_string();
    }
    let head: String = payload.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", head.trim_end())
}

/// True when any of `keywords` occurs (case-insensitively) in any text.
pub fn detect_keywords<'a, I, K>(texts: I, keywords: &[K]) -> bool
where
    I: IntoIterator<Item = &'a str>,
    K: AsRef<str>,
{
    let normalized: Vec<String> = keywords.iter().map(|k| k.as_ref().to_lowercase()).collect();
    texts.into_iter().any(|text| {
        let lower = text.to_lowercase();
        normalized.iter().any(|kw| lower.contains(kw.as_str()))
    })
}

/// Extract product-candidate lines from free text: short identifier-shaped
/// lines that mention an offering token. Preserves first-seen order.
pub fn collect_candidate_products<'a, I>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidates: Vec<String> = Vec::new();
    for text in texts {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.matches(' ').count() > 7 {
                continue;
            }
            let lower = line.to_lowercase();
            if !PRODUCT_TOKENS.iter().any(|token| lower.contains(token)) {
                continue;
            }
            if candidate_shape().is_match(line) && !candidates.iter().any(|c| c == line) {
                candidates.push(line.to_string());
            }
        }
    }
    candidates
}

/// Keep candidates that look like software offerings: a software keyword,
/// or a recognized as-a-service phrasing. Deduplicates, preserving order.
pub fn filter_software_candidates<I, S>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut results: Vec<String> = Vec::new();
    for candidate in candidates {
        let candidate = candidate.as_ref();
        let lower = candidate.to_lowercase();
        let mut keep = SOFTWARE_KEYWORDS.iter().any(|kw| lower.contains(kw));
        if !keep && lower.contains("service") {
            keep = lower.contains(" as a service")
                || lower.contains("-as-a-service")
                || lower.contains("service platform");
        }
        if keep && !results.iter().any(|r| r == candidate) {
            results.push(candidate.to_string());
        }
    }
    results
}

/// Lowercase `value` and strip everything but alphanumerics (used to guess
/// a `.com` host from a company name).
pub fn slugify(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}
