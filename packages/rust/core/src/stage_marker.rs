//! Per-row stage marker: which enrichment passes a row has completed.

use serde_json::Value;

/// Add `stage_id` to an existing marker value and re-serialize.
///
/// Accepts a comma-separated string, a JSON array, or a bare number.
/// Numeric stage ids sort numerically before non-numeric ones; the union
/// makes the operation idempotent.
pub fn mark_stage(existing: Option<&Value>, stage_id: &str) -> String {
    let mut stages: Vec<String> = Vec::new();
    match existing {
        Some(Value::String(s)) => {
            stages.extend(s.split(',').map(str::trim).filter(|p| !p.is_empty()).map(str::to_string));
        }
        Some(Value::Array(items)) => {
            for item in items {
                match item {
                    Value::String(s) if !s.trim().is_empty() => stages.push(s.trim().to_string()),
                    Value::Number(n) => stages.push(n.to_string()),
                    _ => {}
                }
            }
        }
        Some(Value::Number(n)) => stages.push(n.to_string()),
        _ => {}
    }

    let stage_id = stage_id.trim();
    if !stage_id.is_empty() && !stages.iter().any(|s| s == stage_id) {
        stages.push(stage_id.to_string());
    }

    stages.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
    stages.dedup();
    stages.join(",")
}
