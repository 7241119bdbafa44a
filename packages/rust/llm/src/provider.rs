//! Chat-completion calls to the decision providers.

use reqwest::Client;
use serde_json::{Value, json};

use orgsift_shared::{EnrichConfig, OrgsiftError, Result};

/// Call the OpenAI chat-completions endpoint, forcing a JSON object
/// response. Returns the assistant message content.
pub async fn openai_chat(config: &EnrichConfig, system: &str, user: &str) -> Result<String> {
    let Some(api_key) = config.openai_api_key.as_deref() else {
        return Err(OrgsiftError::Provider("openai api key not configured".into()));
    };

    let body = json!({
        "model": config.openai_model,
        "messages": [
            {"role": "system", "content": system},
            {"role": "user", "content": user},
        ],
        "temperature": 0.0,
        "response_format": {"type": "json_object"},
    });
    let endpoint = format!(
        "{}/v1/chat/completions",
        config.openai_base.trim_end_matches('/')
    );

    let payload = post_chat(config, &endpoint, api_key, &body, "openai").await?;
    Ok(message_content(&payload))
}

/// Call the Perplexity chat-completions endpoint. `search_mode` is set for
/// dossier requests so the provider grounds its answer in live search.
pub async fn perplexity_chat(
    config: &EnrichConfig,
    system: &str,
    user: &str,
    temperature: f64,
    search_mode: Option<&str>,
) -> Result<String> {
    let Some(api_key) = config.perplexity_api_key.as_deref() else {
        return Err(OrgsiftError::Provider(
            "perplexity api key not configured".into(),
        ));
    };

    let mut body = json!({
        "model": config.perplexity_model,
        "messages": [
            {"role": "system", "content": system},
            {"role": "user", "content": user},
        ],
        "temperature": temperature,
    });
    if let Some(mode) = search_mode {
        body["search_mode"] = json!(mode);
    }
    let endpoint = format!(
        "{}/chat/completions",
        config.perplexity_base.trim_end_matches('/')
    );

    let payload = post_chat(config, &endpoint, api_key, &body, "perplexity").await?;
    Ok(message_content(&payload))
}

async fn post_chat(
    config: &EnrichConfig,
    endpoint: &str,
    api_key: &str,
    body: &Value,
    provider: &str,
) -> Result<Value> {
    let client = Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|e| OrgsiftError::Network(e.to_string()))?;

    let response = client
        .post(endpoint)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| OrgsiftError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(OrgsiftError::Provider(format!(
            "{provider} returned {status}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| OrgsiftError::Provider(format!("{provider} response body: {e}")))
}

/// First choice's message content, or `{}` when the provider sent none.
fn message_content(payload: &Value) -> String {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("{}")
        .to_string()
}
