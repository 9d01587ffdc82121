//! OpenAI chat-completions backend.
//!
//! Requests strict JSON with the five result keys. Any failure here is
//! recoverable; the orchestrator degrades to the heuristic pipeline.

use findoc_core::{Error, RemoteConfig, Result};
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::types::{AnalysisResult, Provider};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You analyze financial PDFs and answer user questions. \
    Return STRICT JSON with keys: summary(string), insights(array of strings), \
    recommendations(array of strings), risks(array of strings), references(array of strings).";

/// Hard cap on document text sent to the API.
const MAX_PROMPT_CHARS: usize = 120_000;

/// Ask the remote model for a structured analysis of `text` against `query`.
pub async fn analyze_remote(
    client: &Client,
    remote: &RemoteConfig,
    text: &str,
    query: &str,
) -> Result<AnalysisResult> {
    let prompt = format!(
        "User query:\n{}\n\nPDF content (may be truncated):\n{}",
        query.trim(),
        truncate_chars(text, MAX_PROMPT_CHARS)
    );

    let body = json!({
        "model": remote.model,
        "response_format": {"type": "json_object"},
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": prompt},
        ],
        "temperature": 0.2,
    });

    debug!("Requesting analysis with model {}", remote.model);

    let response = client
        .post(CHAT_COMPLETIONS_URL)
        .header("Authorization", format!("Bearer {}", remote.api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::Analysis(format!("request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Analysis(format!("API error {}: {}", status, body)));
    }

    let payload: serde_json::Value = response
        .json()
        .await
        .map_err(|e| Error::Analysis(format!("non-JSON response: {}", e)))?;

    let content = payload["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("{}");
    let data: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| Error::Analysis(format!("model output was not JSON: {}", e)))?;

    Ok(merge_with_defaults(&data, query, &remote.model))
}

/// Schema-with-defaults merge: a missing or mistyped field becomes an empty
/// string or collection, never a hard failure.
fn merge_with_defaults(data: &serde_json::Value, query: &str, model: &str) -> AnalysisResult {
    AnalysisResult {
        summary: str_field(data, "summary"),
        insights: list_field(data, "insights"),
        recommendations: list_field(data, "recommendations"),
        risks: list_field(data, "risks"),
        references: list_field(data, "references"),
        query: query.to_string(),
        provider: Provider::OpenAI,
        model: Some(model.to_string()),
    }
}

fn str_field(data: &serde_json::Value, key: &str) -> String {
    data[key].as_str().unwrap_or("").to_string()
}

fn list_field(data: &serde_json::Value, key: &str) -> Vec<String> {
    data[key]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Truncate on a char boundary so multi-byte text never splits a codepoint.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_fills_missing_fields_with_empties() {
        let data = json!({ "summary": "Solid quarter.", "insights": ["rev up"] });
        let result = merge_with_defaults(&data, "what changed?", "gpt-4o-mini");

        assert_eq!(result.summary, "Solid quarter.");
        assert_eq!(result.insights, vec!["rev up".to_string()]);
        assert!(result.recommendations.is_empty());
        assert!(result.risks.is_empty());
        assert!(result.references.is_empty());
        assert_eq!(result.query, "what changed?");
        assert_eq!(result.provider, Provider::OpenAI);
        assert_eq!(result.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn merge_ignores_mistyped_fields() {
        let data = json!({ "summary": 42, "risks": "not a list" });
        let result = merge_with_defaults(&data, "q", "m");
        assert_eq!(result.summary, "");
        assert!(result.risks.is_empty());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(10);
        assert_eq!(truncate_chars(&text, 4), "éééé");
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
