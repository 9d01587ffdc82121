//! Document analysis pipeline: PDF extraction, then remote or heuristic
//! analysis.

pub mod heuristic;
mod openai;
pub mod types;

pub use types::{AnalysisResult, Provider};

use std::path::Path;

use findoc_core::RemoteConfig;
use reqwest::Client;
use tracing::debug;

/// Analyze a PDF document against a user query.
///
/// Extraction failure flows through as empty text. Remote analysis is
/// attempted only when credentials are configured; any remote failure
/// degrades to the heuristic pipeline and is never surfaced to the caller,
/// so this function always produces a result.
pub async fn analyze_document(
    client: &Client,
    path: &Path,
    query: &str,
    remote: Option<&RemoteConfig>,
) -> AnalysisResult {
    let text = findoc_extract::extract_text(path);

    if let Some(remote) = remote {
        match openai::analyze_remote(client, remote, &text, query).await {
            Ok(result) => return result,
            Err(e) => debug!("remote analysis failed, falling back to heuristics: {}", e),
        }
    }

    heuristic_analysis(&text, query)
}

/// Run the full heuristic pipeline over already-extracted text.
pub fn heuristic_analysis(text: &str, query: &str) -> AnalysisResult {
    let insights = heuristic::extract_insights(text, 5);
    AnalysisResult {
        summary: heuristic::summarize(text, 5),
        risks: heuristic::extract_risks(text, 5),
        recommendations: heuristic::recommendations(text, 3),
        references: heuristic::references(&insights),
        insights,
        query: query.to_string(),
        provider: Provider::Heuristic,
        model: None,
    }
}
