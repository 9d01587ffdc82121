//! Result schema shared by both analysis backends.

use serde::{Deserialize, Serialize};

/// Which analysis backend produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Heuristic,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// Structured analysis output.
///
/// The five content fields are always present; a backend that omits one
/// yields an empty string or collection, never a missing key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub risks: Vec<String>,
    pub references: Vec<String>,
    pub query: String,
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
