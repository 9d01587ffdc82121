//! Store row types.

use findoc_core::Result;
use serde::{Deserialize, Serialize};

/// A registered user. Created lazily on first sighting of a username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
}

/// A stored analysis. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub user_id: i64,
    pub filename: String,
    pub query: String,
    pub result_json: String,
    /// ISO-8601 timestamp assigned by the store.
    pub created_at: String,
}

impl AnalysisRecord {
    /// Deserialize the stored result payload.
    pub fn result(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.result_json)?)
    }
}
