//! SQLite persistence for users and their analyses.

mod schema;
mod sqlite;
mod types;

pub use sqlite::SqliteStore;
pub use types::{AnalysisRecord, User};
