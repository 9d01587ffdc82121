//! SQLite store for users and analyses.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::schema::SCHEMA_SQL;
use crate::types::{AnalysisRecord, User};
use findoc_core::{Error, Result};

/// SQLite-backed store. One connection behind a mutex; each public method
/// is a single transaction from the caller's point of view.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the store.
    ///
    /// `db_dir` is the directory (e.g., `data/db/`). The file will be
    /// `db_dir/findoc.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("findoc.db");

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let user_count = store.count_users()?;
        let analysis_count = store.count_analyses()?;
        info!(
            "SqliteStore initialized: {} users, {} analyses, path={}",
            user_count,
            analysis_count,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------

    /// Look up a user by username, creating one (without email) if absent.
    ///
    /// Two requests racing to create the same username can both miss the
    /// lookup; the loser's insert hits the UNIQUE constraint and we retry
    /// the lookup instead of failing the request.
    pub fn get_or_create_user(&self, username: &str) -> Result<User> {
        let conn = self.conn.lock();

        if let Some(user) = Self::find_user(&conn, username)? {
            return Ok(user);
        }

        let inserted = conn
            .prepare_cached("INSERT INTO users (username) VALUES (?1)")
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![username]);

        match inserted {
            Ok(id) => Ok(User {
                id,
                username: username.to_string(),
                email: None,
            }),
            Err(e) if e.to_string().contains("UNIQUE constraint") => {
                Self::find_user(&conn, username)?
                    .ok_or_else(|| Error::Database(e.to_string()))
            }
            Err(e) => Err(Error::Database(e.to_string())),
        }
    }

    fn find_user(conn: &Connection, username: &str) -> Result<Option<User>> {
        conn.prepare_cached("SELECT id, username, email FROM users WHERE username = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![username], Self::row_to_user)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Count total users.
    pub fn count_users(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    // ---------------------------------------------------------------
    // Analyses
    // ---------------------------------------------------------------

    /// Insert a new analysis row. Returns the new analysis ID.
    /// The creation timestamp is assigned by SQLite, not the caller.
    pub fn create_analysis(
        &self,
        user_id: i64,
        filename: &str,
        query: &str,
        result: &serde_json::Value,
    ) -> Result<i64> {
        let result_json = serde_json::to_string(result)?;
        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO analyses (user_id, filename, query, result_json) VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![user_id, filename, query, result_json])
            .map_err(|e| Error::Database(e.to_string()));
        id
    }

    /// Get an analysis by ID. Unknown IDs are a `NotFound` error.
    pub fn get_analysis(&self, id: i64) -> Result<AnalysisRecord> {
        let conn = self.conn.lock();
        let record = conn
            .prepare_cached(
                "SELECT id, user_id, filename, query, result_json, created_at
                 FROM analyses WHERE id = ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], Self::row_to_analysis)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?
            .ok_or_else(|| Error::NotFound(format!("analysis {}", id)));
        record
    }

    /// All analyses belonging to a user, newest first.
    pub fn list_analyses_for_user(&self, user_id: i64) -> Result<Vec<AnalysisRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, user_id, filename, query, result_json, created_at
                 FROM analyses WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![user_id], Self::row_to_analysis)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Count total analyses.
    pub fn count_analyses(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM analyses", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    // ---------------------------------------------------------------
    // Row mapping
    // ---------------------------------------------------------------

    fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
        })
    }

    fn row_to_analysis(row: &Row<'_>) -> rusqlite::Result<AnalysisRecord> {
        Ok(AnalysisRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            filename: row.get(2)?,
            query: row.get(3)?,
            result_json: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn open_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("db")).unwrap();
        (dir, store)
    }

    #[test]
    fn get_or_create_user_is_idempotent() {
        let (_dir, store) = open_store();

        let first = store.get_or_create_user("alice").unwrap();
        let second = store.get_or_create_user("alice").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.count_users().unwrap(), 1);
        assert!(first.email.is_none());
    }

    #[test]
    fn analysis_round_trips_result_payload() {
        let (_dir, store) = open_store();
        let user = store.get_or_create_user("bob").unwrap();

        let result = json!({
            "summary": "Revenue grew 20%.",
            "insights": ["Revenue grew 20%"],
            "recommendations": ["Consider Buy based on reported strength and guidance"],
            "risks": ["Risk: supply chain pressure."],
            "references": ["snippet:1"],
            "query": "Analyze this financial document for investment insights",
            "provider": "heuristic",
        });

        let id = store
            .create_analysis(user.id, "q3.pdf", "q", &result)
            .unwrap();
        let record = store.get_analysis(id).unwrap();

        assert_eq!(record.user_id, user.id);
        assert_eq!(record.filename, "q3.pdf");
        assert_eq!(record.result().unwrap(), result);
        assert!(!record.created_at.is_empty());
    }

    #[test]
    fn unknown_analysis_is_not_found() {
        let (_dir, store) = open_store();
        match store.get_analysis(999_999) {
            Err(Error::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other.map(|r| r.id)),
        }
    }

    #[test]
    fn two_uploads_same_user_share_one_row() {
        let (_dir, store) = open_store();

        let user1 = store.get_or_create_user("carol").unwrap();
        let a1 = store
            .create_analysis(user1.id, "a.pdf", "q", &json!({}))
            .unwrap();
        let user2 = store.get_or_create_user("carol").unwrap();
        let a2 = store
            .create_analysis(user2.id, "b.pdf", "q", &json!({}))
            .unwrap();

        assert_eq!(user1.id, user2.id);
        assert_eq!(store.count_users().unwrap(), 1);
        assert_ne!(a1, a2);

        let list = store.list_analyses_for_user(user1.id).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|r| r.user_id == user1.id));
    }

    #[test]
    fn schema_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db_dir = dir.path().join("db");
        {
            let store = SqliteStore::open(&db_dir).unwrap();
            store.get_or_create_user("dave").unwrap();
        }
        let reopened = SqliteStore::open(&db_dir).unwrap();
        assert_eq!(reopened.count_users().unwrap(), 1);
    }
}
