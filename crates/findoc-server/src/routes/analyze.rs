//! Analysis routes — PDF upload plus retrieval by id.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info};

use findoc_core::Error;

use crate::state::AppState;

const DEFAULT_QUERY: &str = "Analyze this financial document for investment insights";
const DEFAULT_USERNAME: &str = "anonymous";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/analysis/{id}", get(get_analysis))
}

/// Form fields collected from the multipart body.
#[derive(Default)]
struct AnalyzeForm {
    file: Option<(String, Vec<u8>)>,
    query: String,
    username: String,
}

async fn read_form(mut multipart: Multipart) -> Result<AnalyzeForm, String> {
    let mut form = AnalyzeForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload.pdf").to_string();
                let bytes = field.bytes().await.map_err(|e| e.to_string())?;
                form.file = Some((filename, bytes.to_vec()));
            }
            Some("query") => form.query = field.text().await.map_err(|e| e.to_string())?,
            Some("username") => form.username = field.text().await.map_err(|e| e.to_string())?,
            _ => {}
        }
    }
    Ok(form)
}

/// The transient on-disk copy of an upload. Removed on drop so every exit
/// path of the analyze flow cleans up; removal failures are swallowed.
struct TempUpload(PathBuf);

impl TempUpload {
    fn path(&self) -> &FsPath {
        &self.0
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// POST /analyze — multipart upload of a PDF with optional query/username.
async fn analyze(State(state): State<Arc<AppState>>, multipart: Multipart) -> impl IntoResponse {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": format!("Invalid multipart body: {}", e) })),
            );
        }
    };

    let Some((filename, bytes)) = form.file else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "file field is required" })),
        );
    };

    let query = effective(&form.query, DEFAULT_QUERY);
    let username = effective(&form.username, DEFAULT_USERNAME);

    let upload = TempUpload(
        state
            .config
            .data_paths
            .uploads
            .join(format!("upload_{}.pdf", uuid::Uuid::new_v4())),
    );

    match process(&state, upload.path(), &bytes, &filename, &query, &username).await {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(e) => {
            error!("analyze request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "detail": format!("Error processing financial document: {}", e),
                })),
            )
        }
    }
}

/// The fallible part of the analyze flow. Any error here becomes a 500;
/// the temp upload is cleaned up by the caller's guard either way.
async fn process(
    state: &AppState,
    path: &FsPath,
    bytes: &[u8],
    filename: &str,
    query: &str,
    username: &str,
) -> findoc_core::Result<serde_json::Value> {
    std::fs::write(path, bytes)?;

    let result = findoc_analyze::analyze_document(
        &state.http,
        path,
        query,
        state.config.remote.as_ref(),
    )
    .await;

    let user = state.store.get_or_create_user(username)?;
    let result_value = serde_json::to_value(&result)?;
    let analysis_id = state
        .store
        .create_analysis(user.id, filename, query, &result_value)?;

    info!(
        "analysis {} stored for user {} ({}, provider {})",
        analysis_id, user.username, filename, result.provider
    );

    Ok(json!({
        "status": "success",
        "query": query,
        "analysis": result_value,
        "file_processed": filename,
        "analysis_id": analysis_id,
    }))
}

/// GET /analysis/{id} — fetch a stored analysis.
async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.store.get_analysis(id) {
        Ok(record) => {
            let result = record.result().unwrap_or_else(|_| json!({}));
            (
                StatusCode::OK,
                Json(json!({
                    "id": record.id,
                    "filename": record.filename,
                    "query": record.query,
                    "result": result,
                    "created_at": record.created_at,
                })),
            )
        }
        Err(Error::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Analysis not found" })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": e.to_string() })),
        ),
    }
}

/// Trimmed value, or the default when blank.
fn effective(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}
