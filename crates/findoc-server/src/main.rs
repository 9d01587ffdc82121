//! FinDoc — financial document analysis server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use findoc_server::routes;
use findoc_server::state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("FINDOC_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = findoc_core::AppConfig::from_env(&data_dir)?;
    let port = config.port;

    let store = findoc_store::SqliteStore::open(&config.data_paths.db)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    match &config.remote {
        Some(remote) => info!("Remote analysis enabled (model: {})", remote.model),
        None => info!("No API key configured; all analysis will be heuristic"),
    }

    let state = Arc::new(AppState::new(config, store));
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("FinDoc server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
