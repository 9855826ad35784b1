//! HTTP query service and administrative pipeline trigger

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::pipeline::{run_etl_pipeline, SilentProgress};
use crate::query::{self, PokemonFilter, PokemonRecord};
use crate::writer::SqliteWriter;

#[derive(Clone)]
pub struct AppState {
    config: Arc<PipelineConfig>,
    /// Held for the duration of a pipeline run, one run at a time
    pipeline_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config: Arc::new(config),
            pipeline_lock: Arc::new(Mutex::new(())),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(&'static str),
    Internal(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(format!("{:#}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail.to_string()),
            ApiError::Internal(detail) => {
                error!(%detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
}

pub fn router(state: AppState, static_dir: PathBuf) -> Router {
    Router::new()
        .route("/pokemon", get(list_pokemon))
        .route("/pokemon/filter", get(filter_pokemon))
        .route("/pokemon/search", get(search_pokemon))
        .route("/pokemon/:id", get(get_pokemon))
        .route("/etl/run-pipeline", post(run_pipeline))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Make sure the schema exists, then serve until the process is stopped
pub async fn serve(config: PipelineConfig, addr: SocketAddr, static_dir: PathBuf) -> Result<()> {
    let db_path = config.db_path.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let writer = SqliteWriter::open(&db_path)?;
        if !writer.ensure_schema() {
            warn!("Some tables failed to create");
        }
        writer.finalize()
    })
    .await
    .context("Schema setup task failed")??;

    let app = router(AppState::new(config), static_dir);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, "Serving Pokémon API");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Run a read-only query on the blocking pool with a fresh connection
async fn with_db<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
{
    let db_path = state.config.db_path.clone();
    tokio::task::spawn_blocking(move || {
        let conn = query::open_read_only(&db_path)?;
        f(&conn)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .map_err(ApiError::from)
}

async fn list_pokemon(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let names = with_db(&state, query::list_names).await?;
    Ok(Json(names))
}

async fn filter_pokemon(
    State(state): State<AppState>,
    Query(filter): Query<PokemonFilter>,
) -> Result<Json<Vec<String>>, ApiError> {
    let names = with_db(&state, move |conn| query::filter_names(conn, &filter)).await?;
    Ok(Json(names))
}

async fn search_pokemon(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PokemonRecord>>, ApiError> {
    let records = with_db(&state, move |conn| {
        query::search(conn, params.search.as_deref(), params.type_name.as_deref())
    })
    .await?;
    Ok(Json(records))
}

async fn get_pokemon(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PokemonRecord>, ApiError> {
    with_db(&state, move |conn| query::get_pokemon(conn, id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Pokemon not found"))
}

async fn run_pipeline(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let _guard = state.pipeline_lock.lock().await;
    info!("ETL pipeline started");

    let config = Arc::clone(&state.config);
    let ok = tokio::task::spawn_blocking(move || {
        run_etl_pipeline(&config, &mut SilentProgress::new())
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(ok, "ETL pipeline finished");
    if ok {
        Ok(Json(json!({ "detail": "Pipeline completed." })))
    } else {
        Err(ApiError::Internal("Pipeline failed.".to_string()))
    }
}
