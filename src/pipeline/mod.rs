//! Sequential Extract → Transform → Load over an identifier range
//!
//! One identifier flows through all three stages before the next one
//! starts. Per-record errors are counted and logged; only failing to open
//! the store aborts the run.

mod progress;

pub use progress::{BarProgress, Progress, SilentProgress};

use std::thread;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::error::{FetchError, LoadError, TransformError};
use crate::extract::{PokeApiClient, PokemonSource};
use crate::transform::transform_pokemon;
use crate::writer::SqliteWriter;

/// Where the orchestrator currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    SchemaReady,
    Processing(u32),
    Summary,
    Aborted,
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub state: PipelineState,
    pub attempted: u32,
    pub succeeded: u32,
    pub failed: u32,
}

impl RunSummary {
    fn aborted() -> Self {
        Self {
            state: PipelineState::Aborted,
            attempted: 0,
            succeeded: 0,
            failed: 0,
        }
    }

    /// A run succeeds when it completed and loaded at least one Pokémon
    pub fn is_success(&self) -> bool {
        self.state == PipelineState::Summary && self.succeeded > 0
    }
}

/// Why a single record was skipped
#[derive(Error, Debug)]
enum RecordError {
    #[error("extract: {0}")]
    Fetch(#[from] FetchError),
    #[error("transform: {0}")]
    Transform(#[from] TransformError),
    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("load: {0}")]
    Load(#[from] LoadError),
}

impl RecordError {
    fn stage(&self) -> &'static str {
        match self {
            RecordError::Fetch(_) => "extract",
            RecordError::Transform(_) | RecordError::Encode(_) => "transform",
            RecordError::Load(_) => "load",
        }
    }
}

/// Run the pipeline against PokeAPI; returns the overall success flag
pub fn run_etl_pipeline(config: &PipelineConfig, progress: &mut impl Progress) -> bool {
    let client = match PokeApiClient::new(&config.api) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Cannot create API client, aborting");
            return false;
        }
    };

    run_pipeline(config, &client, progress).is_success()
}

/// Run the pipeline for identifiers `1..=config.count` using `source`
pub fn run_pipeline(
    config: &PipelineConfig,
    source: &impl PokemonSource,
    progress: &mut impl Progress,
) -> RunSummary {
    let mut state = PipelineState::Init;
    debug!(?state, "Starting ETL pipeline setup");

    let mut writer = match SqliteWriter::open(&config.db_path) {
        Ok(writer) => writer,
        Err(e) => {
            error!(error = ?e, "Failed to connect to database, aborting");
            return RunSummary::aborted();
        }
    };

    if !writer.ensure_schema() {
        warn!("Some tables failed to create, continuing anyway");
    }
    state = PipelineState::SchemaReady;
    debug!(?state, "Schema ready");

    info!(count = config.count, "Starting ETL");
    progress.start(u64::from(config.count));

    let mut succeeded = 0u32;
    let mut failed = 0u32;

    for id in 1..=config.count {
        state = PipelineState::Processing(id);
        debug!(?state, "Processing");

        let last = match process_one(i64::from(id), source, &mut writer) {
            Ok(name) => {
                succeeded += 1;
                info!(id, %name, "Successfully loaded");
                name
            }
            Err(e) => {
                failed += 1;
                warn!(id, stage = e.stage(), error = %e, "Skipping record");
                format!("ID:{} failed", id)
            }
        };
        progress.record(&last, succeeded, failed);

        // Rate-limit courtesy, applied whatever the outcome
        thread::sleep(config.delay);
    }

    let summary = RunSummary {
        state: PipelineState::Summary,
        attempted: succeeded + failed,
        succeeded,
        failed,
    };

    info!(
        total = summary.attempted,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "ETL pipeline complete"
    );
    progress.finish(&summary);

    if let Err(e) = writer.finalize() {
        error!(error = %e, "Failed to close database connection");
    }

    summary
}

fn process_one(
    id: i64,
    source: &impl PokemonSource,
    writer: &mut SqliteWriter,
) -> Result<String, RecordError> {
    let raw = source.fetch(id)?;
    let transformed = transform_pokemon(&serde_json::to_value(&raw)?)?;
    writer.load_pokemon(&transformed)?;
    Ok(transformed.main.name)
}
