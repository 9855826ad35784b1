//! Per-stage error types for the ETL pipeline
//!
//! Each stage reports a typed error so the orchestrator can log the
//! identifier and stage before counting the record as failed.

use thiserror::Error;

/// Which of the three dependent requests failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Pokemon,
    Species,
    EvolutionChain,
}

impl std::fmt::Display for FetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStage::Pokemon => write!(f, "pokemon"),
            FetchStage::Species => write!(f, "species"),
            FetchStage::EvolutionChain => write!(f, "evolution_chain"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid Pokémon ID {0}: must be a positive integer")]
    InvalidId(i64),

    #[error("{stage} request failed: {source}")]
    Request {
        stage: FetchStage,
        #[source]
        source: reqwest::Error,
    },

    #[error("{stage} request returned HTTP {status}")]
    Status {
        stage: FetchStage,
        status: reqwest::StatusCode,
    },

    #[error("failed to parse {stage} response: {source}")]
    Decode {
        stage: FetchStage,
        #[source]
        source: serde_json::Error,
    },

    #[error("no {0} URL in response")]
    MissingLink(FetchStage),
}

impl FetchError {
    /// Stage at which the fetch gave up, if any request was attempted
    pub fn stage(&self) -> Option<FetchStage> {
        match self {
            FetchError::InvalidId(_) => None,
            FetchError::Request { stage, .. }
            | FetchError::Status { stage, .. }
            | FetchError::Decode { stage, .. } => Some(*stage),
            FetchError::MissingLink(stage) => Some(*stage),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum TransformError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{0}' has the wrong type")]
    InvalidField(&'static str),

    #[error("stats must be an object")]
    InvalidStats,

    #[error("evolution chain is missing, empty or has no valid names")]
    EmptyChain,
}

/// Step of a single-record load that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Begin,
    Lookups,
    EvolutionChain,
    Pokemon,
    Junctions,
    Commit,
}

impl std::fmt::Display for LoadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoadStage::Begin => "begin",
            LoadStage::Lookups => "lookups",
            LoadStage::EvolutionChain => "evolution_chain",
            LoadStage::Pokemon => "pokemon",
            LoadStage::Junctions => "junctions",
            LoadStage::Commit => "commit",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug)]
#[error("load failed at {stage} for Pokémon {pokemon_id}: {source}")]
pub struct LoadError {
    pub pokemon_id: i64,
    pub stage: LoadStage,
    #[source]
    pub source: rusqlite::Error,
}
