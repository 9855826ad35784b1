use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_DB_PATH: &str = "db/pokemon_database.db";
pub const DEFAULT_COUNT: u32 = 12;
pub const DEFAULT_DELAY_MS: u64 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Remote API settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request timeout (connect + read)
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Settings for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub db_path: PathBuf,
    /// Process identifiers 1..=count
    pub count: u32,
    /// Fixed pause after every identifier
    pub delay: Duration,
    pub api: ApiConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            count: DEFAULT_COUNT,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            api: ApiConfig::default(),
        }
    }
}
