use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    ApiConfig, PipelineConfig, DEFAULT_BASE_URL, DEFAULT_COUNT, DEFAULT_DB_PATH,
    DEFAULT_DELAY_MS, DEFAULT_TIMEOUT_SECS,
};

#[derive(Parser, Debug)]
#[command(name = "pokeapi-to-sqlite")]
#[command(version, about = "Load Pokémon from PokeAPI into a SQLite database")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, transform and load Pokémon 1..=COUNT
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Fetch a single Pokémon and print the raw record as JSON
    Fetch {
        /// Pokémon identifier
        id: i64,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Create the database tables if they do not exist
    InitDb {
        /// SQLite database path
        #[arg(long, env = "POKEAPI_DB", default_value = DEFAULT_DB_PATH)]
        db: PathBuf,
    },

    /// Serve the query API and the pipeline trigger over HTTP
    Serve {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Listen address
        #[arg(long, env = "POKEAPI_ADDR", default_value = "127.0.0.1:8000")]
        addr: SocketAddr,

        /// Directory with static files (index.html)
        #[arg(long, env = "POKEAPI_STATIC_DIR", default_value = "public")]
        static_dir: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// PokeAPI base URL
    #[arg(long, env = "POKEAPI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "POKEAPI_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// SQLite database path
    #[arg(long, env = "POKEAPI_DB", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Number of Pokémon to process, starting at ID 1
    #[arg(short, long, env = "POKEAPI_COUNT", default_value_t = DEFAULT_COUNT)]
    pub count: u32,

    /// Pause between Pokémon in milliseconds
    #[arg(long, env = "POKEAPI_DELAY_MS", default_value_t = DEFAULT_DELAY_MS)]
    pub delay_ms: u64,

    #[command(flatten)]
    pub api: ApiArgs,
}

impl From<ApiArgs> for ApiConfig {
    fn from(args: ApiArgs) -> Self {
        Self {
            base_url: args.base_url,
            timeout: Duration::from_secs(args.timeout_secs),
        }
    }
}

impl From<PipelineArgs> for PipelineConfig {
    fn from(args: PipelineArgs) -> Self {
        Self {
            db_path: args.db,
            count: args.count,
            delay: Duration::from_millis(args.delay_ms),
            api: args.api.into(),
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
