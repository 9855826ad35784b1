pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod query;
pub mod schema;
pub mod server;
pub mod transform;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::{ApiConfig, PipelineConfig};
pub use pipeline::{run_etl_pipeline, run_pipeline, BarProgress, Progress, RunSummary, SilentProgress};
