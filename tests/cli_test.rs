//! Environment fallbacks for CLI options. Kept in its own test binary
//! since it mutates the process environment.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use pokeapi_to_sqlite::cli::{Cli, Commands};
use pokeapi_to_sqlite::config::PipelineConfig;

fn run_config(args: &[&str]) -> PipelineConfig {
    let cli = Cli::try_parse_from(args).unwrap();
    let Commands::Run { pipeline, .. } = cli.command else {
        panic!("expected run");
    };
    PipelineConfig::from(pipeline)
}

#[test]
fn test_run_reads_environment() {
    std::env::set_var("POKEAPI_COUNT", "7");
    std::env::set_var("POKEAPI_DB", "/tmp/env-pokemon.db");
    std::env::set_var("POKEAPI_DELAY_MS", "25");
    std::env::set_var("POKEAPI_TIMEOUT_SECS", "3");

    let config = run_config(&["pokeapi-to-sqlite", "run"]);
    assert_eq!(config.count, 7);
    assert_eq!(config.db_path, PathBuf::from("/tmp/env-pokemon.db"));
    assert_eq!(config.delay, Duration::from_millis(25));
    assert_eq!(config.api.timeout, Duration::from_secs(3));

    // Flags win over the environment
    let config = run_config(&["pokeapi-to-sqlite", "run", "--count", "2"]);
    assert_eq!(config.count, 2);
}
