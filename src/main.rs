use anyhow::{bail, Context, Result};
use pokeapi_to_sqlite::{
    cli::{Cli, Commands},
    config::PipelineConfig,
    extract::PokeApiClient,
    pipeline::{run_etl_pipeline, BarProgress, SilentProgress},
    server,
    writer::SqliteWriter,
};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // The progress bar shares stderr, so per-record info lines stay hidden
    // unless RUST_LOG asks for them
    let default_level = match cli.command {
        Commands::Run { quiet: false, .. } => "warn",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { pipeline, quiet } => {
            let start = Instant::now();
            let config = PipelineConfig::from(pipeline);

            let ok = if quiet {
                run_etl_pipeline(&config, &mut SilentProgress::new())
            } else {
                run_etl_pipeline(&config, &mut BarProgress::new())
            };

            if !ok {
                bail!("ETL pipeline did not load any Pokémon");
            }
            println!(
                "\nLoaded Pokémon into {:?} in {:.1}s",
                config.db_path,
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Fetch { id, api } => {
            let client = PokeApiClient::new(&api.into())?;
            let pokemon = client
                .fetch_pokemon(id)
                .with_context(|| format!("Could not fetch Pokémon {}", id))?;
            println!("{}", serde_json::to_string_pretty(&pokemon)?);
        }

        Commands::InitDb { db } => {
            let writer = SqliteWriter::open(&db)?;
            let complete = writer.ensure_schema();
            writer.finalize()?;
            if !complete {
                bail!("Some tables failed to create in {:?}", db);
            }
            println!("Database {:?} is ready", db);
        }

        Commands::Serve {
            pipeline,
            addr,
            static_dir,
        } => {
            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            runtime.block_on(server::serve(pipeline.into(), addr, static_dir))?;
        }
    }

    Ok(())
}
