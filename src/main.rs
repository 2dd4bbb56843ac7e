use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::sync::Arc;

use ragline::cli::commands::{self, ask::AskOverrides};
use ragline::cli::{Cli, Commands};
use ragline::{CandidateSource, Settings, logging};

#[tokio::main]
async fn main() {
    // .env is optional; a missing file is not an error
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Settings::load().context("Failed to load configuration")?,
    };
    settings
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {e}"))?;

    logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => commands::init::run_init(force),

        Commands::Config => commands::init::run_config(&settings),

        Commands::Index { files } => {
            let gateway = commands::open_gateway(&settings)?;
            commands::index::run(&settings, &gateway, &files)
        }

        Commands::Ask {
            query,
            top_k,
            n_best,
            threshold,
            use_llm,
            json,
        } => {
            let overrides = AskOverrides {
                top_k: top_k.map(usize::from),
                n_best: n_best.map(usize::from),
                threshold,
                use_llm,
            };
            let open_source = |settings: &Settings| -> Result<Arc<dyn CandidateSource>> {
                let gateway: Arc<dyn CandidateSource> =
                    Arc::new(commands::open_gateway(settings)?);
                Ok(gateway)
            };
            commands::ask::run(&settings, open_source, &query, &overrides, json).await
        }

        Commands::Stats { json } => {
            let gateway = commands::open_gateway(&settings)?;
            commands::stats::run(&settings, &gateway, json)
        }
    }
}
