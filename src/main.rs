use anyhow::{Context, Result};
use clap::Parser;
use postcovid::adapters::{load_app_state, start_api_server};
use postcovid::artifacts::ArtifactPaths;
use postcovid::builder::ModelBuilder;
use postcovid::cli::{self, Cli, Commands};
use postcovid::config::AppConfig;
use postcovid::error::PostCovidError;
use tracing::{error, info};

mod main_runtime;

use main_runtime::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config).with_context(|| {
        format!("failed to load configuration from {}", cli.config.display())
    })?;
    cli.command.apply_overrides(&mut config);
    init_logging(&config.logging);

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("config: {}", e);
        }
        return Err(PostCovidError::InvalidConfig(errors.join("; ")).into());
    }

    let paths = ArtifactPaths::new(&config.artifacts.dir);

    match &cli.command {
        Commands::Build { .. } => {
            info!(
                seed = config.builder.seed,
                samples = config.builder.n_samples,
                dir = %paths.dir().display(),
                "building synthetic dataset and model"
            );
            let builder = ModelBuilder::new(config.builder.clone(), paths.clone());
            // Training is CPU-bound; keep it off the async workers.
            let report = tokio::task::spawn_blocking(move || builder.run())
                .await
                .context("build task panicked")?
                .with_context(|| format!("failed to build artifacts in {}", paths.dir().display()))?;
            cli::print_build_report(&report);
            println!(
                "Model and artifacts saved successfully in '{}'!",
                paths.dir().display()
            );
        }
        Commands::Serve { .. } => {
            let state = load_app_state(&paths).with_context(|| {
                format!("failed to load artifacts from {}", paths.dir().display())
            })?;
            start_api_server(&config.server, state)
                .await
                .context("API server failed")?;
        }
    }

    Ok(())
}
