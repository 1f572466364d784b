use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::builder::BuildReport;
use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "postcovid")]
#[command(version = "1.0.0")]
#[command(about = "Post-COVID symptom predictor: model builder and prediction service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory (default.toml, <POSTCOVID_ENV>.toml)
    #[arg(short, long, default_value = "config", global = true)]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the synthetic dataset, train the model and save the artifacts
    Build {
        /// Random seed for generation, split and training
        #[arg(long)]
        seed: Option<u64>,
        /// Number of synthetic records
        #[arg(long)]
        samples: Option<usize>,
        /// Number of trees in the forest
        #[arg(long)]
        estimators: Option<usize>,
        /// Artifact output directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Serve predictions over HTTP from previously built artifacts
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,
        /// HTTP port
        #[arg(short, long)]
        port: Option<u16>,
        /// Artifact directory to load
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },
}

impl Commands {
    /// Apply command-line overrides on top of file/env configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        match self {
            Commands::Build {
                seed,
                samples,
                estimators,
                out,
            } => {
                if let Some(seed) = seed {
                    config.builder.seed = *seed;
                }
                if let Some(samples) = samples {
                    config.builder.n_samples = *samples;
                }
                if let Some(estimators) = estimators {
                    config.builder.n_estimators = *estimators;
                }
                if let Some(out) = out {
                    config.artifacts.dir = out.clone();
                }
            }
            Commands::Serve {
                host,
                port,
                artifacts,
            } => {
                if let Some(host) = host {
                    config.server.host = host.clone();
                }
                if let Some(port) = port {
                    config.server.port = *port;
                }
                if let Some(dir) = artifacts {
                    config.artifacts.dir = dir.clone();
                }
            }
        }
    }
}

/// Print the evaluation reports the way the builder has always shown them.
pub fn print_build_report(report: &BuildReport) {
    println!("Synthetic dataset saved at: {}", report.dataset_path.display());
    println!(
        "Rows: {} (train {}, test {})",
        report.n_samples, report.n_train, report.n_test
    );
    for r in &report.reports {
        println!();
        println!("Classification Report ({}):", r.target);
        print!("{r}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_overrides() {
        let cli = Cli::parse_from(["postcovid", "build", "--seed", "7", "--samples", "500"]);
        let mut config = AppConfig::default_config();
        cli.command.apply_overrides(&mut config);
        assert_eq!(config.builder.seed, 7);
        assert_eq!(config.builder.n_samples, 500);
        assert_eq!(config.builder.n_estimators, 100);
    }

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::parse_from([
            "postcovid",
            "serve",
            "--port",
            "8081",
            "--artifacts",
            "/tmp/models",
        ]);
        let mut config = AppConfig::default_config();
        cli.command.apply_overrides(&mut config);
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.artifacts.dir, PathBuf::from("/tmp/models"));
        assert_eq!(cli.config, PathBuf::from("config"));
    }
}
