use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactConfig,
    pub builder: BuilderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// HTTP port for the prediction service
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    /// Directory holding the dataset, scaler, schema and model
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuilderConfig {
    /// Seed for data generation, the train/test split and the forest
    pub seed: u64,
    /// Number of synthetic records to generate
    pub n_samples: usize,
    /// Fraction of rows held out for evaluation (e.g., 0.2 = 20%)
    pub test_size: f64,
    /// Number of trees in the forest
    pub n_estimators: usize,
    /// Maximum tree depth (unset = grow until pure)
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// Minimum rows required to split a node
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    /// Minimum rows in each child of a split
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_samples: 2000,
            test_size: 0.2,
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily-rolling log files (console only when unset)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("artifacts.dir", "artifacts")?
            .set_default("builder.seed", 42)?
            .set_default("builder.n_samples", 2000)?
            .set_default("builder.test_size", 0.2)?
            .set_default("builder.n_estimators", 100)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("POSTCOVID_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (POSTCOVID__SERVER__PORT, etc.)
            .add_source(
                Environment::with_prefix("POSTCOVID")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Configuration used when no files or environment overrides exist
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            artifacts: ArtifactConfig {
                dir: PathBuf::from("artifacts"),
            },
            builder: BuilderConfig::default(),
            logging: LoggingConfig {
                level: default_log_level(),
                json: false,
                dir: None,
            },
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.host.trim().is_empty() {
            errors.push("server.host must not be empty".to_string());
        }

        let b = &self.builder;
        if b.n_samples < 10 {
            errors.push(format!("builder.n_samples must be >= 10, got {}", b.n_samples));
        }
        if !(b.test_size > 0.0 && b.test_size < 1.0) {
            errors.push("builder.test_size must be between 0 and 1".to_string());
        }
        if b.n_estimators == 0 {
            errors.push("builder.n_estimators must be positive".to_string());
        }
        if b.max_depth == Some(0) {
            errors.push("builder.max_depth must be positive when set".to_string());
        }
        if b.min_samples_split < 2 {
            errors.push("builder.min_samples_split must be >= 2".to_string());
        }
        if b.min_samples_leaf == 0 {
            errors.push("builder.min_samples_leaf must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
