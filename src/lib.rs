pub mod adapters;
pub mod api;
pub mod artifacts;
pub mod builder;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod ml;
pub mod predictor;
pub mod schema;

pub use artifacts::{ArtifactBundle, ArtifactPaths};
pub use builder::{BuildReport, ModelBuilder};
pub use crate::config::AppConfig;
pub use error::{PostCovidError, Result};
pub use ml::{ProbabilityModel, RandomForest, StandardScaler};
pub use predictor::{Predictor, SymptomForecast};
pub use schema::FeatureSchema;
