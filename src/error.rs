use thiserror::Error;

/// Main error type for the builder and the prediction service
#[derive(Error, Debug)]
pub enum PostCovidError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Artifact errors
    #[error("Artifact not found: {0}")]
    ArtifactMissing(String),

    #[error("Artifact mismatch: {0}")]
    ArtifactMismatch(String),

    // Feature vector errors
    #[error("Missing required feature: {0}")]
    MissingFeature(String),

    #[error("Invalid value for feature {field}: {reason}")]
    InvalidFeature { field: String, reason: String },

    #[error("Dimension mismatch: got {got}, expected {expected}")]
    DimensionMismatch { got: usize, expected: usize },

    // Training errors
    #[error("Training failed: {0}")]
    Training(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for PostCovidError
pub type Result<T> = std::result::Result<T, PostCovidError>;

impl PostCovidError {
    /// Errors caused by the caller's input rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PostCovidError::MissingFeature(_) | PostCovidError::InvalidFeature { .. }
        )
    }
}
