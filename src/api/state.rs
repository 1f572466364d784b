use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::predictor::Predictor;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Schema, scaler and model, loaded once at startup
    pub predictor: Arc<Predictor>,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Self {
        Self {
            predictor: Arc::new(predictor),
            start_time: Utc::now(),
        }
    }

    /// Get service uptime in seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
