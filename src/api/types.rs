use serde::{Deserialize, Serialize};

use crate::predictor::{format_percent, SymptomForecast, DISCLAIMER};

pub const SERVICE_NAME: &str = "Post-COVID Symptom Predictor";
pub const SERVICE_VERSION: &str = "1.0.0";

/// GET / response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub status: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            version: SERVICE_VERSION.to_string(),
            status: "operational".to_string(),
        }
    }
}

/// GET /health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: i64,
    pub features: usize,
    pub headline_target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Predictions {
    pub fatigue: String,
    pub breathlessness: String,
    pub brain_fog: String,
}

/// POST /predict response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Predictions,
    pub disclaimer: String,
}

impl From<SymptomForecast> for PredictResponse {
    fn from(f: SymptomForecast) -> Self {
        Self {
            predictions: Predictions {
                fatigue: format_percent(f.fatigue_pct),
                breathlessness: format_percent(f.breathlessness_pct),
                brain_fog: format_percent(f.brain_fog_pct),
            },
            disclaimer: DISCLAIMER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
