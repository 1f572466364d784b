//! Inference context: schema + scaler + model, loaded once and shared
//! read-only by every request.

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::artifacts::ArtifactBundle;
use crate::error::{PostCovidError, Result};
use crate::ml::{ProbabilityModel, StandardScaler};
use crate::schema::FeatureSchema;

/// Keys every predict request must carry, checked in this order.
pub const REQUIRED_FIELDS: [&str; 10] = [
    "age",
    "diabetes",
    "hypertension",
    "fatigue",
    "breathlessness",
    "brain_fog",
    "joint_pain",
    "gender_Male",
    "severity_Moderate",
    "severity_Severe",
];

pub const DISCLAIMER: &str = "disclaimer:This is a predictive tool and not a medical diagnosis. \
Always consult healthcare professionals.";

/// Multipliers turning the headline probability into per-symptom percentages.
///
/// These are fixed demo constants, not model outputs: all three percentages
/// are rescalings of one probability and always keep the ratio 80:50:30.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymptomScales {
    pub fatigue: f64,
    pub breathlessness: f64,
    pub brain_fog: f64,
}

pub const PLACEHOLDER_SYMPTOM_SCALES: SymptomScales = SymptomScales {
    fatigue: 80.0,
    breathlessness: 50.0,
    brain_fog: 30.0,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymptomForecast {
    /// Positive-class probability of the headline target
    pub probability: f64,
    pub fatigue_pct: f64,
    pub breathlessness_pct: f64,
    pub brain_fog_pct: f64,
}

impl SymptomForecast {
    pub fn from_probability(probability: f64, scales: SymptomScales) -> Self {
        Self {
            probability,
            fatigue_pct: round2(probability * scales.fatigue),
            breathlessness_pct: round2(probability * scales.breathlessness),
            brain_fog_pct: round2(probability * scales.brain_fog),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn format_percent(v: f64) -> String {
    format!("{v:.2}%")
}

pub struct Predictor {
    schema: FeatureSchema,
    scaler: StandardScaler,
    model: Arc<dyn ProbabilityModel>,
    headline_index: usize,
    scales: SymptomScales,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("features", &self.schema.dim())
            .field("headline_target", &self.schema.headline_target)
            .finish()
    }
}

impl Predictor {
    pub fn new(
        schema: FeatureSchema,
        scaler: StandardScaler,
        model: Arc<dyn ProbabilityModel>,
    ) -> Result<Self> {
        schema.validate().map_err(PostCovidError::Validation)?;
        scaler.validate().map_err(PostCovidError::Validation)?;

        let dim = schema.dim();
        if scaler.dim() != dim {
            return Err(PostCovidError::ArtifactMismatch(format!(
                "scaler has {} features, schema has {dim}",
                scaler.dim()
            )));
        }
        if model.n_features() != dim {
            return Err(PostCovidError::ArtifactMismatch(format!(
                "model expects {} features, schema has {dim}",
                model.n_features()
            )));
        }
        let headline_index = model
            .target_names()
            .iter()
            .position(|t| *t == schema.headline_target)
            .ok_or_else(|| {
                PostCovidError::ArtifactMismatch(format!(
                    "model does not predict headline target {}",
                    schema.headline_target
                ))
            })?;

        Ok(Self {
            schema,
            scaler,
            model,
            headline_index,
            scales: PLACEHOLDER_SYMPTOM_SCALES,
        })
    }

    pub fn from_bundle(bundle: ArtifactBundle) -> Result<Self> {
        let ArtifactBundle {
            schema,
            scaler,
            model,
        } = bundle;
        Self::new(schema, scaler, Arc::new(model))
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Fail on the first key of `REQUIRED_FIELDS` absent from `payload`.
    pub fn check_required(payload: &Map<String, Value>) -> Result<()> {
        match REQUIRED_FIELDS.iter().find(|f| !payload.contains_key(**f)) {
            Some(missing) => Err(PostCovidError::MissingFeature(missing.to_string())),
            None => Ok(()),
        }
    }

    pub fn predict(&self, payload: &Map<String, Value>) -> Result<SymptomForecast> {
        Self::check_required(payload)?;

        let raw = self.schema.build_vector(payload)?;
        let scaled = self.scaler.transform(&raw)?;
        let proba = self.model.predict_proba(&scaled)?;

        let probability = *proba.get(self.headline_index).ok_or_else(|| {
            PostCovidError::Internal(format!(
                "model returned {} outputs, headline index is {}",
                proba.len(),
                self.headline_index
            ))
        })?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(PostCovidError::Internal(format!(
                "probability {probability} outside [0, 1]"
            )));
        }

        Ok(SymptomForecast::from_probability(probability, self.scales))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mockall::mock! {
        Model {}

        impl ProbabilityModel for Model {
            fn n_features(&self) -> usize;
            fn target_names(&self) -> Vec<String>;
            fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>>;
        }
    }

    fn mock_model(dim: usize, proba: Vec<f64>) -> MockModel {
        let mut model = MockModel::new();
        model.expect_n_features().return_const(dim);
        model.expect_target_names().returning(|| {
            crate::dataset::TARGET_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect()
        });
        model
            .expect_predict_proba()
            .withf(move |features| features.len() == dim)
            .returning(move |_| Ok(proba.clone()));
        model
    }

    fn identity_scaler(dim: usize) -> StandardScaler {
        StandardScaler {
            mean: vec![0.0; dim],
            scale: vec![1.0; dim],
            n_samples_seen: 1,
        }
    }

    fn predictor(proba: Vec<f64>) -> Predictor {
        Predictor::new(
            FeatureSchema::default(),
            identity_scaler(10),
            Arc::new(mock_model(10, proba)),
        )
        .unwrap()
    }

    fn example_payload() -> Map<String, Value> {
        json!({
            "age": 45, "diabetes": 1, "hypertension": 0, "fatigue": 1,
            "breathlessness": 0, "brain_fog": 0, "joint_pain": 1,
            "gender_Male": 1, "severity_Moderate": 0, "severity_Severe": 0
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn uses_headline_probability() {
        let forecast = predictor(vec![0.9, 0.5, 0.1]).predict(&example_payload()).unwrap();
        assert_eq!(forecast.probability, 0.5);
        assert_eq!(forecast.fatigue_pct, 40.0);
        assert_eq!(forecast.breathlessness_pct, 25.0);
        assert_eq!(forecast.brain_fog_pct, 15.0);
    }

    #[test]
    fn percentages_keep_fixed_ratio() {
        for p in [0.0, 0.137, 0.5, 0.777, 1.0] {
            let f = SymptomForecast::from_probability(p, PLACEHOLDER_SYMPTOM_SCALES);
            assert!((f.fatigue_pct / 80.0 - f.breathlessness_pct / 50.0).abs() < 0.01);
            assert!((f.fatigue_pct / 80.0 - f.brain_fog_pct / 30.0).abs() < 0.01);
        }
    }

    #[test]
    fn first_missing_required_field_is_reported() {
        let mut payload = example_payload();
        payload.remove("joint_pain");
        payload.remove("severity_Severe");
        let err = Predictor::check_required(&payload).unwrap_err();
        assert_eq!(err.to_string(), "Missing required feature: joint_pain");
    }

    #[test]
    fn out_of_range_probability_is_internal() {
        let err = predictor(vec![0.1, 1.7, 0.2])
            .predict(&example_payload())
            .unwrap_err();
        assert!(!err.is_client_error());
    }

    #[test]
    fn rejects_model_of_wrong_width() {
        let result = Predictor::new(
            FeatureSchema::default(),
            identity_scaler(10),
            Arc::new(mock_model(5, vec![0.5; 3])),
        );
        assert!(matches!(result, Err(PostCovidError::ArtifactMismatch(_))));
    }

    #[test]
    fn disclaimer_keeps_its_prefix() {
        assert_eq!(
            DISCLAIMER,
            "disclaimer:This is a predictive tool and not a medical diagnosis. \
             Always consult healthcare professionals."
        );
    }

    #[test]
    fn formats_two_decimals() {
        assert_eq!(format_percent(40.0), "40.00%");
        assert_eq!(format_percent(12.345678), "12.35%");
    }
}
