//! One-hot encoding of synthetic records into a numeric feature matrix.
//!
//! Categorical columns drop their first category (`gender_Female`,
//! `severity_Mild`), matching the request contract of the prediction service.

use super::record::{Gender, Severity, SyntheticRecord, TARGET_NAMES};

/// Feature columns in the order the model is trained on.
pub const FEATURE_NAMES: [&str; 10] = [
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

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedDataset {
    pub feature_names: Vec<String>,
    pub target_names: Vec<String>,
    /// Row-major, one row per record
    pub features: Vec<Vec<f64>>,
    /// Row-major, one label per target per record
    pub targets: Vec<Vec<u8>>,
}

impl EncodedDataset {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

pub fn encode_record(r: &SyntheticRecord) -> Vec<f64> {
    vec![
        r.age,
        f64::from(r.diabetes),
        f64::from(r.hypertension),
        f64::from(r.fatigue),
        f64::from(r.breathlessness),
        f64::from(r.brain_fog),
        f64::from(r.joint_pain),
        one_hot(r.gender == Gender::Male),
        one_hot(r.severity == Severity::Moderate),
        one_hot(r.severity == Severity::Severe),
    ]
}

pub fn encode(records: &[SyntheticRecord]) -> EncodedDataset {
    EncodedDataset {
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        target_names: TARGET_NAMES.iter().map(|s| s.to_string()).collect(),
        features: records.iter().map(encode_record).collect(),
        targets: records.iter().map(|r| r.outcomes().to_vec()).collect(),
    }
}

fn one_hot(cond: bool) -> f64 {
    if cond {
        1.0
    } else {
        0.0
    }
}
