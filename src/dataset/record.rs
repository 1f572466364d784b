//! Synthetic patient records and the outcome labels derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome columns, in the order the classifier predicts them.
pub const TARGET_NAMES: [&str; 3] = ["symptomatic", "long_covid", "multi_system"];

/// Outcome whose positive-class probability the service reports.
pub const HEADLINE_TARGET: &str = "long_covid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of the acute infection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated row. Binary flags are stored as `u8` (0 or 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticRecord {
    pub age: f64,
    pub gender: Gender,
    pub severity: Severity,
    pub diabetes: u8,
    pub hypertension: u8,
    pub fatigue: u8,
    pub breathlessness: u8,
    pub brain_fog: u8,
    pub joint_pain: u8,
}

impl SyntheticRecord {
    /// All four reported symptoms.
    pub fn symptom_count(&self) -> u8 {
        self.core_symptom_count() + self.joint_pain
    }

    /// Fatigue, breathlessness and brain fog; joint pain is not counted.
    pub fn core_symptom_count(&self) -> u8 {
        self.fatigue + self.breathlessness + self.brain_fog
    }

    pub fn symptomatic(&self) -> u8 {
        u8::from(self.symptom_count() >= 1)
    }

    pub fn long_covid(&self) -> u8 {
        u8::from(self.core_symptom_count() >= 2)
    }

    pub fn multi_system(&self) -> u8 {
        u8::from(self.symptom_count() >= 3)
    }

    /// Labels in `TARGET_NAMES` order.
    pub fn outcomes(&self) -> [u8; 3] {
        [self.symptomatic(), self.long_covid(), self.multi_system()]
    }
}
