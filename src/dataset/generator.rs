//! Seeded synthetic data generation.
//!
//! Each record draws its fields in a fixed order from a single `StdRng`, so a
//! given `(seed, n_samples)` pair always yields the same dataset.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::debug;

use super::record::{Gender, Severity, SyntheticRecord};
use crate::error::{PostCovidError, Result};

const AGE_MEAN: f64 = 45.0;
const AGE_STD: f64 = 15.0;
const AGE_MIN: f64 = 18.0;
const AGE_MAX: f64 = 85.0;

const DIABETES_RATE: f64 = 0.2;
const HYPERTENSION_RATE: f64 = 0.3;

/// Cumulative probabilities for Mild / Moderate (Severe takes the rest).
const SEVERITY_CDF: [f64; 2] = [0.6, 0.9];

#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    seed: u64,
}

impl SyntheticGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn generate(&self, n_samples: usize) -> Result<Vec<SyntheticRecord>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let age_dist = Normal::new(AGE_MEAN, AGE_STD)
            .map_err(|e| PostCovidError::Internal(format!("age distribution: {e}")))?;

        let records: Vec<SyntheticRecord> = (0..n_samples)
            .map(|_| draw_record(&mut rng, &age_dist))
            .collect();

        debug!(seed = self.seed, n_samples, "generated synthetic records");
        Ok(records)
    }
}

fn draw_record(rng: &mut StdRng, age_dist: &Normal<f64>) -> SyntheticRecord {
    let age = age_dist.sample(rng).clamp(AGE_MIN, AGE_MAX);
    let gender = if rng.gen_bool(0.5) {
        Gender::Male
    } else {
        Gender::Female
    };
    let severity = draw_severity(rng);
    let diabetes = bernoulli(rng, DIABETES_RATE);
    let hypertension = bernoulli(rng, HYPERTENSION_RATE);

    let not_mild = indicator(severity != Severity::Mild);
    let severe = indicator(severity == Severity::Severe);

    let fatigue_p =
        0.3 + 0.1 * indicator(age > 50.0) + 0.2 * f64::from(diabetes) + 0.1 * not_mild;
    let fatigue = bernoulli(rng, fatigue_p);

    let breathlessness_p =
        0.2 + 0.1 * indicator(age > 60.0) + 0.2 * f64::from(hypertension) + 0.1 * severe;
    let breathlessness = bernoulli(rng, breathlessness_p);

    let brain_fog = bernoulli(rng, 0.1 + 0.15 * indicator(age > 55.0));

    let joint_pain = bernoulli(rng, 0.15 + 0.1 * indicator(age > 50.0) + 0.1 * severe);

    SyntheticRecord {
        age,
        gender,
        severity,
        diabetes,
        hypertension,
        fatigue,
        breathlessness,
        brain_fog,
        joint_pain,
    }
}

fn draw_severity(rng: &mut StdRng) -> Severity {
    let r: f64 = rng.gen();
    if r < SEVERITY_CDF[0] {
        Severity::Mild
    } else if r < SEVERITY_CDF[1] {
        Severity::Moderate
    } else {
        Severity::Severe
    }
}

fn bernoulli(rng: &mut StdRng, p: f64) -> u8 {
    let p = p.clamp(0.0, 1.0);
    u8::from(rng.gen::<f64>() < p)
}

fn indicator(cond: bool) -> f64 {
    if cond {
        1.0
    } else {
        0.0
    }
}
