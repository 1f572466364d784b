//! Per-feature z-score standardization.
//!
//! `scale` is the population standard deviation; constant columns get a scale
//! of 1 so they pass through centred but unscaled.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PostCovidError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    /// Rows seen during fit
    pub n_samples_seen: usize,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(PostCovidError::Training(
                "cannot fit scaler on empty data".to_string(),
            ));
        };
        let dim = first.len();
        if dim == 0 {
            return Err(PostCovidError::Training(
                "cannot fit scaler on zero-width rows".to_string(),
            ));
        }
        if let Some(row) = rows.iter().find(|r| r.len() != dim) {
            return Err(PostCovidError::DimensionMismatch {
                got: row.len(),
                expected: dim,
            });
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0_f64; dim];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0_f64; dim];
        for row in rows {
            for ((acc, v), m) in var.iter_mut().zip(row).zip(&mean) {
                let d = v - m;
                *acc += d * d;
            }
        }

        let scale = var
            .into_iter()
            .map(|s| {
                let std = (s / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self {
            mean,
            scale,
            n_samples_seen: rows.len(),
        })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.mean.is_empty() {
            return Err("scaler has no features".to_string());
        }
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean length {} != scale length {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if self.mean.iter().any(|v| !v.is_finite()) {
            return Err("mean must be finite".to_string());
        }
        if self.scale.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err("scale must be finite and > 0".to_string());
        }
        Ok(())
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.dim() {
            return Err(PostCovidError::DimensionMismatch {
                got: row.len(),
                expected: self.dim(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let scaler: Self = serde_json::from_str(&content)?;
        scaler.validate().map_err(PostCovidError::Validation)?;
        Ok(scaler)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_and_transform_standardizes() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();

        assert_eq!(scaler.mean, vec![2.0, 10.0]);
        assert!((scaler.scale[0] - 1.0).abs() < 1e-12);
        // constant column
        assert_eq!(scaler.scale[1], 1.0);

        let out = scaler.transform(&[3.0, 10.0]).unwrap();
        assert!((out[0] - 1.0).abs() < 1e-12);
        assert_eq!(out[1], 0.0);
    }

    #[test]
    fn transformed_columns_have_unit_variance() {
        let rows: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64, (i * i) as f64]).collect();
        let scaler = StandardScaler::fit(&rows).unwrap();
        let out = scaler.transform_all(&rows).unwrap();

        for col in 0..2 {
            let n = out.len() as f64;
            let mean = out.iter().map(|r| r[col]).sum::<f64>() / n;
            let var = out.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / n;
            assert!(mean.abs() < 1e-9);
            assert!((var - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn rejects_wrong_dimension() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0], vec![2.0, 3.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&[1.0]),
            Err(PostCovidError::DimensionMismatch { got: 1, expected: 2 })
        ));
    }

    #[test]
    fn rejects_empty_and_ragged_input() {
        assert!(StandardScaler::fit(&[]).is_err());
        assert!(StandardScaler::fit(&[vec![1.0, 2.0], vec![1.0]]).is_err());
    }

    #[test]
    fn validate_rejects_non_positive_scale() {
        let bad = StandardScaler {
            mean: vec![0.0],
            scale: vec![0.0],
            n_samples_seen: 1,
        };
        assert!(bad.validate().is_err());
    }
}
