//! Lightweight ML utilities (training and deploy-safe inference).
//!
//! Everything here is plain Rust over `Vec<f64>` so the artifacts are JSON and
//! the service runs without a native ML toolchain.

pub mod forest;
pub mod metrics;
pub mod scaler;
pub mod split;

pub use forest::{DecisionTree, ForestParams, MaxFeatures, RandomForest, TreeNode};
pub use metrics::{ClassMetrics, ClassificationReport};
pub use scaler::StandardScaler;
pub use split::{take_rows, train_test_split, SplitIndices};

use crate::error::Result;

/// Inference seam between the prediction service and a fitted model.
pub trait ProbabilityModel: Send + Sync {
    /// Width of the (already scaled) input vector.
    fn n_features(&self) -> usize;

    /// Output names, in `predict_proba` order.
    fn target_names(&self) -> Vec<String>;

    /// Positive-class probability for each target.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>>;
}
