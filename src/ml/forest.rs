//! Multi-output random forest classifier (CPU-only, binary targets).
//!
//! Every tree is grown on a bootstrap sample with a random feature subset per
//! node. Split quality is the Gini impurity averaged across all outputs, so a
//! single tree serves every target. Leaves store the positive-class fraction
//! per output and the forest averages them.
//!
//! Trees live in a flat node arena: children always have larger indices than
//! their parent, which `validate` checks before a loaded model is used.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::ProbabilityModel;
use crate::error::{PostCovidError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least 1
    Sqrt,
    All,
}

impl Default for MaxFeatures {
    fn default() -> Self {
        Self::Sqrt
    }
}

impl MaxFeatures {
    fn resolve(&self, n_features: usize) -> usize {
        match self {
            Self::Sqrt => ((n_features as f64).sqrt().floor() as usize).max(1),
            Self::All => n_features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    #[serde(default)]
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    #[serde(default)]
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Positive-class fraction per output
        proba: Vec<f64>,
        samples: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn leaf_proba(&self, x: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { proba, .. } => return proba,
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Split { left, right, .. } => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                TreeNode::Leaf { .. } => 0,
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    fn validate(&self, n_features: usize, n_outputs: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {i} splits on feature {feature} >= {n_features}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i} threshold is not finite"));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!("node {i} has invalid child index {child}"));
                        }
                    }
                }
                TreeNode::Leaf { proba, .. } => {
                    if proba.len() != n_outputs {
                        return Err(format!(
                            "leaf {i} has {} outputs, expected {n_outputs}",
                            proba.len()
                        ));
                    }
                    if proba.iter().any(|p| !(0.0..=1.0).contains(p)) {
                        return Err(format!("leaf {i} probability outside [0, 1]"));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub target_names: Vec<String>,
    pub params: ForestParams,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit on row-major features and per-row binary labels (one per target).
    pub fn fit(
        features: &[Vec<f64>],
        labels: &[Vec<u8>],
        target_names: Vec<String>,
        params: ForestParams,
    ) -> Result<Self> {
        if features.is_empty() {
            return Err(PostCovidError::Training("no training rows".to_string()));
        }
        if features.len() != labels.len() {
            return Err(PostCovidError::Training(format!(
                "{} feature rows but {} label rows",
                features.len(),
                labels.len()
            )));
        }
        if params.n_estimators == 0 {
            return Err(PostCovidError::Training(
                "n_estimators must be positive".to_string(),
            ));
        }
        let n_features = features[0].len();
        let n_outputs = target_names.len();
        if n_features == 0 || n_outputs == 0 {
            return Err(PostCovidError::Training(
                "need at least one feature and one target".to_string(),
            ));
        }
        if let Some(row) = features.iter().find(|r| r.len() != n_features) {
            return Err(PostCovidError::DimensionMismatch {
                got: row.len(),
                expected: n_features,
            });
        }
        if let Some(row) = labels.iter().find(|r| r.len() != n_outputs) {
            return Err(PostCovidError::DimensionMismatch {
                got: row.len(),
                expected: n_outputs,
            });
        }
        if labels.iter().flatten().any(|&y| y > 1) {
            return Err(PostCovidError::Training(
                "labels must be binary (0 or 1)".to_string(),
            ));
        }

        let mut master = StdRng::seed_from_u64(params.seed);
        let n = features.len();
        let mut trees = Vec::with_capacity(params.n_estimators);

        for t in 0..params.n_estimators {
            let mut rng = StdRng::seed_from_u64(master.gen::<u64>());
            let sample: Vec<usize> = if params.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };

            let mut grower = TreeGrower {
                features,
                labels,
                params: &params,
                max_features: params.max_features.resolve(n_features),
                n_features,
                n_outputs,
                rng,
                nodes: Vec::new(),
            };
            grower.grow(sample, 0);
            let tree = DecisionTree {
                nodes: grower.nodes,
            };
            debug!(tree = t, nodes = tree.nodes.len(), depth = tree.depth(), "grew tree");
            trees.push(tree);
        }

        Ok(Self {
            n_features,
            target_names,
            params,
            trees,
        })
    }

    pub fn n_outputs(&self) -> usize {
        self.target_names.len()
    }

    pub fn target_index(&self, name: &str) -> Option<usize> {
        self.target_names.iter().position(|t| t == name)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.n_features == 0 {
            return Err("n_features must be > 0".to_string());
        }
        if self.target_names.is_empty() {
            return Err("target_names must not be empty".to_string());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.n_outputs())
                .map_err(|e| format!("tree[{t}]: {e}"))?;
        }
        Ok(())
    }

    /// Positive-class probability per target, averaged over trees.
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.n_features {
            return Err(PostCovidError::DimensionMismatch {
                got: x.len(),
                expected: self.n_features,
            });
        }
        let mut acc = vec![0.0_f64; self.n_outputs()];
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.leaf_proba(x)) {
                *a += p;
            }
        }
        let n = self.trees.len() as f64;
        Ok(acc.into_iter().map(|a| a / n).collect())
    }

    /// Hard labels per target; ties resolve to the negative class.
    pub fn predict(&self, x: &[f64]) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let model: Self = serde_json::from_str(&content)?;
        model.validate().map_err(PostCovidError::Validation)?;
        Ok(model)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl ProbabilityModel for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn target_names(&self) -> Vec<String> {
        self.target_names.clone()
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        RandomForest::predict_proba(self, features)
    }
}

struct TreeGrower<'a> {
    features: &'a [Vec<f64>],
    labels: &'a [Vec<u8>],
    params: &'a ForestParams,
    max_features: usize,
    n_features: usize,
    n_outputs: usize,
    rng: StdRng,
    nodes: Vec<TreeNode>,
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl TreeGrower<'_> {
    /// Grow the subtree for `sample` and return its node index.
    fn grow(&mut self, sample: Vec<usize>, depth: usize) -> usize {
        let positives = self.count_positives(&sample);
        let n = sample.len();
        let impurity = mean_gini(&positives, n);

        let depth_exhausted = self.params.max_depth.is_some_and(|d| depth >= d);
        if n < self.params.min_samples_split || depth_exhausted || impurity <= 0.0 {
            return self.push_leaf(&positives, n);
        }

        let Some(split) = self.best_split(&sample) else {
            return self.push_leaf(&positives, n);
        };
        debug_assert!(split.impurity.is_finite());

        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| self.features[i][split.feature] <= split.threshold);

        let idx = self.nodes.len();
        // placeholder, patched once children exist
        self.nodes.push(TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: 0,
            right: 0,
        });
        let left_idx = self.grow(left, depth + 1);
        let right_idx = self.grow(right, depth + 1);
        if let TreeNode::Split { left, right, .. } = &mut self.nodes[idx] {
            *left = left_idx;
            *right = right_idx;
        }
        idx
    }

    fn push_leaf(&mut self, positives: &[usize], n: usize) -> usize {
        let proba = positives
            .iter()
            .map(|&p| if n == 0 { 0.0 } else { p as f64 / n as f64 })
            .collect();
        self.nodes.push(TreeNode::Leaf { proba, samples: n });
        self.nodes.len() - 1
    }

    fn count_positives(&self, sample: &[usize]) -> Vec<usize> {
        let mut pos = vec![0usize; self.n_outputs];
        for &i in sample {
            for (p, &y) in pos.iter_mut().zip(&self.labels[i]) {
                *p += usize::from(y);
            }
        }
        pos
    }

    fn best_split(&mut self, sample: &[usize]) -> Option<Split> {
        let mut candidates: Vec<usize> = (0..self.n_features).collect();
        candidates.shuffle(&mut self.rng);
        candidates.truncate(self.max_features);

        let n = sample.len();
        let min_leaf = self.params.min_samples_leaf;
        let total = self.count_positives(sample);
        let mut best: Option<Split> = None;
        let mut order = sample.to_vec();

        for &f in &candidates {
            order.sort_by(|&a, &b| self.features[a][f].total_cmp(&self.features[b][f]));

            let mut left_pos = vec![0usize; self.n_outputs];
            for k in 0..n - 1 {
                let i = order[k];
                for (p, &y) in left_pos.iter_mut().zip(&self.labels[i]) {
                    *p += usize::from(y);
                }

                let here = self.features[i][f];
                let next = self.features[order[k + 1]][f];
                if here >= next {
                    continue;
                }
                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right_pos: Vec<usize> =
                    total.iter().zip(&left_pos).map(|(t, l)| t - l).collect();
                let weighted = (n_left as f64 * mean_gini(&left_pos, n_left)
                    + n_right as f64 * mean_gini(&right_pos, n_right))
                    / n as f64;

                if best.as_ref().map_or(true, |b| weighted < b.impurity) {
                    let mut threshold = here + (next - here) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(Split {
                        feature: f,
                        threshold,
                        impurity: weighted,
                    });
                }
            }
        }

        best
    }
}

/// Gini impurity averaged over binary outputs.
fn mean_gini(positives: &[usize], n: usize) -> f64 {
    if n == 0 || positives.is_empty() {
        return 0.0;
    }
    let sum: f64 = positives
        .iter()
        .map(|&p| {
            let q = p as f64 / n as f64;
            2.0 * q * (1.0 - q)
        })
        .sum();
    sum / positives.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Vec<Vec<f64>>, Vec<Vec<u8>>) {
        // output 0: x0 > 0.5, output 1: x1 > 0.5
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for i in 0..40 {
            let a = (i % 2) as f64;
            let b = ((i / 2) % 2) as f64;
            xs.push(vec![a, b, (i % 7) as f64]);
            ys.push(vec![a as u8, b as u8]);
        }
        (xs, ys)
    }

    fn targets() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    #[test]
    fn mean_gini_bounds() {
        assert_eq!(mean_gini(&[0, 4], 4), 0.0);
        assert!((mean_gini(&[2], 4) - 0.5).abs() < 1e-12);
        assert_eq!(mean_gini(&[], 0), 0.0);
    }

    #[test]
    fn learns_separable_outputs() {
        let (xs, ys) = toy_data();
        let params = ForestParams {
            n_estimators: 15,
            max_features: MaxFeatures::All,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&xs, &ys, targets(), params).unwrap();
        forest.validate().unwrap();

        for (x, y) in xs.iter().zip(&ys) {
            assert_eq!(&forest.predict(x).unwrap(), y);
        }
    }

    #[test]
    fn probabilities_are_in_unit_interval() {
        let (xs, ys) = toy_data();
        let forest = RandomForest::fit(&xs, &ys, targets(), ForestParams {
            n_estimators: 10,
            ..ForestParams::default()
        })
        .unwrap();

        let p = forest.predict_proba(&[0.3, 0.7, 2.0]).unwrap();
        assert_eq!(p.len(), 2);
        assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn fit_is_deterministic_for_seed() {
        let (xs, ys) = toy_data();
        let params = ForestParams {
            n_estimators: 5,
            ..ForestParams::default()
        };
        let a = RandomForest::fit(&xs, &ys, targets(), params.clone()).unwrap();
        let b = RandomForest::fit(&xs, &ys, targets(), params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn max_depth_limits_tree_depth() {
        let (xs, ys) = toy_data();
        let forest = RandomForest::fit(&xs, &ys, targets(), ForestParams {
            n_estimators: 3,
            max_depth: Some(1),
            ..ForestParams::default()
        })
        .unwrap();
        assert!(forest.trees.iter().all(|t| t.depth() <= 1));
    }

    #[test]
    fn rejects_mismatched_input() {
        let (xs, ys) = toy_data();
        let forest = RandomForest::fit(&xs, &ys, targets(), ForestParams {
            n_estimators: 2,
            ..ForestParams::default()
        })
        .unwrap();
        assert!(matches!(
            forest.predict_proba(&[1.0]),
            Err(PostCovidError::DimensionMismatch { got: 1, expected: 3 })
        ));

        assert!(RandomForest::fit(&xs, &ys[..3], targets(), ForestParams::default()).is_err());
        let non_binary = vec![vec![2u8, 0u8]; xs.len()];
        assert!(RandomForest::fit(&xs, &non_binary, targets(), ForestParams::default()).is_err());
    }

    #[test]
    fn validate_rejects_backward_child_links() {
        let forest = RandomForest {
            n_features: 1,
            target_names: vec!["a".to_string()],
            params: ForestParams::default(),
            trees: vec![DecisionTree {
                nodes: vec![TreeNode::Split {
                    feature: 0,
                    threshold: 0.5,
                    left: 0,
                    right: 0,
                }],
            }],
        };
        assert!(forest.validate().is_err());
    }

    #[test]
    fn serde_preserves_predictions() {
        let (xs, ys) = toy_data();
        let forest = RandomForest::fit(&xs, &ys, targets(), ForestParams {
            n_estimators: 4,
            ..ForestParams::default()
        })
        .unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let loaded: RandomForest = serde_json::from_str(&json).unwrap();
        assert_eq!(
            forest.predict_proba(&xs[3]).unwrap(),
            loaded.predict_proba(&xs[3]).unwrap()
        );
    }
}
