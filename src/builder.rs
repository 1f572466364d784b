//! Offline data & model builder.
//!
//! generate -> CSV -> one-hot encode -> scale -> split -> fit -> evaluate ->
//! save. Any failure aborts the whole run; nothing is retried.

use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::artifacts::{ArtifactBundle, ArtifactPaths};
use crate::config::BuilderConfig;
use crate::dataset::{self, SyntheticGenerator, HEADLINE_TARGET};
use crate::error::Result;
use crate::ml::{
    take_rows, train_test_split, ClassificationReport, ForestParams, MaxFeatures, RandomForest,
    StandardScaler,
};
use crate::schema::FeatureSchema;

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub dataset_path: PathBuf,
    pub n_samples: usize,
    pub n_train: usize,
    pub n_test: usize,
    /// One report per target, in target order
    pub reports: Vec<ClassificationReport>,
}

pub struct ModelBuilder {
    config: BuilderConfig,
    paths: ArtifactPaths,
}

impl ModelBuilder {
    pub fn new(config: BuilderConfig, paths: ArtifactPaths) -> Self {
        Self { config, paths }
    }

    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.config.n_estimators,
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: self.config.seed,
        }
    }

    pub fn run(&self) -> Result<BuildReport> {
        let started = Instant::now();
        let cfg = &self.config;

        let records = SyntheticGenerator::new(cfg.seed).generate(cfg.n_samples)?;
        let dataset_path = self.paths.dataset();
        dataset::csv::write_csv_file(&records, &dataset_path)?;
        info!(path = %dataset_path.display(), rows = records.len(), "synthetic dataset saved");

        let encoded = dataset::encode(&records);
        let scaler = StandardScaler::fit(&encoded.features)?;
        let scaled = scaler.transform_all(&encoded.features)?;

        let split = train_test_split(encoded.len(), cfg.test_size, cfg.seed)?;
        let x_train = take_rows(&scaled, &split.train);
        let y_train = take_rows(&encoded.targets, &split.train);
        let x_test = take_rows(&scaled, &split.test);
        let y_test = take_rows(&encoded.targets, &split.test);

        info!(
            train = x_train.len(),
            test = x_test.len(),
            trees = cfg.n_estimators,
            "fitting random forest"
        );
        let model = RandomForest::fit(
            &x_train,
            &y_train,
            encoded.target_names.clone(),
            self.forest_params(),
        )?;

        let reports = evaluate(&model, &x_test, &y_test)?;
        for report in &reports {
            info!(
                target = %report.target,
                accuracy = report.accuracy,
                "evaluation"
            );
        }

        let schema = FeatureSchema::from_names(
            &encoded.feature_names,
            &encoded.target_names,
            HEADLINE_TARGET,
        );
        ArtifactBundle::new(schema, scaler, model)?.save(&self.paths)?;

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "build complete");
        Ok(BuildReport {
            dataset_path,
            n_samples: records.len(),
            n_train: split.train.len(),
            n_test: split.test.len(),
            reports,
        })
    }
}

/// Per-target classification reports on held-out rows.
pub fn evaluate(
    model: &RandomForest,
    x_test: &[Vec<f64>],
    y_test: &[Vec<u8>],
) -> Result<Vec<ClassificationReport>> {
    let predictions = x_test
        .iter()
        .map(|x| model.predict(x))
        .collect::<Result<Vec<_>>>()?;

    Ok(model
        .target_names
        .iter()
        .enumerate()
        .map(|(k, name)| {
            let y_true: Vec<u8> = y_test.iter().map(|y| y[k]).collect();
            let y_pred: Vec<u8> = predictions.iter().map(|y| y[k]).collect();
            ClassificationReport::from_labels(name, &y_true, &y_pred)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> BuilderConfig {
        BuilderConfig {
            n_samples: 300,
            n_estimators: 10,
            ..BuilderConfig::default()
        }
    }

    #[test]
    fn builds_artifacts_that_load() {
        let dir = std::env::temp_dir().join(format!("postcovid-build-{}", uuid::Uuid::new_v4()));
        let paths = ArtifactPaths::new(&dir);
        let report = ModelBuilder::new(small_config(), paths.clone()).run().unwrap();

        assert_eq!(report.n_samples, 300);
        assert_eq!(report.n_test, 60);
        assert_eq!(report.n_train, 240);
        assert_eq!(report.reports.len(), 3);
        assert!(report.dataset_path.exists());

        let bundle = ArtifactBundle::load(&paths).unwrap();
        assert_eq!(bundle.schema.dim(), 10);
        assert_eq!(bundle.model.trees.len(), 10);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn forest_learns_the_synthetic_labels() {
        let dir = std::env::temp_dir().join(format!("postcovid-build-{}", uuid::Uuid::new_v4()));
        let report = ModelBuilder::new(small_config(), ArtifactPaths::new(&dir))
            .run()
            .unwrap();

        // labels are a deterministic function of the symptom features
        for r in &report.reports {
            assert!(r.accuracy > 0.8, "{} accuracy {}", r.target, r.accuracy);
        }

        std::fs::remove_dir_all(dir).ok();
    }
}
