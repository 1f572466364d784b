//! On-disk layout of the builder's output and the consistency checks run
//! before the service accepts it.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{PostCovidError, Result};
use crate::ml::{RandomForest, StandardScaler};
use crate::schema::FeatureSchema;

pub const DATASET_FILE: &str = "synthetic_covid_data.csv";
pub const SCALER_FILE: &str = "feature_scaler.json";
pub const SCHEMA_FILE: &str = "feature_schema.json";
pub const MODEL_FILE: &str = "random_forest_model.json";

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn dataset(&self) -> PathBuf {
        self.dir.join(DATASET_FILE)
    }

    pub fn scaler(&self) -> PathBuf {
        self.dir.join(SCALER_FILE)
    }

    pub fn schema(&self) -> PathBuf {
        self.dir.join(SCHEMA_FILE)
    }

    pub fn model(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }
}

/// Scaler, schema and model that were fitted together.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub schema: FeatureSchema,
    pub scaler: StandardScaler,
    pub model: RandomForest,
}

impl ArtifactBundle {
    pub fn new(schema: FeatureSchema, scaler: StandardScaler, model: RandomForest) -> Result<Self> {
        let bundle = Self {
            schema,
            scaler,
            model,
        };
        bundle.check_consistency()?;
        Ok(bundle)
    }

    /// Schema width, scaler width and model input width must agree, and the
    /// model must predict the schema's targets in the same order.
    pub fn check_consistency(&self) -> Result<()> {
        let dim = self.schema.dim();
        if self.scaler.dim() != dim {
            return Err(PostCovidError::ArtifactMismatch(format!(
                "scaler has {} features, schema has {dim}",
                self.scaler.dim()
            )));
        }
        if self.model.n_features != dim {
            return Err(PostCovidError::ArtifactMismatch(format!(
                "model expects {} features, schema has {dim}",
                self.model.n_features
            )));
        }
        if self.model.target_names != self.schema.targets {
            return Err(PostCovidError::ArtifactMismatch(format!(
                "model targets {:?} != schema targets {:?}",
                self.model.target_names, self.schema.targets
            )));
        }
        Ok(())
    }

    pub fn save(&self, paths: &ArtifactPaths) -> Result<()> {
        std::fs::create_dir_all(paths.dir())?;
        self.scaler.to_file(paths.scaler())?;
        self.schema.to_file(paths.schema())?;
        self.model.to_file(paths.model())?;
        info!(dir = %paths.dir().display(), "artifacts saved");
        Ok(())
    }

    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        for path in [paths.scaler(), paths.schema(), paths.model()] {
            if !path.exists() {
                return Err(PostCovidError::ArtifactMissing(path.display().to_string()));
            }
        }

        let bundle = Self::new(
            FeatureSchema::from_file(paths.schema())?,
            StandardScaler::from_file(paths.scaler())?,
            RandomForest::from_file(paths.model())?,
        )?;
        info!(
            dir = %paths.dir().display(),
            features = bundle.schema.dim(),
            trees = bundle.model.trees.len(),
            "artifacts loaded"
        );
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::ForestParams;

    fn tiny_bundle(schema: FeatureSchema) -> (FeatureSchema, StandardScaler, RandomForest) {
        let dim = schema.dim();
        let rows: Vec<Vec<f64>> = (0..12)
            .map(|i| (0..dim).map(|j| ((i + j) % 2) as f64).collect())
            .collect();
        let labels: Vec<Vec<u8>> = (0..12)
            .map(|i| schema.targets.iter().map(|_| (i % 2) as u8).collect())
            .collect();
        let scaler = StandardScaler::fit(&rows).unwrap();
        let model = RandomForest::fit(
            &scaler.transform_all(&rows).unwrap(),
            &labels,
            schema.targets.clone(),
            ForestParams {
                n_estimators: 2,
                ..ForestParams::default()
            },
        )
        .unwrap();
        (schema, scaler, model)
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("postcovid-artifacts-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn save_then_load() {
        let (schema, scaler, model) = tiny_bundle(FeatureSchema::default());
        let bundle = ArtifactBundle::new(schema, scaler, model).unwrap();
        let dir = temp_dir();
        let paths = ArtifactPaths::new(&dir);

        bundle.save(&paths).unwrap();
        let loaded = ArtifactBundle::load(&paths).unwrap();
        assert_eq!(loaded.schema, bundle.schema);
        assert_eq!(loaded.scaler, bundle.scaler);
        assert_eq!(loaded.model.trees.len(), 2);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_files_are_reported() {
        let paths = ArtifactPaths::new(temp_dir());
        assert!(matches!(
            ArtifactBundle::load(&paths),
            Err(PostCovidError::ArtifactMissing(_))
        ));
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let (schema, scaler, model) = tiny_bundle(FeatureSchema::default());
        let mut narrow = schema.clone();
        narrow.fields.pop();

        assert!(matches!(
            ArtifactBundle::new(narrow, scaler, model),
            Err(PostCovidError::ArtifactMismatch(_))
        ));
    }
}
