//! Named, ordered feature schema shared by the builder and the service.
//!
//! The schema is written next to the model so the service never relies on
//! positional agreement with the builder: vectors are assembled by name, in
//! the recorded order, and the width is checked against the scaler and model
//! when the artifacts are loaded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::dataset::{FEATURE_NAMES, HEADLINE_TARGET, TARGET_NAMES};
use crate::error::{PostCovidError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    Binary,
    OneHot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureField {
    pub name: String,
    pub kind: FeatureKind,
    /// Value used when the field is absent; `None` makes it mandatory.
    #[serde(default)]
    pub default: Option<f64>,
}

impl FeatureField {
    pub fn new(name: &str) -> Self {
        let kind = if name == "age" {
            FeatureKind::Numeric
        } else if name.starts_with("gender_") || name.starts_with("severity_") {
            FeatureKind::OneHot
        } else {
            FeatureKind::Binary
        };
        let default = match kind {
            FeatureKind::OneHot => Some(0.0),
            _ => None,
        };
        Self {
            name: name.to_string(),
            kind,
            default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub fields: Vec<FeatureField>,
    pub targets: Vec<String>,
    /// Target whose positive-class probability is reported
    pub headline_target: String,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::from_names(&FEATURE_NAMES[..], &TARGET_NAMES[..], HEADLINE_TARGET)
    }
}

impl FeatureSchema {
    pub fn from_names<S: AsRef<str>>(features: &[S], targets: &[S], headline: &str) -> Self {
        Self {
            fields: features
                .iter()
                .map(|n| FeatureField::new(n.as_ref()))
                .collect(),
            targets: targets.iter().map(|t| t.as_ref().to_string()).collect(),
            headline_target: headline.to_string(),
        }
    }

    pub fn dim(&self) -> usize {
        self.fields.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn headline_index(&self) -> Option<usize> {
        self.targets.iter().position(|t| *t == self.headline_target)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.fields.is_empty() {
            return Err("schema has no fields".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err("schema field name must not be empty".to_string());
            }
            if !seen.insert(field.name.as_str()) {
                return Err(format!("duplicate schema field: {}", field.name));
            }
            if field.default.is_some_and(|d| !d.is_finite()) {
                return Err(format!("default for {} is not finite", field.name));
            }
        }
        if self.headline_index().is_none() {
            return Err(format!(
                "headline target {} not among targets {:?}",
                self.headline_target, self.targets
            ));
        }
        Ok(())
    }

    /// Build the raw (unscaled) vector in schema order.
    ///
    /// Numbers are taken as-is and booleans map to 0/1. Absent fields fall back
    /// to their default, or fail with `MissingFeature` when they have none.
    pub fn build_vector(&self, payload: &Map<String, Value>) -> Result<Vec<f64>> {
        self.fields
            .iter()
            .map(|field| match payload.get(&field.name) {
                Some(value) => numeric_value(&field.name, value),
                None => field
                    .default
                    .ok_or_else(|| PostCovidError::MissingFeature(field.name.clone())),
            })
            .collect()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let schema: Self = serde_json::from_str(&content)?;
        schema.validate().map_err(PostCovidError::Validation)?;
        Ok(schema)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn numeric_value(field: &str, value: &Value) -> Result<f64> {
    let invalid = |reason: &str| PostCovidError::InvalidFeature {
        field: field.to_string(),
        reason: reason.to_string(),
    };
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid("not a finite number")),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Null => Err(invalid("must not be null")),
        _ => Err(invalid("expected a number or boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn default_schema_kinds() {
        let schema = FeatureSchema::default();
        assert_eq!(schema.dim(), 10);
        assert_eq!(schema.fields[0].kind, FeatureKind::Numeric);
        assert_eq!(schema.fields[1].kind, FeatureKind::Binary);
        assert_eq!(schema.fields[7].kind, FeatureKind::OneHot);
        assert_eq!(schema.fields[7].default, Some(0.0));
        assert_eq!(schema.headline_index(), Some(1));
        schema.validate().unwrap();
    }

    #[test]
    fn absent_one_hot_fields_equal_explicit_zero() {
        let schema = FeatureSchema::default();
        let base = json!({
            "age": 45, "diabetes": 1, "hypertension": 0, "fatigue": 1,
            "breathlessness": 0, "brain_fog": 0, "joint_pain": 1
        });
        let mut explicit = base.clone();
        for name in ["gender_Male", "severity_Moderate", "severity_Severe"] {
            explicit[name] = json!(0);
        }

        let implicit_vec = schema.build_vector(&payload(base)).unwrap();
        let explicit_vec = schema.build_vector(&payload(explicit)).unwrap();
        assert_eq!(implicit_vec, explicit_vec);
    }

    #[test]
    fn vector_follows_schema_order_not_payload_order() {
        let schema = FeatureSchema::default();
        let p = json!({
            "severity_Severe": 1, "gender_Male": true, "joint_pain": 0,
            "brain_fog": 1, "breathlessness": 1, "fatigue": 0,
            "hypertension": 1, "diabetes": 0, "age": 70.5, "severity_Moderate": 0
        });
        assert_eq!(
            schema.build_vector(&payload(p)).unwrap(),
            vec![70.5, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0]
        );
    }

    #[test]
    fn missing_mandatory_field_is_named() {
        let schema = FeatureSchema::default();
        let err = schema
            .build_vector(&payload(json!({ "age": 30 })))
            .unwrap_err();
        assert!(matches!(err, PostCovidError::MissingFeature(ref f) if f == "diabetes"));
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let schema = FeatureSchema::default();
        let mut p = json!({
            "age": "old", "diabetes": 1, "hypertension": 0, "fatigue": 1,
            "breathlessness": 0, "brain_fog": 0, "joint_pain": 1
        });
        let err = schema.build_vector(&payload(p.clone())).unwrap_err();
        assert!(matches!(err, PostCovidError::InvalidFeature { ref field, .. } if field == "age"));

        p["age"] = Value::Null;
        assert!(schema.build_vector(&payload(p)).is_err());
    }

    #[test]
    fn validate_rejects_unknown_headline_and_duplicates() {
        let mut schema = FeatureSchema::default();
        schema.headline_target = "nope".to_string();
        assert!(schema.validate().is_err());

        let mut schema = FeatureSchema::default();
        schema.fields.push(FeatureField::new("age"));
        assert!(schema.validate().is_err());
    }
}
