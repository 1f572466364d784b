//! Synthetic dataset: generation, encoding and CSV export.

pub mod csv;
pub mod encode;
pub mod generator;
pub mod record;

pub use encode::{encode, EncodedDataset, FEATURE_NAMES};
pub use generator::SyntheticGenerator;
pub use record::{Gender, Severity, SyntheticRecord, HEADLINE_TARGET, TARGET_NAMES};
