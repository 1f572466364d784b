use postcovid::{
    artifacts::ArtifactPaths,
    builder::ModelBuilder,
    config::BuilderConfig,
    dataset::{csv::write_csv, SyntheticGenerator},
};
use std::path::PathBuf;

fn temp_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("postcovid-{tag}-{}", uuid::Uuid::new_v4()))
}

fn csv_bytes(seed: u64, n: usize) -> Vec<u8> {
    let records = SyntheticGenerator::new(seed).generate(n).unwrap();
    let mut buf = Vec::new();
    write_csv(&records, &mut buf).unwrap();
    buf
}

#[test]
fn same_seed_gives_byte_identical_dataset() {
    assert_eq!(csv_bytes(42, 2000), csv_bytes(42, 2000));
    assert_ne!(csv_bytes(42, 2000), csv_bytes(43, 2000));
}

#[test]
fn dataset_has_header_and_one_line_per_record() {
    let text = String::from_utf8(csv_bytes(42, 25)).unwrap();
    assert_eq!(text.lines().count(), 26);
    assert!(text.starts_with("age,gender,severity,"));
}

#[test]
fn full_build_is_reproducible() {
    let config = BuilderConfig {
        n_samples: 250,
        n_estimators: 8,
        ..BuilderConfig::default()
    };
    let (a, b) = (temp_dir("repro-a"), temp_dir("repro-b"));
    let (paths_a, paths_b) = (ArtifactPaths::new(&a), ArtifactPaths::new(&b));

    ModelBuilder::new(config.clone(), paths_a.clone()).run().unwrap();
    ModelBuilder::new(config, paths_b.clone()).run().unwrap();

    for (x, y) in [
        (paths_a.dataset(), paths_b.dataset()),
        (paths_a.scaler(), paths_b.scaler()),
        (paths_a.schema(), paths_b.schema()),
        (paths_a.model(), paths_b.model()),
    ] {
        assert_eq!(
            std::fs::read(&x).unwrap(),
            std::fs::read(&y).unwrap(),
            "{} differs between runs",
            x.display()
        );
    }

    std::fs::remove_dir_all(a).ok();
    std::fs::remove_dir_all(b).ok();
}
