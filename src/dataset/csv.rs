//! Flat CSV export of the synthetic dataset (for inspection only).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::record::{SyntheticRecord, TARGET_NAMES};
use crate::error::Result;

const FEATURE_COLUMNS: [&str; 9] = [
    "age",
    "gender",
    "severity",
    "diabetes",
    "hypertension",
    "fatigue",
    "breathlessness",
    "brain_fog",
    "joint_pain",
];

pub fn header() -> String {
    FEATURE_COLUMNS
        .iter()
        .chain(TARGET_NAMES.iter())
        .copied()
        .collect::<Vec<_>>()
        .join(",")
}

/// Write header plus one line per record.
pub fn write_csv<W: Write>(records: &[SyntheticRecord], writer: W) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    writeln!(writer, "{}", header())?;

    for r in records {
        let [symptomatic, long_covid, multi_system] = r.outcomes();
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            r.age,
            r.gender,
            r.severity,
            r.diabetes,
            r.hypertension,
            r.fatigue,
            r.breathlessness,
            r.brain_fog,
            r.joint_pain,
            symptomatic,
            long_covid,
            multi_system,
        )?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_csv_file<P: AsRef<Path>>(records: &[SyntheticRecord], path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_csv(records, file)
}
