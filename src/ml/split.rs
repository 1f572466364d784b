use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PostCovidError, Result};

/// Row indices for a shuffled train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and hold out `ceil(n * test_size)` rows.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PostCovidError::Validation(format!(
            "test_size must be between 0 and 1, got {test_size}"
        )));
    }
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(PostCovidError::Validation(format!(
            "cannot split {n} rows with test_size {test_size}"
        )));
    }

    let mut idx: Vec<usize> = (0..n).collect();
    idx.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = idx.split_off(n_test);

    Ok(SplitIndices { train, test: idx })
}

pub fn take_rows<T: Clone>(rows: &[T], idx: &[usize]) -> Vec<T> {
    idx.iter().map(|&i| rows[i].clone()).collect()
}
