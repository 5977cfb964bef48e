//! Scoring and data partitioning for model selection.

use crate::regressor::{RegressorError, RegressorSpec, Row};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Coefficient of determination.
///
/// A constant target has no variance to explain: a perfect fit scores 1.0
/// and anything else 0.0.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return f64::NAN;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Shuffled train/test index split. The test side gets `ceil(n * test_fraction)` rows.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    let n_test = n_test.min(n);
    let train = indices.split_off(n_test);
    (train, indices)
}

/// Contiguous, unshuffled folds over `0..n`. The first `n % k` folds hold one
/// extra row. Returns `(start, end)` ranges.
pub fn kfold_ranges(n: usize, k: usize) -> Vec<(usize, usize)> {
    if k == 0 {
        return Vec::new();
    }
    let base = n / k;
    let extra = n % k;
    let mut start = 0;
    (0..k)
        .map(|fold| {
            let len = base + usize::from(fold < extra);
            let range = (start, start + len);
            start += len;
            range
        })
        .collect()
}

/// Per-fold R² of `spec` refitted on the other folds. A fold with fewer
/// than two rows scores NaN.
pub fn cross_val_scores(
    spec: &RegressorSpec,
    x: &[Row],
    y: &[f64],
    folds: usize,
    seed: u64,
) -> Result<Vec<f64>, RegressorError> {
    let mut scores = Vec::with_capacity(folds);
    for (start, end) in kfold_ranges(x.len(), folds) {
        if end - start < 2 {
            scores.push(f64::NAN);
            continue;
        }
        let (train_x, train_y): (Vec<Row>, Vec<f64>) = (0..x.len())
            .filter(|&i| i < start || i >= end)
            .map(|i| (x[i], y[i]))
            .unzip();
        let model = spec.fit(&train_x, &train_y, seed)?;
        let predicted = model.predict_batch(&x[start..end])?;
        scores.push(r2_score(&y[start..end], &predicted));
    }
    Ok(scores)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
