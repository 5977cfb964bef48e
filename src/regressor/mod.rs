//! Tree-ensemble regressors used as model candidates.
//!
//! Random forests come from `smartcore` and boosted trees from `gbdt`. Both
//! serialise through serde, so a fitted regressor is stored inline in the
//! JSON model artifact. Rows are in [`crate::features::FEATURE_NAMES`] order.

use crate::features::FEATURE_COUNT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod boosting;
pub mod forest;

use boosting::{BoostedTrees, BoostingParams};
use forest::{ForestParams, RandomForest};

pub type Row = [f64; FEATURE_COUNT];

#[derive(Debug, Error, PartialEq)]
pub enum RegressorError {
    #[error("cannot fit on an empty dataset")]
    Empty,
    #[error("feature rows ({rows}) and targets ({targets}) differ in length")]
    LengthMismatch { rows: usize, targets: usize },
    #[error("non-finite value in training row {0}")]
    NonFinite(usize),
    #[error("ensemble needs at least one estimator")]
    NoEstimators,
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("random forest failed: {0}")]
    Forest(String),
    #[error("regressor returned no prediction")]
    MissingPrediction,
}

pub(crate) fn check_training_data(x: &[Row], y: &[f64]) -> Result<(), RegressorError> {
    if x.is_empty() {
        return Err(RegressorError::Empty);
    }
    if x.len() != y.len() {
        return Err(RegressorError::LengthMismatch {
            rows: x.len(),
            targets: y.len(),
        });
    }
    for (index, (row, target)) in x.iter().zip(y).enumerate() {
        if !target.is_finite() || row.iter().any(|value| !value.is_finite()) {
            return Err(RegressorError::NonFinite(index));
        }
    }
    Ok(())
}

/// Hyperparameters of one candidate; fitting turns it into a [`Regressor`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorSpec {
    RandomForest(ForestParams),
    GradientBoosting(BoostingParams),
}

impl RegressorSpec {
    pub fn fit(&self, x: &[Row], y: &[f64], seed: u64) -> Result<Regressor, RegressorError> {
        match self {
            RegressorSpec::RandomForest(params) => {
                RandomForest::fit(x, y, params, seed).map(Regressor::RandomForest)
            }
            RegressorSpec::GradientBoosting(params) => {
                BoostedTrees::fit(x, y, params).map(Regressor::GradientBoosting)
            }
        }
    }
}

/// A fitted ensemble. Immutable once built.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    RandomForest(RandomForest),
    GradientBoosting(BoostedTrees),
}

impl Regressor {
    pub fn predict(&self, row: &Row) -> Result<f64, RegressorError> {
        let predictions = self.predict_batch(std::slice::from_ref(row))?;
        predictions
            .first()
            .copied()
            .ok_or(RegressorError::MissingPrediction)
    }

    pub fn predict_batch(&self, rows: &[Row]) -> Result<Vec<f64>, RegressorError> {
        match self {
            Regressor::RandomForest(forest) => forest.predict_batch(rows),
            Regressor::GradientBoosting(model) => Ok(model.predict_batch(rows)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Regressor::RandomForest(_) => "random_forest",
            Regressor::GradientBoosting(_) => "gradient_boosting",
        }
    }

    /// Sanity check for regressors read back from disk: stored
    /// hyperparameters are valid and an all-zero row predicts a finite value.
    pub fn check_structure(&self) -> Result<(), String> {
        let params = match self {
            Regressor::RandomForest(forest) => forest.params().check(),
            Regressor::GradientBoosting(model) => model.params().check(),
        };
        params.map_err(|err| err.to_string())?;

        let zero_row_prediction = self
            .predict(&[0.0; FEATURE_COUNT])
            .map_err(|err| err.to_string())?;
        if !zero_row_prediction.is_finite() {
            return Err(format!("{} predicts a non-finite value", self.kind()));
        }
        Ok(())
    }
}
