//! Least-squares gradient boosting backed by `gbdt`.
//!
//! `gbdt` works in `f32`, so rows and targets are narrowed on the way in and
//! predictions widened on the way out. Row and feature sampling stay at 1.0,
//! which keeps the fit deterministic without a seed.

use super::{RegressorError, Row, check_training_data};
use crate::features::FEATURE_COUNT;
use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    /// Boosting rounds, one tree each.
    pub iterations: usize,
    pub learning_rate: f64,
    pub max_depth: u32,
    pub min_leaf_size: usize,
}

impl BoostingParams {
    pub(crate) fn check(&self) -> Result<(), RegressorError> {
        if self.iterations == 0 {
            return Err(RegressorError::NoEstimators);
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(RegressorError::InvalidParameter("learning_rate must be positive"));
        }
        if self.max_depth == 0 || self.min_leaf_size == 0 {
            return Err(RegressorError::InvalidParameter(
                "max_depth and min_leaf_size must be positive",
            ));
        }
        Ok(())
    }

    fn to_config(self) -> Config {
        let mut config = Config::new();
        config.set_feature_size(FEATURE_COUNT);
        config.set_iterations(self.iterations);
        config.set_shrinkage(self.learning_rate as f32);
        config.set_max_depth(self.max_depth);
        config.set_min_leaf_size(self.min_leaf_size);
        config.set_loss("SquaredError");
        config.set_data_sample_ratio(1.0);
        config.set_feature_sample_ratio(1.0);
        config
    }
}

#[derive(Serialize, Deserialize)]
pub struct BoostedTrees {
    params: BoostingParams,
    model: GBDT,
}

impl BoostedTrees {
    pub fn fit(x: &[Row], y: &[f64], params: &BoostingParams) -> Result<Self, RegressorError> {
        check_training_data(x, y)?;
        params.check()?;

        let mut data: DataVec = x
            .iter()
            .zip(y)
            .map(|(row, &target)| Data::new_training_data(narrow(row), 1.0, target as f32, None))
            .collect();
        let mut model = GBDT::new(&params.to_config());
        model.fit(&mut data);

        Ok(Self {
            params: *params,
            model,
        })
    }

    pub fn predict_batch(&self, rows: &[Row]) -> Vec<f64> {
        if rows.is_empty() {
            return Vec::new();
        }
        let data: DataVec = rows
            .iter()
            .map(|row| Data::new_test_data(narrow(row), None))
            .collect();
        self.model
            .predict(&data)
            .into_iter()
            .map(f64::from)
            .collect()
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }
}

impl fmt::Debug for BoostedTrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoostedTrees")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

fn narrow(row: &Row) -> Vec<f32> {
    row.iter().map(|&value| value as f32).collect()
}
