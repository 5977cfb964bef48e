//! Bootstrap-aggregated regression trees backed by `smartcore`.

use super::{RegressorError, Row, check_training_data};
use crate::features::FEATURE_COUNT;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fmt;

type ForestModel = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    /// `None` grows every tree until its leaves are pure.
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per split. `None` considers all of them.
    pub max_features: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

impl ForestParams {
    pub(crate) fn check(&self) -> Result<(), RegressorError> {
        if self.n_trees == 0 {
            return Err(RegressorError::NoEstimators);
        }
        if self.max_depth == Some(0) {
            return Err(RegressorError::InvalidParameter("max_depth must be positive"));
        }
        if self.min_samples_leaf == 0 || self.min_samples_split < 2 {
            return Err(RegressorError::InvalidParameter(
                "min_samples_leaf must be positive and min_samples_split at least 2",
            ));
        }
        if let Some(features) = self.max_features
            && !(1..=FEATURE_COUNT).contains(&features)
        {
            return Err(RegressorError::InvalidParameter(
                "max_features must be between 1 and the feature count",
            ));
        }
        Ok(())
    }

    fn to_smartcore(self, seed: u64) -> RandomForestRegressorParameters {
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.n_trees)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_m(self.max_features.unwrap_or(FEATURE_COUNT))
            .with_seed(seed);
        match self.max_depth {
            Some(depth) => params.with_max_depth(depth),
            None => params,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    model: ForestModel,
}

impl RandomForest {
    pub fn fit(
        x: &[Row],
        y: &[f64],
        params: &ForestParams,
        seed: u64,
    ) -> Result<Self, RegressorError> {
        check_training_data(x, y)?;
        params.check()?;
        let model = ForestModel::fit(&to_matrix(x), &y.to_vec(), params.to_smartcore(seed))
            .map_err(|err| RegressorError::Forest(err.to_string()))?;
        Ok(Self {
            params: *params,
            model,
        })
    }

    pub fn predict_batch(&self, rows: &[Row]) -> Result<Vec<f64>, RegressorError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        self.model
            .predict(&to_matrix(rows))
            .map_err(|err| RegressorError::Forest(err.to_string()))
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

impl fmt::Debug for RandomForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomForest")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

fn to_matrix(rows: &[Row]) -> DenseMatrix<f64> {
    let values: Vec<Vec<f64>> = rows.iter().map(|row| row.to_vec()).collect();
    DenseMatrix::from_2d_vec(&values)
}
