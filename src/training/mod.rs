//! Offline training: split the dataset, fit every candidate, keep the best.

use crate::estimation::{ModelArtifact, save_artifact};
use crate::regressor::boosting::BoostingParams;
use crate::regressor::forest::ForestParams;
use crate::regressor::{Regressor, RegressorError, RegressorSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

pub mod dataset;
pub mod metrics;

use dataset::{DatasetError, TrainingSet, build_training_set, load_trip_records};
use metrics::{cross_val_scores, mean, r2_score, train_test_split};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
pub const DEFAULT_CV_FOLDS: usize = 5;

/// Which score decides the winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Mean k-fold R² computed over the held-out split.
    #[default]
    CvTest,
    /// R² of the train-split model on the held-out split. Cross-validation
    /// then runs over the training split and is only reported.
    Holdout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub spec: RegressorSpec,
}

impl Candidate {
    pub fn new(name: impl Into<String>, spec: RegressorSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }
}

/// 200 rounds at learning rate 0.05 with depth-5 trees.
fn boosted_trees() -> RegressorSpec {
    RegressorSpec::GradientBoosting(BoostingParams {
        iterations: 200,
        learning_rate: 0.05,
        max_depth: 5,
        min_leaf_size: 1,
    })
}

/// The production candidate list, in declaration order.
///
/// The three boosting entries share one engine and one configuration, so
/// they score identically and the first of them wins any tie.
pub fn default_candidates() -> Vec<Candidate> {
    vec![
        Candidate::new(
            "Random Forest",
            RegressorSpec::RandomForest(ForestParams {
                n_trees: 200,
                max_depth: Some(10),
                ..ForestParams::default()
            }),
        ),
        Candidate::new("Gradient Boosting", boosted_trees()),
        Candidate::new("XGBoost", boosted_trees()),
        Candidate::new("CatBoost", boosted_trees()),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    pub seed: u64,
    pub test_fraction: f64,
    pub cv_folds: usize,
    pub selection: SelectionStrategy,
    pub candidates: Vec<Candidate>,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            test_fraction: DEFAULT_TEST_FRACTION,
            cv_folds: DEFAULT_CV_FOLDS,
            selection: SelectionStrategy::default(),
            candidates: default_candidates(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub name: String,
    pub cv_r2: f64,
    pub holdout_r2: f64,
}

impl CandidateScore {
    fn selection_score(&self, selection: SelectionStrategy) -> f64 {
        match selection {
            SelectionStrategy::CvTest => self.cv_r2,
            SelectionStrategy::Holdout => self.holdout_r2,
        }
    }
}

#[derive(Debug)]
pub struct TrainingOutcome {
    /// One entry per candidate, in declaration order.
    pub scores: Vec<CandidateScore>,
    pub winner: usize,
    pub artifact: ModelArtifact,
}

impl TrainingOutcome {
    pub fn winner_score(&self) -> &CandidateScore {
        &self.scores[self.winner]
    }
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("invalid training options: {0}")]
    InvalidOptions(&'static str),
    #[error("{split} split has {rows} rows, need at least {needed}")]
    InsufficientData {
        split: &'static str,
        rows: usize,
        needed: usize,
    },
    #[error("failed to fit {name}: {source}")]
    Fit {
        name: String,
        #[source]
        source: RegressorError,
    },
    #[error("no candidate produced a finite score")]
    NoUsableCandidate,
    #[error("failed to format training timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("failed to write model artifact: {0}")]
    Write(#[source] std::io::Error),
}

fn check_options(options: &TrainingOptions) -> Result<(), TrainingError> {
    if !(options.test_fraction > 0.0 && options.test_fraction < 1.0) {
        return Err(TrainingError::InvalidOptions("test_fraction must be in (0, 1)"));
    }
    if options.cv_folds < 2 {
        return Err(TrainingError::InvalidOptions("cv_folds must be at least 2"));
    }
    if options.candidates.is_empty() {
        return Err(TrainingError::InvalidOptions("no candidates configured"));
    }
    Ok(())
}

/// Fit every candidate on the training split, score it, and package the
/// best one as an artifact. Ties keep the earlier candidate.
pub fn train_and_select(
    set: &TrainingSet,
    options: &TrainingOptions,
) -> Result<TrainingOutcome, TrainingError> {
    check_options(options)?;

    let (train_idx, test_idx) = train_test_split(set.len(), options.test_fraction, options.seed);
    if train_idx.is_empty() {
        return Err(TrainingError::InsufficientData {
            split: "train",
            rows: 0,
            needed: 1,
        });
    }
    let (train_x, train_y) = set.select(&train_idx);
    let (test_x, test_y) = set.select(&test_idx);

    let (cv_x, cv_y, cv_split) = match options.selection {
        SelectionStrategy::CvTest => (&test_x, &test_y, "test"),
        SelectionStrategy::Holdout => (&train_x, &train_y, "train"),
    };
    // R² is undefined on a single-row fold.
    let needed = 2 * options.cv_folds;
    if cv_x.len() < needed {
        return Err(TrainingError::InsufficientData {
            split: cv_split,
            rows: cv_x.len(),
            needed,
        });
    }

    info!(
        rows = set.len(),
        train_rows = train_x.len(),
        test_rows = test_x.len(),
        folds = options.cv_folds,
        selection = ?options.selection,
        "Training candidates"
    );

    let mut scores = Vec::with_capacity(options.candidates.len());
    let mut best: Option<(usize, f64, Regressor)> = None;

    for (index, candidate) in options.candidates.iter().enumerate() {
        let fit_error = |source| TrainingError::Fit {
            name: candidate.name.clone(),
            source,
        };
        let model = candidate
            .spec
            .fit(&train_x, &train_y, options.seed)
            .map_err(fit_error)?;
        let holdout_r2 = r2_score(&test_y, &model.predict_batch(&test_x).map_err(fit_error)?);
        let fold_scores = cross_val_scores(
            &candidate.spec,
            cv_x,
            cv_y,
            options.cv_folds,
            options.seed,
        )
        .map_err(fit_error)?;
        let score = CandidateScore {
            name: candidate.name.clone(),
            cv_r2: mean(&fold_scores),
            holdout_r2,
        };

        info!(
            model = %score.name,
            cv_r2 = score.cv_r2,
            holdout_r2 = score.holdout_r2,
            "Candidate scored"
        );

        let selection_score = score.selection_score(options.selection);
        if !selection_score.is_finite() {
            warn!(model = %score.name, "Candidate disqualified: non-finite score");
        } else if best
            .as_ref()
            .is_none_or(|(_, best_score, _)| selection_score > *best_score)
        {
            best = Some((index, selection_score, model));
        }
        scores.push(score);
    }

    let (winner, _, regressor) = best.ok_or(TrainingError::NoUsableCandidate)?;
    let trained_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
    let artifact = ModelArtifact::new(
        scores[winner].name.clone(),
        scores[winner].cv_r2,
        scores[winner].holdout_r2,
        trained_at,
        regressor,
    );

    Ok(TrainingOutcome {
        scores,
        winner,
        artifact,
    })
}

/// Load the CSV, train, and write the winning artifact to `output_path`.
pub fn run_training(
    dataset_path: &Path,
    output_path: &Path,
    options: &TrainingOptions,
) -> Result<TrainingOutcome, TrainingError> {
    let records = load_trip_records(dataset_path)?;
    info!(
        path = %dataset_path.display(),
        records = records.len(),
        "Dataset loaded"
    );
    let set = build_training_set(&records)?;
    let outcome = train_and_select(&set, options)?;

    save_artifact(output_path, &outcome.artifact).map_err(TrainingError::Write)?;
    info!(
        path = %output_path.display(),
        model = %outcome.artifact.model_name,
        cv_r2 = outcome.artifact.cv_r2,
        holdout_r2 = outcome.artifact.holdout_r2,
        "Best model saved"
    );
    Ok(outcome)
}
