use crate::features::FEATURE_NAMES;
use crate::regressor::Regressor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub mod heuristic;
pub mod model;
pub mod persisted;

use heuristic::HeuristicModel;
use model::EtaModel;
use persisted::PersistedModel;

/// On-disk form of the winning regressor.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model_name: String,
    pub feature_names: Vec<String>,
    /// Mean cross-validation R² the model was selected with.
    pub cv_r2: f64,
    /// R² of the train-split model on the held-out split.
    pub holdout_r2: f64,
    /// RFC 3339 timestamp.
    pub trained_at: String,
    pub regressor: Regressor,
}

impl ModelArtifact {
    pub fn new(
        model_name: impl Into<String>,
        cv_r2: f64,
        holdout_r2: f64,
        trained_at: String,
        regressor: Regressor,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            feature_names: FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
            cv_r2,
            holdout_r2,
            trained_at,
            regressor,
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read model artifact: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

pub fn load_model_from_path(path: impl AsRef<Path>) -> Result<PersistedModel, ModelLoadError> {
    let contents = std::fs::read_to_string(path)?;
    let artifact: ModelArtifact = serde_json::from_str(&contents)?;
    PersistedModel::new(artifact)
}

/// Write the artifact as pretty JSON, creating parent directories as needed.
pub fn save_artifact(path: impl AsRef<Path>, artifact: &ModelArtifact) -> std::io::Result<()> {
    let path = path.as_ref();
    let contents = serde_json::to_string_pretty(artifact).map_err(std::io::Error::other)?;
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

/// Load the persisted model, substituting the heuristic when no path is
/// configured or the artifact is missing or corrupt. Never fails.
pub fn load_model_or_fallback(path: Option<&Path>) -> Arc<dyn EtaModel> {
    match path {
        Some(path) => match load_model_from_path(path) {
            Ok(model) => {
                info!(
                    path = %path.display(),
                    model = %model.artifact().model_name,
                    cv_r2 = model.artifact().cv_r2,
                    "ETA model loaded"
                );
                Arc::new(model)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load ETA model, using heuristic fallback"
                );
                Arc::new(HeuristicModel)
            }
        },
        None => {
            info!("No model path configured, using heuristic model");
            Arc::new(HeuristicModel)
        }
    }
}
