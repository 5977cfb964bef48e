use crate::estimation::model::{EtaModel, ModelKind, PredictionError, validate_features};
use crate::estimation::{ModelArtifact, ModelLoadError};
use crate::features::{FEATURE_NAMES, FeatureVector};

/// A trained regressor read from a model artifact.
#[derive(Debug)]
pub struct PersistedModel {
    artifact: ModelArtifact,
}

impl PersistedModel {
    /// Wrap an artifact after checking that its feature schema and tree
    /// structure match what this build produces.
    pub fn new(artifact: ModelArtifact) -> Result<Self, ModelLoadError> {
        if artifact.feature_names != FEATURE_NAMES {
            return Err(ModelLoadError::Invalid(format!(
                "feature schema mismatch: artifact has {:?}",
                artifact.feature_names
            )));
        }
        artifact
            .regressor
            .check_structure()
            .map_err(ModelLoadError::Invalid)?;
        Ok(Self { artifact })
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }
}

impl EtaModel for PersistedModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        validate_features(features)?;
        let minutes = self
            .artifact
            .regressor
            .predict(&features.to_array())
            .map_err(|err| PredictionError::Regressor(err.to_string()))?;
        if minutes.is_finite() {
            Ok(minutes)
        } else {
            Err(PredictionError::NonFiniteOutput)
        }
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Persisted
    }
}
