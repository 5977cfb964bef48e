use crate::estimation::model::{EtaModel, ModelKind};
use std::fmt;
use std::sync::Arc;

/// Shared, read-only serving state. Built once at startup.
pub struct AppState<S> {
    model: Arc<dyn EtaModel>,
    services: S,
    model_accuracy: String,
}

impl<S> AppState<S> {
    pub fn new(model: Arc<dyn EtaModel>, services: S, model_accuracy: impl Into<String>) -> Self {
        Self {
            model,
            services,
            model_accuracy: model_accuracy.into(),
        }
    }

    pub fn model(&self) -> &dyn EtaModel {
        self.model.as_ref()
    }

    pub fn model_kind(&self) -> ModelKind {
        self.model.kind()
    }

    pub fn services(&self) -> &S {
        &self.services
    }

    pub fn model_accuracy(&self) -> &str {
        &self.model_accuracy
    }
}

impl<S: fmt::Debug> fmt::Debug for AppState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("model", &self.model)
            .field("services", &self.services)
            .field("model_accuracy", &self.model_accuracy)
            .finish()
    }
}
