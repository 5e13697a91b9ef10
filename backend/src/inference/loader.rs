use shared::ModelStatus;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use super::archive::{extract_model, is_archive};
use super::interpreter::InterpreterClassifier;
use super::saved_model::SavedModelClassifier;
use super::{BackendKind, InferenceError, LoadError, SharedClassifier};
use crate::config::ModelConfig;

type LoadFn = Box<dyn Fn() -> Result<SharedClassifier, LoadError> + Send + Sync>;

/// Process-wide, load-once holder of the classifier.
///
/// The first `get_classifier` call runs the load; concurrent first callers
/// block on the same initialization and all receive the same instance. A failed
/// load is remembered: the loader stays unavailable for the process lifetime.
pub struct ModelLoader {
    load: LoadFn,
    cell: OnceLock<Result<SharedClassifier, LoadError>>,
}

impl ModelLoader {
    pub fn new(config: ModelConfig) -> Self {
        Self::from_fn(move || load_classifier(&config))
    }

    /// Loader backed by an arbitrary load function.
    pub fn from_fn<F>(load: F) -> Self
    where
        F: Fn() -> Result<SharedClassifier, LoadError> + Send + Sync + 'static,
    {
        Self {
            load: Box::new(load),
            cell: OnceLock::new(),
        }
    }

    pub fn get_classifier(&self) -> Result<SharedClassifier, InferenceError> {
        match self.cell.get_or_init(|| self.run_load()) {
            Ok(classifier) => Ok(Arc::clone(classifier)),
            Err(e) => Err(InferenceError::ModelUnavailable(e.to_string())),
        }
    }

    /// Current state, without triggering a load.
    pub fn status(&self) -> ModelStatus {
        match self.cell.get() {
            None => ModelStatus::NotLoaded,
            Some(Ok(classifier)) => ModelStatus::Ready {
                backend: classifier.backend().name().to_string(),
            },
            Some(Err(e)) => ModelStatus::Unavailable {
                reason: e.to_string(),
            },
        }
    }

    fn run_load(&self) -> Result<SharedClassifier, LoadError> {
        let result = (self.load)();
        match &result {
            Ok(classifier) => log::info!("Classifier ready ({})", classifier.backend().name()),
            Err(e) => log::error!("Failed to load classifier, predictions are disabled: {}", e),
        }
        result
    }
}

/// Resolves the configured artifact (unpacking archives) and loads it with the
/// configured backend.
pub fn load_classifier(config: &ModelConfig) -> Result<SharedClassifier, LoadError> {
    let path = resolve_artifact(config)?;
    match config.backend {
        BackendKind::SavedModel => Ok(Arc::new(SavedModelClassifier::load(&path, config.layout)?)),
        BackendKind::Interpreter => Ok(Arc::new(InterpreterClassifier::load(&path, config.layout)?)),
        BackendKind::Torch => load_torch(&path, config),
    }
}

fn resolve_artifact(config: &ModelConfig) -> Result<PathBuf, LoadError> {
    if is_archive(&config.path) {
        return extract_model(&config.path, &config.extract_dir, &config.model_file);
    }
    if !config.path.exists() {
        return Err(LoadError::NotFound(config.path.clone()));
    }
    Ok(config.path.clone())
}

#[cfg(feature = "torch")]
fn load_torch(path: &std::path::Path, config: &ModelConfig) -> Result<SharedClassifier, LoadError> {
    Ok(Arc::new(super::torch::TorchClassifier::load(path, config.layout)?))
}

#[cfg(not(feature = "torch"))]
fn load_torch(_path: &std::path::Path, _config: &ModelConfig) -> Result<SharedClassifier, LoadError> {
    Err(LoadError::BackendDisabled(BackendKind::Torch.name()))
}
