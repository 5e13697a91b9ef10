pub mod archive;
pub mod interpreter;
pub mod loader;
pub mod preprocess;
pub mod saved_model;
#[cfg(feature = "torch")]
pub mod torch;

use ndarray::Array4;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub use loader::ModelLoader;
pub use preprocess::preprocess;

/// Model artifact formats the loader knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// ONNX graph executed with tract.
    SavedModel,
    /// Quantized TFLite flat-buffer driven through an interpreter.
    Interpreter,
    /// TorchScript module, only with the `torch` feature.
    Torch,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::SavedModel => "saved_model",
            BackendKind::Interpreter => "interpreter",
            BackendKind::Torch => "torch",
        }
    }
}

/// Axis order the model expects its input in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorLayout {
    Nhwc,
    Nchw,
}

/// A single preprocessed image with a batch dimension of one, NHWC, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchedInput(Array4<f32>);

impl BatchedInput {
    pub(crate) fn new(array: Array4<f32>) -> Self {
        Self(array)
    }

    pub fn array(&self) -> &Array4<f32> {
        &self.0
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    /// The tensor in the requested layout as a shape and contiguous row-major data.
    pub fn to_layout(&self, layout: TensorLayout) -> (Vec<usize>, Vec<f32>) {
        let view = match layout {
            TensorLayout::Nhwc => self.array().view(),
            TensorLayout::Nchw => self.array().view().permuted_axes([0, 3, 1, 2]),
        };
        let shape = view.shape().to_vec();
        let data = view.iter().copied().collect();
        (shape, data)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("model artifact not found at {0}")]
    NotFound(PathBuf),
    #[error("failed to extract model archive {path}: {source}")]
    Extract {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("model file {file} not present in archive {archive}")]
    MissingInArchive { archive: PathBuf, file: String },
    #[error("failed to load {backend} model: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },
    #[error("backend {0} is not compiled into this build")]
    BackendDisabled(&'static str),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum InferenceError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("model execution failed: {0}")]
    Execution(String),
    #[error("model produced unusable output: {0}")]
    InvalidOutput(String),
}

/// A fixed, pre-trained freshness classifier.
///
/// Implementations must be safe to call from several request threads at once;
/// backends whose runtime keeps mutable buffers serialize calls internally.
pub trait Classifier: Send + Sync {
    fn backend(&self) -> BackendKind;

    /// Runs one forward pass and returns the raw output scores.
    fn predict(&self, input: &BatchedInput) -> Result<Vec<f32>, InferenceError>;
}

pub type SharedClassifier = Arc<dyn Classifier>;
