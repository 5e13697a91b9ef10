use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tract_onnx::prelude::*;

use super::saved_model::{TractPlan, flatten_scores, to_tract_tensor};
use super::{BackendKind, BatchedInput, Classifier, InferenceError, LoadError, TensorLayout};

/// Interpreter-style driver for a TFLite flat-buffer.
///
/// Mirrors the mobile interpreter calling convention: buffers are allocated
/// once, then each prediction writes the input slot, invokes, and reads the
/// output slot.
pub struct Interpreter {
    plan: TractPlan,
    input_shape: Vec<usize>,
    input: Option<Tensor>,
    output: Option<Tensor>,
}

impl Interpreter {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let plan = tract_tflite::tflite()
            .model_for_path(path)
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(backend_error)?;
        Ok(Self::from_plan(plan))
    }

    pub(crate) fn from_plan(plan: TractPlan) -> Self {
        Self {
            plan,
            input_shape: Vec::new(),
            input: None,
            output: None,
        }
    }

    /// Checks the model signature and allocates the input buffer.
    pub fn allocate_tensors(&mut self) -> Result<(), LoadError> {
        let model = self.plan.model();
        if model.inputs.len() != 1 || model.outputs.len() != 1 {
            return Err(LoadError::Backend {
                backend: BackendKind::Interpreter.name(),
                message: format!(
                    "expected one input and one output, model has {} and {}",
                    model.inputs.len(),
                    model.outputs.len()
                ),
            });
        }
        let fact = model.input_fact(0).map_err(backend_error)?;
        if fact.datum_type != f32::datum_type() {
            return Err(LoadError::Backend {
                backend: BackendKind::Interpreter.name(),
                message: format!("unsupported input type {:?}, expected f32", fact.datum_type),
            });
        }
        let shape = fact
            .shape
            .as_concrete()
            .ok_or_else(|| LoadError::Backend {
                backend: BackendKind::Interpreter.name(),
                message: "input shape is not fully known".to_string(),
            })?
            .to_vec();
        self.input = Some(Tensor::zero::<f32>(&shape).map_err(backend_error)?);
        self.input_shape = shape;
        Ok(())
    }

    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    pub fn set_input_tensor(&mut self, tensor: Tensor) -> Result<(), InferenceError> {
        let slot = self.input.as_mut().ok_or_else(not_allocated)?;
        if tensor.shape() != slot.shape() {
            return Err(InferenceError::Execution(format!(
                "input shape {:?} does not match model input {:?}",
                tensor.shape(),
                slot.shape()
            )));
        }
        *slot = tensor;
        Ok(())
    }

    pub fn invoke(&mut self) -> Result<(), InferenceError> {
        let input = self.input.clone().ok_or_else(not_allocated)?;
        let mut outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::Execution(format!("{e:#}")))?;
        let output = outputs
            .pop()
            .ok_or_else(|| InferenceError::InvalidOutput("model returned no outputs".into()))?;
        self.output = Some(output.into_tensor());
        Ok(())
    }

    pub fn output_tensor(&self) -> Result<&Tensor, InferenceError> {
        self.output
            .as_ref()
            .ok_or_else(|| InferenceError::Execution("invoke has not run yet".into()))
    }
}

fn backend_error(e: TractError) -> LoadError {
    LoadError::Backend {
        backend: BackendKind::Interpreter.name(),
        message: format!("{e:#}"),
    }
}

fn not_allocated() -> InferenceError {
    InferenceError::Execution("tensors have not been allocated".into())
}

/// Quantized TFLite classifier. The interpreter owns mutable buffers, so calls
/// are serialized.
pub struct InterpreterClassifier {
    interpreter: Mutex<Interpreter>,
    layout: TensorLayout,
}

impl InterpreterClassifier {
    pub fn load(path: &Path, layout: TensorLayout) -> Result<Self, LoadError> {
        let classifier = Self::from_interpreter(Interpreter::from_path(path)?, layout)?;
        log::info!("Loaded TFLite model from {}", path.display());
        Ok(classifier)
    }

    pub(crate) fn from_interpreter(mut interpreter: Interpreter, layout: TensorLayout) -> Result<Self, LoadError> {
        interpreter.allocate_tensors()?;
        log::debug!("Interpreter input shape {:?}", interpreter.input_shape());
        Ok(Self {
            interpreter: Mutex::new(interpreter),
            layout,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Interpreter> {
        // The slots are fully overwritten on every call, so a panic mid-call
        // leaves nothing a later call could observe.
        self.interpreter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Classifier for InterpreterClassifier {
    fn backend(&self) -> BackendKind {
        BackendKind::Interpreter
    }

    fn predict(&self, input: &BatchedInput) -> Result<Vec<f32>, InferenceError> {
        let tensor = to_tract_tensor(input, self.layout)?;
        let mut interpreter = self.lock();
        interpreter.set_input_tensor(tensor)?;
        interpreter.invoke()?;
        flatten_scores(interpreter.output_tensor()?)
    }
}
