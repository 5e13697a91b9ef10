use std::path::Path;
use tract_onnx::prelude::*;

use super::{BackendKind, BatchedInput, Classifier, InferenceError, LoadError, TensorLayout};
use crate::inference::preprocess::{INPUT_HEIGHT, INPUT_WIDTH};

pub(crate) type TractPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX classifier run through tract.
///
/// The optimized plan is immutable; every `run` builds its own execution state,
/// so concurrent predictions need no lock.
pub struct SavedModelClassifier {
    plan: TractPlan,
    layout: TensorLayout,
}

impl SavedModelClassifier {
    pub fn load(path: &Path, layout: TensorLayout) -> Result<Self, LoadError> {
        let shape = input_shape(layout);
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact(shape).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| LoadError::Backend {
                backend: BackendKind::SavedModel.name(),
                message: format!("{e:#}"),
            })?;
        log::info!("Loaded ONNX model from {}", path.display());
        Ok(Self::from_plan(plan, layout))
    }

    pub(crate) fn from_plan(plan: TractPlan, layout: TensorLayout) -> Self {
        Self { plan, layout }
    }
}

impl Classifier for SavedModelClassifier {
    fn backend(&self) -> BackendKind {
        BackendKind::SavedModel
    }

    fn predict(&self, input: &BatchedInput) -> Result<Vec<f32>, InferenceError> {
        let tensor = to_tract_tensor(input, self.layout)?;
        check_input_shape(&self.plan, &tensor)?;
        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::Execution(format!("{e:#}")))?;
        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::InvalidOutput("model returned no outputs".into()))?;
        flatten_scores(output)
    }
}

pub(crate) fn input_shape(layout: TensorLayout) -> [usize; 4] {
    let (h, w) = (INPUT_HEIGHT as usize, INPUT_WIDTH as usize);
    match layout {
        TensorLayout::Nhwc => [1, h, w, 3],
        TensorLayout::Nchw => [1, 3, h, w],
    }
}

pub(crate) fn to_tract_tensor(input: &BatchedInput, layout: TensorLayout) -> Result<Tensor, InferenceError> {
    let (shape, data) = input.to_layout(layout);
    Tensor::from_shape(&shape, &data).map_err(|e| InferenceError::Execution(format!("{e:#}")))
}

/// Rejects a tensor whose shape differs from the plan's concrete input fact.
pub(crate) fn check_input_shape(plan: &TractPlan, tensor: &Tensor) -> Result<(), InferenceError> {
    let fact = plan
        .model()
        .input_fact(0)
        .map_err(|e| InferenceError::Execution(format!("{e:#}")))?;
    match fact.shape.as_concrete() {
        Some(expected) if expected != tensor.shape() => Err(InferenceError::Execution(format!(
            "input shape {:?} does not match model input {:?}",
            tensor.shape(),
            expected
        ))),
        _ => Ok(()),
    }
}

/// Reads an output tensor as a flat list of `f32` scores, dequantizing
/// quantized outputs with their zero point and scale.
pub(crate) fn flatten_scores(output: &Tensor) -> Result<Vec<f32>, InferenceError> {
    let datum_type = output.datum_type();
    let invalid = |e: TractError| InferenceError::InvalidOutput(format!("{e:#}"));
    if datum_type.is_quantized() {
        let (zero_point, scale) = datum_type.zp_scale();
        let raw = output
            .cast_to_dt(datum_type.unquantized())
            .and_then(|t| t.cast_to::<f32>().map(|t| t.into_owned()))
            .map_err(invalid)?;
        let values = raw.as_slice::<f32>().map_err(invalid)?;
        return Ok(values
            .iter()
            .map(|v| (v - zero_point as f32) * scale)
            .collect());
    }
    let values = output.cast_to::<f32>().map_err(invalid)?;
    Ok(values.as_slice::<f32>().map_err(invalid)?.to_vec())
}
