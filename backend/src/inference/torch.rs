use std::path::Path;
use std::sync::Mutex;
use tch::{CModule, Device, Kind, Tensor};

use super::{BackendKind, BatchedInput, Classifier, InferenceError, LoadError, TensorLayout};

/// TorchScript classifier executed through libtorch.
pub struct TorchClassifier {
    model: Mutex<CModule>,
    device: Device,
    layout: TensorLayout,
}

impl TorchClassifier {
    pub fn load(path: &Path, layout: TensorLayout) -> Result<Self, LoadError> {
        let device = Device::cuda_if_available();
        let model = CModule::load_on_device(path, device).map_err(|e| LoadError::Backend {
            backend: BackendKind::Torch.name(),
            message: e.to_string(),
        })?;
        log::info!("Loaded TorchScript model from {} on {:?}", path.display(), device);
        Ok(Self {
            model: Mutex::new(model),
            device,
            layout,
        })
    }
}

impl Classifier for TorchClassifier {
    fn backend(&self) -> BackendKind {
        BackendKind::Torch
    }

    fn predict(&self, input: &BatchedInput) -> Result<Vec<f32>, InferenceError> {
        let (shape, data) = input.to_layout(self.layout);
        let shape: Vec<i64> = shape.iter().map(|&d| d as i64).collect();
        let tensor = Tensor::from_slice(&data).view(shape.as_slice()).to_device(self.device);

        let output = {
            let model = self.model.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            model
                .forward_ts(&[tensor])
                .map_err(|e| InferenceError::Execution(e.to_string()))?
        };
        let output_flat = output.to_kind(Kind::Float).to_device(Device::Cpu).view([-1]);
        let num_elements = output_flat.size()[0] as usize;
        let mut output_vec = vec![0.0f32; num_elements];
        output_flat.copy_data(&mut output_vec, num_elements);
        Ok(output_vec)
    }
}
