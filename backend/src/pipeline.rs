use sha2::{Digest, Sha256};
use shared::{PredictionResponse, PredictionVector, is_accepted_file_name};
use uuid::Uuid;

use crate::inference::preprocess::PreprocessError;
use crate::inference::{BatchedInput, Classifier, InferenceError, ModelLoader, preprocess};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no image was uploaded")]
    MissingImage,
    #[error("unsupported file type {0:?}, expected a jpg, jpeg or png file")]
    UnsupportedFileType(String),
    #[error(transparent)]
    InvalidImage(#[from] PreprocessError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Runs one forward pass and validates the output vector.
pub fn predict(classifier: &dyn Classifier, input: &BatchedInput) -> Result<PredictionVector, InferenceError> {
    let scores = classifier.predict(input)?;
    PredictionVector::from_slice(&scores).map_err(|e| InferenceError::InvalidOutput(e.to_string()))
}

pub fn calculate_image_hash(image_data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_data);
    hex::encode(hasher.finalize())
}

/// Upload-to-result handler shared by every request.
pub struct FreshnessPipeline {
    loader: ModelLoader,
}

impl FreshnessPipeline {
    pub fn new(loader: ModelLoader) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &ModelLoader {
        &self.loader
    }

    /// Classifies one uploaded image.
    ///
    /// The file name is checked before anything else, the image is decoded
    /// before the model is touched, and an unavailable model refuses the
    /// request without attempting inference.
    pub fn classify(&self, file_name: &str, image: &[u8]) -> Result<PredictionResponse, PipelineError> {
        if !is_accepted_file_name(file_name) {
            return Err(PipelineError::UnsupportedFileType(file_name.to_string()));
        }
        if image.is_empty() {
            return Err(PipelineError::MissingImage);
        }

        let request_id = Uuid::new_v4();
        let image_hash = calculate_image_hash(image);
        let input = preprocess(image)?;
        log::debug!("[{}] preprocessed input {:?}", request_id, input.shape());
        let classifier = self.loader.get_classifier()?;
        let predictions = predict(classifier.as_ref(), &input)?;

        let response = PredictionResponse::from_predictions(request_id, image_hash, predictions);
        log::info!(
            "[{}] {} ({}) -> {} ({:.4})",
            request_id,
            file_name,
            &response.image_hash[..12],
            response.label,
            response.confidence
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::loader::tests::{FixedClassifier, fixed_loader};
    use crate::inference::preprocess::tests::sample_png;
    use crate::inference::{BackendKind, LoadError, SharedClassifier};
    use shared::FreshnessClass;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClassifier(Arc<AtomicUsize>);

    impl Classifier for CountingClassifier {
        fn backend(&self) -> BackendKind {
            BackendKind::Interpreter
        }

        fn predict(&self, input: &BatchedInput) -> Result<Vec<f32>, InferenceError> {
            assert_eq!(input.shape(), &[1, 224, 224, 3]);
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.1, 0.1, 0.8])
        }
    }

    #[test]
    fn reference_image_is_fresh() {
        let pipeline = FreshnessPipeline::new(fixed_loader(vec![0.92, 0.05, 0.03]));
        let response = pipeline.classify("catch.jpg", &sample_png(640, 480)).unwrap();

        assert_eq!(response.label, FreshnessClass::Fresh);
        assert!((response.confidence - 0.92).abs() < 1e-6);
        assert!(response.report.contains("Prediction: Fresh"));
        assert!(response.report.contains("92.00%"));
        assert_eq!(response.image_hash.len(), 64);
    }

    #[test]
    fn predict_returns_three_finite_scores() {
        let input = preprocess(&sample_png(10, 10)).unwrap();
        let v = predict(&FixedClassifier(vec![0.3, 0.3, 0.4]), &input).unwrap();
        assert_eq!(v.scores().len(), 3);
        assert!(v.scores().iter().all(|s| s.is_finite()));

        let err = predict(&FixedClassifier(vec![0.5, 0.5]), &input).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidOutput(_)));
        let err = predict(&FixedClassifier(vec![0.5, f32::NAN, 0.1]), &input).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidOutput(_)));
    }

    #[test]
    fn unavailable_model_refuses_every_request() {
        let loader = ModelLoader::from_fn(|| Err(LoadError::NotFound("model/model.tar.gz".into())));
        let pipeline = FreshnessPipeline::new(loader);
        for _ in 0..2 {
            let err = pipeline.classify("fish.png", &sample_png(8, 8)).unwrap_err();
            assert!(matches!(err, PipelineError::Inference(InferenceError::ModelUnavailable(_))));
        }
    }

    #[test]
    fn bad_image_never_reaches_the_classifier() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let loader = ModelLoader::from_fn(move || Ok(Arc::new(CountingClassifier(Arc::clone(&counter))) as SharedClassifier));
        let pipeline = FreshnessPipeline::new(loader);

        let err = pipeline.classify("fish.jpg", b"GIF89a? no, just text").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidImage(PreprocessError::Decode(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // the shared classifier still serves the next request
        let ok = pipeline.classify("fish.jpg", &sample_png(30, 20)).unwrap();
        assert_eq!(ok.label, FreshnessClass::Spoiled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejects_unaccepted_extensions_and_empty_uploads() {
        let pipeline = FreshnessPipeline::new(fixed_loader(vec![1.0, 0.0, 0.0]));
        let err = pipeline.classify("fish.gif", &sample_png(8, 8)).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFileType(_)));
        let err = pipeline.classify("fish.png", &[]).unwrap_err();
        assert!(matches!(err, PipelineError::MissingImage));
    }

    #[test]
    fn image_hash_is_sha256_hex() {
        assert_eq!(
            calculate_image_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
