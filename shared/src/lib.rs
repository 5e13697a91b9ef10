pub mod freshness;
pub mod report;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use freshness::{CLASS_COUNT, ClassScore, FreshnessClass, PredictionVector, ScoreError, clip_score};
pub use report::{REPORT_FILE_NAME, format_confidence, format_percentage, render_report};

/// File extensions accepted for uploads, lower case.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Whether a file name carries one of [`ACCEPTED_EXTENSIONS`].
pub fn is_accepted_file_name(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ACCEPTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionResponse {
    pub request_id: Uuid,
    pub image_hash: String,
    pub label: FreshnessClass,
    pub confidence: f32,
    pub predictions: PredictionVector,
    pub class_labels: Vec<String>,
    pub breakdown: Vec<ClassScore>,
    pub advisory: String,
    pub report: String,
    pub analyzed_at: DateTime<Utc>,
}

impl PredictionResponse {
    pub fn from_predictions(request_id: Uuid, image_hash: String, predictions: PredictionVector) -> Self {
        let label = predictions.argmax();
        let confidence = predictions.confidence();
        Self {
            request_id,
            image_hash,
            label,
            confidence,
            predictions,
            class_labels: FreshnessClass::labels(),
            breakdown: predictions.breakdown(),
            advisory: label.advisory().to_string(),
            report: render_report(label, confidence),
            analyzed_at: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReportRequest {
    pub label: FreshnessClass,
    pub confidence: f32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStatus {
    MissingImage,
    UnsupportedFileType,
    InvalidImage,
    ModelUnavailable,
    InferenceFailed,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub status: ErrorStatus,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelStatus {
    NotLoaded,
    Ready { backend: String },
    Unavailable { reason: String },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub version: String,
    pub model: ModelStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_file_names() {
        assert!(is_accepted_file_name("trout.jpg"));
        assert!(is_accepted_file_name("trout.JPEG"));
        assert!(is_accepted_file_name("market.photo.png"));
        assert!(!is_accepted_file_name("trout.gif"));
        assert!(!is_accepted_file_name("trout"));
        assert!(!is_accepted_file_name("png"));
    }

    #[test]
    fn response_for_reference_prediction() {
        let predictions = PredictionVector::new([0.92, 0.05, 0.03]).unwrap();
        let response = PredictionResponse::from_predictions(Uuid::new_v4(), "abc".into(), predictions);
        assert_eq!(response.label, FreshnessClass::Fresh);
        assert!((response.confidence - 0.92).abs() < 1e-6);
        assert_eq!(response.class_labels, vec!["Fresh", "Moderately Fresh", "Spoiled"]);
        assert_eq!(response.advisory, FreshnessClass::Fresh.advisory());
        assert!(response.report.contains("Prediction: Fresh"));
        assert!(response.report.contains("92.00%"));
    }

    #[test]
    fn wire_format() {
        let predictions = PredictionVector::new([0.1, 0.2, 0.7]).unwrap();
        let response = PredictionResponse::from_predictions(Uuid::nil(), "ff".into(), predictions);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["label"], "Spoiled");
        assert_eq!(json["predictions"].as_array().unwrap().len(), 3);
        assert_eq!(json["breakdown"][2]["class"], "Spoiled");

        let status = serde_json::to_value(ModelStatus::Ready { backend: "interpreter".into() }).unwrap();
        assert_eq!(status["state"], "ready");
        assert_eq!(status["backend"], "interpreter");

        let error = serde_json::to_value(ErrorResponse {
            error: "no model".into(),
            status: ErrorStatus::ModelUnavailable,
        })
        .unwrap();
        assert_eq!(error["status"], "model_unavailable");
    }
}
