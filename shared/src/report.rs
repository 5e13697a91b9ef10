use crate::freshness::{FreshnessClass, clip_score};

/// File name offered for the downloadable report.
pub const REPORT_FILE_NAME: &str = "FishFreshnessReport.txt";

/// Two-decimal percentage text, as shown for every class score.
pub fn format_percentage(percentage: f64) -> String {
    format!("{:.2}%", percentage)
}

/// Confidence as a percentage with two decimals, clipped to `[0, 100]`.
///
/// Scaled in `f64` so the rounded digits match the score read as a double.
pub fn format_confidence(confidence: f32) -> String {
    format_percentage(f64::from(clip_score(confidence)) * 100.0)
}

/// Plain-text report for a single prediction.
pub fn render_report(label: FreshnessClass, confidence: f32) -> String {
    format!(
        "Fish Freshness Prediction Report\n\
         \n\
         Prediction: {}\n\
         Confidence: {}\n\
         \n\
         {}\n",
        label.label(),
        format_confidence(confidence),
        label.advisory()
    )
}
