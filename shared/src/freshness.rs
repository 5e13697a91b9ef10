use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Number of classes the freshness classifier scores.
pub const CLASS_COUNT: usize = 3;

/// Freshness classes, in the order of the classifier's output vector.
///
/// The declaration order is the model's training label order and must not be
/// changed independently of the model artifact.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum FreshnessClass {
    #[serde(rename = "Fresh")]
    #[strum(serialize = "Fresh")]
    Fresh,
    #[serde(rename = "Moderately Fresh")]
    #[strum(serialize = "Moderately Fresh")]
    ModeratelyFresh,
    #[serde(rename = "Spoiled")]
    #[strum(serialize = "Spoiled")]
    Spoiled,
}

impl FreshnessClass {
    pub fn index(self) -> usize {
        match self {
            FreshnessClass::Fresh => 0,
            FreshnessClass::ModeratelyFresh => 1,
            FreshnessClass::Spoiled => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        FreshnessClass::iter().nth(index)
    }

    pub fn label(self) -> &'static str {
        match self {
            FreshnessClass::Fresh => "Fresh",
            FreshnessClass::ModeratelyFresh => "Moderately Fresh",
            FreshnessClass::Spoiled => "Spoiled",
        }
    }

    /// Labels of every class, in output-vector order.
    pub fn labels() -> Vec<String> {
        FreshnessClass::iter().map(|c| c.label().to_string()).collect()
    }

    /// Canned advice shown to the user and embedded in the report.
    pub fn advisory(self) -> &'static str {
        match self {
            FreshnessClass::Fresh => {
                "✅ Fresh Fish Detected\n\n\
                 - Estimated Age: Less than 1 day old\n\
                 - Features: Bright eyes, red gills, firm flesh\n\
                 - Suitable for raw and cooked dishes."
            }
            FreshnessClass::ModeratelyFresh => {
                "⚠️ Moderately Fresh Fish Detected\n\n\
                 - Estimated Age: 2–3 days old\n\
                 - Slightly dull eyes and minor odor\n\
                 - Cook thoroughly before consuming."
            }
            FreshnessClass::Spoiled => {
                "🚫 Spoiled Fish Detected\n\n\
                 - Estimated Age: 4–5+ days old\n\
                 - May contain formalin or show signs of decay\n\
                 - Unsafe for consumption."
            }
        }
    }
}

/// Clamps a raw model score into `[0, 1]` for display.
///
/// Non-finite scores never reach this point in the server; NaN still maps to 0
/// so the UI never renders a broken bar.
pub fn clip_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("expected 3 scores, model produced {0}")]
    WrongLength(usize),
    #[error("score at index {0} is not a finite number")]
    NonFinite(usize),
}

/// Raw classifier scores, one per [`FreshnessClass`].
///
/// Scores are kept exactly as the model produced them; they are not
/// renormalized to sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f32; CLASS_COUNT]")]
pub struct PredictionVector([f32; CLASS_COUNT]);

impl TryFrom<[f32; CLASS_COUNT]> for PredictionVector {
    type Error = ScoreError;

    fn try_from(scores: [f32; CLASS_COUNT]) -> Result<Self, Self::Error> {
        Self::new(scores)
    }
}

impl PredictionVector {
    pub fn new(scores: [f32; CLASS_COUNT]) -> Result<Self, ScoreError> {
        if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
            return Err(ScoreError::NonFinite(index));
        }
        Ok(Self(scores))
    }

    pub fn from_slice(scores: &[f32]) -> Result<Self, ScoreError> {
        let scores: [f32; CLASS_COUNT] = scores
            .try_into()
            .map_err(|_| ScoreError::WrongLength(scores.len()))?;
        Self::new(scores)
    }

    pub fn scores(&self) -> &[f32; CLASS_COUNT] {
        &self.0
    }

    pub fn score(&self, class: FreshnessClass) -> f32 {
        self.0[class.index()]
    }

    /// Class with the highest raw score. Ties resolve to the lowest index.
    pub fn argmax(&self) -> FreshnessClass {
        let mut best = 0;
        for (index, &score) in self.0.iter().enumerate().skip(1) {
            if score > self.0[best] {
                best = index;
            }
        }
        FreshnessClass::from_index(best).unwrap_or(FreshnessClass::Fresh)
    }

    /// Highest raw score, read as the probability of [`Self::argmax`].
    pub fn confidence(&self) -> f32 {
        self.0[self.argmax().index()]
    }

    pub fn breakdown(&self) -> Vec<ClassScore> {
        FreshnessClass::iter()
            .map(|class| {
                let score = self.score(class);
                ClassScore {
                    class,
                    score,
                    percentage: f64::from(clip_score(score)) * 100.0,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub class: FreshnessClass,
    pub score: f32,
    /// Display percentage, always within `[0, 100]`.
    pub percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn class_order_matches_output_vector() {
        let order: Vec<_> = FreshnessClass::iter().collect();
        assert_eq!(
            order,
            vec![
                FreshnessClass::Fresh,
                FreshnessClass::ModeratelyFresh,
                FreshnessClass::Spoiled
            ]
        );
        for class in FreshnessClass::iter() {
            assert_eq!(FreshnessClass::from_index(class.index()), Some(class));
        }
        assert_eq!(FreshnessClass::from_index(3), None);
    }

    #[test]
    fn labels_round_trip_through_strum_and_serde() {
        assert_eq!(FreshnessClass::ModeratelyFresh.to_string(), "Moderately Fresh");
        assert_eq!(
            FreshnessClass::from_str("Moderately Fresh").unwrap(),
            FreshnessClass::ModeratelyFresh
        );
        let json = serde_json::to_string(&FreshnessClass::Spoiled).unwrap();
        assert_eq!(json, "\"Spoiled\"");
        assert_eq!(
            FreshnessClass::labels(),
            vec!["Fresh", "Moderately Fresh", "Spoiled"]
        );
    }

    #[test]
    fn argmax_and_confidence() {
        let v = PredictionVector::new([0.1, 0.7, 0.2]).unwrap();
        assert_eq!(v.argmax(), FreshnessClass::ModeratelyFresh);
        assert_eq!(v.confidence(), 0.7);
    }

    #[test]
    fn argmax_ties_pick_first_index() {
        let v = PredictionVector::new([0.4, 0.4, 0.2]).unwrap();
        assert_eq!(v.argmax(), FreshnessClass::Fresh);
        let v = PredictionVector::new([0.1, 0.45, 0.45]).unwrap();
        assert_eq!(v.argmax(), FreshnessClass::ModeratelyFresh);
    }

    #[test]
    fn clipping_never_changes_the_winner() {
        let cases = [
            [1.000_001, 0.0, -0.000_001],
            [-0.000_002, 0.999_9, 0.000_1],
            [0.2, 0.3, 1.000_003],
            [0.33, 0.33, 0.34],
        ];
        for scores in cases {
            let raw = PredictionVector::new(scores).unwrap();
            let clipped = PredictionVector::new(scores.map(clip_score)).unwrap();
            assert_eq!(raw.argmax(), clipped.argmax(), "scores {scores:?}");
        }
    }

    #[test]
    fn breakdown_percentages_stay_in_range() {
        let v = PredictionVector::new([1.000_01, -0.000_01, 0.5]).unwrap();
        let breakdown = v.breakdown();
        assert_eq!(breakdown.len(), CLASS_COUNT);
        assert_eq!(breakdown[0].percentage, 100.0);
        assert_eq!(breakdown[1].percentage, 0.0);
        assert_eq!(breakdown[2].percentage, 50.0);
        // raw score is preserved next to the clipped percentage
        assert_eq!(breakdown[0].score, 1.000_01);
    }

    #[test]
    fn rejects_wrong_length_and_non_finite() {
        assert_eq!(
            PredictionVector::from_slice(&[0.5, 0.5]),
            Err(ScoreError::WrongLength(2))
        );
        assert_eq!(
            PredictionVector::from_slice(&[0.5, f32::NAN, 0.1]),
            Err(ScoreError::NonFinite(1))
        );
        assert_eq!(
            PredictionVector::from_slice(&[0.5, 0.2, f32::INFINITY]),
            Err(ScoreError::NonFinite(2))
        );
    }

    #[test]
    fn deserialization_validates_scores() {
        let v: PredictionVector = serde_json::from_str("[0.2, 0.5, 0.3]").unwrap();
        assert_eq!(v.argmax(), FreshnessClass::ModeratelyFresh);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[0.2,0.5,0.3]");

        assert!(serde_json::from_str::<PredictionVector>("[0.2, 0.5]").is_err());
        assert!(serde_json::from_str::<PredictionVector>("[0.2, 0.5, 0.3, 0.1]").is_err());
    }

    #[test]
    fn breakdown_percentage_is_widened_before_scaling() {
        let v = PredictionVector::new([0.50895, 0.3, 0.19105]).unwrap();
        assert_eq!(format!("{:.2}", v.breakdown()[0].percentage), "50.89");
    }

    #[test]
    fn advisories_keep_markers_and_ranges() {
        assert!(FreshnessClass::Fresh.advisory().starts_with("✅ Fresh Fish Detected\n\n"));
        assert!(FreshnessClass::ModeratelyFresh.advisory().starts_with("⚠️ Moderately Fresh"));
        assert!(FreshnessClass::ModeratelyFresh.advisory().contains("2–3 days old"));
        assert!(FreshnessClass::Spoiled.advisory().starts_with("🚫 Spoiled Fish Detected"));
        assert!(FreshnessClass::Spoiled.advisory().contains("4–5+ days old"));
    }

    #[test]
    fn clip_score_handles_nan() {
        assert_eq!(clip_score(f32::NAN), 0.0);
        assert_eq!(clip_score(1.5), 1.0);
        assert_eq!(clip_score(-0.1), 0.0);
        assert_eq!(clip_score(0.25), 0.25);
    }
}
