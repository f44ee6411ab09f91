use image::DynamicImage;

use super::{Classifier, InferenceError};

/// Returns a canned probability vector regardless of the image.
pub struct FakeClassifier {
    scores: Result<Vec<f32>, String>,
    reports_count: bool,
}

impl FakeClassifier {
    pub fn returning(scores: Vec<f32>) -> Self {
        Self {
            scores: Ok(scores),
            reports_count: true,
        }
    }

    /// Like [`FakeClassifier::returning`], but with an output size that is
    /// only known after inference, so no startup check can catch a mismatch.
    pub fn returning_unsized(scores: Vec<f32>) -> Self {
        Self {
            scores: Ok(scores),
            reports_count: false,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            scores: Err(message.to_string()),
            reports_count: false,
        }
    }
}

impl Classifier for FakeClassifier {
    fn class_count(&self) -> Option<usize> {
        if !self.reports_count {
            return None;
        }
        self.scores.as_ref().ok().map(Vec::len)
    }

    fn probabilities(&self, _image: &DynamicImage) -> Result<Vec<f32>, InferenceError> {
        self.scores.clone().map_err(InferenceError::Model)
    }
}
