use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("failed to read labels file: {0}")]
    Io(#[from] std::io::Error),
    #[error("labels file is not a JSON array of strings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("labels file contains no classes")]
    Empty,
}

/// Class names, index-aligned with the model's output vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabels(Vec<String>);

impl ClassLabels {
    pub fn new(labels: Vec<String>) -> Result<Self, LabelError> {
        if labels.is_empty() {
            return Err(LabelError::Empty);
        }
        Ok(Self(labels))
    }

    pub fn from_json(raw: &str) -> Result<Self, LabelError> {
        let labels: Vec<String> = serde_json::from_str(raw)?;
        Self::new(labels)
    }

    pub fn from_path(path: &Path) -> Result<Self, LabelError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Condition {
    Fresh,
    Rotten,
}

impl Condition {
    /// Anything whose label mentions "fresh" (any case) is fresh; the rest is rotten.
    pub fn from_label(label: &str) -> Self {
        if label.to_lowercase().contains("fresh") {
            Condition::Fresh
        } else {
            Condition::Rotten
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScore {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub predicted_class: String,
    pub condition: Condition,
    pub confidence: f64,
    pub top3: Vec<LabelScore>,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    #[serde(flatten)]
    pub prediction: Prediction,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub classes: usize,
}
