use thiserror::Error;
use tracing::{error, info};

use crate::classifier::{Classifier, InferenceError, TractClassifier};
use crate::config::Config;
use crate::models::{ClassLabels, LabelError, Prediction};
use crate::postprocess::{self, PostProcessError};
use crate::upload::UploadDir;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("class labels: {0}")]
    Labels(#[from] LabelError),
    #[error("model: {0}")]
    Model(#[from] InferenceError),
    #[error("model emits {model} classes but {labels} labels are loaded")]
    LabelMismatch { model: usize, labels: usize },
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    PostProcess(#[from] PostProcessError),
}

/// A loaded classifier together with its label set.
pub struct Predictor {
    classifier: Box<dyn Classifier>,
    labels: ClassLabels,
}

impl Predictor {
    pub fn new(classifier: Box<dyn Classifier>, labels: ClassLabels) -> Result<Self, LoadError> {
        if let Some(model) = classifier.class_count() {
            if model != labels.len() {
                return Err(LoadError::LabelMismatch {
                    model,
                    labels: labels.len(),
                });
            }
        }
        Ok(Self { classifier, labels })
    }

    pub fn load(config: &Config) -> Result<Self, LoadError> {
        let labels = ClassLabels::from_path(&config.labels_path)?;
        info!(classes = labels.len(), path = %config.labels_path.display(), "class labels loaded");

        let classifier = TractClassifier::load(&config.model_path, config.input_spec())?;
        Self::new(Box::new(classifier), labels)
    }

    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    pub fn predict(&self, bytes: &[u8]) -> Result<Prediction, PredictError> {
        let image = image::load_from_memory(bytes)?;
        let scores = self.classifier.probabilities(&image)?;
        Ok(postprocess::summarize(&scores, &self.labels)?)
    }
}

/// Shared, read-only request context.
pub struct AppState {
    pub predictor: Option<Predictor>,
    pub uploads: UploadDir,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Builds the context from configuration. A predictor that fails to load
    /// is logged and left out, so `/predict` reports the model as unavailable.
    pub fn from_config(config: &Config) -> Self {
        let predictor = match Predictor::load(config) {
            Ok(predictor) => {
                info!("model ready");
                Some(predictor)
            }
            Err(err) => {
                error!(error = %err, "failed to load model, predictions are disabled");
                None
            }
        };

        let uploads = UploadDir::new(&config.static_dir);
        info!(dir = %uploads.root().display(), "upload directory configured");

        Self {
            predictor,
            uploads,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}
