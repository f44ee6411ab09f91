pub mod tract;

#[cfg(test)]
pub mod fake;

use image::DynamicImage;
use thiserror::Error;

pub use self::tract::TractClassifier;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model error: {0}")]
    Model(String),
    #[error("failed to build input tensor: {0}")]
    Input(String),
}

impl InferenceError {
    pub(crate) fn model(err: impl std::fmt::Display) -> Self {
        InferenceError::Model(format!("{err:#}"))
    }
}

/// Channel order of the model's single image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLayout {
    /// `[1, height, width, 3]`, as exported from Keras.
    Nhwc,
    /// `[1, 3, height, width]`.
    Nchw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSpec {
    pub width: u32,
    pub height: u32,
    pub layout: InputLayout,
}

impl InputSpec {
    pub fn shape(&self) -> [usize; 4] {
        let (w, h) = (self.width as usize, self.height as usize);
        match self.layout {
            InputLayout::Nhwc => [1, h, w, 3],
            InputLayout::Nchw => [1, 3, h, w],
        }
    }
}

/// An opaque image classifier producing one probability per class.
pub trait Classifier: Send + Sync {
    /// Number of classes the model emits, when the output shape is known up front.
    fn class_count(&self) -> Option<usize>;

    fn probabilities(&self, image: &DynamicImage) -> Result<Vec<f32>, InferenceError>;
}
