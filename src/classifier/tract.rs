use std::path::Path;

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;
use tract_onnx::prelude::*;
use tracing::{debug, info};

use super::{Classifier, InferenceError, InputLayout, InputSpec};

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// ONNX classifier executed with tract.
pub struct TractClassifier {
    model: Plan,
    input: InputSpec,
    class_count: Option<usize>,
}

impl TractClassifier {
    pub fn load(path: &Path, input: InputSpec) -> Result<Self, InferenceError> {
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(InferenceError::model)?
            .with_input_fact(0, f32::fact(input.shape()).into())
            .map_err(InferenceError::model)?
            .into_optimized()
            .map_err(InferenceError::model)?;

        let class_count = model
            .output_fact(0)
            .map_err(InferenceError::model)?
            .shape
            .as_concrete()
            .map(|dims| dims.iter().product::<usize>());

        let model = model.into_runnable().map_err(InferenceError::model)?;

        info!(
            model = %path.display(),
            input = ?input.shape(),
            classes = ?class_count,
            "loaded ONNX classifier"
        );
        Ok(Self {
            model,
            input,
            class_count,
        })
    }
}

impl Classifier for TractClassifier {
    fn class_count(&self) -> Option<usize> {
        self.class_count
    }

    fn probabilities(&self, image: &DynamicImage) -> Result<Vec<f32>, InferenceError> {
        let tensor = image_to_tensor(image, self.input)?;

        let result = self
            .model
            .run(tvec!(tensor.into()))
            .map_err(InferenceError::model)?;

        let output = result[0]
            .to_array_view::<f32>()
            .map_err(InferenceError::model)?;
        let scores: Vec<f32> = output.iter().copied().collect();

        debug!(classes = scores.len(), "inference finished");
        Ok(scores)
    }
}

/// Resizes to the model input (stretching, nearest neighbour), scales every
/// channel to `[0, 1]` and packs the pixels in the requested layout.
pub fn image_to_tensor(image: &DynamicImage, spec: InputSpec) -> Result<Tensor, InferenceError> {
    let rgb = image
        .resize_exact(spec.width, spec.height, FilterType::Nearest)
        .to_rgb8();

    let shape = spec.shape();
    let mut input = Array4::<f32>::zeros(shape);
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            match spec.layout {
                InputLayout::Nhwc => input[[0, y, x, c]] = value,
                InputLayout::Nchw => input[[0, c, y, x]] = value,
            }
        }
    }

    let tensor = tract_ndarray::Array::from_shape_vec(shape, input.into_raw_vec())
        .map_err(|e| InferenceError::Input(e.to_string()))?
        .into_tensor();
    Ok(tensor)
}
