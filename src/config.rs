use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::classifier::{InputLayout, InputSpec};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Runtime configuration. Every flag can also be set through the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "freshness", version, about = "Fresh vs rotten produce classifier")]
pub struct Config {
    #[arg(long, env = "FRESHNESS_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "FRESHNESS_PORT", default_value_t = 5000)]
    pub port: u16,

    /// ONNX model exported from the trained classifier.
    #[arg(long, env = "FRESHNESS_MODEL_PATH", default_value = "healthy_vs_rotten.onnx")]
    pub model_path: PathBuf,

    /// JSON array of class names, index-aligned with the model output.
    #[arg(long, env = "FRESHNESS_LABELS_PATH", default_value = "class_labels.json")]
    pub labels_path: PathBuf,

    /// Public directory; uploads are written to `<static-dir>/uploads`.
    #[arg(long, env = "FRESHNESS_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    #[arg(long, env = "FRESHNESS_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Square input edge expected by the model.
    #[arg(long, env = "FRESHNESS_INPUT_SIZE", default_value_t = 224)]
    pub input_size: u32,

    #[arg(long, env = "FRESHNESS_INPUT_LAYOUT", value_enum, default_value_t = Layout::Nhwc)]
    pub input_layout: Layout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    Nhwc,
    Nchw,
}

impl Config {
    pub fn input_spec(&self) -> InputSpec {
        let layout = match self.input_layout {
            Layout::Nhwc => InputLayout::Nhwc,
            Layout::Nchw => InputLayout::Nchw,
        };
        InputSpec {
            width: self.input_size,
            height: self.input_size,
            layout,
        }
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
