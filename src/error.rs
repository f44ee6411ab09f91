use std::io;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::predictor::PredictError;

/// Errors returned to HTTP clients. Messages are fixed strings; the
/// underlying cause is logged where the error is produced.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFile,
    #[error("No file selected")]
    NoFileSelected,
    #[error("Invalid file type. Use PNG, JPG, JPEG, or WEBP")]
    InvalidFileType,
    #[error("Malformed upload")]
    MalformedUpload,
    #[error("File too large. Maximum upload size is {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error("Invalid image file")]
    InvalidImage,
    #[error("Model not loaded")]
    ModelNotLoaded,
    #[error("Inference failed")]
    Inference,
    #[error("Not found")]
    NotFound,
    #[error("Internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoFile
            | ApiError::NoFileSelected
            | ApiError::InvalidFileType
            | ApiError::MalformedUpload
            | ApiError::InvalidImage => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::ModelNotLoaded | ApiError::Inference | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

impl From<io::Error> for ApiError {
    fn from(err: io::Error) -> Self {
        error!(error = %err, "failed to persist upload");
        ApiError::Internal
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::Decode(e) => {
                warn!(error = %e, "uploaded file is not a decodable image");
                ApiError::InvalidImage
            }
            other => {
                error!(error = %other, "inference failed");
                ApiError::Inference
            }
        }
    }
}
