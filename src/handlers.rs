use std::fs;
use std::io;

use actix_multipart::Multipart;
use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse, Result};
use tracing::{error, info};

use crate::error::ApiError;
use crate::models::{HealthResponse, Prediction, PredictionResponse};
use crate::predictor::AppState;
use crate::upload::{self, UploadDir};

const INDEX_HTML: &str = include_str!("../templates/index.html");
const ABOUT_HTML: &str = include_str!("../templates/about.html");

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/about").route(web::get().to(about)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/static/uploads/{filename}").route(web::get().to(uploaded_image)));
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_HTML)
}

pub async fn about() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(ABOUT_HTML)
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let classes = state
        .predictor
        .as_ref()
        .map_or(0, |predictor| predictor.labels().len());

    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        model_loaded: state.predictor.is_some(),
        classes,
    })
}

pub async fn predict(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let upload = upload::read_upload(payload, state.max_upload_bytes)
        .await?
        .ok_or(ApiError::NoFile)?;

    if upload.filename.is_empty() {
        return Err(ApiError::NoFileSelected);
    }
    if !upload::allowed_file(&upload.filename) {
        return Err(ApiError::InvalidFileType);
    }
    if state.predictor.is_none() {
        return Err(ApiError::ModelNotLoaded);
    }

    let name = UploadDir::unique_name(&upload.filename);
    let image_url = UploadDir::url_for(&name);

    let task_state = state.clone();
    let outcome = web::block(move || -> Result<Prediction, ApiError> {
        let path = task_state.uploads.save(&name, &upload.bytes)?;
        info!(path = %path.display(), bytes = upload.bytes.len(), "upload saved");

        let predictor = task_state
            .predictor
            .as_ref()
            .ok_or(ApiError::ModelNotLoaded)?;
        predictor.predict(&upload.bytes).map_err(ApiError::from)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "prediction task failed");
        ApiError::Internal
    })?;

    let prediction = outcome?;
    info!(
        class = %prediction.predicted_class,
        confidence = prediction.confidence,
        "prediction served"
    );

    Ok(HttpResponse::Ok().json(PredictionResponse {
        prediction,
        image_url,
    }))
}

pub async fn uploaded_image(
    state: web::Data<AppState>,
    filename: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let name = filename.into_inner();
    let path = state.uploads.resolve(&name).ok_or(ApiError::NotFound)?;

    let bytes = web::block(move || fs::read(path))
        .await
        .map_err(|e| {
            error!(error = %e, "file read task failed");
            ApiError::Internal
        })?
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ApiError::NotFound
            } else {
                error!(error = %e, file = %name, "failed to read upload");
                ApiError::Internal
            }
        })?;

    Ok(HttpResponse::Ok()
        .content_type(upload::content_type_for(&name))
        .body(bytes))
}
