use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::agents::InterpretError;
use crate::batch;
use crate::render::{background, RenderError};
use crate::state::AppState;
use crate::storage;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("Request failed: {}", self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<InterpretError> for ApiError {
    fn from(e: InterpretError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<batch::BatchError> for ApiError {
    fn from(e: batch::BatchError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut prompt = String::new();
    let mut language = "English".to_string();
    let mut logo: Option<(String, Vec<u8>)> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "prompt" => {
                if let Ok(text) = field.text().await {
                    prompt = text;
                }
            }
            "language" => {
                if let Ok(text) = field.text().await {
                    if !text.trim().is_empty() {
                        language = text.trim().to_string();
                    }
                }
            }
            "logo" => {
                let filename = field.file_name().unwrap_or("logo.png").to_string();
                if let Ok(data) = field.bytes().await {
                    logo = Some((filename, data.to_vec()));
                }
            }
            _ => {}
        }
    }

    if prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Prompt is required".to_string()));
    }

    let logo_path = match logo {
        Some((filename, data)) if !data.is_empty() => {
            let path = state
                .config
                .upload_folder
                .join(storage::sanitize_filename(&filename));
            std::fs::write(&path, &data)
                .map_err(|e| ApiError::Internal(format!("failed to store logo: {}", e)))?;
            Some(path.to_string_lossy().to_string())
        }
        _ => None,
    };

    let mut spec = state.interpreter.interpret(&prompt, &language).await?;
    spec.logo_path = logo_path;
    let cert_id = storage::new_cert_id();
    spec.id = cert_id.clone();

    let image_url = background::describe(&spec);
    let artifacts = state.renderer.render(&spec, &image_url, &cert_id).await?;

    Ok(Json(json!({
        "status": "success",
        "poster_url": format!("/generated/{}", file_name(&artifacts.poster_path)),
        "cert_url": format!("/generated/{}", file_name(&artifacts.cert_path)),
        "qr_url": format!("/generated/{}", file_name(&artifacts.qr_path)),
        "design_spec": spec,
        "warnings": artifacts.warnings.iter().map(ToString::to_string).collect::<Vec<String>>(),
    })))
}

pub async fn bulk_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut prompt = "Certificate of Participation".to_string();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                if let Ok(data) = field.bytes().await {
                    file_data = Some(data.to_vec());
                }
            }
            "prompt" => {
                if let Ok(text) = field.text().await {
                    if !text.trim().is_empty() {
                        prompt = text.trim().to_string();
                    }
                }
            }
            _ => {}
        }
    }

    let file_data = match file_data {
        Some(d) if !d.is_empty() => d,
        _ => return Err(ApiError::BadRequest("No file uploaded".to_string())),
    };

    let rows = batch::parse_rows(&file_data)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if rows.is_empty() {
        return Err(ApiError::BadRequest("No rows in file".to_string()));
    }

    let outcome = batch::run_batch(
        &state.interpreter,
        &state.renderer,
        rows,
        &prompt,
        batch::BULK_IMAGE_REF,
        &state.config.generated_folder,
    )
    .await?;

    Ok(Json(json!({
        "status": "bulk_completed",
        "zip_url": format!("/generated/{}", outcome.zip_filename),
        "rows": outcome.rows,
    })))
}

pub async fn get_generated(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    if filename.contains("..") || filename.contains('/') || filename.is_empty() {
        return Redirect::to("/").into_response();
    }

    let path = state.config.generated_folder.join(&filename);
    if path.exists() {
        if let Ok(content) = std::fs::read(&path) {
            let mime = mime_guess::from_path(&filename)
                .first_raw()
                .unwrap_or("application/octet-stream");
            return axum::response::Response::builder()
                .header("Content-Type", mime)
                .body(axum::body::Body::from(content))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
                .into_response();
        }
    }

    Redirect::to("/").into_response()
}
