//! HTTP surface for Tika Relay.
//!
//! Every extraction endpoint accepts a multipart body with a single `file` field:
//!
//! - `POST /extract-text` – Plain text. Returns `{ success, filename, text, length }`.
//! - `POST /extract-text-ocr` – Text with OCR for images and scanned PDFs. Same shape as above.
//! - `POST /extract-metadata` – Returns `{ success, filename, metadata }`.
//! - `POST /extract-all` – Text and metadata in one pass, plus `stats.textLength` and
//!   `stats.wordCount`.
//! - `POST /detect-type` – Returns `{ success, filename, mimeType }`.
//! - `GET /health` – `{ status: "healthy" | "unhealthy", tika }`, always `200`.
//! - `GET /metrics` – Upload and extraction counters.
//! - `GET /commands` – Machine-readable endpoint catalog.
//!
//! The upload is staged in the scratch directory and deleted before the response is written.
//! Failures become `{ error, message }` bodies: `400` for a missing or unreadable upload and `500`
//! when Tika fails.

use crate::metrics::{MetricsSnapshot, RelayMetrics};
use crate::stats::{TextStats, char_length};
use crate::tika::{ExtractionApi, ExtractionError, Metadata};
use crate::upload::{TempUpload, UploadError};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared state handed to every handler.
pub struct AppState<S> {
    /// Extraction backend.
    pub service: Arc<S>,
    /// Scratch directory for staged uploads.
    pub upload_dir: PathBuf,
    /// Request counters.
    pub metrics: Arc<RelayMetrics>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            upload_dir: self.upload_dir.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<S> AppState<S> {
    /// Build state around `service`, staging uploads in `upload_dir`.
    pub fn new(service: Arc<S>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            upload_dir: upload_dir.into(),
            metrics: Arc::new(RelayMetrics::new()),
        }
    }
}

/// Build the HTTP router exposing the extraction API surface.
///
/// `max_upload_bytes` caps request bodies; `None` removes axum's default limit entirely.
pub fn create_router<S>(state: AppState<S>, max_upload_bytes: Option<usize>) -> Router
where
    S: ExtractionApi + 'static,
{
    let body_limit = match max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/extract-text", post(extract_text::<S>))
        .route("/extract-text-ocr", post(extract_text_ocr::<S>))
        .route("/extract-metadata", post(extract_metadata::<S>))
        .route("/extract-all", post(extract_all::<S>))
        .route("/detect-type", post(detect_type::<S>))
        .route("/health", get(health::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(body_limit)
        .with_state(state)
}

type UploadBody = Result<Multipart, MultipartRejection>;

/// Success body for the text endpoints.
#[derive(Serialize)]
struct TextResponse {
    success: bool,
    filename: String,
    text: String,
    length: usize,
}

/// Success body for `POST /extract-metadata`.
#[derive(Serialize)]
struct MetadataResponse {
    success: bool,
    filename: String,
    metadata: Metadata,
}

/// Success body for `POST /extract-all`.
#[derive(Serialize)]
struct ExtractAllResponse {
    success: bool,
    filename: String,
    text: String,
    metadata: Metadata,
    stats: TextStats,
}

/// Success body for `POST /detect-type`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectTypeResponse {
    success: bool,
    filename: String,
    mime_type: String,
}

/// Body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    tika: bool,
}

async fn extract_text<S>(
    State(state): State<AppState<S>>,
    multipart: UploadBody,
) -> Result<Json<TextResponse>, ApiError>
where
    S: ExtractionApi,
{
    let (filename, text) = with_upload(
        &state,
        multipart,
        "/extract-text",
        "Text extraction failed",
        |service, path| async move { service.extract_text(&path).await },
    )
    .await?;
    Ok(Json(text_response(filename, text)))
}

async fn extract_text_ocr<S>(
    State(state): State<AppState<S>>,
    multipart: UploadBody,
) -> Result<Json<TextResponse>, ApiError>
where
    S: ExtractionApi,
{
    let (filename, text) = with_upload(
        &state,
        multipart,
        "/extract-text-ocr",
        "OCR extraction failed",
        |service, path| async move { service.extract_text_with_ocr(&path).await },
    )
    .await?;
    Ok(Json(text_response(filename, text)))
}

fn text_response(filename: String, text: String) -> TextResponse {
    TextResponse {
        success: true,
        filename,
        length: char_length(&text),
        text,
    }
}

async fn extract_metadata<S>(
    State(state): State<AppState<S>>,
    multipart: UploadBody,
) -> Result<Json<MetadataResponse>, ApiError>
where
    S: ExtractionApi,
{
    let (filename, metadata) = with_upload(
        &state,
        multipart,
        "/extract-metadata",
        "Metadata extraction failed",
        |service, path| async move { service.extract_metadata(&path).await },
    )
    .await?;
    Ok(Json(MetadataResponse {
        success: true,
        filename,
        metadata,
    }))
}

async fn extract_all<S>(
    State(state): State<AppState<S>>,
    multipart: UploadBody,
) -> Result<Json<ExtractAllResponse>, ApiError>
where
    S: ExtractionApi,
{
    let (filename, full) = with_upload(
        &state,
        multipart,
        "/extract-all",
        "Extraction failed",
        |service, path| async move { service.extract_all(&path).await },
    )
    .await?;
    Ok(Json(ExtractAllResponse {
        success: true,
        filename,
        stats: TextStats::of(&full.text),
        text: full.text,
        metadata: full.metadata,
    }))
}

async fn detect_type<S>(
    State(state): State<AppState<S>>,
    multipart: UploadBody,
) -> Result<Json<DetectTypeResponse>, ApiError>
where
    S: ExtractionApi,
{
    let (filename, mime_type) = with_upload(
        &state,
        multipart,
        "/detect-type",
        "Type detection failed",
        |service, path| async move { service.detect_mime_type(&path).await },
    )
    .await?;
    Ok(Json(DetectTypeResponse {
        success: true,
        filename,
        mime_type,
    }))
}

/// Report Tika reachability. Always answers `200`.
async fn health<S>(State(state): State<AppState<S>>) -> Json<HealthResponse>
where
    S: ExtractionApi,
{
    let tika = state.service.health_check().await;
    Json(HealthResponse {
        status: if tika { "healthy" } else { "unhealthy" },
        tika,
    })
}

async fn get_metrics<S>(State(state): State<AppState<S>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Stage the upload, run `op` against it, and translate failures for the response.
///
/// The staged file is gone by the time this returns, on every path.
async fn with_upload<S, T, F, Fut>(
    state: &AppState<S>,
    multipart: UploadBody,
    endpoint: &'static str,
    label: &'static str,
    op: F,
) -> Result<(String, T), ApiError>
where
    S: ExtractionApi,
    F: FnOnce(Arc<S>, PathBuf) -> Fut,
    Fut: Future<Output = Result<T, ExtractionError>>,
{
    let multipart =
        multipart.map_err(|rejection| ApiError::InvalidUpload(rejection.body_text()))?;
    let upload = TempUpload::receive(multipart, &state.upload_dir).await?;
    let bytes = upload.size();
    state.metrics.record_upload(bytes);

    let service = Arc::clone(&state.service);
    let (filename, outcome) = upload.run(|path| op(service, path)).await;
    state.metrics.record_extraction(outcome.is_ok());

    match outcome {
        Ok(value) => {
            tracing::info!(endpoint, filename = %filename, bytes, "Extraction completed");
            Ok((filename, value))
        }
        Err(source) => {
            tracing::error!(endpoint, filename = %filename, error = %source, "Extraction failed");
            Err(ApiError::Extraction { label, source })
        }
    }
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "extract_text",
                method: "POST",
                path: "/extract-text",
                description: "Extract plain text from the multipart `file` field. Returns { success, filename, text, length }.",
            },
            CommandDescriptor {
                name: "extract_text_ocr",
                method: "POST",
                path: "/extract-text-ocr",
                description: "Extract text with OCR for images and scanned PDFs from the multipart `file` field. Returns { success, filename, text, length }.",
            },
            CommandDescriptor {
                name: "extract_metadata",
                method: "POST",
                path: "/extract-metadata",
                description: "Extract document metadata from the multipart `file` field. Returns { success, filename, metadata }.",
            },
            CommandDescriptor {
                name: "extract_all",
                method: "POST",
                path: "/extract-all",
                description: "Extract text and metadata from the multipart `file` field. Returns { success, filename, text, metadata, stats: { textLength, wordCount } }.",
            },
            CommandDescriptor {
                name: "detect_type",
                method: "POST",
                path: "/detect-type",
                description: "Detect the MIME type of the multipart `file` field. Returns { success, filename, mimeType }.",
            },
            CommandDescriptor {
                name: "health",
                method: "GET",
                path: "/health",
                description: "Probe Tika reachability. Returns { status, tika }.",
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return upload and extraction counters.",
            },
        ],
    })
}

/// Errors surfaced to HTTP clients as `{ error, message }` JSON.
#[derive(Debug)]
enum ApiError {
    NoFile,
    InvalidUpload(String),
    Storage(String),
    Extraction {
        label: &'static str,
        source: ExtractionError,
    },
}

impl From<UploadError> for ApiError {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::MissingFile => Self::NoFile,
            UploadError::Multipart(inner) => Self::InvalidUpload(inner.to_string()),
            UploadError::Storage(inner) => {
                tracing::error!(error = %inner, "Failed to stage upload");
                Self::Storage(inner.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NoFile => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "No file uploaded" }),
            ),
            Self::InvalidUpload(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid upload", "message": message }),
            ),
            Self::Storage(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Upload failed", "message": message }),
            ),
            Self::Extraction { label, source } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": label, "message": source.to_string() }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
