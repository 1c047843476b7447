//! HTTP client wrapper for interacting with Apache Tika.

use crate::tika::types::{ExtractionError, FullExtraction, Metadata, Operation, TikaError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio_util::io::ReaderStream;

const OCTET_STREAM: &str = "application/octet-stream";

/// Fixed request contract for one Tika capability.
struct Endpoint {
    path: &'static str,
    accept: Option<&'static str>,
    headers: &'static [(&'static str, &'static str)],
}

const TEXT: Endpoint = Endpoint {
    path: "tika",
    accept: Some("text/plain"),
    headers: &[],
};

const TEXT_OCR: Endpoint = Endpoint {
    path: "tika",
    accept: Some("text/plain"),
    headers: &[
        ("X-Tika-OCRLanguage", "eng"),
        ("X-Tika-PDFOcrStrategy", "ocr_and_text"),
    ],
};

const META: Endpoint = Endpoint {
    path: "meta",
    accept: Some("application/json"),
    headers: &[],
};

const RMETA_TEXT: Endpoint = Endpoint {
    path: "rmeta/text",
    accept: Some("application/json"),
    headers: &[],
};

const DETECT: Endpoint = Endpoint {
    path: "detect/stream",
    accept: None,
    headers: &[],
};

/// Abstraction over the extraction backend used by the HTTP surface.
#[async_trait]
pub trait ExtractionApi: Send + Sync {
    /// Extract plain text from the file at `path`.
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractionError>;

    /// Extract text from the file at `path`, running OCR on images and scanned pages.
    async fn extract_text_with_ocr(&self, path: &Path) -> Result<String, ExtractionError>;

    /// Extract the metadata mapping for the file at `path`.
    async fn extract_metadata(&self, path: &Path) -> Result<Metadata, ExtractionError>;

    /// Extract text and metadata for the file at `path` in one call.
    async fn extract_all(&self, path: &Path) -> Result<FullExtraction, ExtractionError>;

    /// Detect the MIME type of the file at `path`.
    async fn detect_mime_type(&self, path: &Path) -> Result<String, ExtractionError>;

    /// Report whether Tika is reachable. Never fails.
    async fn health_check(&self) -> bool;
}

/// Lightweight HTTP client for Tika operations.
///
/// Holds nothing but the base URL and a connection pool, so a single instance can be shared
/// across all requests through an `Arc`.
pub struct TikaService {
    client: Client,
    base_url: String,
}

impl TikaService {
    /// Construct a client for the Tika server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, TikaError> {
        let client = Client::builder().user_agent("tika-relay/0.1").build()?;
        let base_url = normalize_base_url(base_url).map_err(TikaError::InvalidUrl)?;
        tracing::debug!(url = %base_url, "Initialized Tika HTTP client");
        Ok(Self { client, base_url })
    }

    /// Normalized base URL of the Tika server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Extract plain text from the file at `path`.
    pub async fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        self.text_from_file(&TEXT, path)
            .await
            .map_err(|error| failed(Operation::ExtractText, error))
    }

    /// Extract plain text from an in-memory buffer.
    ///
    /// `content_type` is forwarded to Tika as the body type, defaulting to
    /// `application/octet-stream`.
    pub async fn extract_text_from_bytes(
        &self,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, ExtractionError> {
        let length = bytes.len() as u64;
        let content_type = content_type.unwrap_or(OCTET_STREAM);
        self.text_from_body(&TEXT, Body::from(bytes), length, content_type)
            .await
            .map_err(|error| failed(Operation::ExtractText, error))
    }

    /// Extract text with OCR enabled for images and scanned PDFs.
    pub async fn extract_text_with_ocr(&self, path: &Path) -> Result<String, ExtractionError> {
        self.text_from_file(&TEXT_OCR, path)
            .await
            .map_err(|error| failed(Operation::ExtractTextWithOcr, error))
    }

    /// Extract metadata from the file at `path`.
    pub async fn extract_metadata(&self, path: &Path) -> Result<Metadata, ExtractionError> {
        self.json_from_file::<Metadata>(&META, path)
            .await
            .map_err(|error| failed(Operation::ExtractMetadata, error))
    }

    /// Extract text and metadata from the file at `path` using the recursive metadata endpoint.
    pub async fn extract_all(&self, path: &Path) -> Result<FullExtraction, ExtractionError> {
        self.json_from_file::<Vec<Metadata>>(&RMETA_TEXT, path)
            .await
            .and_then(FullExtraction::from_documents)
            .map_err(|error| failed(Operation::ExtractAll, error))
    }

    /// Detect the MIME type of the file at `path`.
    pub async fn detect_mime_type(&self, path: &Path) -> Result<String, ExtractionError> {
        self.text_from_file(&DETECT, path)
            .await
            .map_err(|error| failed(Operation::DetectMimeType, error))
    }

    /// Probe `GET /tika`; any failure is reported as `false`.
    pub async fn health_check(&self) -> bool {
        let url = format_endpoint(&self.base_url, TEXT.path);
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Tika health probe returned non-success status");
                false
            }
            Err(error) => {
                tracing::warn!(error = %error, "Tika health probe failed");
                false
            }
        }
    }

    async fn text_from_file(&self, endpoint: &Endpoint, path: &Path) -> Result<String, TikaError> {
        let response = self.send_file(endpoint, path).await?;
        Ok(response.text().await?)
    }

    async fn text_from_body(
        &self,
        endpoint: &Endpoint,
        body: Body,
        length: u64,
        content_type: &str,
    ) -> Result<String, TikaError> {
        let response = self.send(endpoint, body, length, content_type).await?;
        Ok(response.text().await?)
    }

    async fn json_from_file<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        path: &Path,
    ) -> Result<T, TikaError> {
        let response = self.send_file(endpoint, path).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| TikaError::MalformedBody(err.to_string()))
    }

    async fn send_file(&self, endpoint: &Endpoint, path: &Path) -> Result<Response, TikaError> {
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        let body = Body::wrap_stream(ReaderStream::new(file));
        self.send(endpoint, body, length, OCTET_STREAM).await
    }

    async fn send(
        &self,
        endpoint: &Endpoint,
        body: Body,
        length: u64,
        content_type: &str,
    ) -> Result<Response, TikaError> {
        let url = format_endpoint(&self.base_url, endpoint.path);
        let mut request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, length);
        if let Some(accept) = endpoint.accept {
            request = request.header(ACCEPT, accept);
        }
        for (name, value) in endpoint.headers {
            request = request.header(*name, *value);
        }

        let response = request.body(body).send().await?;
        ensure_success(response).await
    }
}

#[async_trait]
impl ExtractionApi for TikaService {
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        TikaService::extract_text(self, path).await
    }

    async fn extract_text_with_ocr(&self, path: &Path) -> Result<String, ExtractionError> {
        TikaService::extract_text_with_ocr(self, path).await
    }

    async fn extract_metadata(&self, path: &Path) -> Result<Metadata, ExtractionError> {
        TikaService::extract_metadata(self, path).await
    }

    async fn extract_all(&self, path: &Path) -> Result<FullExtraction, ExtractionError> {
        TikaService::extract_all(self, path).await
    }

    async fn detect_mime_type(&self, path: &Path) -> Result<String, ExtractionError> {
        TikaService::detect_mime_type(self, path).await
    }

    async fn health_check(&self) -> bool {
        TikaService::health_check(self).await
    }
}

fn failed(operation: Operation, source: TikaError) -> ExtractionError {
    let error = ExtractionError::new(operation, source);
    tracing::debug!(error = %error, "Tika request failed");
    error
}

async fn ensure_success(response: Response) -> Result<Response, TikaError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(TikaError::UnexpectedStatus { status, body })
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
