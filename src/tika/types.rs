//! Shared types used by the Tika client and its callers.

use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Metadata key carrying the detected content type.
pub const CONTENT_TYPE_FIELD: &str = "Content-Type";
/// Metadata key carrying the extracted text in recursive metadata responses.
pub const CONTENT_FIELD: &str = "X-TIKA:content";

/// Open-ended metadata returned by Tika: string keys to arbitrary JSON values.
pub type Metadata = Map<String, Value>;

/// Errors returned while talking to Tika.
#[derive(Debug, Error)]
pub enum TikaError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Tika URL: {0}")]
    InvalidUrl(String),
    /// The uploaded file could not be read from disk.
    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),
    /// HTTP layer failed before a usable response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Tika responded with a non-success status code.
    #[error("Unexpected Tika response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Tika.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Response body did not have the expected shape.
    #[error("Malformed Tika response: {0}")]
    MalformedBody(String),
    /// Recursive metadata endpoint returned an empty array.
    #[error("Tika returned no documents for the upload")]
    EmptyDocument,
}

/// Capability being exercised when a Tika call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Plain text extraction.
    ExtractText,
    /// OCR-assisted text extraction.
    ExtractTextWithOcr,
    /// Metadata extraction.
    ExtractMetadata,
    /// Combined text and metadata extraction.
    ExtractAll,
    /// MIME type detection.
    DetectMimeType,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ExtractText => "Tika extraction",
            Self::ExtractTextWithOcr => "Tika OCR extraction",
            Self::ExtractMetadata => "Tika metadata extraction",
            Self::ExtractAll => "Tika full extraction",
            Self::DetectMimeType => "MIME detection",
        };
        f.write_str(name)
    }
}

/// A failed extraction, tagged with the operation that was attempted.
#[derive(Debug, Error)]
#[error("{operation} failed: {source}")]
pub struct ExtractionError {
    /// Operation that failed.
    pub operation: Operation,
    /// Underlying transport, protocol, or response-shape failure.
    #[source]
    pub source: TikaError,
}

impl ExtractionError {
    /// Wrap `source` as a failure of `operation`.
    pub fn new(operation: Operation, source: TikaError) -> Self {
        Self { operation, source }
    }
}

/// Text and metadata obtained from a single combined extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct FullExtraction {
    /// Extracted text, empty when Tika reported no content field.
    pub text: String,
    /// Every field of the first document Tika returned, content field included.
    pub metadata: Metadata,
}

impl FullExtraction {
    /// Split the first element of a recursive metadata response into text and metadata.
    pub fn from_documents(documents: Vec<Metadata>) -> Result<Self, TikaError> {
        let metadata = documents
            .into_iter()
            .next()
            .ok_or(TikaError::EmptyDocument)?;
        let text = metadata
            .get(CONTENT_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Self { text, metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> Metadata {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn full_extraction_takes_first_document() {
        let docs = vec![
            document(json!({ "Content-Type": "text/plain", "X-TIKA:content": "hello" })),
            document(json!({ "Content-Type": "image/png", "X-TIKA:content": "embedded" })),
        ];
        let full = FullExtraction::from_documents(docs).expect("extraction");
        assert_eq!(full.text, "hello");
        assert_eq!(full.metadata[CONTENT_TYPE_FIELD], "text/plain");
    }

    #[test]
    fn missing_content_defaults_to_empty_text() {
        let docs = vec![document(json!({ "Content-Type": "application/pdf" }))];
        let full = FullExtraction::from_documents(docs).expect("extraction");
        assert_eq!(full.text, "");
    }

    #[test]
    fn empty_array_is_an_error() {
        let error = FullExtraction::from_documents(Vec::new()).unwrap_err();
        assert!(matches!(error, TikaError::EmptyDocument));
    }

    #[test]
    fn extraction_error_names_the_operation() {
        let error = ExtractionError::new(
            Operation::DetectMimeType,
            TikaError::MalformedBody("nope".into()),
        );
        assert_eq!(
            error.to_string(),
            "MIME detection failed: Malformed Tika response: nope"
        );
    }
}
