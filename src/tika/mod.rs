//! Apache Tika integration.

pub mod client;
pub mod types;

pub use client::{ExtractionApi, TikaService};
pub use types::{
    CONTENT_FIELD, CONTENT_TYPE_FIELD, ExtractionError, FullExtraction, Metadata, Operation,
    TikaError,
};
