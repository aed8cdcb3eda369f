//! Data models shared across the pipeline.

pub mod config;
pub mod document;

pub use config::{BizdocConfig, ClassifierConfig, InputConfig, OcrConfig};
pub use document::{
    AnalysisResult, ClassificationResult, DocumentType, ExtractionRecord, Provenance, Status,
    NOT_FOUND,
};
