//! Core library for classifying Indian business-registration documents and
//! extracting their registration numbers.
//!
//! This crate provides:
//! - Document ingestion (images and the first page of scanned PDFs)
//! - OCR token normalization onto a 0..=1000 layout grid
//! - Keyword heuristics with a model fallback for the 12 document types
//! - Per-type registration number extraction (GSTIN, CIN, Udyam, FSSAI, ...)
//! - The `Type / Confidence / Status / Data` result used by callers

pub mod classify;
pub mod error;
pub mod extract;
pub mod input;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;

pub use classify::{
    DocumentClassifier, HeuristicClassifier, HeuristicRule, ModelPrediction,
    OnnxDocumentClassifier, UnavailableClassifier,
};
pub use error::{BizdocError, ClassificationError, InputError, OcrError, Result};
pub use extract::{ExtractionRule, Normalizer, RegistrationExtractor};
pub use input::{load_document, load_document_bytes};
pub use models::{
    AnalysisResult, BizdocConfig, ClassificationResult, DocumentType, ExtractionRecord,
    Provenance, Status, NOT_FOUND,
};
pub use ocr::{normalize_tokens, BoundingBox, OcrProvider, PrecomputedOcr, RawOcr, Token};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pipeline::{aggregate, confidence_display, Analyzer, PipelineStage};

/// Re-export inference types.
pub use bizdoc_inference::{InferenceBackend, InputTensor, OutputTensor};

#[cfg(feature = "native")]
pub use bizdoc_inference::OrtBackend;
