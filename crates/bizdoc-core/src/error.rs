//! Error types for the bizdoc-core library.

use thiserror::Error;

/// Main error type for the bizdoc library.
#[derive(Error, Debug)]
pub enum BizdocError {
    /// The source document could not be ingested.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// The fallback classifier could not produce a label.
    #[error("classification error: {0}")]
    Classification(#[from] ClassificationError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while loading the source image or PDF.
#[derive(Error, Debug)]
pub enum InputError {
    /// The file does not exist.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The file exists but could not be decoded.
    #[error("failed to load image: {0}")]
    Unreadable(String),

    /// The file extension is not a supported image or PDF type.
    #[error("unsupported file format: {0}")]
    Unsupported(String),

    /// The decoded image has no pixels.
    #[error("image is empty")]
    Empty,

    /// The PDF has no pages or no page image to analyze.
    #[error("empty PDF: {0}")]
    EmptyPdf(String),

    /// The PDF is encrypted with a non-empty password.
    #[error("PDF is encrypted")]
    Encrypted,
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text detection or recognition failed.
    #[error("recognition failed: {0}")]
    Recognition(String),

    /// OCR output is structurally invalid.
    #[error("invalid OCR output: {0}")]
    InvalidOutput(String),
}

/// Errors surfaced by the fallback model adapter.
#[derive(Error, Debug)]
pub enum ClassificationError {
    /// No classification capability is loaded.
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    /// Input packaging failed before inference.
    #[error("failed to encode classifier input: {0}")]
    Encoding(String),

    /// The model ran but the call failed.
    #[error("inference error: {0}")]
    Inference(#[from] bizdoc_inference::InferenceError),

    /// The model returned something other than a usable probability vector.
    #[error("malformed classifier output: {0}")]
    MalformedOutput(String),
}

/// Result type for the bizdoc library.
pub type Result<T> = std::result::Result<T, BizdocError>;
