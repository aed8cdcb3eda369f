//! ONNX inference abstraction layer for bizdoc.
//!
//! The document classifier in `bizdoc-core` talks to models only through the
//! [`InferenceBackend`] trait defined here. The `native` feature provides an
//! ONNX Runtime implementation with the XNNPACK execution provider.

mod backend;
mod error;
mod tensor;

pub use backend::InferenceBackend;
pub use error::InferenceError;
pub use tensor::{InputTensor, OutputTensor, TensorType};

#[cfg(feature = "native")]
pub use backend::ort::{OrtBackend, OrtOptions};

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
