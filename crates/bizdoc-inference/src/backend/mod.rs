//! Inference backend implementations.

#[cfg(feature = "native")]
pub mod ort;

use crate::{InputTensor, OutputTensor, Result};

/// Trait for ONNX inference backends.
///
/// Implementations must be safe to share between threads: a loaded model is
/// created once and then serves concurrent, read-only inference calls from
/// every in-flight document analysis.
pub trait InferenceBackend: Send + Sync {
    /// Run inference with the given named inputs and return named outputs.
    fn run(&self, inputs: &[(&str, InputTensor)]) -> Result<Vec<(String, OutputTensor)>>;

    /// Get the input names expected by the model.
    fn input_names(&self) -> &[String];

    /// Get the output names produced by the model.
    fn output_names(&self) -> &[String];

    /// Check whether the model declares an input with this name.
    fn has_input(&self, name: &str) -> bool {
        self.input_names().iter().any(|n| n == name)
    }
}
