//! LayoutLM-style sequence classifier served through an [`InferenceBackend`].

use image::DynamicImage;
use tracing::{debug, info};

use bizdoc_inference::{InferenceBackend, InputTensor, OutputTensor};

use crate::error::ClassificationError;
use crate::models::DocumentType;
#[cfg(feature = "native")]
use crate::models::config::ClassifierConfig;
use crate::ocr::Token;

use super::encoding::{pixel_values, EncodedInput, Vocabulary};
use super::{DocumentClassifier, ModelPrediction};

/// Document classifier running an exported multimodal model.
pub struct OnnxDocumentClassifier<B: InferenceBackend> {
    backend: B,
    vocab: Vocabulary,
    max_tokens: usize,
    image_size: u32,
}

impl<B: InferenceBackend> OnnxDocumentClassifier<B> {
    /// Wrap an already loaded backend.
    pub fn new(backend: B, vocab: Vocabulary) -> Self {
        Self {
            backend,
            vocab,
            max_tokens: 512,
            image_size: 224,
        }
    }

    /// Set the token budget, boundary tokens included.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the side length of the image input.
    pub fn with_image_size(mut self, image_size: u32) -> Self {
        self.image_size = image_size;
        self
    }

    fn build_inputs(
        &self,
        image: &DynamicImage,
        tokens: &[Token],
    ) -> Result<Vec<(&'static str, InputTensor)>, ClassificationError> {
        let encoded = EncodedInput::encode(tokens, &self.vocab, self.max_tokens);
        let seq = encoded.len();
        let side = self.image_size as usize;

        let mut inputs = Vec::with_capacity(4);
        if self.backend.has_input("input_ids") {
            inputs.push(("input_ids", InputTensor::from_i64(encoded.input_ids.clone(), &[1, seq])?));
        }
        if self.backend.has_input("bbox") {
            inputs.push(("bbox", InputTensor::from_i64(encoded.flat_bbox(), &[1, seq, 4])?));
        }
        if self.backend.has_input("attention_mask") {
            inputs.push((
                "attention_mask",
                InputTensor::from_i64(encoded.attention_mask.clone(), &[1, seq])?,
            ));
        }
        if self.backend.has_input("pixel_values") {
            let pixels = pixel_values(image, self.image_size);
            inputs.push(("pixel_values", InputTensor::from_f32(pixels, &[1, 3, side, side])?));
        }

        if inputs.is_empty() {
            return Err(ClassificationError::Encoding(format!(
                "model declares none of the expected inputs (has {:?})",
                self.backend.input_names()
            )));
        }

        Ok(inputs)
    }
}

#[cfg(feature = "native")]
impl OnnxDocumentClassifier<bizdoc_inference::OrtBackend> {
    /// Load model and vocabulary named in the config through ONNX Runtime.
    ///
    /// Blocks until the session is ready.
    pub fn load(config: &ClassifierConfig) -> Result<Self, ClassificationError> {
        let model_path = config.model_path();
        let vocab_path = config.vocab_path();

        for path in [&model_path, &vocab_path] {
            if !path.exists() {
                return Err(ClassificationError::Unavailable(format!(
                    "missing classifier file {}",
                    path.display()
                )));
            }
        }

        let options = bizdoc_inference::OrtOptions {
            intra_threads: config.num_threads,
        };
        let backend = bizdoc_inference::OrtBackend::from_file_with_options(&model_path, options)
            .map_err(|e| ClassificationError::Unavailable(e.to_string()))?;
        let vocab = Vocabulary::from_file(&vocab_path)?;

        info!("Loaded document classifier from {}", model_path.display());

        Ok(Self::new(backend, vocab)
            .with_max_tokens(config.max_tokens)
            .with_image_size(config.image_size))
    }
}

impl<B: InferenceBackend> DocumentClassifier for OnnxDocumentClassifier<B> {
    fn classify(
        &self,
        image: &DynamicImage,
        tokens: &[Token],
    ) -> Result<ModelPrediction, ClassificationError> {
        let inputs = self.build_inputs(image, tokens)?;
        let outputs = self.backend.run(&inputs)?;

        let (name, output) = outputs
            .into_iter()
            .next()
            .ok_or_else(|| ClassificationError::MalformedOutput("model returned no outputs".to_string()))?;

        let logits: Vec<f32> = match output {
            OutputTensor::Float32(arr) => arr.iter().copied().collect(),
            OutputTensor::Int64(_) => {
                return Err(ClassificationError::MalformedOutput(format!(
                    "output '{}' is not float",
                    name
                )));
            }
        };

        if logits.len() != DocumentType::COUNT {
            return Err(ClassificationError::MalformedOutput(format!(
                "expected {} logits, got {}",
                DocumentType::COUNT,
                logits.len()
            )));
        }
        if logits.iter().any(|v| !v.is_finite()) {
            return Err(ClassificationError::MalformedOutput(
                "non-finite logits".to_string(),
            ));
        }

        let prediction = ModelPrediction::from_probabilities(softmax(&logits))?;
        debug!(
            "Model predicted {} ({:.4})",
            prediction.label,
            prediction.confidence()
        );
        Ok(prediction)
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}
