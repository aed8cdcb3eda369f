//! Document classification: keyword heuristics first, model fallback second.

pub mod encoding;
pub mod heuristic;
mod model;

pub use encoding::{EncodedInput, Vocabulary};
pub use heuristic::{HeuristicClassifier, HeuristicRule};
pub use model::OnnxDocumentClassifier;

use image::DynamicImage;

use crate::error::ClassificationError;
use crate::models::DocumentType;
use crate::ocr::Token;

/// Label and full probability distribution returned by a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrediction {
    /// Predicted label.
    pub label: DocumentType,
    /// One probability per label, in [`DocumentType::ALL`] order.
    pub probabilities: Vec<f32>,
}

impl ModelPrediction {
    /// Pick the arg-max label of a probability vector.
    ///
    /// Ties go to the lower label index.
    pub fn from_probabilities(probabilities: Vec<f32>) -> Result<Self, ClassificationError> {
        check_distribution(&probabilities)?;

        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate() {
            if *p > probabilities[best] {
                best = i;
            }
        }

        let label = DocumentType::from_index(best).ok_or_else(|| {
            ClassificationError::MalformedOutput(format!("label index {} out of range", best))
        })?;

        Ok(Self {
            label,
            probabilities,
        })
    }

    /// Check the distribution is well formed and the label is its arg-max.
    pub fn validate(&self) -> Result<(), ClassificationError> {
        check_distribution(&self.probabilities)?;

        let confidence = self.confidence();
        let max = self.probabilities.iter().copied().fold(0.0f32, f32::max);
        if confidence < max {
            return Err(ClassificationError::MalformedOutput(format!(
                "label {} has probability {} but the maximum is {}",
                self.label, confidence, max
            )));
        }
        Ok(())
    }

    /// Probability of the predicted label.
    pub fn confidence(&self) -> f32 {
        self.probabilities
            .get(self.label.index())
            .copied()
            .unwrap_or_default()
    }
}

/// Allowed drift of a probability vector's sum from 1.
const SUM_TOLERANCE: f32 = 1e-3;

fn check_distribution(probabilities: &[f32]) -> Result<(), ClassificationError> {
    if probabilities.len() != DocumentType::COUNT {
        return Err(ClassificationError::MalformedOutput(format!(
            "expected {} probabilities, got {}",
            DocumentType::COUNT,
            probabilities.len()
        )));
    }
    if let Some(p) = probabilities
        .iter()
        .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
    {
        return Err(ClassificationError::MalformedOutput(format!(
            "invalid probability {}",
            p
        )));
    }

    let max = probabilities.iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return Err(ClassificationError::MalformedOutput(
            "all probabilities are zero".to_string(),
        ));
    }

    let sum: f32 = probabilities.iter().sum();
    if (sum - 1.0).abs() > SUM_TOLERANCE {
        return Err(ClassificationError::MalformedOutput(format!(
            "probabilities sum to {}",
            sum
        )));
    }
    Ok(())
}

/// The fallback classification capability.
///
/// Loaded once, then shared by every concurrent analysis.
pub trait DocumentClassifier: Send + Sync {
    /// Classify a page from its image and normalized tokens. Blocks until
    /// the model answers.
    fn classify(
        &self,
        image: &DynamicImage,
        tokens: &[Token],
    ) -> Result<ModelPrediction, ClassificationError>;

    /// Release model resources. Called once when the analyzer shuts down.
    fn shutdown(&self) {}
}

impl<C: DocumentClassifier + ?Sized> DocumentClassifier for Box<C> {
    fn classify(
        &self,
        image: &DynamicImage,
        tokens: &[Token],
    ) -> Result<ModelPrediction, ClassificationError> {
        (**self).classify(image, tokens)
    }

    fn shutdown(&self) {
        (**self).shutdown()
    }
}

/// Stand-in used when no model is configured. Every call fails.
#[derive(Debug, Clone)]
pub struct UnavailableClassifier {
    reason: String,
}

impl UnavailableClassifier {
    /// A classifier that reports `reason` on every call.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for UnavailableClassifier {
    fn default() -> Self {
        Self::new("no classification model loaded")
    }
}

impl DocumentClassifier for UnavailableClassifier {
    fn classify(
        &self,
        _image: &DynamicImage,
        _tokens: &[Token],
    ) -> Result<ModelPrediction, ClassificationError> {
        Err(ClassificationError::Unavailable(self.reason.clone()))
    }
}
