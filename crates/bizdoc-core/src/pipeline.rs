//! Per-document analysis pipeline.
//!
//! ```text
//! INGESTED -> NORMALIZED -> RULE_CLASSIFIED | MODEL_CLASSIFIED -> EXTRACTED -> FINALIZED
//! ```
//!
//! Any failure ends the document in `FAILED`; nothing is retried.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, warn};

use crate::classify::{DocumentClassifier, HeuristicClassifier};
use crate::error::{BizdocError, Result};
use crate::extract::RegistrationExtractor;
use crate::input;
use crate::models::{
    AnalysisResult, ClassificationResult, ExtractionRecord, Provenance, Status,
};
use crate::ocr::{normalize_tokens, OcrProvider, RawOcr, Token};

/// Stages a document passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Ingested,
    Normalized,
    RuleClassified,
    ModelClassified,
    Extracted,
    Finalized,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Ingested => "INGESTED",
            PipelineStage::Normalized => "NORMALIZED",
            PipelineStage::RuleClassified => "RULE_CLASSIFIED",
            PipelineStage::ModelClassified => "MODEL_CLASSIFIED",
            PipelineStage::Extracted => "EXTRACTED",
            PipelineStage::Finalized => "FINALIZED",
            PipelineStage::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Text shown in the `Confidence` field.
pub fn confidence_display(classification: &ClassificationResult) -> String {
    match classification.provenance {
        Provenance::RuleBased => "100% (Rule-Based)".to_string(),
        Provenance::Model => format!("{:.2}% (AI)", classification.confidence * 100.0),
    }
}

/// Combine classification and extraction into the caller-facing result.
pub fn aggregate(
    classification: ClassificationResult,
    extraction: ExtractionRecord,
) -> AnalysisResult {
    let status = if extraction.is_found() {
        Status::Valid
    } else {
        Status::ReviewRequired
    };

    AnalysisResult {
        doc_type: classification.doc_type,
        confidence_display: confidence_display(&classification),
        status,
        data: extraction,
        classification: Some(classification),
    }
}

/// Space-joined token texts.
pub fn full_text(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Document analyzer.
///
/// Holds the loaded fallback classifier for its whole lifetime and can be
/// shared across threads; each `analyze` call is independent.
pub struct Analyzer<C: DocumentClassifier> {
    heuristics: HeuristicClassifier,
    extractor: RegistrationExtractor,
    classifier: C,
    max_image_size: u32,
}

impl<C: DocumentClassifier> Analyzer<C> {
    /// Analyzer with the built-in rule tables and the given fallback model.
    pub fn new(classifier: C) -> Self {
        Self {
            heuristics: HeuristicClassifier::new(),
            extractor: RegistrationExtractor::new(),
            classifier,
            max_image_size: 2048,
        }
    }

    /// Replace the heuristic table.
    pub fn with_heuristics(mut self, heuristics: HeuristicClassifier) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Replace the extraction tables.
    pub fn with_extractor(mut self, extractor: RegistrationExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Longest image side accepted by [`Analyzer::analyze_path`] before downscaling.
    pub fn with_max_image_size(mut self, max_image_size: u32) -> Self {
        self.max_image_size = max_image_size;
        self
    }

    /// The fallback classifier.
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Release the fallback classifier.
    pub fn shutdown(self) {
        debug!("Shutting down analyzer");
        self.classifier.shutdown();
    }

    /// Analyze a document from its image and OCR output.
    pub fn analyze(&self, image: &DynamicImage, ocr: &RawOcr) -> Result<AnalysisResult> {
        let start = Instant::now();
        let mut stage = PipelineStage::Ingested;
        transition(stage);

        let result = self.run(image, ocr, &mut stage);
        match &result {
            Ok(analysis) => info!(
                "Analyzed document: {} ({}, {}) in {}ms",
                analysis.doc_type,
                analysis.status,
                analysis.confidence_display,
                start.elapsed().as_millis()
            ),
            Err(e) => fail(stage, e),
        }
        result
    }

    /// Load a file, run OCR on it, and analyze it.
    pub fn analyze_path(&self, path: &Path, ocr: &dyn OcrProvider) -> Result<AnalysisResult> {
        let image = input::load_document(path, self.max_image_size).map_err(|e| {
            let e = BizdocError::from(e);
            fail(PipelineStage::Ingested, &e);
            e
        })?;

        let raw = ocr.recognize(&image).map_err(|e| {
            let e = BizdocError::from(e);
            fail(PipelineStage::Ingested, &e);
            e
        })?;

        self.analyze(&image, &raw)
    }

    fn run(
        &self,
        image: &DynamicImage,
        ocr: &RawOcr,
        stage: &mut PipelineStage,
    ) -> Result<AnalysisResult> {
        ocr.validate()?;
        let (width, height) = image.dimensions();
        if (ocr.width, ocr.height) != (width, height) {
            debug!(
                "OCR dimensions {}x{} differ from image {}x{}",
                ocr.width, ocr.height, width, height
            );
        }

        let tokens = normalize_tokens(ocr);
        let text = full_text(&tokens);
        advance(stage, PipelineStage::Normalized);
        debug!("{} tokens, {} characters", tokens.len(), text.len());

        let classification = match self.heuristics.classify(&text) {
            Some(doc_type) => {
                advance(stage, PipelineStage::RuleClassified);
                ClassificationResult::rule_based(doc_type)
            }
            None => {
                let prediction = self.classifier.classify(image, &tokens)?;
                prediction.validate()?;
                advance(stage, PipelineStage::ModelClassified);
                ClassificationResult::model(prediction.label, prediction.confidence())
            }
        };

        let extraction = self.extractor.extract(classification.doc_type, &text);
        advance(stage, PipelineStage::Extracted);

        let result = aggregate(classification, extraction);
        advance(stage, PipelineStage::Finalized);
        Ok(result)
    }
}

fn transition(stage: PipelineStage) {
    debug!("Pipeline stage: {}", stage);
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    *stage = next;
    transition(next);
}

fn fail(reached: PipelineStage, error: &BizdocError) {
    transition(PipelineStage::Failed);
    warn!("Analysis failed after {}: {}", reached, error);
}
