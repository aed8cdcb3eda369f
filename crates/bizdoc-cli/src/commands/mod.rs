//! Subcommands and the helpers they share.

pub mod analyze;
pub mod batch;
pub mod config;
pub mod models;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use bizdoc_core::{
    AnalysisResult, Analyzer, BizdocConfig, ClassificationError, DocumentClassifier,
    OcrProvider, OnnxDocumentClassifier, PrecomputedOcr, PureOcrEngine, RawOcr,
    UnavailableClassifier,
};

/// Analyzer type used by the CLI: the fallback model is chosen at runtime.
pub type CliAnalyzer = Analyzer<Box<dyn DocumentClassifier>>;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension for per-document output files.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Load the config from `--config`, the user config file, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<BizdocConfig> {
    if let Some(path) = config_path {
        return Ok(BizdocConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(BizdocConfig::from_file(&default_path)?)
    } else {
        Ok(BizdocConfig::default())
    }
}

/// Directory where `bizdoc` keeps model files.
pub fn data_model_dir(kind: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bizdoc")
        .join("models")
        .join(kind)
}

/// Point relative model directories that do not exist at the data dir.
pub fn resolve_model_dirs(config: &mut BizdocConfig) {
    if config.ocr.model_dir.is_relative() && !config.ocr.model_dir.exists() {
        config.ocr.model_dir = data_model_dir("ocr");
    }
    if config.classifier.model_dir.is_relative() && !config.classifier.model_dir.exists() {
        config.classifier.model_dir = data_model_dir("classifier");
    }
}

/// Build the analyzer, loading the fallback model once.
///
/// A missing model is not fatal: documents the keyword rules recognize still
/// succeed, the others fail with a classification error.
pub fn build_analyzer(config: &BizdocConfig) -> CliAnalyzer {
    let classifier: Box<dyn DocumentClassifier> = if !config.classifier.enabled {
        info!("Fallback classifier disabled in config");
        Box::new(UnavailableClassifier::new("fallback classifier disabled"))
    } else {
        match OnnxDocumentClassifier::load(&config.classifier) {
            Ok(classifier) => Box::new(classifier),
            Err(ClassificationError::Unavailable(reason)) => {
                warn!("Fallback classifier unavailable: {}", reason);
                Box::new(UnavailableClassifier::new(reason))
            }
            Err(e) => {
                warn!("Failed to load fallback classifier: {}", e);
                Box::new(UnavailableClassifier::new(e.to_string()))
            }
        }
    };

    Analyzer::new(classifier).with_max_image_size(config.input.max_image_size)
}

/// OCR from a JSON file when given, otherwise the ONNX OCR engine.
pub fn build_ocr(
    config: &BizdocConfig,
    ocr_json: Option<&Path>,
) -> anyhow::Result<Box<dyn OcrProvider>> {
    if let Some(path) = ocr_json {
        let raw = RawOcr::from_json_file(path)?;
        debug!("Using precomputed OCR from {} ({} words)", path.display(), raw.words.len());
        return Ok(Box::new(PrecomputedOcr::new(raw)));
    }

    let engine = PureOcrEngine::from_config(&config.ocr).map_err(|e| {
        anyhow::anyhow!(
            "{}\n\nPlace det/rec/dictionary files in {} or pass --ocr-json.",
            e,
            config.ocr.model_dir.display()
        )
    })?;
    Ok(Box::new(engine))
}

/// Render one result in the requested format.
pub fn format_result(result: &AnalysisResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &AnalysisResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["type", "confidence", "status", "id_number"])?;
    wtr.write_record([
        result.doc_type.as_str(),
        &result.confidence_display,
        &result.status.to_string(),
        &result.data.id_number,
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &AnalysisResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Type:       {}\n", result.doc_type));
    output.push_str(&format!("Confidence: {}\n", result.confidence_display));
    output.push_str(&format!("Status:     {}\n", result.status));
    output.push_str(&format!("ID number:  {}\n", result.data.id_number));

    output
}
