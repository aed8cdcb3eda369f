//! Configuration structures for the analysis pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::BizdocError;

/// Main configuration for the bizdoc pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BizdocConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Fallback classifier configuration.
    pub classifier: ClassifierConfig,

    /// Document ingestion configuration.
    pub input: InputConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing OCR model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` markers in recognized text instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/ocr"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "en_rec.onnx".to_string(),
            dictionary: "en_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Full paths of the (detection, recognition, dictionary) files.
    pub fn model_files(&self) -> [PathBuf; 3] {
        [
            self.model_dir.join(&self.detection_model),
            self.model_dir.join(&self.recognition_model),
            self.model_dir.join(&self.dictionary),
        ]
    }
}

/// Fallback document classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Load the fallback model at startup.
    pub enabled: bool,

    /// Directory containing the classifier export.
    pub model_dir: PathBuf,

    /// ONNX model file name.
    pub model_file: String,

    /// Token vocabulary (`token -> id` JSON map).
    pub vocab_file: String,

    /// Token budget including the two boundary tokens.
    pub max_tokens: usize,

    /// Side length of the square image input.
    pub image_size: u32,

    /// Number of CPU threads for inference.
    pub num_threads: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_dir: PathBuf::from("models/classifier"),
            model_file: "document_classifier.onnx".to_string(),
            vocab_file: "vocab.json".to_string(),
            max_tokens: 512,
            image_size: 224,
            num_threads: 4,
        }
    }
}

impl ClassifierConfig {
    /// Full path to the ONNX model.
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    /// Full path to the vocabulary.
    pub fn vocab_path(&self) -> PathBuf {
        self.model_dir.join(&self.vocab_file)
    }
}

/// Document ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Longest image side before downscaling (0 = never downscale).
    pub max_image_size: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_image_size: 2048,
        }
    }
}

impl BizdocConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, BizdocError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| BizdocError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), BizdocError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| BizdocError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
