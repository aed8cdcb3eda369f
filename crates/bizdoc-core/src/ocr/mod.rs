//! OCR boundary: raw recognizer output and its normalization into tokens.

mod normalize;
#[cfg(feature = "native")]
mod pure_engine;

pub use normalize::{normalize_tokens, BoundingBox, Token, FALLBACK_TOKEN_TEXT, GRID_SIZE};
#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Output of an OCR pass, in pixel coordinates of the analyzed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOcr {
    /// Recognized words, in reading order.
    pub words: Vec<String>,

    /// Pixel boxes `[x0, y0, x1, y1]`, parallel to `words`.
    pub boxes: Vec<[f32; 4]>,

    /// Image width in pixels.
    pub width: u32,

    /// Image height in pixels.
    pub height: u32,
}

impl RawOcr {
    /// An OCR pass that found nothing.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            words: Vec::new(),
            boxes: Vec::new(),
            width,
            height,
        }
    }

    /// Check that words and boxes line up.
    pub fn validate(&self) -> Result<(), OcrError> {
        if self.words.len() != self.boxes.len() {
            return Err(OcrError::InvalidOutput(format!(
                "{} words but {} boxes",
                self.words.len(),
                self.boxes.len()
            )));
        }
        Ok(())
    }

    /// Parse OCR output produced elsewhere.
    pub fn from_json(json: &str) -> Result<Self, OcrError> {
        let raw: RawOcr =
            serde_json::from_str(json).map_err(|e| OcrError::InvalidOutput(e.to_string()))?;
        raw.validate()?;
        Ok(raw)
    }

    /// Load OCR output from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, OcrError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| OcrError::InvalidOutput(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Serialize for storage or hand-off.
    pub fn to_json(&self) -> Result<String, OcrError> {
        serde_json::to_string(self).map_err(|e| OcrError::InvalidOutput(e.to_string()))
    }
}

/// The external OCR capability.
pub trait OcrProvider: Send + Sync {
    /// Recognize words and their pixel boxes in an image.
    fn recognize(&self, image: &DynamicImage) -> Result<RawOcr, OcrError>;
}

/// Provider that replays OCR output computed ahead of time.
#[derive(Debug, Clone)]
pub struct PrecomputedOcr {
    output: RawOcr,
}

impl PrecomputedOcr {
    /// Wrap an existing OCR result.
    pub fn new(output: RawOcr) -> Self {
        Self { output }
    }
}

impl OcrProvider for PrecomputedOcr {
    fn recognize(&self, _image: &DynamicImage) -> Result<RawOcr, OcrError> {
        self.output.validate()?;
        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let raw = RawOcr::from_json(
            r#"{"words":["TAN:","MUMA12345C"],"boxes":[[10,10,60,30],[70,10,200,30]],"width":1000,"height":1400}"#,
        )
        .unwrap();
        assert_eq!(raw.words.len(), 2);
        assert_eq!(raw.boxes[1], [70.0, 10.0, 200.0, 30.0]);
    }

    #[test]
    fn test_mismatched_boxes_rejected() {
        let result = RawOcr::from_json(
            r#"{"words":["a","b"],"boxes":[[0,0,1,1]],"width":10,"height":10}"#,
        );
        assert!(matches!(result, Err(OcrError::InvalidOutput(_))));
    }

    #[test]
    fn test_precomputed_ignores_image() {
        let raw = RawOcr {
            words: vec!["FSSAI".to_string()],
            boxes: vec![[0.0, 0.0, 5.0, 5.0]],
            width: 10,
            height: 10,
        };
        let provider = PrecomputedOcr::new(raw.clone());
        let image = DynamicImage::new_rgb8(1, 1);
        assert_eq!(provider.recognize(&image).unwrap(), raw);
    }
}
