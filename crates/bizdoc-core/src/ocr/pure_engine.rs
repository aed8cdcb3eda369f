//! OCR provider backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).

use std::sync::Mutex;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{OcrProvider, RawOcr};

/// Height of the row bands used to put regions into reading order.
const ROW_BAND_PX: f32 = 20.0;

/// OCR engine backed by `pure-onnx-ocr`.
///
/// Recognition calls are serialized on the engine.
pub struct PureOcrEngine {
    engine: Mutex<pure_onnx_ocr::engine::OcrEngine>,
    keep_unk: bool,
}

impl PureOcrEngine {
    /// Load detection, recognition and dictionary files named in the config.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let [det_path, rec_path, dict_path] = config.model_files();

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "missing OCR model file {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", config.model_dir.display());

        Ok(Self {
            engine: Mutex::new(engine),
            keep_unk: config.keep_unk,
        })
    }
}

impl OcrProvider for PureOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<RawOcr, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        debug!("Running OCR on {}x{} image", width, height);

        let results = self
            .engine
            .lock()
            .map_err(|e| OcrError::Recognition(format!("OCR engine lock poisoned: {}", e)))?
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let mut regions: Vec<(String, [f32; 4])> = results
            .iter()
            .map(|r| {
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                (text, polygon_to_rect(&r.bounding_box))
            })
            .collect();

        regions.sort_by(|(_, a), (_, b)| {
            let row_a = (a[1] / ROW_BAND_PX) as i32;
            let row_b = (b[1] / ROW_BAND_PX) as i32;
            row_a
                .cmp(&row_b)
                .then(a[0].partial_cmp(&b[0]).unwrap_or(std::cmp::Ordering::Equal))
        });

        let (words, boxes) = regions.into_iter().unzip();

        info!(
            "OCR complete: {} regions in {}ms",
            results.len(),
            start.elapsed().as_millis()
        );

        Ok(RawOcr {
            words,
            boxes,
            width,
            height,
        })
    }
}

/// Axis-aligned hull `[x0, y0, x1, y1]` of a detection polygon.
fn polygon_to_rect(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 4] {
    let mut rect = [f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY];
    for coord in polygon.exterior().coords() {
        rect[0] = rect[0].min(coord.x as f32);
        rect[1] = rect[1].min(coord.y as f32);
        rect[2] = rect[2].max(coord.x as f32);
        rect[3] = rect[3].max(coord.y as f32);
    }
    if rect[0].is_finite() { rect } else { [0.0; 4] }
}
