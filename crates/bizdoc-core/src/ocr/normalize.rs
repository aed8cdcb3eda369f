//! Token normalization onto the fixed 0..=1000 layout grid.

use serde::{Deserialize, Serialize};

use super::RawOcr;

/// Side length of the normalized coordinate grid.
pub const GRID_SIZE: u16 = 1000;

/// Text of the synthetic token emitted when OCR found nothing.
pub const FALLBACK_TOKEN_TEXT: &str = "empty";

/// Axis-aligned box on the 0..=1000 grid. Always `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

impl BoundingBox {
    /// The whole page.
    pub const FULL: BoundingBox = BoundingBox {
        x0: 0,
        y0: 0,
        x1: GRID_SIZE,
        y1: GRID_SIZE,
    };

    /// Build a box from corner coordinates, clamping and ordering them.
    pub fn new(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        let (x0, x1) = (x0.min(GRID_SIZE), x1.min(GRID_SIZE));
        let (y0, y1) = (y0.min(GRID_SIZE), y1.min(GRID_SIZE));
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Scale a pixel box of an image with the given dimensions onto the grid.
    pub fn from_pixels(pixel_box: [f32; 4], width: u32, height: u32) -> Self {
        let [x0, y0, x1, y1] = pixel_box;
        Self::new(
            scale(x0, width),
            scale(y0, height),
            scale(x1, width),
            scale(y1, height),
        )
    }

    /// Coordinates as `[x0, y0, x1, y1]`.
    pub fn to_array(&self) -> [u16; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

/// `round(coord / dimension * 1000)` clamped to the grid.
fn scale(coord: f32, dimension: u32) -> u16 {
    if dimension == 0 || !coord.is_finite() {
        return 0;
    }
    let scaled = (coord as f64 / dimension as f64 * GRID_SIZE as f64).round();
    scaled.clamp(0.0, GRID_SIZE as f64) as u16
}

/// One OCR word on the normalized grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

impl Token {
    /// The synthetic token covering the whole page.
    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_TOKEN_TEXT.to_string(),
            bbox: BoundingBox::FULL,
        }
    }
}

/// Convert raw OCR output into a non-empty token stream.
///
/// Words whose trimmed text is empty are dropped. When nothing survives, a
/// single `"empty"` token spanning the page is returned instead.
pub fn normalize_tokens(raw: &RawOcr) -> Vec<Token> {
    let tokens: Vec<Token> = raw
        .words
        .iter()
        .zip(raw.boxes.iter())
        .filter_map(|(word, pixel_box)| {
            let text = word.trim();
            if text.is_empty() {
                return None;
            }
            Some(Token {
                text: text.to_string(),
                bbox: BoundingBox::from_pixels(*pixel_box, raw.width, raw.height),
            })
        })
        .collect();

    if tokens.is_empty() {
        vec![Token::fallback()]
    } else {
        tokens
    }
}
