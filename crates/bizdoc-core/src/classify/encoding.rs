//! Packaging of page image and tokens into classifier input tensors.

use std::collections::HashMap;
use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

use crate::error::ClassificationError;
use crate::ocr::Token;

const BOS: &str = "<s>";
const EOS: &str = "</s>";
const PAD: &str = "<pad>";
const UNK: &str = "<unk>";

/// Word-start marker of byte-level BPE vocabularies.
const WORD_START: char = '\u{0120}';

/// Token vocabulary of the classifier.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    ids: HashMap<String, i64>,
    bos: i64,
    eos: i64,
    pad: i64,
    unk: i64,
}

impl Vocabulary {
    /// Build from a `token -> id` map. Missing special tokens get the usual
    /// RoBERTa ids.
    pub fn from_map(ids: HashMap<String, i64>) -> Self {
        let special = |name: &str, fallback: i64| ids.get(name).copied().unwrap_or(fallback);
        Self {
            bos: special(BOS, 0),
            pad: special(PAD, 1),
            eos: special(EOS, 2),
            unk: special(UNK, 3),
            ids,
        }
    }

    /// Parse a `vocab.json` document.
    pub fn from_json(json: &str) -> Result<Self, ClassificationError> {
        let ids: HashMap<String, i64> = serde_json::from_str(json)
            .map_err(|e| ClassificationError::Unavailable(format!("invalid vocabulary: {}", e)))?;
        Ok(Self::from_map(ids))
    }

    /// Load a `vocab.json` file.
    pub fn from_file(path: &Path) -> Result<Self, ClassificationError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ClassificationError::Unavailable(format!("{}: {}", path.display(), e))
        })?;
        let vocab = Self::from_json(&json)?;
        debug!("Loaded vocabulary with {} entries", vocab.len());
        Ok(vocab)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the vocabulary has no entries.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Id for a whole word: word-start form, then bare, then `<unk>`.
    pub fn word_id(&self, word: &str) -> i64 {
        let lower = word.to_lowercase();
        let prefixed = format!("{}{}", WORD_START, lower);
        self.ids
            .get(&prefixed)
            .or_else(|| self.ids.get(word))
            .or_else(|| self.ids.get(&lower))
            .copied()
            .unwrap_or(self.unk)
    }
}

/// Token-side classifier inputs, all of length `max_tokens`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInput {
    pub input_ids: Vec<i64>,
    pub bbox: Vec<[i64; 4]>,
    pub attention_mask: Vec<i64>,
}

impl EncodedInput {
    /// `<s>` + one id per token + `</s>`, truncated to `max_tokens` and
    /// padded with `<pad>`.
    pub fn encode(tokens: &[Token], vocab: &Vocabulary, max_tokens: usize) -> Self {
        let max_tokens = max_tokens.max(2);
        let kept = tokens.len().min(max_tokens - 2);
        if kept < tokens.len() {
            debug!("Truncating {} tokens to {}", tokens.len(), kept);
        }

        let mut input_ids = Vec::with_capacity(max_tokens);
        let mut bbox = Vec::with_capacity(max_tokens);

        input_ids.push(vocab.bos);
        bbox.push([0; 4]);
        for token in &tokens[..kept] {
            input_ids.push(vocab.word_id(&token.text));
            bbox.push(token.bbox.to_array().map(i64::from));
        }
        input_ids.push(vocab.eos);
        bbox.push([0; 4]);

        let real = input_ids.len();
        let mut attention_mask = vec![1; real];

        input_ids.resize(max_tokens, vocab.pad);
        bbox.resize(max_tokens, [0; 4]);
        attention_mask.resize(max_tokens, 0);

        Self {
            input_ids,
            bbox,
            attention_mask,
        }
    }

    /// Sequence length.
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// `bbox` flattened row-major.
    pub fn flat_bbox(&self) -> Vec<i64> {
        self.bbox.iter().flatten().copied().collect()
    }
}

/// RGB pixels resized to `size x size`, scaled to [-1, 1], laid out CHW.
pub fn pixel_values(image: &DynamicImage, size: u32) -> Vec<f32> {
    let resized = image.resize_exact(size, size, FilterType::Triangle).to_rgb8();
    let plane = (size * size) as usize;
    let mut data = vec![0.0f32; 3 * plane];

    for (i, pixel) in resized.pixels().enumerate() {
        for c in 0..3 {
            data[c * plane + i] = (pixel[c] as f32 / 255.0 - 0.5) / 0.5;
        }
    }

    data
}
