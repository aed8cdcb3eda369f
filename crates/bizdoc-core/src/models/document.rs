//! Document taxonomy and the result types produced by the analysis pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sentinel stored in [`ExtractionRecord::id_number`] when no rule matched.
pub const NOT_FOUND: &str = "Not Found";

/// Category of a business-registration document.
///
/// The declaration order is the label index order of the trained classifier;
/// changing it requires re-exporting the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// GST registration certificate (Form GST REG-06).
    Gst,
    /// Certificate of incorporation.
    Coi,
    /// Maharashtra shops and establishments registration.
    Gumasta,
    /// Udyam (MSME) registration certificate.
    Udyam,
    /// FSSAI food business license.
    Fssai,
    /// Karnataka e-Karmika labour registration.
    Ekarmika,
    /// Drug license (Form 20).
    DrugLicense,
    /// Importer-exporter code certificate.
    Iec,
    /// Profession tax enrollment certificate.
    Ptec,
    /// TAN allotment letter.
    Tan,
    /// Kolkata Municipal Corporation certificate of enlistment.
    TradeLicenseWb,
    /// Partnership deed.
    PartnershipDeed,
}

impl DocumentType {
    /// Every label, in model index order.
    pub const ALL: [DocumentType; 12] = [
        DocumentType::Gst,
        DocumentType::Coi,
        DocumentType::Gumasta,
        DocumentType::Udyam,
        DocumentType::Fssai,
        DocumentType::Ekarmika,
        DocumentType::DrugLicense,
        DocumentType::Iec,
        DocumentType::Ptec,
        DocumentType::Tan,
        DocumentType::TradeLicenseWb,
        DocumentType::PartnershipDeed,
    ];

    /// Number of labels in the taxonomy.
    pub const COUNT: usize = Self::ALL.len();

    /// Canonical label string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Gst => "GST",
            DocumentType::Coi => "COI",
            DocumentType::Gumasta => "GUMASTA",
            DocumentType::Udyam => "UDYAM",
            DocumentType::Fssai => "FSSAI",
            DocumentType::Ekarmika => "EKARMIKA",
            DocumentType::DrugLicense => "DRUG_LICENSE",
            DocumentType::Iec => "IEC",
            DocumentType::Ptec => "PTEC",
            DocumentType::Tan => "TAN",
            DocumentType::TradeLicenseWb => "TRADE_LICENSE_WB",
            DocumentType::PartnershipDeed => "PARTNERSHIP_DEED",
        }
    }

    /// Label at a model output index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Model output index of this label.
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|t| t == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_uppercase();
        Self::ALL
            .iter()
            .find(|t| t.as_str() == label)
            .copied()
            .ok_or_else(|| format!("Unknown document type: '{s}'"))
    }
}

/// Where a classification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provenance {
    /// Matched by the heuristic keyword table.
    RuleBased,
    /// Predicted by the fallback model.
    Model,
}

/// Output of the classification stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Assigned document type.
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    /// Rule or model.
    pub provenance: Provenance,
    /// Confidence in (0, 1]; always 1.0 for rule matches.
    pub confidence: f32,
}

impl ClassificationResult {
    /// A heuristic match.
    pub fn rule_based(doc_type: DocumentType) -> Self {
        Self {
            doc_type,
            provenance: Provenance::RuleBased,
            confidence: 1.0,
        }
    }

    /// A model prediction with its top-class probability.
    pub fn model(doc_type: DocumentType, probability: f32) -> Self {
        Self {
            doc_type,
            provenance: Provenance::Model,
            confidence: probability,
        }
    }
}

/// The identifier pulled from a document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Document type the rules were selected for.
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    /// Normalized identifier, or [`NOT_FOUND`].
    pub id_number: String,
}

impl ExtractionRecord {
    /// A record carrying an extracted identifier.
    pub fn found(doc_type: DocumentType, id_number: impl Into<String>) -> Self {
        Self {
            doc_type,
            id_number: id_number.into(),
        }
    }

    /// A record for an extraction miss.
    pub fn not_found(doc_type: DocumentType) -> Self {
        Self::found(doc_type, NOT_FOUND)
    }

    /// Whether an identifier was extracted.
    pub fn is_found(&self) -> bool {
        self.id_number != NOT_FOUND
    }
}

/// Validation status of an analyzed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// An identifier was extracted.
    Valid,
    /// No identifier; a human needs to look at the document.
    ReviewRequired,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Valid => write!(f, "VALID"),
            Status::ReviewRequired => write!(f, "REVIEW_REQUIRED"),
        }
    }
}

/// Terminal output of the pipeline for one document.
///
/// Serializes to the caller-facing shape
/// `{"Type", "Confidence", "Status", "Data": {"type", "id_number"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "Type")]
    pub doc_type: DocumentType,

    #[serde(rename = "Confidence")]
    pub confidence_display: String,

    #[serde(rename = "Status")]
    pub status: Status,

    #[serde(rename = "Data")]
    pub data: ExtractionRecord,

    /// Classification behind this result.
    #[serde(skip)]
    pub classification: Option<ClassificationResult>,
}

impl AnalysisResult {
    /// Whether the document needs manual review.
    pub fn needs_review(&self) -> bool {
        self.status == Status::ReviewRequired
    }
}
