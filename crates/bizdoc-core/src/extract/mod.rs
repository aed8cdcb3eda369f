//! Registration number extraction.
//!
//! Each document type owns an ordered list of [`ExtractionRule`]s. Rules are
//! tried in order against the full document text and the first match wins.

pub mod patterns;

use std::collections::HashMap;

use regex::Regex;
use tracing::{debug, trace};

use crate::models::{DocumentType, ExtractionRecord};

use patterns::*;

/// Post-processing applied to a captured identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    /// Keep the capture exactly as matched.
    AsIs,
    /// Upper-case the capture.
    Uppercase,
    /// Remove all whitespace, then upper-case. For identifiers OCR splits
    /// across tokens or lines.
    Compact,
}

impl Normalizer {
    /// Apply the normalization.
    pub fn apply(&self, value: &str) -> String {
        match self {
            Normalizer::AsIs => value.to_string(),
            Normalizer::Uppercase => value.to_uppercase(),
            Normalizer::Compact => value
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_uppercase(),
        }
    }
}

/// A pattern, the capture group holding the identifier, and its normalizer.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pattern: Regex,
    group: usize,
    normalizer: Normalizer,
}

impl ExtractionRule {
    /// Create a rule. Group 0 is the whole match.
    pub fn new(pattern: Regex, group: usize, normalizer: Normalizer) -> Self {
        Self {
            pattern,
            group,
            normalizer,
        }
    }

    /// Normalized identifier of the first match, if any.
    pub fn apply(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let value = caps.get(self.group)?.as_str();
        Some(self.normalizer.apply(value))
    }

    /// The underlying pattern.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Per-type extraction tables.
#[derive(Debug, Clone)]
pub struct RegistrationExtractor {
    rules: HashMap<DocumentType, Vec<ExtractionRule>>,
}

impl RegistrationExtractor {
    /// Extractor with the built-in rule tables.
    pub fn new() -> Self {
        let mut rules = HashMap::new();

        rules.insert(
            DocumentType::Gst,
            vec![
                ExtractionRule::new(GSTIN_LABELED.clone(), 1, Normalizer::Uppercase),
                ExtractionRule::new(GSTIN_STANDALONE.clone(), 0, Normalizer::Uppercase),
            ],
        );
        rules.insert(
            DocumentType::Coi,
            vec![
                ExtractionRule::new(CIN_LABELED.clone(), 1, Normalizer::Compact),
                ExtractionRule::new(CIN_STANDALONE.clone(), 0, Normalizer::Compact),
            ],
        );
        rules.insert(
            DocumentType::Udyam,
            vec![ExtractionRule::new(UDYAM_NUMBER.clone(), 0, Normalizer::Uppercase)],
        );
        rules.insert(
            DocumentType::Fssai,
            vec![ExtractionRule::new(FSSAI_LICENSE.clone(), 1, Normalizer::AsIs)],
        );
        rules.insert(
            DocumentType::Gumasta,
            vec![ExtractionRule::new(GUMASTA_REGISTRATION.clone(), 1, Normalizer::AsIs)],
        );
        rules.insert(
            DocumentType::Iec,
            vec![ExtractionRule::new(IEC_NUMBER.clone(), 1, Normalizer::AsIs)],
        );
        rules.insert(
            DocumentType::Tan,
            vec![ExtractionRule::new(TAN_NUMBER.clone(), 0, Normalizer::AsIs)],
        );
        rules.insert(
            DocumentType::TradeLicenseWb,
            vec![ExtractionRule::new(ENLISTMENT_NUMBER.clone(), 1, Normalizer::AsIs)],
        );

        Self { rules }
    }

    /// Extractor with no rules at all.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Append a rule after the existing ones for a type.
    pub fn with_rule(mut self, doc_type: DocumentType, rule: ExtractionRule) -> Self {
        self.rules.entry(doc_type).or_default().push(rule);
        self
    }

    /// Replace every rule for a type.
    pub fn with_rules(mut self, doc_type: DocumentType, rules: Vec<ExtractionRule>) -> Self {
        self.rules.insert(doc_type, rules);
        self
    }

    /// Rules for a type, in evaluation order.
    pub fn rules_for(&self, doc_type: DocumentType) -> &[ExtractionRule] {
        self.rules.get(&doc_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pull the registration number for `doc_type` out of `text`.
    pub fn extract(&self, doc_type: DocumentType, text: &str) -> ExtractionRecord {
        for (i, rule) in self.rules_for(doc_type).iter().enumerate() {
            if let Some(id) = rule.apply(text) {
                debug!("{} rule {} matched: {}", doc_type, i, id);
                return ExtractionRecord::found(doc_type, id);
            }
            trace!("{} rule {} did not match", doc_type, i);
        }

        debug!("No {} identifier found", doc_type);
        ExtractionRecord::not_found(doc_type)
    }
}

impl Default for RegistrationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NOT_FOUND;

    fn extract(doc_type: DocumentType, text: &str) -> String {
        RegistrationExtractor::new().extract(doc_type, text).id_number
    }

    #[test]
    fn test_gstin_labeled() {
        assert_eq!(
            extract(
                DocumentType::Gst,
                "Form GST REG-06 Registration Number : 27AAAAA1111A1Z5"
            ),
            "27AAAAA1111A1Z5"
        );
        assert_eq!(
            extract(DocumentType::Gst, "gstin: 29abcde1234f1z5"),
            "29ABCDE1234F1Z5"
        );
    }

    #[test]
    fn test_gstin_standalone_uses_whole_match() {
        assert_eq!(
            extract(DocumentType::Gst, "Certificate 07AAACR5055K1Z3 issued"),
            "07AAACR5055K1Z3"
        );
    }

    #[test]
    fn test_gstin_first_rule_wins() {
        let text = "07AAACR5055K1Z3 appears first but GSTIN 27AAAAA1111A1Z5 is labeled";
        assert_eq!(extract(DocumentType::Gst, text), "27AAAAA1111A1Z5");
    }

    #[test]
    fn test_cin_whitespace_stripped() {
        assert_eq!(
            extract(
                DocumentType::Coi,
                "Corporate Identity Number : U72900 MH2015 PTC123456"
            ),
            "U72900MH2015PTC123456"
        );
        assert_eq!(
            extract(DocumentType::Coi, "company L17110MH1973PLC019786 limited"),
            "L17110MH1973PLC019786"
        );
    }

    #[test]
    fn test_udyam() {
        assert_eq!(
            extract(DocumentType::Udyam, "Udyam Registration Number udyam-mh-33-0012345"),
            "UDYAM-MH-33-0012345"
        );
    }

    #[test]
    fn test_fssai_iec_trade_license() {
        assert_eq!(
            extract(DocumentType::Fssai, "License Number : 11521999000123 valid"),
            "11521999000123"
        );
        assert_eq!(
            extract(DocumentType::Iec, "IEC Number 0515012345"),
            "0515012345"
        );
        assert_eq!(
            extract(
                DocumentType::TradeLicenseWb,
                "Certificate of Enlistment CE No. 004512345678"
            ),
            "004512345678"
        );
    }

    #[test]
    fn test_gumasta_registration() {
        assert_eq!(
            extract(DocumentType::Gumasta, "Registration No: 760271234/CE/2020"),
            "760271234/CE/2020"
        );
        assert_eq!(extract(DocumentType::Gumasta, "FORM F ESTABLISHMENTS"), NOT_FOUND);
    }

    #[test]
    fn test_tan_is_case_sensitive() {
        assert_eq!(extract(DocumentType::Tan, "TAN MUMA12345C"), "MUMA12345C");
        assert_eq!(extract(DocumentType::Tan, "tan muma12345c"), NOT_FOUND);
    }

    #[test]
    fn test_types_without_rules() {
        for doc_type in [
            DocumentType::Ekarmika,
            DocumentType::DrugLicense,
            DocumentType::Ptec,
            DocumentType::PartnershipDeed,
        ] {
            let record = extract(doc_type, "27AAAAA1111A1Z5 MUMA12345C 11521999000123");
            assert_eq!(record, NOT_FOUND);
        }
    }

    #[test]
    fn test_with_rule_appends() {
        let extractor = RegistrationExtractor::new().with_rule(
            DocumentType::Ptec,
            ExtractionRule::new(
                Regex::new(r"PTEC\s*(\d{11})").unwrap(),
                1,
                Normalizer::AsIs,
            ),
        );
        let record = extractor.extract(DocumentType::Ptec, "PTEC 99512345678");
        assert!(record.is_found());
        assert_eq!(record.id_number, "99512345678");
        assert_eq!(extractor.rules_for(DocumentType::Ptec).len(), 1);
    }

    #[test]
    fn test_with_rules_replaces() {
        let extractor = RegistrationExtractor::new().with_rules(DocumentType::Gst, Vec::new());
        assert_eq!(
            extractor.extract(DocumentType::Gst, "GSTIN 27AAAAA1111A1Z5").id_number,
            NOT_FOUND
        );
    }

    #[test]
    fn test_normalizers() {
        assert_eq!(Normalizer::Compact.apply(" u 729\n00 "), "U72900");
        assert_eq!(Normalizer::Uppercase.apply("abc 1"), "ABC 1");
        assert_eq!(Normalizer::AsIs.apply("abc 1"), "abc 1");
    }
}
