//! Keyword rules that classify a document without the model.
//!
//! Rules live in an ordered table. Evaluation stops at the first rule whose
//! conditions hold, so table order decides between documents that carry
//! keywords of several types (a GST certificate usually also prints a CIN).

use tracing::debug;

use crate::models::DocumentType;

/// One row of the heuristic table.
///
/// Conditions are substring tests against the upper-cased document text:
/// every group in `all_of` needs at least one of its keywords present, and
/// none of `none_of` may appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicRule {
    label: DocumentType,
    all_of: Vec<Vec<String>>,
    none_of: Vec<String>,
}

impl HeuristicRule {
    /// A rule for `label` with no conditions yet.
    pub fn new(label: DocumentType) -> Self {
        Self {
            label,
            all_of: Vec::new(),
            none_of: Vec::new(),
        }
    }

    /// Require at least one of these keywords.
    pub fn any_of(mut self, keywords: &[&str]) -> Self {
        self.all_of
            .push(keywords.iter().map(|k| k.to_uppercase()).collect());
        self
    }

    /// Require this keyword.
    pub fn requires(self, keyword: &str) -> Self {
        self.any_of(&[keyword])
    }

    /// Forbid this keyword.
    pub fn forbids(mut self, keyword: &str) -> Self {
        self.none_of.push(keyword.to_uppercase());
        self
    }

    /// Label assigned when the rule fires.
    pub fn label(&self) -> DocumentType {
        self.label
    }

    /// Whether the rule fires on already upper-cased text.
    pub fn matches(&self, upper_text: &str) -> bool {
        !self.all_of.is_empty()
            && self
                .all_of
                .iter()
                .all(|group| group.iter().any(|k| upper_text.contains(k.as_str())))
            && !self.none_of.iter().any(|k| upper_text.contains(k.as_str()))
    }
}

/// Ordered keyword classifier.
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    rules: Vec<HeuristicRule>,
}

impl HeuristicClassifier {
    /// Classifier with the built-in table.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Classifier with a caller-supplied table.
    pub fn with_rules(rules: Vec<HeuristicRule>) -> Self {
        Self { rules }
    }

    /// Append a rule at the lowest precedence.
    pub fn with_rule(mut self, rule: HeuristicRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Put a rule ahead of every existing one.
    pub fn with_priority_rule(mut self, rule: HeuristicRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// The table, in evaluation order.
    pub fn rules(&self) -> &[HeuristicRule] {
        &self.rules
    }

    /// Label of the first matching rule, or `None`.
    pub fn classify(&self, text: &str) -> Option<DocumentType> {
        let upper = text.to_uppercase();
        let label = self
            .rules
            .iter()
            .position(|rule| rule.matches(&upper))
            .map(|i| {
                debug!("Heuristic rule {} matched: {}", i, self.rules[i].label);
                self.rules[i].label
            });

        if label.is_none() {
            debug!("No heuristic rule matched");
        }
        label
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn default_rules() -> Vec<HeuristicRule> {
    use DocumentType::*;

    vec![
        HeuristicRule::new(Coi)
            .any_of(&["CORPORATE IDENTITY NUMBER", "CIN"])
            .forbids("GST"),
        HeuristicRule::new(Gst).requires("GST").requires("REG-06"),
        HeuristicRule::new(Udyam)
            .requires("UDYAM")
            .requires("REGISTRATION"),
        HeuristicRule::new(Fssai).requires("FSSAI"),
        HeuristicRule::new(Gumasta).requires("GUMASTA"),
        HeuristicRule::new(Gumasta)
            .requires("FORM F")
            .requires("ESTABLISHMENTS"),
        HeuristicRule::new(Ekarmika)
            .requires("KARNATAKA")
            .requires("FORM C"),
        HeuristicRule::new(DrugLicense).any_of(&["FORM 20", "DRUG"]),
        HeuristicRule::new(Iec).any_of(&["IMPORTER-EXPORTER", "IEC"]),
        HeuristicRule::new(Ptec).any_of(&["PROFESSION TAX", "FORM II"]),
        HeuristicRule::new(Tan).requires("TAN").requires("DEDUCTION"),
        HeuristicRule::new(TradeLicenseWb)
            .requires("KOLKATA MUNICIPAL")
            .requires("ENLISTMENT"),
        HeuristicRule::new(PartnershipDeed).requires("DEED OF PARTNERSHIP"),
    ]
}
