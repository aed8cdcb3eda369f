use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bizdoc_core::{
    Analyzer, ClassificationError, DocumentClassifier, DocumentType, HeuristicClassifier,
    HeuristicRule, ModelPrediction, PrecomputedOcr, Provenance, RawOcr, Status, Token,
    UnavailableClassifier, NOT_FOUND,
};
use image::DynamicImage;
use pretty_assertions::assert_eq;

/// Model stub that always answers with one label and counts its calls.
struct FixedClassifier {
    label: DocumentType,
    probability: f32,
    calls: AtomicUsize,
}

impl FixedClassifier {
    fn new(label: DocumentType, probability: f32) -> Self {
        Self {
            label,
            probability,
            calls: AtomicUsize::new(0),
        }
    }
}

impl DocumentClassifier for FixedClassifier {
    fn classify(
        &self,
        _image: &DynamicImage,
        tokens: &[Token],
    ) -> Result<ModelPrediction, ClassificationError> {
        assert!(!tokens.is_empty());
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rest = (1.0 - self.probability) / (DocumentType::COUNT - 1) as f32;
        let probabilities = DocumentType::ALL
            .iter()
            .map(|t| if *t == self.label { self.probability } else { rest })
            .collect();
        Ok(ModelPrediction {
            label: self.label,
            probabilities,
        })
    }
}

fn page(text: &str) -> RawOcr {
    let words: Vec<String> = text.split_whitespace().map(String::from).collect();
    let boxes = words
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let x = (i % 10) as f32 * 80.0;
            let y = (i / 10) as f32 * 30.0;
            [x, y, x + 70.0, y + 20.0]
        })
        .collect();
    RawOcr {
        words,
        boxes,
        width: 800,
        height: 1100,
    }
}

fn blank_image() -> DynamicImage {
    DynamicImage::new_rgb8(800, 1100)
}

#[test]
fn test_gst_certificate() {
    let analyzer = Analyzer::new(FixedClassifier::new(DocumentType::Udyam, 0.9));
    let result = analyzer
        .analyze(
            &blank_image(),
            &page("Government of India Form GST REG-06 Registration Certificate Registration Number : 27AAAAA1111A1Z5"),
        )
        .unwrap();

    assert_eq!(result.doc_type, DocumentType::Gst);
    assert_eq!(result.confidence_display, "100% (Rule-Based)");
    assert_eq!(result.status, Status::Valid);
    assert_eq!(result.data.id_number, "27AAAAA1111A1Z5");
    assert_eq!(
        result.classification.map(|c| c.provenance),
        Some(Provenance::RuleBased)
    );
    assert_eq!(analyzer.classifier().calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_gst_wins_over_other_keywords() {
    let analyzer = Analyzer::new(UnavailableClassifier::default());
    let result = analyzer
        .analyze(
            &blank_image(),
            &page("GST REG-06 CIN U72900MH2015PTC123456 UDYAM REGISTRATION FSSAI GSTIN 27AAAAA1111A1Z5"),
        )
        .unwrap();

    assert_eq!(result.doc_type, DocumentType::Gst);
    assert_eq!(result.data.id_number, "27AAAAA1111A1Z5");
}

#[test]
fn test_udyam_from_model() {
    let analyzer = Analyzer::new(FixedClassifier::new(DocumentType::Udyam, 0.62));
    let result = analyzer
        .analyze(&blank_image(), &page("Ministry letterhead ref 2021 UDYAM-MH-33-0012345"))
        .unwrap();

    assert_eq!(result.doc_type, DocumentType::Udyam);
    assert_eq!(result.confidence_display, "62.00% (AI)");
    assert_eq!(result.data.id_number, "UDYAM-MH-33-0012345");
    assert_eq!(result.status, Status::Valid);
    assert_eq!(analyzer.classifier().calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_gumasta_without_number_needs_review() {
    let analyzer = Analyzer::new(UnavailableClassifier::default());
    let result = analyzer
        .analyze(&blank_image(), &page("Gumasta licence Mumbai ward office"))
        .unwrap();

    assert_eq!(result.doc_type, DocumentType::Gumasta);
    assert_eq!(result.status, Status::ReviewRequired);
    assert_eq!(result.data.id_number, NOT_FOUND);
}

#[test]
fn test_coi_with_split_cin() {
    let analyzer = Analyzer::new(UnavailableClassifier::default());
    let result = analyzer
        .analyze(
            &blank_image(),
            &page("Certificate of Incorporation Corporate Identity Number U72900 MH2015 PTC123456"),
        )
        .unwrap();

    assert_eq!(result.doc_type, DocumentType::Coi);
    assert_eq!(result.data.id_number, "U72900MH2015PTC123456");
}

#[test]
fn test_serialized_result_is_stable() {
    let analyzer = Analyzer::new(FixedClassifier::new(DocumentType::Iec, 0.7315));
    let ocr = page("Form GST REG-06 GSTIN 29ABCDE1234F1Z5");

    let first = serde_json::to_string(&analyzer.analyze(&blank_image(), &ocr).unwrap()).unwrap();
    let second = serde_json::to_string(&analyzer.analyze(&blank_image(), &ocr).unwrap()).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first,
        r#"{"Type":"GST","Confidence":"100% (Rule-Based)","Status":"VALID","Data":{"type":"GST","id_number":"29ABCDE1234F1Z5"}}"#
    );
}

#[test]
fn test_custom_rule_table() {
    let heuristics = HeuristicClassifier::with_rules(vec![
        HeuristicRule::new(DocumentType::Ptec).requires("PTRC"),
    ]);
    let analyzer = Analyzer::new(UnavailableClassifier::default()).with_heuristics(heuristics);

    let result = analyzer
        .analyze(&blank_image(), &page("PTRC enrolment 27123456789P"))
        .unwrap();
    assert_eq!(result.doc_type, DocumentType::Ptec);
    assert_eq!(result.status, Status::ReviewRequired);
}

#[test]
fn test_concurrent_analyses_share_one_analyzer() {
    let analyzer = Arc::new(Analyzer::new(FixedClassifier::new(DocumentType::Ekarmika, 0.8)));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let analyzer = Arc::clone(&analyzer);
            std::thread::spawn(move || {
                let text = if i % 2 == 0 {
                    "TAN allotment deduction MUMA12345C"
                } else {
                    "unlabelled scan"
                };
                analyzer.analyze(&blank_image(), &page(text)).unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (i, result) in results.iter().enumerate() {
        let expected = if i % 2 == 0 {
            DocumentType::Tan
        } else {
            DocumentType::Ekarmika
        };
        assert_eq!(result.doc_type, expected);
    }
    assert_eq!(analyzer.classifier().calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_analyze_path_with_precomputed_ocr() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tan.png");
    let mut png = Vec::new();
    DynamicImage::new_rgb8(800, 1100)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(&path, png).unwrap();

    let analyzer = Analyzer::new(UnavailableClassifier::default());
    let ocr = PrecomputedOcr::new(page("Income Tax TAN allotment for tax deduction MUMA12345C"));
    let result = analyzer.analyze_path(&path, &ocr).unwrap();

    assert_eq!(result.doc_type, DocumentType::Tan);
    assert_eq!(result.data.id_number, "MUMA12345C");

    analyzer.shutdown();
}

/// Model stub that returns a prediction exactly as given.
struct RawClassifier(ModelPrediction);

impl DocumentClassifier for RawClassifier {
    fn classify(
        &self,
        _image: &DynamicImage,
        _tokens: &[Token],
    ) -> Result<ModelPrediction, ClassificationError> {
        Ok(self.0.clone())
    }
}

#[test]
fn test_malformed_model_predictions_fail() {
    let zero = RawClassifier(ModelPrediction {
        label: DocumentType::Gst,
        probabilities: vec![0.0; DocumentType::COUNT],
    });

    let mut skewed = vec![0.01; DocumentType::COUNT];
    skewed[DocumentType::Fssai.index()] = 0.89;
    let mislabeled = RawClassifier(ModelPrediction {
        label: DocumentType::Udyam,
        probabilities: skewed,
    });

    for classifier in [zero, mislabeled] {
        let analyzer = Analyzer::new(classifier);
        let result = analyzer.analyze(&blank_image(), &page("illegible scan"));
        assert!(matches!(
            result,
            Err(bizdoc_core::BizdocError::Classification(
                ClassificationError::MalformedOutput(_)
            ))
        ));
    }
}
