use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Workspace with a config pointing at empty model dirs, so no test depends
/// on models installed on the machine.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = serde_json::json!({
            "ocr": { "model_dir": dir.path().join("no-ocr-models") },
            "classifier": { "model_dir": dir.path().join("no-classifier") },
        });
        std::fs::write(dir.path().join("config.json"), config.to_string()).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self) -> String {
        self.path("config.json").display().to_string()
    }

    fn scan(&self, name: &str) -> PathBuf {
        let path = self.path(name);
        image::RgbImage::from_pixel(400, 300, image::Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();
        path
    }

    fn ocr(&self, name: &str, text: &str) -> PathBuf {
        let words: Vec<&str> = text.split_whitespace().collect();
        let boxes: Vec<[f32; 4]> = (0..words.len())
            .map(|i| [i as f32 * 30.0, 20.0, i as f32 * 30.0 + 25.0, 40.0])
            .collect();
        let json = serde_json::json!({
            "words": words,
            "boxes": boxes,
            "width": 400,
            "height": 300,
        });
        let path = self.path(name);
        std::fs::write(&path, json.to_string()).unwrap();
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("bizdoc").unwrap();
        cmd.arg("--config").arg(self.config());
        cmd
    }
}

fn arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn test_analyze_gst_json() {
    let fx = Fixture::new();
    let scan = fx.scan("gst.png");
    let ocr = fx.ocr(
        "gst.json",
        "Form GST REG-06 Registration Certificate Registration Number : 27AAAAA1111A1Z5",
    );

    fx.cmd()
        .args(["analyze", &arg(&scan), "--ocr-json", &arg(&ocr)])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"Type":"GST","Confidence":"100% (Rule-Based)","Status":"VALID","Data":{"type":"GST","id_number":"27AAAAA1111A1Z5"}}"#,
        ));
}

#[test]
fn test_analyze_text_format() {
    let fx = Fixture::new();
    let scan = fx.scan("gumasta.png");
    let ocr = fx.ocr("gumasta.json", "Gumasta licence Mumbai");

    fx.cmd()
        .args(["analyze", &arg(&scan), "--ocr-json", &arg(&ocr), "-f", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Type:       GUMASTA"))
        .stdout(predicate::str::contains("REVIEW_REQUIRED"))
        .stdout(predicate::str::contains("Not Found"));
}

#[test]
fn test_analyze_writes_output_file() {
    let fx = Fixture::new();
    let scan = fx.scan("tan.png");
    let ocr = fx.ocr("tan.json", "TAN allotment tax deduction MUMA12345C");
    let out = fx.path("tan.csv");

    fx.cmd()
        .args([
            "analyze",
            &arg(&scan),
            "--ocr-json",
            &arg(&ocr),
            "-f",
            "csv",
            "-o",
            &arg(&out),
        ])
        .assert()
        .success();

    let csv = std::fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("type,confidence,status,id_number"));
    assert!(csv.contains("TAN,100% (Rule-Based),VALID,MUMA12345C"));
}

#[test]
fn test_analyze_unrecognized_without_model_fails() {
    let fx = Fixture::new();
    let scan = fx.scan("unknown.png");
    let ocr = fx.ocr("unknown.json", "blurry letterhead");

    fx.cmd()
        .args(["analyze", &arg(&scan), "--ocr-json", &arg(&ocr)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("classifier unavailable"));
}

#[test]
fn test_analyze_missing_input() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["analyze", &arg(&fx.path("missing.png"))])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_batch_summary() {
    let fx = Fixture::new();
    let scans = fx.path("scans");
    let ocr_dir = fx.path("ocr");
    let out = fx.path("out");
    std::fs::create_dir_all(&scans).unwrap();
    std::fs::create_dir_all(&ocr_dir).unwrap();

    fx.scan("scans/fssai.png");
    fx.ocr("ocr/fssai.json", "FSSAI License No. 11521999000123");
    fx.scan("scans/coi.png");
    fx.ocr(
        "ocr/coi.json",
        "Certificate of Incorporation Corporate Identity Number U72900 MH2015 PTC123456",
    );
    fx.scan("scans/blank.png");
    fx.ocr("ocr/blank.json", "");

    fx.cmd()
        .args([
            "batch",
            &format!("{}/*.png", arg(&scans)),
            "--ocr-dir",
            &arg(&ocr_dir),
            "-o",
            &arg(&out),
            "--summary",
            "--continue-on-error",
            "-j",
            "2",
        ])
        .assert()
        .success();

    let summary = std::fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(
        lines[0],
        "filename,status,type,confidence,id_number,processing_time_ms,error"
    );
    assert!(lines[1].starts_with("blank.png,ERROR,"));
    assert!(lines[2].starts_with("coi.png,VALID,COI,100% (Rule-Based),U72900MH2015PTC123456,"));
    assert!(lines[3].starts_with("fssai.png,VALID,FSSAI,100% (Rule-Based),11521999000123,"));

    assert!(out.join("coi.json").exists());
    assert!(!out.join("blank.json").exists());
}

#[test]
fn test_batch_stops_on_error() {
    let fx = Fixture::new();
    let scans = fx.path("scans");
    std::fs::create_dir_all(&scans).unwrap();
    std::fs::create_dir_all(fx.path("ocr")).unwrap();
    fx.scan("scans/blank.png");
    fx.ocr("ocr/blank.json", "");

    fx.cmd()
        .args([
            "batch",
            &format!("{}/*.png", arg(&scans)),
            "--ocr-dir",
            &arg(&fx.path("ocr")),
        ])
        .assert()
        .failure();
}

#[test]
fn test_models_labels() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["models", "labels"])
        .assert()
        .success()
        .stdout(predicate::str::contains(" 0  GST"))
        .stdout(predicate::str::contains("11  PARTNERSHIP_DEED"));
}

#[test]
fn test_models_status_reports_missing() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["models", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("missing"));
}

#[test]
fn test_config_set_and_get() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["config", "set", "classifier.max_tokens", "256"])
        .assert()
        .success();

    fx.cmd()
        .args(["config", "get", "classifier.max_tokens"])
        .assert()
        .success()
        .stdout(predicate::str::contains("256"));

    fx.cmd()
        .args(["config", "set", "classifier.unknown", "1"])
        .assert()
        .failure();
}
