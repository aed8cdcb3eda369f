//! Batch command - analyze many documents concurrently.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use bizdoc_core::input::is_supported;
use bizdoc_core::{AnalysisResult, OcrProvider, PrecomputedOcr, RawOcr};

use super::{
    build_analyzer, build_ocr, format_result, load_config, resolve_model_dirs, CliAnalyzer,
    OutputFormat,
};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Directory of precomputed OCR files named `<file stem>.json`
    #[arg(long)]
    ocr_dir: Option<PathBuf>,

    /// Classifier model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// OCR model directory
    #[arg(long)]
    ocr_model_dir: Option<PathBuf>,
}

/// Outcome of analyzing a single file.
struct FileOutcome {
    path: PathBuf,
    result: Option<AnalysisResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    resolve_model_dirs(&mut config);
    if let Some(dir) = &args.model_dir {
        config.classifier.model_dir = dir.clone();
    }
    if let Some(dir) = &args.ocr_model_dir {
        config.ocr.model_dir = dir.clone();
    }

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to analyze",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    // Models are loaded once, before any document is analyzed.
    let engine: Option<Arc<dyn OcrProvider>> = match args.ocr_dir {
        Some(_) => None,
        None => Some(Arc::from(build_ocr(&config, None)?)),
    };
    let analyzer = Arc::new(build_analyzer(&config));

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    // One task per file; the semaphore bounds how many analyze at once.
    let (tx, mut rx) = tokio::sync::mpsc::channel(files.len());
    let semaphore = Arc::new(tokio::sync::Semaphore::new(args.jobs.max(1)));

    for path in files {
        let tx = tx.clone();
        let semaphore = Arc::clone(&semaphore);
        let analyzer = Arc::clone(&analyzer);
        let engine = engine.clone();
        let ocr_dir = args.ocr_dir.clone();

        tokio::spawn(async move {
            let _permit = semaphore.acquire().await;
            let file_start = Instant::now();

            let task_path = path.clone();
            let result = tokio::task::spawn_blocking(move || {
                analyze_file(&task_path, &analyzer, engine.as_deref(), ocr_dir.as_deref())
            })
            .await
            .unwrap_or_else(|e| Err(anyhow::anyhow!("worker panicked: {}", e)));

            let (result, error) = match result {
                Ok(result) => (Some(result), None),
                Err(e) => (None, Some(format!("{:#}", e))),
            };

            let _ = tx
                .send(FileOutcome {
                    path,
                    result,
                    error,
                    processing_time_ms: file_start.elapsed().as_millis() as u64,
                })
                .await;
        });
    }
    drop(tx);

    let mut outcomes = Vec::new();
    while let Some(outcome) = rx.recv().await {
        pb.inc(1);
        if let Some(error_msg) = &outcome.error {
            if args.continue_on_error {
                warn!("Failed to analyze {}: {}", outcome.path.display(), error_msg);
            } else {
                pb.abandon();
                error!("Failed to analyze {}: {}", outcome.path.display(), error_msg);
                anyhow::bail!("Analysis of {} failed: {}", outcome.path.display(), error_msg);
            }
        }
        outcomes.push(outcome);
    }

    pb.finish_with_message("Complete");
    outcomes.sort_by(|a, b| a.path.cmp(&b.path));

    match Arc::try_unwrap(analyzer) {
        Ok(analyzer) => analyzer.shutdown(),
        Err(_) => debug!("Analyzer still shared, skipping shutdown"),
    }

    if let Some(output_dir) = &args.output_dir {
        let paths: Vec<&Path> = outcomes.iter().map(|o| o.path.as_path()).collect();
        for (outcome, output_name) in outcomes.iter().zip(output_stems(&paths)) {
            if let Some(result) = &outcome.result {
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_result(result, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = outcomes.iter().filter(|o| o.error.is_some()).collect();
    let review = outcomes
        .iter()
        .filter(|o| o.result.as_ref().is_some_and(|r| r.needs_review()))
        .count();

    println!();
    println!(
        "{} Analyzed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} valid, {} need review, {} failed",
        style(outcomes.len() - failed.len() - review).green(),
        style(review).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            println!(
                "  - {}: {}",
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn analyze_file(
    path: &Path,
    analyzer: &CliAnalyzer,
    engine: Option<&dyn OcrProvider>,
    ocr_dir: Option<&Path>,
) -> anyhow::Result<AnalysisResult> {
    match (ocr_dir, engine) {
        (Some(dir), _) => {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            let raw = RawOcr::from_json_file(&dir.join(format!("{}.json", stem)))?;
            Ok(analyzer.analyze_path(path, &PrecomputedOcr::new(raw))?)
        }
        (None, Some(engine)) => Ok(analyzer.analyze_path(path, engine)?),
        (None, None) => anyhow::bail!("no OCR provider configured"),
    }
}

/// Output file stem for each input.
///
/// Inputs sharing a stem are prefixed with their parent directory name, then
/// numbered if the names still collide.
fn output_stems(paths: &[&Path]) -> Vec<String> {
    let stem = |path: &Path| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string()
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    for path in paths {
        *counts.entry(stem(*path)).or_default() += 1;
    }

    let mut used = HashSet::new();
    paths
        .iter()
        .map(|path| {
            let base = stem(*path);
            let base = match path.parent().and_then(|d| d.file_name()).and_then(|s| s.to_str()) {
                Some(dir) if counts[&base] > 1 => format!("{}_{}", dir, base),
                _ => base,
            };

            let mut name = base.clone();
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!("{}_{}", base, n);
                n += 1;
            }
            if name != stem(*path) {
                debug!("Writing {} as {}", path.display(), name);
            }
            name
        })
        .collect()
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "type",
        "confidence",
        "id_number",
        "processing_time_ms",
        "error",
    ])?;

    for outcome in outcomes {
        let filename = outcome
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(result) = &outcome.result {
            wtr.write_record([
                filename,
                &result.status.to_string(),
                result.doc_type.as_str(),
                &result.confidence_display,
                &result.data.id_number,
                &outcome.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "ERROR",
                "",
                "",
                "",
                &outcome.processing_time_ms.to_string(),
                outcome.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
