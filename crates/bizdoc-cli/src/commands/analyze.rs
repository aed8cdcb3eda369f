//! Analyze command - classify a single document and extract its registration number.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use super::{build_analyzer, build_ocr, format_result, load_config, resolve_model_dirs, OutputFormat};

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input file (image or scanned PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Use OCR output from a JSON file instead of running OCR
    #[arg(long)]
    ocr_json: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Classifier model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// OCR model directory
    #[arg(long)]
    ocr_model_dir: Option<PathBuf>,
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    resolve_model_dirs(&mut config);
    if let Some(dir) = &args.model_dir {
        config.classifier.model_dir = dir.clone();
    }
    if let Some(dir) = &args.ocr_model_dir {
        config.ocr.model_dir = dir.clone();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Analyzing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );

    pb.set_message("Loading OCR...");
    let ocr = build_ocr(&config, args.ocr_json.as_deref())?;

    pb.set_message("Loading classifier...");
    let analyzer = build_analyzer(&config);

    pb.set_message("Analyzing document...");
    let result = analyzer.analyze_path(&args.input, ocr.as_ref());
    pb.finish_and_clear();
    analyzer.shutdown();

    let result = result?;
    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output.trim_end());
    }

    debug!("Total processing time: {:?}", start.elapsed());
    eprintln!(
        "{} {} in {}ms",
        style("ℹ").blue(),
        result.status,
        start.elapsed().as_millis()
    );

    Ok(())
}
