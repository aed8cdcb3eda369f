//! Models command - check model files and show the label taxonomy.

use std::fs;
use std::path::Path;

use clap::{Args, Subcommand};
use console::style;

use bizdoc_core::{BizdocConfig, DocumentType};

use super::{load_config, resolve_model_dirs};

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// Check that the configured OCR and classifier files are present
    Status,

    /// List classifier labels in model output order
    Labels,
}

pub async fn run(args: ModelsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Status => {
            let mut config = load_config(config_path)?;
            resolve_model_dirs(&mut config);
            check_status(&config)
        }
        ModelsCommand::Labels => list_labels(),
    }
}

fn check_status(config: &BizdocConfig) -> anyhow::Result<()> {
    println!("{}", style("Model Status").bold());
    println!();

    let ocr_ready = print_group("OCR", &config.ocr.model_dir, &config.ocr.model_files())?;
    println!();

    let classifier_files = [config.classifier.model_path(), config.classifier.vocab_path()];
    let classifier_ready = if config.classifier.enabled {
        print_group("Classifier", &config.classifier.model_dir, &classifier_files)?
    } else {
        println!(
            "{} {} {}",
            style("▸ Classifier").bold(),
            config.classifier.model_dir.display(),
            style("(disabled)").dim()
        );
        false
    };
    println!();

    if !ocr_ready {
        println!(
            "{} Without OCR models, pass precomputed OCR with --ocr-json.",
            style("⚠").yellow()
        );
    }
    if !classifier_ready {
        println!(
            "{} Without the classifier, documents the keyword rules miss will fail.",
            style("⚠").yellow()
        );
    }

    Ok(())
}

/// Print one model group; returns whether every file is present.
fn print_group(name: &str, dir: &Path, files: &[std::path::PathBuf]) -> anyhow::Result<bool> {
    println!("{} {}", style(format!("▸ {}", name)).bold(), dir.display());

    let mut all_present = true;
    let mut total_size: u64 = 0;

    for path in files {
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        if path.exists() {
            let size = fs::metadata(path)?.len();
            total_size += size;
            println!("    {} {:<28} {:>10}", style("✓").green(), filename, format_size(size));
        } else {
            all_present = false;
            println!("    {} {:<28} {:>10}", style("✗").red(), filename, "missing");
        }
    }

    if all_present {
        println!(
            "    {} Ready ({} total)",
            style("✓").green(),
            format_size(total_size)
        );
    }

    Ok(all_present)
}

fn list_labels() -> anyhow::Result<()> {
    for doc_type in DocumentType::ALL {
        println!("{:>2}  {}", doc_type.index(), doc_type);
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1}GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{}B", bytes)
    }
}
