use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use qrarchive::config::{ArchiveConfig, DEFAULT_CONFIG_FILE};
use qrarchive::optical::{QrRenderer, QrScanner};
use qrarchive::pipeline::{encode_file, inspect_dir, restore_dir};
use qrarchive::progress::TracingProgress;
use qrarchive::{ChunkOrdering, EncodeReport, InspectReport, RestoreReport};

#[derive(Parser)]
#[command(name = "qrarchive")]
#[command(about = "Convert binary files to QR codes and restore them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Config file path")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Output as JSON")]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a file to QR codes
    Encode {
        /// File to convert
        file: PathBuf,
        #[arg(short, long, help = "Output directory")]
        output: Option<PathBuf>,
        #[arg(short, long, help = "Chunk size (bytes)")]
        chunk_size: Option<usize>,
    },
    /// Restore a file from QR codes
    Decode {
        /// Directory holding the QR codes
        qrdir: PathBuf,
        #[arg(short, long, help = "Output directory")]
        output: Option<PathBuf>,
        #[arg(long, value_enum, help = "Chunk ordering")]
        ordering: Option<ChunkOrdering>,
        #[arg(long, help = "Exit with an error if any warning was raised")]
        strict: bool,
    },
    /// Check a QR code directory without restoring
    Inspect {
        qrdir: PathBuf,
    },
    GenerateConfig {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE, help = "Config file path")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qrarchive=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ArchiveConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Encode { file, output, chunk_size } => {
            if let Some(chunk_size) = chunk_size {
                config.chunk_size = chunk_size;
            }
            let output = output.unwrap_or_else(|| config.artifact_dir.clone());
            let renderer = QrRenderer::new(config.qr.clone());

            match encode_file(&file, &output, &config, renderer, TracingProgress::shared()).await {
                Ok(report) => print_encode(&report, cli.json)?,
                Err(e) => {
                    error!("encode failed: {}", e);
                    exit_with_failure("Encoding failed", &e, cli.json)
                }
            }
        }
        Commands::Decode { qrdir, output, ordering, strict } => {
            if let Some(ordering) = ordering {
                config.ordering = ordering;
            }
            let output = output.unwrap_or_else(|| config.restore_dir.clone());

            match restore_dir(&qrdir, &output, &config, QrScanner::new(), TracingProgress::shared()).await {
                Ok(report) => {
                    print_restore(&report, cli.json)?;
                    if strict && !report.is_clean() {
                        anyhow::bail!("restore finished with {} warning(s)", report.warnings.len());
                    }
                }
                Err(e) => {
                    error!("decode failed: {}", e);
                    exit_with_failure("Restore failed", &e, cli.json)
                }
            }
        }
        Commands::Inspect { qrdir } => {
            match inspect_dir(&qrdir, &config, QrScanner::new(), TracingProgress::shared()).await {
                Ok(report) => print_inspect(&report, cli.json)?,
                Err(e) => exit_with_failure("Inspection failed", &e, cli.json),
            }
        }
        Commands::GenerateConfig { output } => {
            ArchiveConfig::default().save(&output)?;
            if cli.json {
                println!("{}", serde_json::json!({"success": true, "config_file": output}));
            } else {
                println!("✅ Wrote default configuration to {}", output.display());
            }
        }
    }

    Ok(())
}

/// Report a fatal error once and exit non-zero.
fn exit_with_failure(title: &str, e: &qrarchive::ArchiveError, json: bool) -> ! {
    if json {
        println!("{}", serde_json::json!({"error": e.to_string()}));
    } else {
        eprintln!("❌ {}: {}", title, e);
    }
    std::process::exit(1)
}

fn print_encode(report: &EncodeReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("📦 QR Codes Created");
    println!("==================");
    println!("   File: {} ({} bytes)", report.file_name, report.file_size);
    println!("   Chunks: {} x {} bytes", report.total_chunks, report.chunk_size);
    println!("   QR codes: {} (including header)", report.artifacts);
    println!("   Output: {}", report.output_dir.display());
    println!("   SHA-256: {}", report.sha256);
    Ok(())
}

fn print_restore(report: &RestoreReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("🔄 File Restored");
    println!("================");
    for warning in &report.warnings {
        println!("⚠️  {}", warning);
    }
    if report.is_clean() {
        println!("✅ Restored {}", report.output_path.display());
    } else {
        println!("⚠️  Restored with warnings: {}", report.output_path.display());
    }
    println!("   Size: {} / {} bytes", report.restored_size, report.expected_size);
    println!("   Chunks used: {}", report.chunks_used);
    println!("   SHA-256: {}", report.sha256);
    Ok(())
}

fn print_inspect(report: &InspectReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("🔍 QR Archive Inspection");
    println!("========================");
    println!("   File: {} ({} bytes)", report.file_name, report.file_size);
    match report.total_chunks {
        Some(total) => println!("   Chunks: {} of {} readable", report.present.len(), total),
        None => println!("   Chunks: none readable"),
    }
    println!("   Chunk artifacts: {}", report.chunk_artifacts);
    if report.warnings.is_empty() {
        println!("✅ Archive is complete");
    } else {
        for warning in &report.warnings {
            println!("⚠️  {}", warning);
        }
    }
    Ok(())
}
