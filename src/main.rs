use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use pageocr::core::model::{ExtractionReport, RunOutcome};
use pageocr::ocr::{BridgeConfig, OcrBridge, PageRenderer};
use pageocr::pipeline::{run_document, run_image, PipelineConfig};

const PREVIEW_SEGMENTS: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "pageocr")]
#[command(version, about = "Extract text from scanned PDFs or images with PaddleOCR", long_about = None)]
struct Cli {
    /// PDF to process; takes priority over the image when both exist
    #[arg(long, default_value = "pdfs/A.pdf")]
    pdf: PathBuf,

    /// Image to process when the PDF is missing
    #[arg(long, default_value = "pdfs/Ali_Lazraq.jpg")]
    image: PathBuf,

    /// Directory for the extraction report
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Directory for temporary page images (default: output directory)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Rendering DPI for PDF pages
    #[arg(long, default_value_t = 300)]
    dpi: u32,

    /// Longest image side passed to the OCR engine
    #[arg(long, default_value_t = 1200)]
    max_dimension: u32,

    /// OCR language
    #[arg(long, default_value = "en")]
    lang: String,

    /// Python interpreter running the OCR bridge
    #[arg(long, env = "PAGEOCR_PYTHON", default_value = "python3")]
    python: PathBuf,

    /// OCR bridge script
    #[arg(long, env = "PAGEOCR_SCRIPT", default_value = "bridge/paddle_bridge.py")]
    script: PathBuf,

    /// Also write the report as JSON
    #[arg(long)]
    json: bool,

    /// Only log warnings and skip the summary
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let pdf_exists = cli.pdf.is_file();
    let image_exists = cli.image.is_file();

    if !cli.quiet {
        println!("[*] PDF file ({}): {}", cli.pdf.display(), found_label(pdf_exists));
        println!(
            "[*] Image file ({}): {}",
            cli.image.display(),
            found_label(image_exists)
        );
    }

    let input = if pdf_exists {
        cli.pdf.clone()
    } else if image_exists {
        cli.image.clone()
    } else {
        eprintln!("[!] No files found to process. Please ensure one of these files exists:");
        eprintln!("    - {}", cli.pdf.display());
        eprintln!("    - {}", cli.image.display());
        anyhow::bail!("no input files found");
    };

    let mut config = PipelineConfig::new(input.clone(), cli.output.clone())
        .with_dpi(cli.dpi)
        .with_max_dimension(cli.max_dimension)
        .with_json(cli.json);
    if let Some(scratch_dir) = cli.scratch_dir.clone() {
        config = config.with_scratch_dir(scratch_dir);
    }

    let bridge = BridgeConfig::default()
        .with_python(cli.python.clone())
        .with_script(cli.script.clone())
        .with_lang(cli.lang.clone());
    let connect = || OcrBridge::spawn(&bridge);

    if !cli.quiet {
        println!("\n[*] Processing: {}", input.display());
    }

    let result = if pdf_exists {
        let renderer = PageRenderer::new(config.scratch_dir.clone(), config.dpi);
        run_document(&config, &renderer, connect)
    } else {
        run_image(&config, connect)
    };
    let outcome = result.with_context(|| format!("Failed to process: {}", input.display()))?;

    match outcome {
        RunOutcome::NotFound(path) => {
            anyhow::bail!("File not found: {}", path.display());
        }
        RunOutcome::ConversionFailed { path, reason } => {
            anyhow::bail!("Failed to convert {} to images: {reason}", path.display());
        }
        RunOutcome::NoText { pages } => {
            println!("[!] No text extracted from {} page(s)", pages.len());
        }
        RunOutcome::Completed { report, written } => {
            if !cli.quiet {
                print_summary(&report);
                for path in &written {
                    println!("[✓] Results saved to: {}", path.display());
                }
            }
        }
    }

    Ok(())
}

fn init_logging(quiet: bool) {
    let default_filter = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn found_label(exists: bool) -> &'static str {
    if exists {
        "found"
    } else {
        "not found"
    }
}

fn print_summary(report: &ExtractionReport) {
    let stats = &report.stats;
    println!(
        "\n[+] Extracted {} text segments from {} page(s)",
        stats.segments, stats.pages
    );

    println!("\nPage summary:");
    for page in &report.pages {
        match &page.failure {
            Some(reason) => println!("   Page {}: failed ({reason})", page.page),
            None => println!("   Page {}: {} segments", page.page, page.segments.len()),
        }
    }

    println!("\nFirst {PREVIEW_SEGMENTS} text segments:");
    println!("{}", "-".repeat(50));
    for (i, segment) in report.segments().take(PREVIEW_SEGMENTS).enumerate() {
        println!(
            "{:2}. {} (conf: {:.3})",
            i + 1,
            segment.text,
            segment.confidence
        );
    }
    if stats.segments > PREVIEW_SEGMENTS {
        println!("   ... and {} more segments", stats.segments - PREVIEW_SEGMENTS);
    }

    println!("\nSummary:");
    println!("   Total pages processed: {}", stats.pages);
    println!("   Total text segments: {}", stats.segments);
    println!("   Total characters: {}", stats.characters);
    println!("   Average confidence: {:.3}", stats.mean_confidence);
    println!("   OCR time: {:.2} seconds", report.processing_secs);
}
