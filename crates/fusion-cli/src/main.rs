use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fusion_io::{load_image, output_name, save_image, FusionConfig, FusionReport, ImageAssessment};
use image_fusion::{FusionEngine, FusionMethod, Image, QualityAnalyzer};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imagefuse")]
#[command(about = "Fuse co-registered aerial captures into a single, more detailed composite")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fuse two or more images into one
    Fuse {
        /// Input images; the first one sets the output size
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Fusion method: weighted, laplacian or adaptive
        #[arg(short, long)]
        method: Option<String>,

        /// Per-image weight for the weighted method (repeat once per input)
        #[arg(short, long = "weight")]
        weights: Vec<f64>,

        /// Output image path (.jpg or .png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JPEG quality (1-100)
        #[arg(long)]
        quality: Option<u8>,

        /// Write the quality report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Skip writing the quality report
        #[arg(long, conflicts_with = "report")]
        no_report: bool,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print quality metrics for one or more images
    Analyze {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Fuse { inputs, method, weights, output, quality, report, no_report, config } => {
            let mut config = match config {
                Some(path) => FusionConfig::from_file(&path)?,
                None => FusionConfig::default(),
            };
            if let Some(method) = method {
                config.method = method.parse::<FusionMethod>()?;
            }
            if !weights.is_empty() {
                config.weights = Some(weights);
            }
            if let Some(quality) = quality {
                config.jpeg_quality = quality;
            }
            if no_report {
                config.write_report = false;
            }
            fuse_files(&inputs, &config, output, report)
        }
        Commands::Analyze { inputs, json } => analyze_files(&inputs, json),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();
}

fn load_all(paths: &[PathBuf]) -> Result<Vec<Image>> {
    paths
        .iter()
        .map(|path| {
            let image = load_image(path)?;
            debug!(
                "Loaded {} ({}x{}, {:?})",
                path.display(),
                image.width(),
                image.height(),
                image.channels()
            );
            Ok(image)
        })
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn fuse_files(
    inputs: &[PathBuf],
    config: &FusionConfig,
    output: Option<PathBuf>,
    report_path: Option<PathBuf>,
) -> Result<()> {
    if inputs.len() < config.method.min_images() {
        warn!("{} fusion needs at least 2 images; the input will be passed through", config.method);
    }

    let images = load_all(inputs)?;
    println!("📸 Loaded {} images", images.len());

    let weights = match (&config.weights, config.method) {
        (Some(w), FusionMethod::Weighted) => Some(w.as_slice()),
        (Some(_), method) => {
            warn!("Weights are only used by the weighted method, ignoring them for {}", method);
            None
        }
        (None, _) => None,
    };

    println!("🎯 Fusing with {} method...", config.method);
    let result = FusionEngine::fuse(&images, config.method, weights)?;

    let output_path = match output {
        Some(path) => path,
        None => config.output_dir.join(output_name(inputs, config.method)?),
    };
    save_image(&result.image, &output_path, config.jpeg_quality)?;
    println!("💾 Fused image saved to: {}", output_path.display());

    let names: Vec<String> = inputs.iter().map(|p| display_name(p)).collect();
    let report = FusionReport::build(&names, &images, &result, &display_name(&output_path));
    print_report(&report);

    let report_path = match report_path {
        Some(path) => Some(path),
        None if config.write_report => Some(output_path.with_extension("json")),
        None => None,
    };
    if let Some(path) = report_path {
        report.write_to(&path)?;
        println!("📝 Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_report(report: &FusionReport) {
    println!("\n📈 QUALITY REPORT");
    println!("=================");
    for input in &report.inputs {
        print_assessment("  ", input);
    }
    print_assessment("⭐", &report.fused);

    let sign = if report.improvement >= 0 { "+" } else { "" };
    println!("\nChange vs best input: {}{} points", sign, report.improvement);

    let hints = report.recommendations();
    if !hints.is_empty() {
        println!("\n💡 Recommendations:");
        for hint in hints {
            println!("  - {}", hint);
        }
    }
}

fn print_assessment(marker: &str, assessment: &ImageAssessment) {
    let m = &assessment.metrics;
    println!(
        "{} {:<32} {:>3}/100 {:<9} sharpness {:>8.1}  brightness {:>6.1}  contrast {:>5.1}  snr {:>6.2}  edges {:.3}",
        marker,
        assessment.name,
        assessment.score,
        assessment.rating.to_string(),
        m.sharpness,
        m.brightness,
        m.contrast,
        m.snr,
        m.edge_density
    );
}

fn analyze_files(inputs: &[PathBuf], json: bool) -> Result<()> {
    let images = load_all(inputs)?;
    if images.is_empty() {
        bail!("No images to analyze");
    }

    let metrics = QualityAnalyzer::new().analyze_batch(&images);
    let assessments: Vec<ImageAssessment> = inputs
        .iter()
        .zip(metrics)
        .map(|(path, m)| ImageAssessment::new(display_name(path), m))
        .collect();

    if json {
        let text = serde_json::to_string_pretty(&assessments).context("Failed to serialize metrics to JSON")?;
        println!("{}", text);
    } else {
        for assessment in &assessments {
            print_assessment("  ", assessment);
        }
    }
    Ok(())
}
