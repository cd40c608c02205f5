//! stripquant CLI — concentration readout from a test card photograph.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use stripquant::{Analyzer, AssayConfig, SamplingStrategy};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "stripquant")]
#[command(about = "Estimate analyte concentration from a test card photo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a card image.
    Analyze(CliAnalyzeArgs),

    /// Print the default configuration as JSON.
    PrintConfig,
}

#[derive(Debug, Clone, Args)]
struct CliAnalyzeArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Optional JSON configuration (missing fields take defaults).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write the full result (JSON).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Gaussian pre-blur sigma in pixels; 0 disables blurring.
    #[arg(long)]
    blur_sigma: Option<f32>,

    /// Erosion disk radius in pixels.
    #[arg(long)]
    erode_radius: Option<u8>,

    /// Use fixed-window median sampling with this half size (pixels)
    /// instead of region growing.
    #[arg(long)]
    window: Option<u32>,

    /// Seed for the k-means initialization.
    #[arg(long)]
    seed: Option<u64>,
}

impl CliAnalyzeArgs {
    fn to_config(&self) -> CliResult<AssayConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => AssayConfig::default(),
        };
        if let Some(sigma) = self.blur_sigma {
            config.blur_sigma = (sigma > 0.0).then_some(sigma);
        }
        if let Some(r) = self.erode_radius {
            config.segment.erode_radius = r;
        }
        if let Some(half) = self.window {
            config.sampling.strategy = SamplingStrategy::FixedWindow {
                half_width: half,
                half_height: half,
            };
        }
        if let Some(seed) = self.seed {
            config.cluster.seed = seed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn load_config(path: &Path) -> CliResult<AssayConfig> {
    AssayConfig::from_json_file(path).map_err(|e| {
        CliError::from(format!("Failed to load config {}: {}", path.display(), e))
    })
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::PrintConfig => run_print_config(),
    }
}

// ── print-config ───────────────────────────────────────────────────────

fn run_print_config() -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(&AssayConfig::default())?);
    Ok(())
}

// ── analyze ────────────────────────────────────────────────────────────

fn run_analyze(args: &CliAnalyzeArgs) -> CliResult<()> {
    tracing::info!("Loading image: {}", args.image.display());

    let img = image::open(&args.image).map_err(|e| {
        CliError::from(format!("Can't open image {}: {}", args.image.display(), e))
    })?;
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    if w == 0 || h == 0 {
        return Err(format!("Image {} is empty", args.image.display()).into());
    }
    tracing::info!("Image size: {}x{}", w, h);

    let analyzer = Analyzer::with_config(args.to_config()?);
    let result = analyzer.analyze(&rgb).map_err(|e| {
        tracing::warn!("Analysis failed; consider re-capturing the card");
        e
    })?;

    print!("{}", result);

    if let Some(out) = &args.out {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(out, &json)?;
        tracing::info!("Results written to {}", out.display());
    }

    Ok(())
}
