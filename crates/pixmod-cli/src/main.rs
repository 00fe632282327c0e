//! pixmod - apply a pixel transformation to a PNG file
//!
//! `pixmod <grey|hsv|blur|emboss> <input> <output>`

use anyhow::{bail, Context, Result};
use clap::Parser;
use pixmod_core::PixelBuffer;
use pixmod_ops::{
    AlphaMode, EdgeMode, EmbossMode, FilterPipeline, HsvMode, Operation, PipelineConfig,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pixmod")]
#[command(author, version, about = "Pixel transformations on PNG images")]
#[command(long_about = "
Applies one pixel transformation to a PNG image and writes the result as PNG.

Operations:
  grey     luminance greyscale (0.299 R + 0.587 G + 0.114 B)
  hsv      HSV conversion (H, S, V stored in R, G, B by default)
  blur     Gaussian blur, radius ceil(3 * sigma)
  emboss   3x3 relief around mid-grey

Examples:
  pixmod grey photo.png photo_grey.png
  pixmod blur photo.png soft.png --sigma 2.5 --edge mirror
  pixmod emboss photo.png relief.png --emboss-mode per-channel
  pixmod hsv photo.png same.png --hsv-mode round-trip
")]
struct Cli {
    /// Operation: grey, hsv, blur, emboss
    operation: String,

    /// Input PNG
    input: PathBuf,

    /// Output PNG
    output: PathBuf,

    /// Gaussian standard deviation for blur
    #[arg(long, default_value_t = pixmod_ops::kernel::DEFAULT_SIGMA)]
    sigma: f32,

    /// Edge handling for blur and emboss: clamp, wrap, mirror
    #[arg(long, default_value = "clamp")]
    edge: EdgeMode,

    /// Blur the alpha channel too instead of keeping it
    #[arg(long)]
    blur_alpha: bool,

    /// Emboss input: greyscale, per-channel
    #[arg(long, default_value = "greyscale")]
    emboss_mode: EmbossMode,

    /// HSV output: encode, round-trip
    #[arg(long, default_value = "encode")]
    hsv_mode: HsvMode,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,
}

impl Cli {
    fn config(&self) -> PipelineConfig {
        let blur_alpha = if self.blur_alpha {
            AlphaMode::Convolve
        } else {
            AlphaMode::Preserve
        };
        PipelineConfig::default()
            .with_sigma(self.sigma)
            .with_edge(self.edge)
            .with_blur_alpha(blur_alpha)
            .with_emboss_mode(self.emboss_mode)
            .with_hsv_mode(self.hsv_mode)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_image(path: &Path) -> Result<PixelBuffer> {
    if !path.is_file() {
        bail!("The file could not be loaded: {} does not exist", path.display());
    }
    pixmod_io::read(path).with_context(|| format!("The file could not be loaded: {}", path.display()))
}

fn save_image(path: &Path, image: &PixelBuffer) -> Result<()> {
    pixmod_io::write(path, image).with_context(|| format!("Failed to save: {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let op: Operation = cli
        .operation
        .parse()
        .with_context(|| format!("The operation {} is not available", cli.operation))?;
    let pipeline = FilterPipeline::new(cli.config()).context("Invalid options")?;

    let image = load_image(&cli.input)?;
    info!(path = %cli.input.display(), width = image.width(), height = image.height(), "loaded");

    let start = Instant::now();
    let result = pipeline
        .run(op, &image)
        .with_context(|| format!("{op} failed"))?;
    info!(%op, elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "operation complete");

    save_image(&cli.output, &result)?;
    info!(path = %cli.output.display(), "saved");
    Ok(())
}
