use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use serde::Serialize;

use clearvision::grid::PixelGrid;
use clearvision::pipeline::{FilterSpec, Pipeline};
use clearvision::stego;
use clearvision::triangular::TriangularPair;

/// Triangular-split storage, LSB message hiding, and filtering for grayscale images
#[derive(Parser)]
#[command(name = "clearvision", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress progress output on stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split an image (PNG or JPEG) into a triangular pair file
    Split {
        /// Input image
        image: String,
        /// Output pair file
        #[arg(short, long)]
        output: String,
    },
    /// Rebuild an image from a triangular pair file
    Reconstruct {
        /// Input pair file
        pair: String,
        /// Output image (format from extension)
        #[arg(short, long)]
        output: String,
    },
    /// Hide an ASCII message in an image and save it as a pair file
    Embed {
        /// Cover image
        image: String,
        /// Message to hide (7-bit ASCII)
        #[arg(short, long)]
        message: String,
        /// Output pair file
        #[arg(short, long)]
        output: String,
    },
    /// Recover a hidden message of known length from a pair file
    Extract {
        /// Input pair file
        pair: String,
        /// Message length in characters
        #[arg(short, long)]
        length: usize,
        /// Print a JSON object instead of the bare message
        #[arg(long)]
        json: bool,
    },
    /// Apply convolution filters to an image
    Filter {
        /// Input image
        image: String,
        /// Output image (format from extension)
        #[arg(short, long)]
        output: String,
        /// TOML pipeline file; overrides the single-filter options
        #[arg(long)]
        pipeline: Option<String>,
        /// Mean filter kernel size
        #[arg(long, conflicts_with_all = ["gaussian", "unsharp"])]
        mean: Option<usize>,
        /// Gaussian smoothing kernel size
        #[arg(long, conflicts_with = "unsharp")]
        gaussian: Option<usize>,
        /// Gaussian sigma
        #[arg(long, default_value = "1.0")]
        sigma: f64,
        /// Unsharp mask kernel size
        #[arg(long)]
        unsharp: Option<usize>,
        /// Unsharp mask amount
        #[arg(long, default_value = "1.0")]
        amount: f64,
    },
    /// Describe a pair file as JSON
    Info {
        /// Input pair file
        pair: String,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Serialize)]
struct ExtractOutput {
    file: String,
    length: usize,
    message: String,
}

#[derive(Serialize)]
struct InfoOutput {
    file: String,
    width: usize,
    height: usize,
    upper_len: usize,
    lower_len: usize,
    capacity_bits: usize,
    capacity_chars: usize,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    let quiet = cli.quiet;

    match cli.command {
        Command::Split { image, output } => cmd_split(&image, &output, quiet),
        Command::Reconstruct { pair, output } => cmd_reconstruct(&pair, &output, quiet),
        Command::Embed {
            image,
            message,
            output,
        } => cmd_embed(&image, &message, &output, quiet),
        Command::Extract { pair, length, json } => cmd_extract(&pair, length, json),
        Command::Filter {
            image,
            output,
            pipeline,
            mean,
            gaussian,
            sigma,
            unsharp,
            amount,
        } => {
            let pipeline = match pipeline {
                Some(path) => load_pipeline(&path)?,
                None => single_filter(mean, gaussian, sigma, unsharp, amount)?,
            };
            cmd_filter(&image, &output, &pipeline, quiet)
        }
        Command::Info { pair, pretty } => cmd_info(&pair, pretty),
    }
}

/// Decode an image file into a grayscale grid.
fn load_image(path: &str) -> Result<PixelGrid> {
    let img = image::open(path)
        .with_context(|| format!("failed to open image: {path}"))?
        .into_luma8();

    let width = img.width() as usize;
    let height = img.height() as usize;
    PixelGrid::from_buf(width, height, img.into_raw())
        .with_context(|| format!("decoding {path}"))
}

/// Encode a grid as a grayscale image; the format follows the extension.
fn save_image(grid: &PixelGrid, path: &str) -> Result<()> {
    let width = u32::try_from(grid.width()).context("grid too wide to encode")?;
    let height = u32::try_from(grid.height()).context("grid too tall to encode")?;
    let img = image::GrayImage::from_raw(width, height, grid.as_slice().to_vec())
        .context("pixel buffer does not match grid dimensions")?;
    img.save(Path::new(path))
        .with_context(|| format!("failed to write image: {path}"))
}

fn load_pair(path: &str) -> Result<TriangularPair> {
    TriangularPair::load(path).with_context(|| format!("reading pair file {path}"))
}

fn load_pipeline(path: &str) -> Result<Pipeline> {
    let toml_str =
        std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    Pipeline::from_toml(&toml_str).with_context(|| format!("parsing pipeline from {path}"))
}

fn single_filter(
    mean: Option<usize>,
    gaussian: Option<usize>,
    sigma: f64,
    unsharp: Option<usize>,
    amount: f64,
) -> Result<Pipeline> {
    let step = match (mean, gaussian, unsharp) {
        (Some(kernel_size), _, _) => FilterSpec::Mean { kernel_size },
        (_, Some(kernel_size), _) => FilterSpec::Gaussian { kernel_size, sigma },
        (_, _, Some(kernel_size)) => FilterSpec::Unsharp {
            kernel_size,
            amount,
        },
        _ => anyhow::bail!("choose a filter: --pipeline, --mean, --gaussian, or --unsharp"),
    };
    Ok(Pipeline::new(vec![step]))
}

fn cmd_split(image: &str, output: &str, quiet: bool) -> Result<()> {
    let grid = load_image(image)?;
    if grid.width() != grid.height() {
        log::warn!(
            "{image} is {}x{}; non-square grids use generalized triangle sizes",
            grid.width(),
            grid.height()
        );
    }
    let pair = TriangularPair::split(&grid);
    pair.save(output)
        .with_context(|| format!("writing pair file {output}"))?;
    if !quiet {
        eprintln!(
            "split {image} ({}x{}) into {output}",
            grid.width(),
            grid.height()
        );
    }
    Ok(())
}

fn cmd_reconstruct(pair_path: &str, output: &str, quiet: bool) -> Result<()> {
    let pair = load_pair(pair_path)?;
    let grid = pair.reconstruct();
    save_image(&grid, output)?;
    if !quiet {
        eprintln!("reconstructed {pair_path} into {output}");
    }
    Ok(())
}

fn cmd_embed(image: &str, message: &str, output: &str, quiet: bool) -> Result<()> {
    let grid = load_image(image)?;
    let pair = stego::hide_message(&grid, message)
        .with_context(|| format!("hiding message in {image}"))?;
    pair.save(output)
        .with_context(|| format!("writing pair file {output}"))?;
    info!("embedded {} characters", message.len());
    if !quiet {
        eprintln!(
            "hid {} characters in {output}; extract with --length {}",
            message.len(),
            message.len()
        );
    }
    Ok(())
}

fn cmd_extract(pair_path: &str, length: usize, json: bool) -> Result<()> {
    let pair = load_pair(pair_path)?;
    let message = stego::reveal_message(&pair, length)
        .with_context(|| format!("extracting {length} characters from {pair_path}"))?;

    if json {
        let out = ExtractOutput {
            file: pair_path.to_string(),
            length,
            message,
        };
        println!("{}", serde_json::to_string(&out)?);
    } else {
        println!("{message}");
    }
    Ok(())
}

fn cmd_filter(image: &str, output: &str, pipeline: &Pipeline, quiet: bool) -> Result<()> {
    let mut grid = load_image(image)?;
    pipeline
        .apply(&mut grid)
        .with_context(|| format!("filtering {image}"))?;
    save_image(&grid, output)?;
    if !quiet {
        eprintln!(
            "applied {} filter step(s) to {image}, wrote {output}",
            pipeline.filters.len()
        );
    }
    Ok(())
}

fn cmd_info(pair_path: &str, pretty: bool) -> Result<()> {
    let pair = load_pair(pair_path)?;
    let (width, height) = (pair.width(), pair.height());
    let out = InfoOutput {
        file: pair_path.to_string(),
        width,
        height,
        upper_len: pair.upper().len(),
        lower_len: pair.lower().len(),
        capacity_bits: width * height,
        capacity_chars: stego::max_message_len(width, height),
    };

    let json = if pretty {
        serde_json::to_string_pretty(&out)?
    } else {
        serde_json::to_string(&out)?
    };
    println!("{json}");
    Ok(())
}
