use clap::{Args, Parser, Subcommand};
use photoflow::convert::ConvertConfig;
use photoflow::run::{self, Mode, RunConfig, RunResult};
use photoflow::transfer;
use photoflow::types::UploadedItem;
use photoflow::watermark::{Position, WatermarkSpec};
use std::path::{Path, PathBuf};

/// Shared options for all processing modes.
#[derive(Args, Clone)]
struct InputArgs {
    /// Image files or ZIP archives to process
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Path for the result archive
    #[arg(long, default_value = "result.zip")]
    output: PathBuf,

    /// Reject any input item larger than this many megabytes
    #[arg(long, default_value_t = 400)]
    max_size_mb: u64,

    /// POST the finished archive to this endpoint and print the download link
    #[arg(long)]
    upload: Option<String>,

    /// Print the run summary as JSON instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
#[command(name = "photoflow")]
#[command(about = "Batch photo processing: rename, convert to JPEG, or watermark")]
#[command(long_about = "\
Batch photo processing: rename, convert to JPEG, or watermark

Inputs are loose images and/or ZIP archives; each run expands them into a
scratch workspace, applies one transform per file, and repackages the
results (plus log.txt) into a single ZIP.

Supported input formats:
  JPG, JPEG, PNG, BMP, WEBP, TIFF, HEIC, HEIF, and ZIP archives of the same.

Modes:
  rename      In every folder, number the photos 1.<ext>, 2.<ext>, ... in
              lexicographic order. Existing names are never overwritten.
  convert     Re-encode every image as maximum-quality JPEG, optionally
              downscaled with --scale.
  watermark   Composite a watermark (preset or your own PNG/JPEG) onto every
              image at a chosen position, scale, and opacity.

Per-file failures (corrupt members, undecodable photos) are logged and
counted; the run always completes and always produces an archive.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rename the photos in every folder to 1.<ext>, 2.<ext>, ...
    Rename(RenameArgs),
    /// Convert every image to JPEG, optionally downscaled
    Convert(ConvertArgs),
    /// Composite a watermark onto every image
    Watermark(WatermarkArgs),
}

#[derive(Args)]
struct RenameArgs {
    #[command(flatten)]
    io: InputArgs,
}

#[derive(Args)]
struct ConvertArgs {
    #[command(flatten)]
    io: InputArgs,

    /// Rescale percentage (reduces resolution and file size)
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(10..=100))]
    scale: u32,
}

#[derive(Args)]
#[command(group = clap::ArgGroup::new("source").required(true))]
struct WatermarkArgs {
    #[command(flatten)]
    io: InputArgs,

    /// Watermark image file (PNG or JPEG)
    #[arg(long, group = "source")]
    watermark: Option<PathBuf>,

    /// Named watermark from the preset directory
    #[arg(long, group = "source")]
    preset: Option<String>,

    /// Directory holding preset watermark images
    #[arg(long, default_value = "watermarks")]
    watermark_dir: PathBuf,

    /// Watermark opacity in percent
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(0..=100))]
    opacity: u32,

    /// Watermark width as a percentage of each photo's width
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u32).range(5..=80))]
    wm_scale: u32,

    /// Watermark placement
    #[arg(long, value_enum, default_value_t = Position::BottomRight)]
    position: Position,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (io, mode) = match cli.command {
        Command::Rename(args) => (args.io, Mode::Rename),
        Command::Convert(args) => (
            args.io,
            Mode::Convert(ConvertConfig {
                scale_percent: args.scale,
            }),
        ),
        Command::Watermark(args) => {
            let source = resolve_watermark_source(&args)?;
            let spec = WatermarkSpec::load(
                &source,
                args.position,
                args.opacity as f32 / 100.0,
                args.wm_scale as f32 / 100.0,
            )?;
            (args.io, Mode::Watermark(spec))
        }
    };

    let items = io
        .inputs
        .iter()
        .map(|path| UploadedItem::from_path(path))
        .collect::<Result<Vec<_>, _>>()?;

    let config = RunConfig {
        max_size_mb: io.max_size_mb,
    };
    let result = run::run(&items, mode, &config)?;

    report(&result, io.json);

    match &result.archive {
        Some(bytes) => {
            std::fs::write(&io.output, bytes)?;
            println!(
                "archive written to {} ({} KB)",
                io.output.display(),
                bytes.len() / 1024
            );
            if let Some(endpoint) = &io.upload {
                let link = transfer::upload_archive(endpoint, &io.output)?;
                println!("download link: {link}");
            }
        }
        None => eprintln!("no archive could be produced; see the log above"),
    }

    Ok(())
}

/// Pick the watermark image: an explicit file, or a preset by name.
fn resolve_watermark_source(args: &WatermarkArgs) -> Result<PathBuf, std::io::Error> {
    if let Some(path) = &args.watermark {
        return Ok(path.clone());
    }
    // The arg group guarantees preset is set when --watermark is not.
    let name = args.preset.clone().unwrap_or_default();
    let is_image = Path::new(&name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"));
    if !is_image {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("preset '{name}' is not a PNG/JPEG file name"),
        ));
    }
    let path = args.watermark_dir.join(&name);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("preset '{name}' not found in {}", args.watermark_dir.display()),
        ));
    }
    Ok(path)
}

fn report(result: &RunResult, as_json: bool) {
    if as_json {
        let summary = serde_json::json!({
            "stats": result.stats,
            "log": result.log,
        });
        println!("{summary:#}");
    } else {
        for line in result.log.lines() {
            println!("{line}");
        }
        println!("Summary: {}", result.stats);
    }
}
