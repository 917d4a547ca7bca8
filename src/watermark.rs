//! The watermark transform: alpha compositing a mark onto every photo.
//!
//! Compositing pipeline per file:
//!
//! 1. Base image to RGBA.
//! 2. Watermark scaled so its width is `scale × base width`, aspect kept.
//! 3. Per-pixel `alpha ×= opacity` — marks that already carry partial
//!    transparency keep it.
//! 4. Placement offset from the position; "over" blend at that offset.
//! 5. Flatten to RGB and encode as JPEG at maximum quality.
//!
//! Per-file failures are logged and counted; only successes reach the
//! archive.

use crate::convert::{JPEG_QUALITY, jpeg_targets};
use crate::types::{CandidateFile, RunLog, RunStats};
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage, imageops};
use rayon::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(image::ImageError),
    #[error("encode failed: {0}")]
    Encode(image::ImageError),
    #[error("watermark scale must be in (0, 1], got {0}")]
    InvalidScale(f32),
}

/// Where the watermark lands on the base image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl Position {
    /// Placement offset for a `(w, h)` watermark on a `(W, H)` base.
    fn offset(self, base: (u32, u32), mark: (u32, u32)) -> (i64, i64) {
        let (bw, bh) = (base.0 as i64, base.1 as i64);
        let (mw, mh) = (mark.0 as i64, mark.1 as i64);
        match self {
            Self::TopLeft => (0, 0),
            Self::TopRight => (bw - mw, 0),
            Self::BottomLeft => (0, bh - mh),
            Self::BottomRight => (bw - mw, bh - mh),
            Self::Center => ((bw - mw) / 2, (bh - mh) / 2),
        }
    }
}

/// A decoded watermark plus its placement parameters.
#[derive(Debug, Clone)]
pub struct WatermarkSpec {
    pub image: RgbaImage,
    pub position: Position,
    /// Opacity factor in `[0, 1]`; clamped on construction.
    pub opacity: f32,
    /// Mark width relative to the base width, in `(0, 1]`.
    pub scale: f32,
}

impl WatermarkSpec {
    pub fn new(
        image: RgbaImage,
        position: Position,
        opacity: f32,
        scale: f32,
    ) -> Result<Self, WatermarkError> {
        if !(scale > 0.0 && scale <= 1.0) {
            return Err(WatermarkError::InvalidScale(scale));
        }
        Ok(Self {
            image,
            position,
            opacity: opacity.clamp(0.0, 1.0),
            scale,
        })
    }

    /// Decode a watermark image from disk (preset or user-supplied).
    pub fn load(
        path: &Path,
        position: Position,
        opacity: f32,
        scale: f32,
    ) -> Result<Self, WatermarkError> {
        let image = image::open(path).map_err(WatermarkError::Decode)?.to_rgba8();
        Self::new(image, position, opacity, scale)
    }
}

/// Composite the watermark onto a base image, returning the RGBA result.
pub fn apply_watermark(base: &DynamicImage, spec: &WatermarkSpec) -> RgbaImage {
    let mut out = base.to_rgba8();
    let (bw, bh) = out.dimensions();

    let mark_w = ((bw as f32 * spec.scale) as u32).max(1);
    let ratio = mark_w as f32 / spec.image.width() as f32;
    let mark_h = ((spec.image.height() as f32 * ratio) as u32).max(1);
    let mut mark = imageops::resize(&spec.image, mark_w, mark_h, FilterType::Lanczos3);

    if spec.opacity < 1.0 {
        for pixel in mark.pixels_mut() {
            pixel.0[3] = (pixel.0[3] as f32 * spec.opacity) as u8;
        }
    }

    let (x, y) = spec.position.offset((bw, bh), (mark_w, mark_h));
    imageops::overlay(&mut out, &mark, x, y);
    out
}

/// Watermark every candidate and re-encode as JPEG under `root`.
///
/// Returns `(absolute, workspace-relative)` output pairs; failures are
/// logged, counted under `errors`, and omitted from the result.
pub fn watermark_all(
    candidates: &[CandidateFile],
    root: &Path,
    spec: &WatermarkSpec,
    log: &mut RunLog,
    stats: &mut RunStats,
) -> Vec<(PathBuf, PathBuf)> {
    let targets = jpeg_targets(candidates, root);
    let results: Vec<Result<(), WatermarkError>> = candidates
        .par_iter()
        .zip(&targets)
        .map(|(candidate, target)| watermark_file(&candidate.path, root, target, spec))
        .collect();

    let mut outputs = Vec::new();
    for ((candidate, target), result) in candidates.iter().zip(targets).zip(results) {
        let rel = candidate.path.strip_prefix(root).unwrap_or(&candidate.path);
        match result {
            Ok(()) => {
                log.push(format!(
                    "watermarked: {} -> {}",
                    rel.display(),
                    target.display()
                ));
                stats.bump("processed");
                outputs.push((root.join(&target), target));
            }
            Err(e) => {
                log.push(format!("error: {} ({e})", rel.display()));
                stats.bump("errors");
            }
        }
    }
    outputs
}

fn watermark_file(
    source: &Path,
    root: &Path,
    out_rel: &Path,
    spec: &WatermarkSpec,
) -> Result<(), WatermarkError> {
    let base = image::open(source).map_err(WatermarkError::Decode)?;
    let composited = apply_watermark(&base, spec);
    let rgb = DynamicImage::ImageRgba8(composited).to_rgb8();

    let out_path = root.join(out_rel);
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let writer = BufWriter::new(File::create(&out_path)?);
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
    encoder.encode_image(&rgb).map_err(WatermarkError::Encode)?;

    Ok(())
}
