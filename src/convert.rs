//! The convert transform: everything becomes a JPEG.
//!
//! Per candidate: decode, carry the embedded ICC profile over when present,
//! flatten to RGB (JPEG has no alpha), optionally downscale with Lanczos3,
//! and encode at [`JPEG_QUALITY`]. The output mirrors the input's relative
//! path with the extension replaced by `.jpg`.
//!
//! Decode and encode failures are per-file: logged, counted, and the run
//! moves on. Files are processed in parallel; the log is emitted in input
//! order so identical input yields an identical report.

use crate::types::{CandidateFile, RunLog, RunStats};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageReader};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The one documented encode quality for all JPEG output.
pub const JPEG_QUALITY: u8 = 100;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(image::ImageError),
    #[error("encode failed: {0}")]
    Encode(image::ImageError),
}

/// Configuration for a convert run.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Proportional rescale, 10–100. 100 keeps original dimensions.
    pub scale_percent: u32,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self { scale_percent: 100 }
    }
}

/// Convert every candidate to JPEG under `root`, mirroring relative paths.
///
/// Returns `(absolute, workspace-relative)` output pairs for the archiver;
/// failed files are logged, counted under `errors`, and omitted.
pub fn convert_all(
    candidates: &[CandidateFile],
    root: &Path,
    config: &ConvertConfig,
    log: &mut RunLog,
    stats: &mut RunStats,
) -> Vec<(PathBuf, PathBuf)> {
    let targets = jpeg_targets(candidates, root);
    let results: Vec<Result<(), ConvertError>> = candidates
        .par_iter()
        .zip(&targets)
        .map(|(candidate, target)| convert_file(&candidate.path, root, target, config))
        .collect();

    let mut outputs = Vec::new();
    for ((candidate, target), result) in candidates.iter().zip(targets).zip(results) {
        let rel = candidate.path.strip_prefix(root).unwrap_or(&candidate.path);
        match result {
            Ok(()) => {
                log.push(format!(
                    "converted: {} -> {}",
                    rel.display(),
                    target.display()
                ));
                stats.bump("converted");
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

/// Workspace-relative `.jpg` target for every candidate, in input order.
///
/// Stems that collide after the extension swap (`x.png` and `x.jpeg` both
/// want `x.jpg`) get a numeric suffix; no two candidates ever share an
/// output path, so parallel workers never write the same file.
pub(crate) fn jpeg_targets(candidates: &[CandidateFile], root: &Path) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    candidates
        .iter()
        .map(|candidate| {
            let rel = candidate.path.strip_prefix(root).unwrap_or(&candidate.path);
            let mut target = rel.with_extension("jpg");
            let stem = rel
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("image")
                .to_owned();
            let mut n = 2;
            while !taken.insert(target.clone()) {
                target = rel.with_file_name(format!("{stem}-{n}.jpg"));
                n += 1;
            }
            target
        })
        .collect()
}

/// Convert one file into `out_rel` (workspace-relative) under `root`.
fn convert_file(
    source: &Path,
    root: &Path,
    out_rel: &Path,
    config: &ConvertConfig,
) -> Result<(), ConvertError> {
    let reader = ImageReader::open(source)?.with_guessed_format()?;
    let mut decoder = reader.into_decoder().map_err(ConvertError::Decode)?;
    let icc = decoder.icc_profile().ok().flatten();
    let img = DynamicImage::from_decoder(decoder).map_err(ConvertError::Decode)?;

    let mut rgb = img.to_rgb8();
    if config.scale_percent != 100 {
        let (w, h) = rgb.dimensions();
        let new_w = (w * config.scale_percent / 100).max(1);
        let new_h = (h * config.scale_percent / 100).max(1);
        rgb = image::imageops::resize(&rgb, new_w, new_h, FilterType::Lanczos3);
    }

    let out_path = root.join(out_rel);
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let writer = BufWriter::new(File::create(&out_path)?);
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
    if let Some(profile) = icc {
        // The pure-Rust encoder may not accept every profile; the pixels
        // still encode fine without it.
        let _ = encoder.set_icc_profile(profile);
    }
    encoder.encode_image(&rgb).map_err(ConvertError::Encode)?;

    Ok(())
}
