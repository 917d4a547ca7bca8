//! Input collection — stage 1 of the pipeline.
//!
//! Resolves uploaded items (loose images and ZIP archives) into candidate
//! files inside an ephemeral workspace:
//!
//! - Items over the configured size threshold are rejected and logged.
//! - ZIP archives are expanded member by member; a member that fails to
//!   extract is logged and skipped (partial extraction is fine). Supported
//!   members become candidates in archive-listing order.
//! - Loose supported images are materialized unchanged.
//! - Anything else is logged as unsupported and excluded.
//!
//! Only a failure to open the ZIP container itself (or a workspace-level I/O
//! failure) aborts the run; everything else is file-scoped.

use crate::types::{CandidateFile, RunLog, UploadedItem};
use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;
use tempfile::TempDir;
use thiserror::Error;
use zip::ZipArchive;

/// Extensions the pipeline accepts, lowercased, without the dot.
///
/// HEIC/HEIF are accepted even though no decoder is compiled in: renaming
/// works on them, and the decode-based modes record a per-file error instead
/// of rejecting the upload outright.
pub const SUPPORTED_EXTS: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "webp", "tiff", "heic", "heif",
];

/// Lowercased extension of `path` if it is in the supported set.
pub fn supported_ext(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    SUPPORTED_EXTS.contains(&ext.as_str()).then_some(ext)
}

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("failed to open archive {name}: {source}")]
    ArchiveOpen {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ephemeral directory scoped to exactly one run.
///
/// Owns every candidate file and every transform output. Dropped (and
/// deleted) unconditionally when the run ends, on success or failure.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// Resolve uploaded items into workspace-resident candidate files.
///
/// Candidate order follows the order items were supplied, with archive
/// contents in archive-listing order.
pub fn collect(
    items: &[UploadedItem],
    max_size_bytes: u64,
    workspace: &Workspace,
    log: &mut RunLog,
) -> Result<Vec<CandidateFile>, CollectError> {
    let mut candidates = Vec::new();

    for item in items {
        if item.size() > max_size_bytes {
            log.push(format!(
                "rejected: {} exceeds the {} MB size limit",
                item.name,
                max_size_bytes / (1024 * 1024)
            ));
            continue;
        }

        if item.name.to_ascii_lowercase().ends_with(".zip") {
            extract_archive(item, workspace, log, &mut candidates)?;
        } else if supported_ext(Path::new(&item.name)).is_some() {
            materialize_image(item, workspace, log, &mut candidates)?;
        } else {
            log.push(format!("{}: unsupported", item.name));
        }
    }

    Ok(candidates)
}

/// Expand a ZIP item into the workspace, collecting supported members.
///
/// Member extraction failures (bad CRC, truncated data) are logged and the
/// extraction continues; a container that cannot be opened at all is fatal.
fn extract_archive(
    item: &UploadedItem,
    workspace: &Workspace,
    log: &mut RunLog,
    candidates: &mut Vec<CandidateFile>,
) -> Result<(), CollectError> {
    let mut archive =
        ZipArchive::new(Cursor::new(item.bytes())).map_err(|source| CollectError::ArchiveOpen {
            name: item.name.clone(),
            source,
        })?;

    let mut found = 0usize;
    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                log.push(format!(
                    "error: could not read entry {index} of {} ({e})",
                    item.name
                ));
                continue;
            }
        };

        // mangled_name strips absolute prefixes and parent traversal, so
        // every member lands inside the workspace.
        let rel = entry.mangled_name();
        if rel.as_os_str().is_empty() {
            continue;
        }
        let dest = workspace.root().join(&rel);

        if entry.is_dir() {
            std::fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let copied = File::create(&dest).and_then(|mut out| io::copy(&mut entry, &mut out));
        match copied {
            Ok(_) => {
                if let Some(ext) = supported_ext(&dest) {
                    found += 1;
                    candidates.push(CandidateFile { path: dest, ext });
                }
            }
            Err(e) => {
                log.push(format!(
                    "error: could not extract {} from {} ({e})",
                    rel.display(),
                    item.name
                ));
                // A half-written file must not become a candidate later.
                let _ = std::fs::remove_file(&dest);
            }
        }
    }

    log.push(format!("archive {}: found {} images", item.name, found));
    Ok(())
}

/// Write a directly-supported image into the workspace unchanged.
fn materialize_image(
    item: &UploadedItem,
    workspace: &Workspace,
    log: &mut RunLog,
    candidates: &mut Vec<CandidateFile>,
) -> Result<(), CollectError> {
    // File-name component only; an uploaded name never dictates directories.
    let file_name = Path::new(&item.name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| item.name.clone());
    let dest = workspace.root().join(&file_name);
    std::fs::write(&dest, item.bytes())?;

    if let Some(ext) = supported_ext(&dest) {
        log.push(format!("file {}: added", item.name));
        candidates.push(CandidateFile { path: dest, ext });
    }
    Ok(())
}
