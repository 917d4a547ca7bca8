//! Run orchestration: collect → transform → archive → result.
//!
//! One run is one end-to-end invocation for a single mode and configuration.
//! The workspace, open handles, and decoded images all live inside the run
//! and are released when it returns, on every path.
//!
//! Failure policy (file-scoped wherever possible):
//!
//! - input rejections and per-file transform failures are logged and counted,
//!   never fatal;
//! - an archiving failure degrades to a log-only archive;
//! - only workspace creation and an unopenable ZIP container abort the run.

use crate::archive;
use crate::collect::{self, CollectError, Workspace, supported_ext};
use crate::convert::{self, ConvertConfig};
use crate::rename;
use crate::types::{RunLog, RunStats, UploadedItem};
use crate::watermark::{self, WatermarkSpec};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to create workspace: {0}")]
    Workspace(std::io::Error),
    #[error(transparent)]
    Collect(#[from] CollectError),
}

/// Which transform a run applies. Exactly one per run.
pub enum Mode {
    Rename,
    Convert(ConvertConfig),
    Watermark(WatermarkSpec),
}

impl Mode {
    /// Counter keys this mode reports; all present (zero) from run start.
    fn counter_keys(&self) -> &'static [&'static str] {
        match self {
            Mode::Rename => &["total", "renamed", "skipped", "errors"],
            Mode::Convert(_) => &["total", "converted", "errors"],
            Mode::Watermark(_) => &["total", "processed", "errors"],
        }
    }
}

/// Per-run configuration shared by all modes.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Items larger than this are rejected by the collector.
    pub max_size_mb: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { max_size_mb: 400 }
    }
}

impl RunConfig {
    fn max_size_bytes(&self) -> u64 {
        self.max_size_mb * 1024 * 1024
    }
}

/// Everything a run produces. A new run replaces the previous result
/// wholesale from the caller's perspective.
pub struct RunResult {
    /// The downloadable ZIP; `None` only if even the fallback archive failed.
    pub archive: Option<Vec<u8>>,
    pub log: RunLog,
    pub stats: RunStats,
}

/// Execute one run: collect the items, apply the mode's transform, and
/// package the result.
pub fn run(items: &[UploadedItem], mode: Mode, config: &RunConfig) -> Result<RunResult, RunError> {
    let workspace = Workspace::new().map_err(RunError::Workspace)?;
    let mut log = RunLog::default();
    let mut stats = RunStats::for_keys(mode.counter_keys());

    let candidates = collect::collect(items, config.max_size_bytes(), &workspace, &mut log)?;
    stats.add("total", candidates.len() as u64);

    if candidates.is_empty() {
        log.push("no supported images found");
        let archive = archive::log_only_archive(&log.to_text()).ok();
        return Ok(RunResult {
            archive,
            log,
            stats,
        });
    }

    let (files, dirs) = match &mode {
        Mode::Rename => {
            rename::rename_folders(workspace.root(), &candidates, &mut log, &mut stats);
            collect_renamed_tree(workspace.root())
        }
        Mode::Convert(convert_config) => {
            let outputs = convert::convert_all(
                &candidates,
                workspace.root(),
                convert_config,
                &mut log,
                &mut stats,
            );
            if outputs.is_empty() {
                log.push("no files were converted successfully");
            }
            (outputs, Vec::new())
        }
        Mode::Watermark(spec) => {
            let outputs =
                watermark::watermark_all(&candidates, workspace.root(), spec, &mut log, &mut stats);
            if outputs.is_empty() {
                log.push("no files were watermarked successfully");
            }
            (outputs, Vec::new())
        }
    };

    let archive = match archive::build_archive(&files, &dirs, Some(&log.to_text())) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log.push(format!("error: archiving failed ({e})"));
            archive::log_only_archive(&log.to_text()).ok()
        }
    };

    Ok(RunResult {
        archive,
        log,
        stats,
    })
}

/// Gather the post-rename workspace for archiving: every supported photo
/// plus empty directories, as `(absolute, archive-relative)` pairs.
///
/// When extraction produced exactly one top-level directory, paths are taken
/// relative to it, so `album.zip` containing `album/...` round-trips without
/// double nesting.
fn collect_renamed_tree(root: &Path) -> (Vec<(PathBuf, PathBuf)>, Vec<PathBuf>) {
    let zip_root = single_top_level_dir(root).unwrap_or_else(|| root.to_path_buf());

    let mut files = Vec::new();
    let mut empty_dirs = Vec::new();
    for entry in WalkDir::new(&zip_root).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        let Ok(rel) = path.strip_prefix(&zip_root) else {
            continue;
        };
        if rel.as_os_str().is_empty() {
            continue;
        }
        if entry.file_type().is_dir() {
            if dir_is_empty(path) {
                empty_dirs.push(rel.to_path_buf());
            }
        } else if supported_ext(path).is_some() {
            files.push((path.to_path_buf(), rel.to_path_buf()));
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    empty_dirs.sort();
    (files, empty_dirs)
}

fn single_top_level_dir(root: &Path) -> Option<PathBuf> {
    let entries: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect();
    match entries.as_slice() {
        [only] if only.is_dir() => Some(only.clone()),
        _ => None,
    }
}

fn dir_is_empty(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn single_top_level_dir_detected() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("album")).unwrap();
        assert_eq!(
            single_top_level_dir(tmp.path()),
            Some(tmp.path().join("album"))
        );
    }

    #[test]
    fn mixed_top_level_keeps_workspace_root() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("album")).unwrap();
        std::fs::write(tmp.path().join("loose.jpg"), b"x").unwrap();
        assert_eq!(single_top_level_dir(tmp.path()), None);
    }

    #[test]
    fn renamed_tree_collects_photos_and_empty_dirs() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("a")).unwrap();
        std::fs::create_dir_all(tmp.path().join("vacant")).unwrap();
        std::fs::write(tmp.path().join("a/1.jpg"), b"x").unwrap();
        std::fs::write(tmp.path().join("a/notes.txt"), b"skip").unwrap();

        let (files, dirs) = collect_renamed_tree(tmp.path());
        let rels: Vec<_> = files.iter().map(|(_, rel)| rel.clone()).collect();
        assert_eq!(rels, [PathBuf::from("a/1.jpg")]);
        assert_eq!(dirs, [PathBuf::from("vacant")]);
    }

    #[test]
    fn renamed_tree_unwraps_single_top_level_dir() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("album/day")).unwrap();
        std::fs::write(tmp.path().join("album/day/1.png"), b"x").unwrap();

        let (files, _) = collect_renamed_tree(tmp.path());
        assert_eq!(files[0].1, PathBuf::from("day/1.png"));
    }
}
