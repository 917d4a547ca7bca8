//! Result packaging — the last stage of every run.
//!
//! Builds the downloadable ZIP entirely in memory: transform outputs under
//! their workspace-relative paths, explicitly listed empty directories, and
//! the run log as `log.txt`. An empty file list still yields a valid
//! (log-only) archive, so the user always gets something downloadable.

use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;
use thiserror::Error;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::FileOptions;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Build a ZIP from `(source, archive-relative)` file pairs.
///
/// `empty_dirs` are archive-relative directories preserved without content;
/// `log_text`, when present, becomes `log.txt` at the archive root.
pub fn build_archive(
    files: &[(std::path::PathBuf, std::path::PathBuf)],
    empty_dirs: &[std::path::PathBuf],
    log_text: Option<&str>,
) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for dir in empty_dirs {
        writer.add_directory(zip_name(dir), options)?;
    }
    for (source, rel) in files {
        writer.start_file(zip_name(rel), options)?;
        let mut input = File::open(source)?;
        std::io::copy(&mut input, &mut writer)?;
    }
    if let Some(text) = log_text {
        writer.start_file("log.txt", options)?;
        writer.write_all(text.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}

/// The fallback archive: nothing but the log.
pub fn log_only_archive(log_text: &str) -> Result<Vec<u8>, ArchiveError> {
    build_archive(&[], &[], Some(log_text))
}

/// Archive entry names always use forward slashes, whatever the host OS.
fn zip_name(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::path::PathBuf;
    use zip::ZipArchive;

    fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        content
    }

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn empty_file_list_yields_log_only_archive() {
        let bytes = log_only_archive("line one\nline two").unwrap();
        assert_eq!(entry_names(&bytes), ["log.txt"]);
        assert_eq!(read_entry(&bytes, "log.txt"), b"line one\nline two");
    }

    #[test]
    fn files_keep_relative_paths() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("photo.jpg");
        std::fs::write(&src, b"jpeg bytes").unwrap();

        let files = vec![(src, PathBuf::from("album/photo.jpg"))];
        let bytes = build_archive(&files, &[], Some("log")).unwrap();

        let names = entry_names(&bytes);
        assert!(names.contains(&"album/photo.jpg".to_string()));
        assert!(names.contains(&"log.txt".to_string()));
        assert_eq!(read_entry(&bytes, "album/photo.jpg"), b"jpeg bytes");
    }

    #[test]
    fn empty_directories_are_preserved() {
        let bytes =
            build_archive(&[], &[PathBuf::from("album/untouched")], Some("log")).unwrap();
        let names = entry_names(&bytes);
        assert!(names.iter().any(|n| n.trim_end_matches('/') == "album/untouched"));
    }

    #[test]
    fn entry_names_use_forward_slashes() {
        let rel: PathBuf = ["a", "b", "c.jpg"].iter().collect();
        assert_eq!(zip_name(&rel), "a/b/c.jpg");
    }

    #[test]
    fn missing_source_file_is_an_error() {
        let files = vec![(PathBuf::from("/nonexistent/x.jpg"), PathBuf::from("x.jpg"))];
        assert!(matches!(
            build_archive(&files, &[], None),
            Err(ArchiveError::Io(_))
        ));
    }
}
