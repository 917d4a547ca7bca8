//! The rename transform: per-folder sequential photo numbering.
//!
//! Within every folder that holds at least one candidate, photos are sorted
//! by original file name (lexicographic) and renamed to `1.<ext>`,
//! `2.<ext>`, … with the extension lowercased. Sorting first makes the
//! numbering deterministic and reproducible.
//!
//! A file already occupying a target name is never overwritten: the rename
//! is skipped and logged. Folders without candidates are never visited.

use crate::collect::supported_ext;
use crate::types::{CandidateFile, RunLog, RunStats};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Rename photos in every folder holding a candidate, mutating the
/// workspace in place. Folders are the distinct candidate parents, visited
/// in sorted order.
///
/// Counters touched: `renamed`, `skipped`, `errors`.
pub fn rename_folders(
    root: &Path,
    candidates: &[CandidateFile],
    log: &mut RunLog,
    stats: &mut RunStats,
) {
    let folders: BTreeSet<PathBuf> = candidates
        .iter()
        .filter_map(|candidate| candidate.path.parent())
        .map(Path::to_path_buf)
        .collect();

    for folder in folders {
        rename_one_folder(root, &folder, log, stats);
    }
}

fn rename_one_folder(root: &Path, folder: &Path, log: &mut RunLog, stats: &mut RunStats) {
    let mut photos: Vec<PathBuf> = match std::fs::read_dir(folder) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && supported_ext(path).is_some())
            .collect(),
        Err(e) => {
            log.push(format!(
                "error: could not list '{}' ({e})",
                relative(root, folder)
            ));
            stats.bump("errors");
            return;
        }
    };

    if photos.is_empty() {
        log.push(format!("info: no photos in '{}'", relative(root, folder)));
        stats.bump("skipped");
        return;
    }

    photos.sort_by_key(|path| path.file_name().map(|n| n.to_owned()));

    for (index, photo) in photos.iter().enumerate() {
        // supported_ext was checked during listing.
        let Some(ext) = supported_ext(photo) else {
            continue;
        };
        let target = folder.join(format!("{}.{}", index + 1, ext));

        if target != *photo && target.exists() {
            log.push(format!(
                "skipped: '{}' already exists",
                relative(root, &target)
            ));
            stats.bump("skipped");
            continue;
        }

        if target == *photo {
            // Already carries its canonical name.
            stats.bump("renamed");
            continue;
        }

        match std::fs::rename(photo, &target) {
            Ok(()) => {
                log.push(format!(
                    "renamed: '{}' -> '{}'",
                    relative(root, photo),
                    relative(root, &target)
                ));
                stats.bump("renamed");
            }
            Err(e) => {
                log.push(format!(
                    "error: could not rename '{}' ({e})",
                    relative(root, photo)
                ));
                stats.bump("errors");
            }
        }
    }
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stats() -> RunStats {
        RunStats::for_keys(&["total", "renamed", "skipped", "errors"])
    }

    fn candidates(paths: &[PathBuf]) -> Vec<CandidateFile> {
        paths
            .iter()
            .map(|path| CandidateFile {
                path: path.clone(),
                ext: supported_ext(path).unwrap(),
            })
            .collect()
    }

    #[test]
    fn lone_photo_becomes_one() {
        let tmp = TempDir::new().unwrap();
        let photo = tmp.path().join("holiday.jpg");
        std::fs::write(&photo, b"jpeg").unwrap();

        let mut log = RunLog::default();
        let mut stats = stats();
        rename_folders(tmp.path(), &candidates(&[photo]), &mut log, &mut stats);

        assert!(tmp.path().join("1.jpg").exists());
        assert!(!tmp.path().join("holiday.jpg").exists());
        assert_eq!(stats.get("renamed"), 1);
        assert_eq!(stats.get("skipped"), 0);
    }

    #[test]
    fn numbering_follows_lexicographic_order() {
        let tmp = TempDir::new().unwrap();
        let b = tmp.path().join("b.png");
        let a = tmp.path().join("a.png");
        std::fs::write(&b, b"second").unwrap();
        std::fs::write(&a, b"first").unwrap();

        let mut log = RunLog::default();
        let mut stats = stats();
        rename_folders(tmp.path(), &candidates(&[b, a]), &mut log, &mut stats);

        assert_eq!(std::fs::read(tmp.path().join("1.png")).unwrap(), b"first");
        assert_eq!(std::fs::read(tmp.path().join("2.png")).unwrap(), b"second");
        assert_eq!(stats.get("renamed"), 2);
    }

    #[test]
    fn extension_is_lowercased() {
        let tmp = TempDir::new().unwrap();
        let photo = tmp.path().join("SHOT.JPG");
        std::fs::write(&photo, b"jpeg").unwrap();

        let mut log = RunLog::default();
        let mut stats = stats();
        rename_folders(tmp.path(), &candidates(&[photo]), &mut log, &mut stats);

        assert!(tmp.path().join("1.jpg").exists());
    }

    #[test]
    fn existing_target_is_skipped_not_overwritten() {
        let tmp = TempDir::new().unwrap();
        // Sorted order is ["0.png", "1.png"]: "0.png" wants the name "1.png",
        // which a different file already holds.
        let zero = tmp.path().join("0.png");
        let one = tmp.path().join("1.png");
        std::fs::write(&zero, b"zero").unwrap();
        std::fs::write(&one, b"one").unwrap();

        let mut log = RunLog::default();
        let mut stats = stats();
        rename_folders(tmp.path(), &candidates(&[zero, one]), &mut log, &mut stats);

        assert_eq!(std::fs::read(tmp.path().join("0.png")).unwrap(), b"zero");
        assert_eq!(std::fs::read(tmp.path().join("2.png")).unwrap(), b"one");
        assert_eq!(stats.get("skipped"), 1);
        assert_eq!(stats.get("renamed"), 1);
        assert!(
            log.lines()
                .iter()
                .any(|l| l.contains("skipped: '1.png' already exists"))
        );
    }

    #[test]
    fn photo_already_canonical_counts_as_renamed() {
        let tmp = TempDir::new().unwrap();
        let photo = tmp.path().join("1.jpg");
        std::fs::write(&photo, b"jpeg").unwrap();

        let mut log = RunLog::default();
        let mut stats = stats();
        rename_folders(tmp.path(), &candidates(&[photo]), &mut log, &mut stats);

        assert!(tmp.path().join("1.jpg").exists());
        assert_eq!(stats.get("renamed"), 1);
        assert_eq!(stats.get("skipped"), 0);
    }

    #[test]
    fn folders_without_candidates_are_not_visited() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("vacant")).unwrap();
        std::fs::create_dir(tmp.path().join("album")).unwrap();
        let photo = tmp.path().join("album/shot.jpg");
        std::fs::write(&photo, b"jpeg").unwrap();

        let mut log = RunLog::default();
        let mut stats = stats();
        rename_folders(tmp.path(), &candidates(&[photo]), &mut log, &mut stats);

        assert!(tmp.path().join("album/1.jpg").exists());
        assert_eq!(stats.get("renamed"), 1);
        assert_eq!(stats.get("skipped"), 0);
        assert!(!log.lines().iter().any(|l| l.starts_with("info:")));
    }

    #[test]
    fn vanished_candidate_folder_logs_info_and_skips() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("gone")).unwrap();
        // Collected earlier, deleted before the rename ran.
        let phantom = CandidateFile {
            path: tmp.path().join("gone/photo.jpg"),
            ext: "jpg".into(),
        };

        let mut log = RunLog::default();
        let mut stats = stats();
        rename_folders(tmp.path(), &[phantom], &mut log, &mut stats);

        assert!(
            log.lines()
                .iter()
                .any(|l| l.contains("info: no photos in 'gone'"))
        );
        assert_eq!(stats.get("skipped"), 1);
        assert_eq!(stats.get("errors"), 0);
    }

    #[test]
    fn folders_are_renamed_independently() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("x")).unwrap();
        std::fs::create_dir(tmp.path().join("y")).unwrap();
        let in_x = tmp.path().join("x/photo.jpg");
        let in_y = tmp.path().join("y/other.png");
        std::fs::write(&in_x, b"x").unwrap();
        std::fs::write(&in_y, b"y").unwrap();

        let mut log = RunLog::default();
        let mut stats = stats();
        rename_folders(tmp.path(), &candidates(&[in_x, in_y]), &mut log, &mut stats);

        assert_eq!(std::fs::read(tmp.path().join("x/1.jpg")).unwrap(), b"x");
        assert_eq!(std::fs::read(tmp.path().join("y/1.png")).unwrap(), b"y");
        assert_eq!(stats.get("renamed"), 2);
    }

    #[test]
    fn non_photo_files_are_left_alone() {
        let tmp = TempDir::new().unwrap();
        let photo = tmp.path().join("photo.jpg");
        std::fs::write(&photo, b"jpeg").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), b"text").unwrap();

        let mut log = RunLog::default();
        let mut stats = stats();
        rename_folders(tmp.path(), &candidates(&[photo]), &mut log, &mut stats);

        assert!(tmp.path().join("1.jpg").exists());
        assert!(tmp.path().join("notes.txt").exists());
    }
}
