//! Shared types used across all pipeline stages.
//!
//! A run flows `UploadedItem`s through the collector, which resolves them into
//! workspace-resident `CandidateFile`s; the transform stage folds per-file
//! outcomes into a `RunLog` and `RunStats`, both of which end up in the
//! caller-held `RunResult`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// An uploaded input: a byte blob with a declared name.
///
/// Read-only to the pipeline. The caller owns it for the duration of a run;
/// the collector materializes it into the workspace once and never touches
/// it again.
#[derive(Debug, Clone)]
pub struct UploadedItem {
    pub name: String,
    bytes: Vec<u8>,
}

impl UploadedItem {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk into an item named after its final path component.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            bytes: std::fs::read(path)?,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A workspace-resident file eligible for transformation.
///
/// Created by the collector; owned by the run's workspace and gone when the
/// workspace is torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    /// Detected extension, lowercased, without the dot (e.g. `"jpg"`).
    pub ext: String,
}

/// Ordered, append-only sequence of human-readable run events.
///
/// One line per notable event: file accepted, transformed, skipped, errored.
/// Becomes `log.txt` in the result archive.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunLog(Vec<String>);

impl RunLog {
    pub fn push(&mut self, line: impl Into<String>) {
        self.0.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    /// Newline-joined text, as written to `log.txt`.
    pub fn to_text(&self) -> String {
        self.0.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Named run counters (`total`, `renamed`, `converted`, `processed`,
/// `skipped`, `errors` — whichever apply to the mode).
///
/// Every key a mode reports is present from run start, so a zero-input run
/// still yields a complete `{total: 0, ..., errors: 0}` mapping.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RunStats {
    counters: BTreeMap<String, u64>,
}

impl RunStats {
    /// Initialize all of a mode's counters to zero.
    pub fn for_keys(keys: &[&str]) -> Self {
        Self {
            counters: keys.iter().map(|k| (k.to_string(), 0)).collect(),
        }
    }

    pub fn bump(&mut self, key: &str) {
        self.add(key, 1);
    }

    pub fn add(&mut self, key: &str, n: u64) {
        *self.counters.entry(key.to_string()).or_insert(0) += n;
    }

    /// Counter value; 0 for keys never reported.
    pub fn get(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counters.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Fixed, reader-friendly order; alphabetical for anything else.
        const ORDER: [&str; 6] = [
            "total",
            "renamed",
            "converted",
            "processed",
            "skipped",
            "errors",
        ];
        let mut first = true;
        for key in ORDER {
            if let Some(&value) = self.counters.get(key) {
                if !first {
                    write!(f, ", ")?;
                }
                first = false;
                write!(f, "{key}: {value}")?;
            }
        }
        for (key, &value) in &self.counters {
            if !ORDER.contains(&key.as_str()) {
                if !first {
                    write!(f, ", ")?;
                }
                first = false;
                write!(f, "{key}: {value}")?;
            }
        }
        Ok(())
    }
}
