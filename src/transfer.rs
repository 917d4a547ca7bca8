//! Optional delivery of a finished archive to an external transfer service.
//!
//! Alternative to handing the archive bytes back directly: POST the file as
//! multipart form data and return the download link from the JSON response.
//! Never part of the core pipeline; a failed upload loses nothing, the
//! archive is still on disk.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("could not read archive for upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("transfer service responded with status {0}")]
    Status(u16),
    #[error("transfer service response carried no download link")]
    MissingLink,
}

/// Upload `archive_path` to `endpoint`, returning the download URL.
pub fn upload_archive(endpoint: &str, archive_path: &Path) -> Result<String, TransferError> {
    let form = reqwest::blocking::multipart::Form::new()
        .text("message", "Your archive is ready")
        .file("files", archive_path)?;

    let response = reqwest::blocking::Client::new()
        .post(endpoint)
        .multipart(form)
        .send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransferError::Status(status.as_u16()));
    }

    let body: serde_json::Value = response.json()?;
    body.get("download_url")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .ok_or(TransferError::MissingLink)
}
