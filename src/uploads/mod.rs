//! Content-addressed upload storage
//!
//! Uploads are stored under the SHA-256 of their bytes plus the original
//! extension, enabling:
//! - Deduplication (same content = same file name, written once)
//! - No path input from clients (the stored name is always hex + extension)
//!
//! Payloads are written to a staging file in the target directory and only
//! then linked to their content address, so a stored name never refers to
//! a partial file. When two uploads of the same new content race, the one
//! that publishes second discards its copy and reports a duplicate.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::MAX_EXTENSION_LEN;

/// Name prefix of in-flight upload files; listings skip these
pub const STAGING_PREFIX: &str = ".upload-";

/// Upload errors
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no file payload in request")]
    MissingPayload,

    #[error("failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single uploaded file, validated at the HTTP boundary
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadRequest {
    /// Build an upload, rejecting empty payloads
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self, UploadError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(UploadError::MissingPayload);
        }
        Ok(Self {
            file_name: file_name.into(),
            bytes,
        })
    }
}

/// Outcome of a stored upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    #[serde(rename = "fileName")]
    pub stored_file_name: String,
    #[serde(rename = "duplicate")]
    pub was_duplicate: bool,
}

/// Compute SHA-256 hash of data
pub fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Extension of `file_name` with its dot, reduced to safe characters
///
/// Only ASCII alphanumerics survive, truncated to `MAX_EXTENSION_LEN`.
/// Names without an extension (including dotfiles) yield an empty string.
pub fn safe_extension(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let ext = match base.rfind('.') {
        Some(0) | None => return String::new(),
        Some(i) => &base[i + 1..],
    };

    let cleaned: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_EXTENSION_LEN)
        .collect();

    if cleaned.is_empty() {
        String::new()
    } else {
        format!(".{}", cleaned)
    }
}

/// Name a payload is stored under
pub fn stored_name(upload: &UploadRequest) -> String {
    format!(
        "{}{}",
        compute_hash(&upload.bytes),
        safe_extension(&upload.file_name)
    )
}

/// Store `upload` in `directory`, at most once per distinct content
///
/// The directory must already exist; a missing directory is a write failure.
pub async fn store(directory: &Path, upload: &UploadRequest) -> Result<UploadResult, UploadError> {
    let stored_file_name = stored_name(upload);
    let path = directory.join(&stored_file_name);
    let write_failed = |source: io::Error| UploadError::WriteFailed {
        path: path.clone(),
        source,
    };

    if tokio::fs::try_exists(&path).await.map_err(write_failed)? {
        debug!("File {} is a duplicate. Ignoring.", stored_file_name);
        return Ok(UploadResult {
            stored_file_name,
            was_duplicate: true,
        });
    }

    let (staging_dir, target, bytes) = (
        directory.to_path_buf(),
        path.clone(),
        upload.bytes.clone(),
    );
    // Runs to completion even if the request is dropped mid-write
    let published = tokio::task::spawn_blocking(move || {
        write_atomically(&staging_dir, &target, |file| file.write_all(&bytes))
    })
    .await
    .map_err(io::Error::other)
    .and_then(|result| result)
    .map_err(write_failed)?;

    if !published {
        debug!("File {} was stored concurrently. Ignoring.", stored_file_name);
        return Ok(UploadResult {
            stored_file_name,
            was_duplicate: true,
        });
    }

    info!(
        "File {} uploaded as {} ({} bytes)",
        upload.file_name,
        stored_file_name,
        upload.bytes.len()
    );
    Ok(UploadResult {
        stored_file_name,
        was_duplicate: false,
    })
}

/// Write a staging file in `directory` and link it to `target`
///
/// Returns `Ok(false)` when `target` already exists; it is never replaced.
/// The staging file is removed on every path except a successful publish.
fn write_atomically(
    directory: &Path,
    target: &Path,
    write: impl FnOnce(&mut File) -> io::Result<()>,
) -> io::Result<bool> {
    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(directory)?;
    write(staged.as_file_mut())?;
    staged.as_file().sync_all()?;

    match staged.persist_noclobber(target) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.error),
    }
}
