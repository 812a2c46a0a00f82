//! Gallery listing and random sampling
//!
//! Directories are listed fresh on every call; nothing is cached. Listing is
//! non-recursive and keeps every regular entry the filesystem returns,
//! including dotfiles, except uploads that are still being written.

use std::io;
use std::path::{Path, PathBuf};

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::media::{classify, MediaKind};
use crate::uploads::STAGING_PREFIX;

/// Listing errors
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("directory has no media")]
    EmptyDirectory,

    #[error("failed to list {}: {source}", directory.display())]
    ListFailed {
        directory: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How `sample` draws its entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SampleMode {
    /// Independent uniform draws; the same entry may appear more than once
    #[default]
    WithReplacement,
    /// Distinct entries, at most as many as the directory holds
    Distinct,
}

/// A file in a gallery directory, as exposed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaEntry {
    #[serde(rename = "id")]
    pub file_name: String,
    #[serde(rename = "fullpath")]
    pub public_path: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

impl MediaEntry {
    /// Build an entry served under `static_prefix`
    pub fn new(static_prefix: &str, file_name: String) -> Self {
        Self {
            public_path: format!("{}/{}", static_prefix, file_name),
            kind: classify(&file_name),
            file_name,
        }
    }
}

/// List every file in `directory`, sorted by name
pub async fn list(directory: &Path) -> Result<Vec<String>, GalleryError> {
    let list_failed = |source: io::Error| GalleryError::ListFailed {
        directory: directory.to_path_buf(),
        source,
    };

    let mut dir = tokio::fs::read_dir(directory).await.map_err(list_failed)?;
    let mut names = Vec::new();

    while let Some(entry) = dir.next_entry().await.map_err(list_failed)? {
        // Subdirectories are not servable media
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) if name.starts_with(STAGING_PREFIX) => {}
            Ok(name) => names.push(name),
            Err(name) => warn!(
                "Skipping non-UTF-8 filename {:?} in {}",
                name,
                directory.display()
            ),
        }
    }

    names.sort();
    Ok(names)
}

/// List `directory` as media entries served under `static_prefix`
pub async fn entries(directory: &Path, static_prefix: &str) -> Result<Vec<MediaEntry>, GalleryError> {
    Ok(list(directory)
        .await?
        .into_iter()
        .map(|name| MediaEntry::new(static_prefix, name))
        .collect())
}

/// Draw `n` entries from `directory`
pub async fn sample(
    directory: &Path,
    static_prefix: &str,
    n: usize,
    mode: SampleMode,
) -> Result<Vec<MediaEntry>, GalleryError> {
    let entries = entries(directory, static_prefix).await?;
    sample_from(&entries, n, mode)
}

/// Draw `n` entries from an already-listed set
pub fn sample_from(
    entries: &[MediaEntry],
    n: usize,
    mode: SampleMode,
) -> Result<Vec<MediaEntry>, GalleryError> {
    if entries.is_empty() {
        return Err(GalleryError::EmptyDirectory);
    }

    let mut rng = rand::rng();
    let picked = match mode {
        SampleMode::WithReplacement => (0..n)
            .filter_map(|_| entries.choose(&mut rng).cloned())
            .collect(),
        SampleMode::Distinct => entries.choose_multiple(&mut rng, n).cloned().collect(),
    };
    Ok(picked)
}

/// Draw a single entry from `directory`
pub async fn random_one(directory: &Path, static_prefix: &str) -> Result<MediaEntry, GalleryError> {
    let entries = entries(directory, static_prefix).await?;
    pick_one(&entries)
}

/// Draw a single entry from an already-listed set
pub fn pick_one(entries: &[MediaEntry]) -> Result<MediaEntry, GalleryError> {
    entries
        .choose(&mut rand::rng())
        .cloned()
        .ok_or(GalleryError::EmptyDirectory)
}
