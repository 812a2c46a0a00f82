//! Media classification
//!
//! Files are tagged as image or video purely by extension. Matching is
//! case-sensitive: `clip.mp4` is a video, `clip.MP4` is an image.

use std::path::Path;

use serde::Serialize;

/// Extensions served as video; everything else is an image
const VIDEO_EXTENSIONS: &[&str] = &["webm", "mp4"];

/// Kind of a media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Lowercase name as used in API responses
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    pub fn is_video(self) -> bool {
        self == MediaKind::Video
    }
}

/// Classify a filename by its extension
pub fn classify(file_name: &str) -> MediaKind {
    let ext = Path::new(file_name).extension().and_then(|e| e.to_str());
    match ext {
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext) => MediaKind::Video,
        _ => MediaKind::Image,
    }
}
