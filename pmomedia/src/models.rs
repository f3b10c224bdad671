//! Media item types shared across the viewer

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media a source serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn is_image(&self) -> bool {
        matches!(self, MediaKind::Image)
    }

    pub fn is_video(&self) -> bool {
        matches!(self, MediaKind::Video)
    }

    /// Default file extension used when exporting an item of this kind
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// A single resolved media item
///
/// Items are immutable once created; identity is the `url` field, which is
/// also the deduplication key of the prefetch queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub url: String,
    pub kind: MediaKind,
}

impl MediaItem {
    pub fn new(url: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::new(url, MediaKind::Image)
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self::new(url, MediaKind::Video)
    }
}

/// Catalog entry describing a configurable media source
///
/// These entries live under the `sources:` key of the configuration file
/// and are turned into `HttpMediaSource` instances by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub name: String,
    pub url: String,
    pub kind: MediaKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_yaml() {
        let kind: MediaKind = serde_yaml::from_str("video").unwrap();
        assert_eq!(kind, MediaKind::Video);
        assert_eq!(serde_yaml::to_string(&kind).unwrap().trim(), "video");
    }

    #[test]
    fn descriptor_parses_from_catalog_entry() {
        let yaml = "id: picsum\nname: Lorem Picsum\nurl: https://picsum.photos/1920/1080\nkind: image\n";
        let desc: SourceDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(desc.id, "picsum");
        assert!(desc.kind.is_image());
    }

    #[test]
    fn extension_matches_kind() {
        assert_eq!(MediaKind::Image.default_extension(), "jpg");
        assert_eq!(MediaKind::Video.default_extension(), "mp4");
    }
}
