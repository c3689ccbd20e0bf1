//! Adaptive streaming backend bridge traits.
//!
//! The streaming backend owns manifest parsing, segment fetching, and bitrate
//! switching for one media element. The core node only steers it: create a
//! binding per bind episode, initialize it against the element and manifest,
//! constrain quality selection, and forward volume. Everything the backend
//! learns asynchronously (notably "metadata loaded") surfaces through handler
//! registration; handlers receive the backend itself so they can act on the
//! instance that fired them.

use crate::{element::MediaElement, error::Result, platform::PlatformSendSync};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Track category addressed by quality-control calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Video,
    Audio,
    Text,
}

impl std::fmt::Display for TrackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackType::Video => write!(f, "video"),
            TrackType::Audio => write!(f, "audio"),
            TrackType::Text => write!(f, "text"),
        }
    }
}

/// One rung of a track's bitrate ladder as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitrateInfo {
    /// Index of this entry within the ladder; the value passed to
    /// [`StreamingBackend::set_quality`].
    pub quality_index: usize,
    /// Media bitrate in bits per second.
    pub bitrate: u32,
    /// Frame width in pixels, for video tracks.
    pub width: Option<u32>,
    /// Frame height in pixels, for video tracks.
    pub height: Option<u32>,
}

impl BitrateInfo {
    /// Create a ladder entry without dimension information.
    pub fn new(quality_index: usize, bitrate: u32) -> Self {
        Self {
            quality_index,
            bitrate,
            width: None,
            height: None,
        }
    }

    /// Attach video dimensions to the entry.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Handler invoked when the backend has loaded playback metadata.
///
/// The backend passes itself so the handler can query the bitrate ladder and
/// pin a quality on the instance that raised the signal.
#[cfg(not(target_arch = "wasm32"))]
pub type MetadataHandler = Box<dyn Fn(&dyn StreamingBackend) + Send + Sync>;

/// Handler invoked when the backend has loaded playback metadata.
#[cfg(target_arch = "wasm32")]
pub type MetadataHandler = Box<dyn Fn(&dyn StreamingBackend)>;

/// Trait for adaptive streaming engines bound to a single media element.
///
/// Methods take `&self`; implementations manage their own interior mutability
/// so registered handlers can steer the backend that invoked them.
pub trait StreamingBackend: PlatformSendSync {
    /// Attach the backend to a media element and begin loading the manifest.
    ///
    /// `autoplay` controls whether the backend starts playback on its own once
    /// enough data is buffered; the driving node passes `false` and issues
    /// play calls itself.
    fn initialize(
        &self,
        element: Arc<dyn MediaElement>,
        manifest_url: &str,
        autoplay: bool,
    ) -> Result<()>;

    /// Enable or disable automatic bitrate switching for a track.
    fn set_auto_switch_quality(&self, track: TrackType, enabled: bool) -> Result<()>;

    /// Register a handler for the metadata-loaded signal. The signal fires at
    /// most once per initialization, after the manifest and initial metadata
    /// have been parsed.
    fn on_metadata_loaded(&self, handler: MetadataHandler);

    /// Bitrate ladder for a track, ordered by the backend. Empty until
    /// metadata has loaded.
    fn bitrate_ladder(&self, track: TrackType) -> Vec<BitrateInfo>;

    /// Pin a track to one ladder entry. Only meaningful while auto switching
    /// is disabled.
    fn set_quality(&self, track: TrackType, index: usize) -> Result<()>;

    /// Forward the desired output volume, normalized to `0.0..=1.0`.
    fn set_volume(&self, volume: f32) -> Result<()>;
}

/// Factory creating one backend binding per bind episode.
///
/// Bindings are tied 1:1 to the element they were initialized with and are
/// destroyed (dropped) when that element is released.
pub trait StreamingBackendFactory: PlatformSendSync {
    /// Create a fresh, uninitialized backend binding.
    fn create_backend(&self) -> Result<Box<dyn StreamingBackend>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_type_display_matches_wire_names() {
        assert_eq!(TrackType::Video.to_string(), "video");
        assert_eq!(TrackType::Audio.to_string(), "audio");
        assert_eq!(TrackType::Text.to_string(), "text");
    }

    #[test]
    fn track_type_serde_lowercase() {
        let json = serde_json::to_string(&TrackType::Video).unwrap();
        assert_eq!(json, "\"video\"");
        let back: TrackType = serde_json::from_str("\"audio\"").unwrap();
        assert_eq!(back, TrackType::Audio);
    }

    #[test]
    fn bitrate_info_builder() {
        let info = BitrateInfo::new(2, 4_500_000).with_dimensions(1920, 1080);
        assert_eq!(info.quality_index, 2);
        assert_eq!(info.bitrate, 4_500_000);
        assert_eq!(info.width, Some(1920));
        assert_eq!(info.height, Some(1080));
    }
}
