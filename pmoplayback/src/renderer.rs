//! Presentation boundary of the playback pipeline

use anyhow::Result;
use pmomedia::MediaItem;
use std::sync::Mutex;
use tracing::info;

/// Outcome of starting video playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStart {
    /// Playing with the requested mute state
    Playing,
    /// The host refused autoplay with sound; caller falls back to muted
    AutoplayBlocked,
}

/// Abstraction over the single "currently displayed media" surface
///
/// The playback controller is the only caller: all display mutation goes
/// through its operations, never directly to the surface. Implementations
/// report asynchronous load failures by sending
/// `PlayerCommand::MediaError { url }` into the command channel.
#[async_trait::async_trait]
pub trait MediaRenderer: Send + Sync {
    /// Display an image item
    async fn show_image(&self, item: &MediaItem) -> Result<()>;

    /// Display a video item and start playback
    async fn show_video(&self, item: &MediaItem, muted: bool) -> Result<VideoStart>;

    /// Apply the session mute flag to the surface
    async fn set_muted(&self, muted: bool);

    /// Resume playback of the displayed video
    async fn resume(&self);

    /// Toggle play/pause; `None` when no video is displayed, otherwise
    /// the new playing state
    async fn toggle_play(&self) -> Option<bool>;

    /// Seek the displayed video by a signed number of seconds, clamped
    /// to its duration; returns false when no video is displayed
    async fn seek_by(&self, seconds: i64) -> bool;

    /// Tear down the surface (source change)
    async fn clear(&self);

    /// Best-effort eager-decode hint for a freshly prefetched image
    fn prefetch_hint(&self, _item: &MediaItem) {}
}

/// Tracing-backed renderer used by the binary and as a test stand-in
///
/// Keeps just enough state to answer the video-oriented calls.
#[derive(Debug, Default)]
pub struct LogRenderer {
    displayed: Mutex<Option<Displayed>>,
}

#[derive(Debug)]
struct Displayed {
    item: MediaItem,
    playing: bool,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn video_displayed(&self) -> bool {
        self.displayed
            .lock()
            .unwrap()
            .as_ref()
            .map(|d| d.item.kind.is_video())
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl MediaRenderer for LogRenderer {
    async fn show_image(&self, item: &MediaItem) -> Result<()> {
        info!(url = %item.url, "🖼️ Displaying image");
        *self.displayed.lock().unwrap() = Some(Displayed {
            item: item.clone(),
            playing: false,
        });
        Ok(())
    }

    async fn show_video(&self, item: &MediaItem, muted: bool) -> Result<VideoStart> {
        info!(url = %item.url, muted, "🎬 Displaying video");
        *self.displayed.lock().unwrap() = Some(Displayed {
            item: item.clone(),
            playing: true,
        });
        Ok(VideoStart::Playing)
    }

    async fn set_muted(&self, muted: bool) {
        info!(muted, "Mute flag applied");
    }

    async fn resume(&self) {
        if let Some(displayed) = self.displayed.lock().unwrap().as_mut() {
            displayed.playing = true;
        }
    }

    async fn toggle_play(&self) -> Option<bool> {
        let mut displayed = self.displayed.lock().unwrap();
        match displayed.as_mut() {
            Some(d) if d.item.kind.is_video() => {
                d.playing = !d.playing;
                Some(d.playing)
            }
            _ => None,
        }
    }

    async fn seek_by(&self, seconds: i64) -> bool {
        if self.video_displayed() {
            info!(seconds, "Seek");
            true
        } else {
            false
        }
    }

    async fn clear(&self) {
        *self.displayed.lock().unwrap() = None;
    }
}
