//! Optional platform capabilities consumed by the controller
//!
//! Each capability is independently absent-tolerant: the controller holds
//! an `Option<Arc<dyn ...>>` per concern, reports a missing or rejected
//! capability once per attempt, and never lets it alter playback state.

use anyhow::Result;

/// Fullscreen enter/exit, as exposed by the host environment
#[async_trait::async_trait]
pub trait FullscreenCapability: Send + Sync {
    async fn is_active(&self) -> bool;

    /// Enter fullscreen; hosts may reject the request
    async fn enter(&self) -> Result<()>;

    async fn exit(&self) -> Result<()>;
}

/// Picture-in-picture enter/exit
///
/// Entering fails when the active media is not a video or the video has
/// not buffered enough to detach.
#[async_trait::async_trait]
pub trait PictureInPictureCapability: Send + Sync {
    async fn is_active(&self) -> bool;

    /// True once the displayed video is ready to detach
    async fn video_ready(&self) -> bool;

    async fn enter(&self) -> Result<()>;

    async fn exit(&self) -> Result<()>;
}

/// "Now playing" metadata published on each display transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlayingInfo {
    pub title: String,
    pub source: String,
}

#[async_trait::async_trait]
pub trait NowPlayingPublisher: Send + Sync {
    async fn publish(&self, info: NowPlayingInfo);
}

/// Hand a URL to the host for direct opening (download fallback)
#[async_trait::async_trait]
pub trait ExternalOpen: Send + Sync {
    async fn open(&self, url: &str) -> Result<()>;
}
