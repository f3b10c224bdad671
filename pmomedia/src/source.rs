//! The media source resolution contract

use crate::error::Result;
use crate::models::MediaKind;
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

/// Main trait for media sources
///
/// A source resolves, on demand, one concrete playable URL of its kind.
/// Implementations must be `Send + Sync`: resolution runs inside background
/// fill tasks that outlive any single caller.
///
/// # Cancellation
///
/// Each `resolve` call observes the provided [`CancellationToken`]; a
/// cancelled call returns `Error::Aborted` and must not leave a request in
/// flight. A source change or forced advance cancels the token before a new
/// resolution starts, so a stale response can never be applied.
///
/// # Dedup busting
///
/// Upstream endpoints return random content per fetch of the same path, so
/// each call must append freshly generated query parameters to avoid
/// resolving an identical cached URL twice in a row (see
/// [`cache_busted`](crate::http::cache_busted)).
#[async_trait::async_trait]
pub trait MediaSource: Debug + Send + Sync {
    /// Stable identifier of the source (selection key)
    fn id(&self) -> &str;

    /// Human readable label, published with now-playing metadata
    fn name(&self) -> &str;

    /// Kind of media this source serves
    fn kind(&self) -> MediaKind;

    /// Resolve one playable URL, or fail
    async fn resolve(&self, cancel: &CancellationToken) -> Result<String>;
}
