//! Playback session: the single active-media slot and its guards

use pmomedia::MediaItem;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// State of the active-media slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing displayed, nothing loading
    Idle,
    /// An advance is in flight
    Loading,
    /// A video is displayed and playing
    DisplayingVideo,
    /// An image is displayed; the dwell timer is armed
    DisplayingImage,
}

/// The live playback session
///
/// Exactly one session is live at a time; a source change replaces it
/// wholesale. The session owns the cancellation guard of in-flight
/// resolutions and the scheduled-callback handles (image dwell,
/// delayed advance retry) — every competing transition must go through
/// the clearing methods here so no timer outlives the item it was armed
/// for.
#[derive(Debug)]
pub struct PlaybackSession {
    pub state: PlaybackState,
    pub current_item: Option<MediaItem>,
    pub is_muted: bool,
    /// Bumped on each source change; stale work logs against it
    pub generation: u64,
    fetch_guard: CancellationToken,
    dwell_timer: Option<JoinHandle<()>>,
    scheduled_advance: Option<JoinHandle<()>>,
}

impl PlaybackSession {
    pub fn new(start_muted: bool) -> Self {
        Self {
            state: PlaybackState::Idle,
            current_item: None,
            is_muted: start_muted,
            generation: 0,
            fetch_guard: CancellationToken::new(),
            dwell_timer: None,
            scheduled_advance: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == PlaybackState::Loading
    }

    /// Handle observed by resolutions started for this session
    ///
    /// Clones share the cancellation state: once [`cancel_fetch`]
    /// replaces the guard, every previously handed-out token stays
    /// cancelled and its pending result must be discarded.
    ///
    /// [`cancel_fetch`]: Self::cancel_fetch
    pub fn fetch_token(&self) -> CancellationToken {
        self.fetch_guard.clone()
    }

    /// Cancel the in-flight resolution, if any, and arm a fresh guard
    pub fn cancel_fetch(&mut self) {
        self.fetch_guard.cancel();
        self.fetch_guard = CancellationToken::new();
    }

    /// Arm the image auto-advance timer, replacing any previous one
    pub fn set_dwell_timer(&mut self, timer: JoinHandle<()>) {
        self.clear_dwell_timer();
        self.dwell_timer = Some(timer);
    }

    pub fn clear_dwell_timer(&mut self) {
        if let Some(timer) = self.dwell_timer.take() {
            timer.abort();
        }
    }

    /// Arm a delayed advance (exhausted-queue retry or failed-load skip)
    pub fn set_scheduled_advance(&mut self, timer: JoinHandle<()>) {
        self.clear_scheduled_advance();
        self.scheduled_advance = Some(timer);
    }

    pub fn clear_scheduled_advance(&mut self) {
        if let Some(timer) = self.scheduled_advance.take() {
            timer.abort();
        }
    }

    /// True while any scheduled callback is pending (test hook)
    pub fn has_pending_timers(&self) -> bool {
        self.dwell_timer
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
            || self
                .scheduled_advance
                .as_ref()
                .map(|t| !t.is_finished())
                .unwrap_or(false)
    }

    /// Tear the session down to a fresh idle state (source change)
    pub fn reset(&mut self) {
        self.clear_dwell_timer();
        self.clear_scheduled_advance();
        self.cancel_fetch();
        self.current_item = None;
        self.state = PlaybackState::Idle;
        self.generation += 1;
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.clear_dwell_timer();
        self.clear_scheduled_advance();
        self.fetch_guard.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_idle() {
        let session = PlaybackSession::new(true);
        assert_eq!(session.state, PlaybackState::Idle);
        assert!(session.current_item.is_none());
        assert!(session.is_muted);
        assert!(!session.has_pending_timers());
    }

    #[test]
    fn cancel_fetch_invalidates_previous_tokens() {
        let mut session = PlaybackSession::new(true);
        let before = session.fetch_token();
        session.cancel_fetch();

        assert!(before.is_cancelled());
        assert!(!session.fetch_token().is_cancelled());
    }

    #[tokio::test]
    async fn reset_clears_slot_and_bumps_generation() {
        let mut session = PlaybackSession::new(false);
        session.current_item = Some(MediaItem::image("https://example.com/a"));
        session.state = PlaybackState::DisplayingImage;
        session.set_dwell_timer(tokio::spawn(std::future::pending()));
        let token = session.fetch_token();

        session.reset();

        assert_eq!(session.state, PlaybackState::Idle);
        assert!(session.current_item.is_none());
        assert_eq!(session.generation, 1);
        assert!(token.is_cancelled());
        // Le mute est global à la session utilisateur, pas au slot
        assert!(!session.is_muted);
    }
}
