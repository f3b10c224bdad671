//! Playback controller: the state machine over the active-media slot

use std::sync::Arc;
use std::time::Duration;

use pmofeed::{HistoryRing, PrefetchQueue};
use pmomedia::{MediaItem, MediaKind, MediaSource};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::capabilities::{
    ExternalOpen, FullscreenCapability, NowPlayingInfo, NowPlayingPublisher,
    PictureInPictureCapability,
};
use crate::commands::{CommandSender, PlayerCommand};
use crate::download::Downloader;
use crate::errors::PlaybackError;
use crate::events::{ViewerEvent, ViewerEventBus};
use crate::renderer::{MediaRenderer, VideoStart};
use crate::session::{PlaybackSession, PlaybackState};
use crate::settings::ViewerSettings;

/// Mutable state behind the controller's single lock
struct SessionState {
    session: PlaybackSession,
    history: HistoryRing,
    source: Option<Arc<dyn MediaSource>>,
}

/// Owner of the single active-media slot
///
/// All display mutation funnels through the operations here; input
/// dispatchers and timers only ever send commands. State transitions are
/// serialized by one internal lock, while the long suspension points
/// (resolution, fill) run outside it so a forced advance or a source
/// change can overtake an in-flight advance by cancelling its fetch
/// token. A token found dead after a suspension point means the advance
/// was superseded: its result is discarded, never applied.
pub struct PlaybackController {
    state: Mutex<SessionState>,
    queue: Arc<PrefetchQueue>,
    renderer: Arc<dyn MediaRenderer>,
    events: ViewerEventBus,
    commands: CommandSender,
    settings: ViewerSettings,
    fullscreen: Option<Arc<dyn FullscreenCapability>>,
    pip: Option<Arc<dyn PictureInPictureCapability>>,
    now_playing: Option<Arc<dyn NowPlayingPublisher>>,
    opener: Option<Arc<dyn ExternalOpen>>,
    downloader: Option<Downloader>,
}

impl PlaybackController {
    pub fn new(
        renderer: Arc<dyn MediaRenderer>,
        events: ViewerEventBus,
        commands: CommandSender,
        settings: ViewerSettings,
    ) -> Self {
        let hint_renderer = renderer.clone();
        let queue = Arc::new(
            PrefetchQueue::new(settings.fill_backoff)
                .with_decode_hint(Box::new(move |item| hint_renderer.prefetch_hint(item))),
        );
        Self {
            state: Mutex::new(SessionState {
                session: PlaybackSession::new(settings.start_muted),
                history: HistoryRing::new(settings.history_limit),
                source: None,
            }),
            queue,
            renderer,
            events,
            commands,
            settings,
            fullscreen: None,
            pip: None,
            now_playing: None,
            opener: None,
            downloader: None,
        }
    }

    pub fn with_fullscreen(mut self, capability: Arc<dyn FullscreenCapability>) -> Self {
        self.fullscreen = Some(capability);
        self
    }

    pub fn with_pip(mut self, capability: Arc<dyn PictureInPictureCapability>) -> Self {
        self.pip = Some(capability);
        self
    }

    pub fn with_now_playing(mut self, publisher: Arc<dyn NowPlayingPublisher>) -> Self {
        self.now_playing = Some(publisher);
        self
    }

    pub fn with_opener(mut self, opener: Arc<dyn ExternalOpen>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn with_downloader(mut self, downloader: Downloader) -> Self {
        self.downloader = Some(downloader);
        self
    }

    /// Show the next item
    ///
    /// Unforced requests coalesce: while an advance is loading they are
    /// dropped. A forced request first cancels the in-flight resolution
    /// and every pending timer, then proceeds. The outgoing item is
    /// pushed onto the history ring; if the queue is empty a depth-1
    /// fill is awaited before taking the head. An empty queue even then
    /// sends the session back to idle, notifies, and schedules exactly
    /// one delayed retry.
    pub async fn advance(&self, force: bool) {
        let (token, source) = {
            let mut s = self.state.lock().await;
            if s.session.is_loading() && !force {
                debug!("Advance ignored, already loading");
                return;
            }
            if force {
                s.session.cancel_fetch();
                s.session.clear_dwell_timer();
                s.session.clear_scheduled_advance();
            }
            let source = match s.source.clone() {
                Some(source) => source,
                None => {
                    self.events.notify("No media source selected");
                    return;
                }
            };
            s.session.state = PlaybackState::Loading;
            self.events.loading(true);
            if let Some(current) = s.session.current_item.clone() {
                s.history.push(current);
            }
            (s.session.fetch_token(), source)
        };

        if self.queue.is_empty().await {
            self.queue
                .fill(source.clone(), 1, self.settings.max_retries, &token)
                .await;
        }
        if token.is_cancelled() {
            debug!("Advance superseded during fill");
            return;
        }

        let item = self.queue.take().await;

        let mut s = self.state.lock().await;
        if token.is_cancelled() {
            debug!("Advance superseded, discarding taken item");
            return;
        }
        match item {
            Some(item) => {
                self.display(&mut s, item).await;
                self.spawn_refill(source, s.session.fetch_token());
            }
            None => {
                s.session.state = PlaybackState::Idle;
                warn!(error = %PlaybackError::QueueExhausted, "Advance found nothing to show");
                self.events.notify("Failed to fetch media, retrying…");
                self.schedule_advance(&mut s, self.settings.refill_retry_delay, false);
            }
        }
        if s.session.current_item.is_some() {
            self.events.loading(false);
        }
    }

    /// Show the most recent history item
    ///
    /// The superseded current item is dropped, not re-enqueued; no fetch
    /// is cancelled and the queue is left alone.
    pub async fn retreat(&self) {
        let mut s = self.state.lock().await;
        match s.history.pop() {
            None => self.events.notify("No previous item"),
            Some(previous) => {
                self.display(&mut s, previous).await;
                self.events.notify("Previous");
            }
        }
    }

    /// The displayed video reached its end
    pub async fn on_video_ended(&self) {
        debug!("Video ended, loading next");
        self.advance(false).await;
    }

    /// The displayed element reported a load error
    ///
    /// Errors for anything but the currently displayed item are stale
    /// leftovers of a fast advance and are ignored.
    pub async fn on_media_load_failure(&self, url: &str) {
        let mut s = self.state.lock().await;
        let is_current = s
            .session
            .current_item
            .as_ref()
            .map(|item| item.url == url)
            .unwrap_or(false);
        if !is_current || s.session.is_loading() {
            debug!(url, "Ignoring stale media error");
            return;
        }
        warn!(error = %PlaybackError::MediaLoad(url.to_string()), "Displayed media failed");
        self.events.notify("Media failed to load, skipping…");
        self.schedule_advance(&mut s, self.settings.error_advance_delay, false);
    }

    /// Replace the active source and restart the pipeline
    ///
    /// Cancels the in-flight resolution, drops queue and history, and
    /// resets the session, all under the state lock: after the switch no
    /// old-source item can surface anywhere. Bootstraps with a forced
    /// advance.
    pub async fn change_source(&self, source: Arc<dyn MediaSource>, announce: bool) {
        {
            let mut s = self.state.lock().await;
            s.session.reset();
            s.history.clear();
            self.queue.clear().await;
            self.renderer.clear().await;
            s.source = Some(source.clone());
            self.events
                .broadcast(ViewerEvent::SourceChanged(source.id().to_string()));
            if announce {
                self.events.notify(format!("Switched to: {}", source.name()));
            }
        }
        self.advance(true).await;
    }

    /// Toggle the session mute flag
    pub async fn toggle_mute(&self) {
        let muted = {
            let mut s = self.state.lock().await;
            s.session.is_muted = !s.session.is_muted;
            s.session.is_muted
        };
        self.renderer.set_muted(muted).await;
        self.events.notify(if muted { "Muted" } else { "Unmuted" });
    }

    /// First interaction unmutes playback; later calls are no-ops
    pub async fn start_playback(&self) {
        {
            let mut s = self.state.lock().await;
            if !s.session.is_muted {
                return;
            }
            s.session.is_muted = false;
        }
        self.renderer.set_muted(false).await;
        self.events.notify("Unmuted");
    }

    /// Toggle play/pause of the displayed video
    pub async fn toggle_play_pause(&self) {
        match self.renderer.toggle_play().await {
            Some(true) => self.events.notify("Play"),
            Some(false) => self.events.notify("Pause"),
            None => {}
        }
    }

    /// Seek the displayed video by a signed number of seconds
    pub async fn seek_by(&self, seconds: i64) {
        if self.renderer.seek_by(seconds).await {
            let label = if seconds >= 0 { "Fast forward" } else { "Rewind" };
            self.events.notify(format!("{label} {}s", seconds.abs()));
        }
    }

    /// Toggle fullscreen through the capability, if present
    pub async fn toggle_fullscreen(&self) {
        let Some(fullscreen) = &self.fullscreen else {
            warn!(error = %PlaybackError::CapabilityUnavailable("Fullscreen"), "Capability call failed");
            self.events.notify("Fullscreen is not available");
            return;
        };
        if fullscreen.is_active().await {
            if let Err(e) = fullscreen.exit().await {
                debug!(error = %e, "Fullscreen exit rejected");
            }
        } else if fullscreen.enter().await.is_err() {
            self.events.notify("Unable to enter fullscreen");
        }
    }

    /// Toggle picture-in-picture through the capability, if present
    pub async fn toggle_pip(&self) {
        let video_displayed = {
            let s = self.state.lock().await;
            s.session.state == PlaybackState::DisplayingVideo
        };
        let Some(pip) = &self.pip else {
            warn!(error = %PlaybackError::CapabilityUnavailable("Picture-in-picture"), "Capability call failed");
            self.events.notify("Picture-in-picture is not available");
            return;
        };
        if pip.is_active().await {
            match pip.exit().await {
                Ok(()) => self.events.notify("Exited picture-in-picture"),
                Err(_) => self.events.notify("Unable to toggle picture-in-picture"),
            }
            return;
        }
        if !video_displayed {
            self.events.notify("Not a video, cannot picture-in-picture");
            return;
        }
        if !pip.video_ready().await {
            self.events.notify("Wait for the video to load first");
            return;
        }
        match pip.enter().await {
            Ok(()) => self.events.notify("Picture-in-picture enabled"),
            Err(e) => {
                warn!(error = %e, "Picture-in-picture rejected");
                self.events.notify("Unable to enable picture-in-picture");
            }
        }
    }

    /// Export the current item to a local file
    ///
    /// A transport failure falls back to handing the raw URL to the
    /// external-open capability.
    pub async fn download_current(&self) {
        let item = {
            let s = self.state.lock().await;
            s.session.current_item.clone()
        };
        let Some(item) = item else {
            self.events.notify("Nothing to download");
            return;
        };
        let Some(downloader) = &self.downloader else {
            self.events.notify("Download is not available");
            return;
        };
        match downloader.download(&item).await {
            Ok(path) => self.events.notify(format!("Saved {}", path.display())),
            Err(e) => {
                warn!(error = %PlaybackError::DownloadFailed(e.to_string()), "Falling back to direct open");
                match &self.opener {
                    Some(opener) if opener.open(&item.url).await.is_ok() => {
                        self.events.notify("Opening media directly…");
                    }
                    _ => self.events.notify("Download failed"),
                }
            }
        }
    }

    /// Route a command to the matching operation
    ///
    /// `ChangeSource` and `Shutdown` belong to the session coordinator
    /// and are ignored here.
    pub async fn dispatch(&self, command: PlayerCommand) {
        match command {
            PlayerCommand::Advance { force } => self.advance(force).await,
            PlayerCommand::Retreat => self.retreat().await,
            PlayerCommand::VideoEnded => self.on_video_ended().await,
            PlayerCommand::MediaError { url } => self.on_media_load_failure(&url).await,
            PlayerCommand::ToggleMute => self.toggle_mute().await,
            PlayerCommand::StartPlayback => self.start_playback().await,
            PlayerCommand::TogglePlayPause => self.toggle_play_pause().await,
            PlayerCommand::Seek(seconds) => self.seek_by(seconds).await,
            PlayerCommand::ToggleFullscreen => self.toggle_fullscreen().await,
            PlayerCommand::TogglePip => self.toggle_pip().await,
            PlayerCommand::Download => self.download_current().await,
            PlayerCommand::ChangeSource(_) | PlayerCommand::Shutdown => {}
        }
    }

    // ---- accessors ----

    pub async fn current_item(&self) -> Option<MediaItem> {
        self.state.lock().await.session.current_item.clone()
    }

    pub async fn playback_state(&self) -> PlaybackState {
        self.state.lock().await.session.state
    }

    pub async fn is_muted(&self) -> bool {
        self.state.lock().await.session.is_muted
    }

    pub async fn history_len(&self) -> usize {
        self.state.lock().await.history.len()
    }

    pub async fn has_pending_timers(&self) -> bool {
        self.state.lock().await.session.has_pending_timers()
    }

    pub fn queue(&self) -> Arc<PrefetchQueue> {
        self.queue.clone()
    }

    // ---- internals ----

    /// Drive the slot into the right displaying state for `item`
    async fn display(&self, s: &mut SessionState, item: MediaItem) {
        s.session.clear_dwell_timer();
        s.session.clear_scheduled_advance();

        match item.kind {
            MediaKind::Video => match self.renderer.show_video(&item, s.session.is_muted).await {
                Ok(VideoStart::Playing) => {
                    s.session.state = PlaybackState::DisplayingVideo;
                }
                Ok(VideoStart::AutoplayBlocked) => {
                    debug!("Autoplay with sound rejected, falling back to muted playback");
                    s.session.is_muted = true;
                    self.renderer.set_muted(true).await;
                    self.renderer.resume().await;
                    s.session.state = PlaybackState::DisplayingVideo;
                    self.events.notify("Playing muted (autoplay policy)");
                }
                Err(e) => {
                    warn!(url = %item.url, error = %e, "Video failed to display");
                    s.session.state = PlaybackState::DisplayingVideo;
                    self.events.notify("Media failed to load, skipping…");
                    self.schedule_advance(s, self.settings.error_advance_delay, false);
                }
            },
            MediaKind::Image => {
                // Une image affichée pendant un PiP actif le ferme d'abord
                if let Some(pip) = &self.pip {
                    if pip.is_active().await {
                        let _ = pip.exit().await;
                    }
                }
                match self.renderer.show_image(&item).await {
                    Ok(()) => {
                        s.session.state = PlaybackState::DisplayingImage;
                        self.arm_dwell_timer(s);
                    }
                    Err(e) => {
                        warn!(url = %item.url, error = %e, "Image failed to display");
                        s.session.state = PlaybackState::DisplayingImage;
                        self.events.notify("Media failed to load, skipping…");
                        self.schedule_advance(s, self.settings.error_advance_delay, false);
                    }
                }
            }
        }

        if let Some(publisher) = &self.now_playing {
            let source = s
                .source
                .as_ref()
                .map(|source| source.name().to_string())
                .unwrap_or_default();
            publisher
                .publish(NowPlayingInfo {
                    title: format!("Random {}", item.kind),
                    source,
                })
                .await;
        }

        s.session.current_item = Some(item);
    }

    /// Arm the image auto-advance timer
    fn arm_dwell_timer(&self, s: &mut SessionState) {
        let commands = self.commands.clone();
        let dwell = self.settings.image_display;
        s.session.set_dwell_timer(tokio::spawn(async move {
            tokio::time::sleep(dwell).await;
            let _ = commands.send(PlayerCommand::Advance { force: false });
        }));
    }

    /// Arm a delayed advance, replacing any pending one
    fn schedule_advance(&self, s: &mut SessionState, delay: Duration, force: bool) {
        let commands = self.commands.clone();
        s.session.set_scheduled_advance(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = commands.send(PlayerCommand::Advance { force });
        }));
    }

    /// Kick the background refill toward the steady-state depth
    fn spawn_refill(&self, source: Arc<dyn MediaSource>, token: CancellationToken) {
        let queue = self.queue.clone();
        let depth = self.settings.preload_count;
        let retries = self.settings.max_retries;
        tokio::spawn(async move {
            queue.fill(source, depth, retries, &token).await;
        });
    }
}
