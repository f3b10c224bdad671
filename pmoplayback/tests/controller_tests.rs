//! Integration tests for the playback controller state machine

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pmomedia::{MediaKind, MediaSource};
use pmoplayback::{
    command_channel, CommandReceiver, MediaRenderer, PlaybackController, PlaybackState,
    PlayerCommand, VideoStart, ViewerEvent, ViewerEventBus, ViewerSettings,
};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

// ---- test doubles ----

#[derive(Debug)]
enum Behavior {
    /// Resolves instantly with unique URLs
    Instant,
    /// Always fails with a timeout
    Failing,
    /// Parks each resolution until the gate fires or the token cancels
    Gated(Arc<Notify>),
}

#[derive(Debug)]
struct TestSource {
    id: String,
    kind: MediaKind,
    behavior: Behavior,
    calls: AtomicUsize,
    aborted: AtomicUsize,
}

impl TestSource {
    fn instant(id: &str, kind: MediaKind) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            kind,
            behavior: Behavior::Instant,
            calls: AtomicUsize::new(0),
            aborted: AtomicUsize::new(0),
        })
    }

    fn failing(id: &str, kind: MediaKind) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            kind,
            behavior: Behavior::Failing,
            calls: AtomicUsize::new(0),
            aborted: AtomicUsize::new(0),
        })
    }

    fn gated(id: &str, kind: MediaKind, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            kind,
            behavior: Behavior::Gated(gate),
            calls: AtomicUsize::new(0),
            aborted: AtomicUsize::new(0),
        })
    }

    fn url(&self, n: usize) -> String {
        format!("https://{}.example/{n}", self.id)
    }
}

#[async_trait::async_trait]
impl MediaSource for TestSource {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.id
    }
    fn kind(&self) -> MediaKind {
        self.kind
    }
    async fn resolve(&self, cancel: &CancellationToken) -> pmomedia::Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Instant => Ok(self.url(n)),
            Behavior::Failing => Err(pmomedia::Error::Timeout),
            Behavior::Gated(gate) => {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        self.aborted.fetch_add(1, Ordering::SeqCst);
                        Err(pmomedia::Error::Aborted)
                    }
                    _ = gate.notified() => Ok(self.url(n)),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RenderCall {
    Image(String),
    Video { url: String, muted: bool },
    SetMuted(bool),
    Resume,
    Clear,
}

#[derive(Debug, Default)]
struct TestRenderer {
    calls: Mutex<Vec<RenderCall>>,
    block_next_autoplay: AtomicBool,
    hints: AtomicUsize,
}

impl TestRenderer {
    fn record(&self, call: RenderCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MediaRenderer for TestRenderer {
    async fn show_image(&self, item: &pmomedia::MediaItem) -> anyhow::Result<()> {
        self.record(RenderCall::Image(item.url.clone()));
        Ok(())
    }

    async fn show_video(
        &self,
        item: &pmomedia::MediaItem,
        muted: bool,
    ) -> anyhow::Result<VideoStart> {
        self.record(RenderCall::Video {
            url: item.url.clone(),
            muted,
        });
        if self.block_next_autoplay.swap(false, Ordering::SeqCst) {
            Ok(VideoStart::AutoplayBlocked)
        } else {
            Ok(VideoStart::Playing)
        }
    }

    async fn set_muted(&self, muted: bool) {
        self.record(RenderCall::SetMuted(muted));
    }

    async fn resume(&self) {
        self.record(RenderCall::Resume);
    }

    async fn toggle_play(&self) -> Option<bool> {
        None
    }

    async fn seek_by(&self, _seconds: i64) -> bool {
        false
    }

    async fn clear(&self) {
        self.record(RenderCall::Clear);
    }

    fn prefetch_hint(&self, _item: &pmomedia::MediaItem) {
        self.hints.fetch_add(1, Ordering::SeqCst);
    }
}

// ---- harness ----

struct Harness {
    controller: Arc<PlaybackController>,
    rx: CommandReceiver,
    events: crossbeam_channel::Receiver<ViewerEvent>,
    renderer: Arc<TestRenderer>,
}

fn harness_with(settings: ViewerSettings) -> Harness {
    let bus = ViewerEventBus::new();
    let events = bus.subscribe();
    let (tx, rx) = command_channel();
    let renderer = Arc::new(TestRenderer::default());
    let controller = Arc::new(PlaybackController::new(
        renderer.clone(),
        bus,
        tx,
        settings,
    ));
    Harness {
        controller,
        rx,
        events,
        renderer,
    }
}

fn harness() -> Harness {
    harness_with(ViewerSettings::default())
}

/// Drain and dispatch every queued command (timers feed this channel)
async fn pump(h: &mut Harness) {
    let controller = h.controller.clone();
    while let Ok(command) = h.rx.try_recv() {
        controller.dispatch(command).await;
    }
}

/// Drain queued commands without dispatching them
fn drain_commands(h: &mut Harness) -> Vec<PlayerCommand> {
    let mut commands = Vec::new();
    while let Ok(command) = h.rx.try_recv() {
        commands.push(command);
    }
    commands
}

fn drain_notifies(h: &Harness) -> Vec<String> {
    h.events
        .try_iter()
        .filter_map(|event| match event {
            ViewerEvent::Notify(text) => Some(text),
            _ => None,
        })
        .collect()
}

async fn yield_a_bit() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

// ---- tests ----

#[tokio::test(start_paused = true)]
async fn bootstrap_stabilizes_queue_at_target_depth() {
    let mut h = harness();
    let source = TestSource::instant("img", MediaKind::Image);

    h.controller.change_source(source.clone(), false).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    pump(&mut h).await;

    assert_eq!(
        h.controller.playback_state().await,
        PlaybackState::DisplayingImage
    );
    assert_eq!(h.controller.current_item().await.unwrap().url, source.url(0));
    // Le refill d'arrière-plan ramène la profondeur au régime permanent
    assert_eq!(h.controller.queue().len().await, 5);
}

#[tokio::test(start_paused = true)]
async fn unforced_advance_is_a_noop_while_loading() {
    let mut h = harness();
    let gate = Arc::new(Notify::new());
    let source = TestSource::gated("vid", MediaKind::Video, gate.clone());

    let c = h.controller.clone();
    let src = source.clone();
    let bootstrap = tokio::spawn(async move {
        c.change_source(src, false).await;
    });
    yield_a_bit().await;

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.controller.playback_state().await, PlaybackState::Loading);

    h.controller.advance(false).await;

    // Aucune nouvelle résolution, aucun changement d'état
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(h.controller.current_item().await.is_none());
    assert_eq!(h.controller.playback_state().await, PlaybackState::Loading);

    gate.notify_waiters();
    bootstrap.await.unwrap();
    assert_eq!(h.controller.current_item().await.unwrap().url, source.url(0));
}

#[tokio::test(start_paused = true)]
async fn second_forced_advance_cancels_the_first_resolution() {
    let mut h = harness();
    let gate = Arc::new(Notify::new());
    let source = TestSource::gated("vid", MediaKind::Video, gate.clone());

    let c = h.controller.clone();
    let src = source.clone();
    let first = tokio::spawn(async move {
        c.change_source(src, false).await;
    });
    yield_a_bit().await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);

    let c = h.controller.clone();
    let second = tokio::spawn(async move {
        c.advance(true).await;
    });
    yield_a_bit().await;

    // La première résolution en vol a été annulée par le forçage
    assert_eq!(source.aborted.load(Ordering::SeqCst), 1);
    first.await.unwrap();

    // Les résolutions suivantes aboutissent; le résultat affiché vient
    // d'une résolution postérieure à l'annulation
    for _ in 0..50 {
        gate.notify_waiters();
        tokio::time::sleep(Duration::from_millis(200)).await;
        pump(&mut h).await;
        if h.controller.current_item().await.is_some() {
            break;
        }
    }
    let _ = second.await;

    assert_eq!(source.aborted.load(Ordering::SeqCst), 1);
    let current = h.controller.current_item().await.expect("nothing displayed");
    assert!(current.url.starts_with("https://vid.example/"));
    assert_ne!(current.url, source.url(0));
}

#[tokio::test(start_paused = true)]
async fn retreat_on_empty_history_changes_nothing() {
    let h = harness();

    h.controller.retreat().await;

    assert_eq!(drain_notifies(&h), vec!["No previous item".to_string()]);
    assert_eq!(h.controller.playback_state().await, PlaybackState::Idle);
    assert!(h.controller.current_item().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn image_dwell_advances_exactly_once() {
    let mut h = harness();
    let source = TestSource::instant("img", MediaKind::Image);
    h.controller.change_source(source.clone(), false).await;
    assert_eq!(h.controller.current_item().await.unwrap().url, source.url(0));

    tokio::time::sleep(Duration::from_millis(3100)).await;
    let commands = drain_commands(&mut h);
    assert_eq!(commands, vec![PlayerCommand::Advance { force: false }]);

    h.controller.dispatch(commands[0].clone()).await;
    assert_eq!(h.controller.current_item().await.unwrap().url, source.url(1));

    // Le minuteur de la première image n'a pas survécu : un seul
    // auto-avancement par période d'affichage
    tokio::time::sleep(Duration::from_millis(3100)).await;
    let commands = drain_commands(&mut h);
    assert_eq!(commands, vec![PlayerCommand::Advance { force: false }]);
}

#[tokio::test(start_paused = true)]
async fn forced_advance_cancels_the_pending_dwell_timer() {
    let mut h = harness();
    let source = TestSource::instant("img", MediaKind::Image);
    h.controller.change_source(source.clone(), false).await;

    tokio::time::sleep(Duration::from_millis(1000)).await;
    h.controller.advance(true).await;

    // t=3500: l'ancien minuteur (échéance 3000) a été annulé
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(drain_commands(&mut h).is_empty());

    // t=4200: le minuteur de la nouvelle image (échéance 4000) tire
    tokio::time::sleep(Duration::from_millis(700)).await;
    let commands = drain_commands(&mut h);
    assert_eq!(commands, vec![PlayerCommand::Advance { force: false }]);
}

#[tokio::test(start_paused = true)]
async fn source_change_cancels_timers_and_leaves_none_pending() {
    let mut h = harness();
    let images = TestSource::instant("img", MediaKind::Image);
    h.controller.change_source(images, false).await;

    let videos = TestSource::instant("vid", MediaKind::Video);
    h.controller.change_source(videos, false).await;

    // L'échéance du minuteur d'image est passée sans avancement parasite
    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert!(drain_commands(&mut h).is_empty());
    assert!(!h.controller.has_pending_timers().await);
}

#[tokio::test(start_paused = true)]
async fn exhausted_queue_notifies_and_schedules_a_single_retry() {
    let mut h = harness();
    let source = TestSource::failing("dead", MediaKind::Video);

    h.controller.change_source(source.clone(), false).await;

    // Budget de remplissage forcé : max_retries × profondeur 1
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.controller.playback_state().await, PlaybackState::Idle);
    assert!(h.controller.current_item().await.is_none());
    assert!(drain_notifies(&h)
        .iter()
        .any(|text| text.contains("retrying")));

    // Pas de relance avant le délai configuré
    assert!(drain_commands(&mut h).is_empty());
    tokio::time::sleep(Duration::from_millis(1600)).await;
    let commands = drain_commands(&mut h);
    assert_eq!(commands, vec![PlayerCommand::Advance { force: false }]);

    // Une seule relance programmée par tentative échouée
    tokio::time::sleep(Duration::from_millis(3000)).await;
    assert!(drain_commands(&mut h).is_empty());
}

#[tokio::test(start_paused = true)]
async fn source_change_purges_every_trace_of_the_old_source() {
    let mut h = harness();
    let gate = Arc::new(Notify::new());
    let old = TestSource::gated("old", MediaKind::Image, gate.clone());
    let new = TestSource::instant("new", MediaKind::Image);

    let c = h.controller.clone();
    let src = old.clone();
    let stalled = tokio::spawn(async move {
        c.change_source(src, false).await;
    });
    yield_a_bit().await;
    assert_eq!(old.calls.load(Ordering::SeqCst), 1);

    h.controller.change_source(new.clone(), false).await;
    gate.notify_waiters();
    let _ = stalled.await;

    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(200)).await;
        pump(&mut h).await;
        if h.controller.current_item().await.is_some() {
            break;
        }
    }

    let current = h.controller.current_item().await.expect("nothing displayed");
    assert!(current.url.starts_with("https://new.example/"));
    for queued in h.controller.queue().snapshot().await {
        assert!(
            queued.url.starts_with("https://new.example/"),
            "stale item survived the switch: {}",
            queued.url
        );
    }
    assert_eq!(h.controller.history_len().await, 0);
}

#[tokio::test(start_paused = true)]
async fn rejected_autoplay_falls_back_to_muted_playback() {
    let h = harness_with(ViewerSettings {
        start_muted: false,
        ..ViewerSettings::default()
    });
    h.renderer.block_next_autoplay.store(true, Ordering::SeqCst);
    let source = TestSource::instant("vid", MediaKind::Video);

    h.controller.change_source(source.clone(), false).await;

    assert!(h.controller.is_muted().await);
    assert_eq!(
        h.controller.playback_state().await,
        PlaybackState::DisplayingVideo
    );
    let calls = h.renderer.calls();
    assert!(calls.contains(&RenderCall::Video {
        url: source.url(0),
        muted: false
    }));
    assert!(calls.contains(&RenderCall::SetMuted(true)));
    assert!(calls.contains(&RenderCall::Resume));
    assert!(drain_notifies(&h).iter().any(|text| text.contains("muted")));
}

#[tokio::test(start_paused = true)]
async fn media_errors_for_stale_elements_are_ignored() {
    let mut h = harness();
    let source = TestSource::instant("vid", MediaKind::Video);
    h.controller.change_source(source.clone(), false).await;

    h.controller
        .on_media_load_failure("https://elsewhere.example/0")
        .await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(drain_commands(&mut h).is_empty());

    let current = h.controller.current_item().await.unwrap();
    h.controller.on_media_load_failure(&current.url).await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    let commands = drain_commands(&mut h);
    assert_eq!(commands, vec![PlayerCommand::Advance { force: false }]);
}

#[tokio::test(start_paused = true)]
async fn retreat_restores_the_previous_item_and_drops_the_current_one() {
    let mut h = harness();
    let source = TestSource::instant("vid", MediaKind::Video);
    h.controller.change_source(source.clone(), false).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    pump(&mut h).await;

    h.controller.advance(true).await;
    assert_eq!(h.controller.current_item().await.unwrap().url, source.url(1));
    assert_eq!(h.controller.history_len().await, 1);

    h.controller.retreat().await;

    assert_eq!(h.controller.current_item().await.unwrap().url, source.url(0));
    assert_eq!(h.controller.history_len().await, 0);
    assert_eq!(
        h.controller.playback_state().await,
        PlaybackState::DisplayingVideo
    );
    // L'élément remplacé n'est pas réenfilé
    assert!(!h.controller.queue().contains(&source.url(1)).await);
    assert!(drain_notifies(&h)
        .iter()
        .any(|text| text == "Previous"));
}
