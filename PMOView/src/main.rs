use std::sync::Arc;
use std::time::Duration;

use pmoconfig::get_config;
use pmoinput::{DispatcherSettings, InputDispatcher, InputEvent, Key};
use pmomedia::{MediaCatalogConfigExt, SourceRegistry};
use pmoplayback::{
    command_channel, CommandSender, Downloader, LogRenderer, PlaybackController, PlayerCommand,
    SessionCoordinator, ViewerEvent, ViewerEventBus, ViewerSettings,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ========== PHASE 1 : Configuration ==========

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = get_config();
    let settings = ViewerSettings::from_config(&config)?;
    let dispatcher_settings = DispatcherSettings::from_config(&config)?;

    // ========== PHASE 2 : Sources ==========

    info!("📡 Loading media source catalog...");
    let descriptors = config.get_media_sources()?;
    let client = reqwest::Client::builder()
        .user_agent(pmomedia::http::DEFAULT_USER_AGENT)
        .build()?;
    let registry = SourceRegistry::from_descriptors(
        &descriptors,
        client.clone(),
        Duration::from_millis(config.get_fetch_timeout_ms()?),
    );

    info!("✅ {} media source(s) registered", registry.len());
    for source in registry.list() {
        info!("  - {} ({}, {})", source.name(), source.id(), source.kind());
    }

    // ========== PHASE 3 : Pipeline de lecture ==========

    let events = ViewerEventBus::new();
    let (commands, command_rx) = command_channel();

    let renderer = Arc::new(LogRenderer::new());
    let downloader = Downloader::new(client, config.get_download_dir()?);

    let controller = Arc::new(
        PlaybackController::new(renderer, events.clone(), commands.clone(), settings)
            .with_downloader(downloader),
    );

    let coordinator = SessionCoordinator::new(controller, registry, command_rx, events.clone());

    // Relais des notifications vers le journal
    let event_rx = events.subscribe();
    tokio::task::spawn_blocking(move || {
        while let Ok(event) = event_rx.recv() {
            match event {
                ViewerEvent::Notify(text) => info!("💬 {text}"),
                ViewerEvent::Loading(active) => debug!(active, "Loading indicator"),
                ViewerEvent::NowPlaying { title, source } => {
                    info!("🎞️ Now playing: {title} ({source})")
                }
                ViewerEvent::SourceChanged(id) => info!("🔀 Source changed: {id}"),
            }
        }
    });

    // Surface d'entrée console : une ligne, une commande
    let dispatcher = InputDispatcher::new(commands.clone(), dispatcher_settings);
    tokio::spawn(read_console_input(dispatcher, commands.clone()));

    info!("▶️ Starting PMOView...");
    let pipeline = tokio::spawn(coordinator.run());

    info!("✅ PMOView is ready!");
    info!("Commands: n(ext), p(rev), m(ute), f(ullscreen), pip, space, left, right, d(ownload), src <id>, q(uit)");
    info!("Press Ctrl+C to stop...");
    tokio::signal::ctrl_c().await?;

    let _ = commands.send(PlayerCommand::Shutdown);
    let _ = pipeline.await;
    info!("Stopped.");

    Ok(())
}

/// Map console lines onto input events, one command per line
async fn read_console_input(dispatcher: InputDispatcher, commands: CommandSender) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match line.trim() {
            "n" | "next" => dispatcher.handle(InputEvent::Key(Key::ArrowDown)),
            "p" | "prev" => dispatcher.handle(InputEvent::Key(Key::ArrowUp)),
            "right" => dispatcher.handle(InputEvent::Key(Key::ArrowRight)),
            "left" => dispatcher.handle(InputEvent::Key(Key::ArrowLeft)),
            "space" | "play" | "pause" => dispatcher.handle(InputEvent::Key(Key::Space)),
            "m" | "mute" => dispatcher.handle(InputEvent::Key(Key::KeyM)),
            "f" | "fullscreen" => dispatcher.handle(InputEvent::Key(Key::KeyF)),
            "pip" => dispatcher.handle(InputEvent::Key(Key::KeyP)),
            "c" | "click" => dispatcher.handle(InputEvent::Click),
            "d" | "download" => {
                let _ = commands.send(PlayerCommand::Download);
            }
            "q" | "quit" => {
                let _ = commands.send(PlayerCommand::Shutdown);
                break;
            }
            other => {
                if let Some(id) = other.strip_prefix("src ") {
                    let _ = commands.send(PlayerCommand::ChangeSource(id.trim().to_string()));
                } else if !other.is_empty() {
                    info!("Unknown command: {other}");
                }
            }
        }
    }
}
