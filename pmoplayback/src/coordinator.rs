//! Session coordinator: command loop and source lifecycle

use std::sync::Arc;

use pmomedia::SourceRegistry;
use tracing::{debug, info, warn};

use crate::commands::{CommandReceiver, PlayerCommand};
use crate::controller::PlaybackController;
use crate::events::ViewerEventBus;

/// Serialization point of the viewer pipeline
///
/// Consumes the single command channel every input surface writes to,
/// reacts to source changes (cancel, clear, restart) and hands the rest
/// to the playback controller. Handlers run as tasks so a forced advance
/// can overtake one still in flight; the controller's own lock and fetch
/// tokens keep that safe.
pub struct SessionCoordinator {
    controller: Arc<PlaybackController>,
    registry: SourceRegistry,
    commands: CommandReceiver,
    events: ViewerEventBus,
}

impl SessionCoordinator {
    pub fn new(
        controller: Arc<PlaybackController>,
        registry: SourceRegistry,
        commands: CommandReceiver,
        events: ViewerEventBus,
    ) -> Self {
        Self {
            controller,
            registry,
            commands,
            events,
        }
    }

    /// Bootstrap the selected source and process commands until shutdown
    pub async fn run(mut self) {
        match self.registry.selected() {
            Some(source) => {
                info!(source = %source.name(), "▶️ Starting playback pipeline");
                let controller = self.controller.clone();
                tokio::spawn(async move {
                    controller.change_source(source, false).await;
                });
            }
            None => {
                warn!("No media source configured");
                self.events.notify("No media source configured");
            }
        }

        while let Some(command) = self.commands.recv().await {
            match command {
                PlayerCommand::Shutdown => {
                    debug!("Coordinator shutting down");
                    break;
                }
                PlayerCommand::ChangeSource(id) => self.change_source(&id),
                other => {
                    let controller = self.controller.clone();
                    tokio::spawn(async move {
                        controller.dispatch(other).await;
                    });
                }
            }
        }
    }

    /// Select another source and restart the pipeline on it
    fn change_source(&mut self, id: &str) {
        match self.registry.select(id) {
            Ok(source) => {
                let controller = self.controller.clone();
                tokio::spawn(async move {
                    controller.change_source(source, true).await;
                });
            }
            Err(e) => {
                warn!(error = %e, "Source selection rejected");
                self.events.notify("Unknown media source");
            }
        }
    }
}
