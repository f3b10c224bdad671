//! Viewer event bus: toast, spinner and now-playing notifications

use std::sync::{Arc, Mutex};

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Fire-and-forget events emitted by the playback pipeline
///
/// The presentation side decides how to surface them (toast overlay,
/// spinner, media-session metadata); no acknowledgment flows back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewerEvent {
    /// Short user-facing message, auto-dismissed by the consumer
    Notify(String),
    /// Loading indicator on/off
    Loading(bool),
    /// Metadata of the item that just started displaying
    NowPlaying { title: String, source: String },
    /// The active source selection changed
    SourceChanged(String),
}

/// Broadcast bus for [`ViewerEvent`]
///
/// Subscribers each get their own unbounded channel; senders whose
/// receiver is gone are pruned at the next broadcast.
#[derive(Clone, Default)]
pub struct ViewerEventBus {
    subscribers: Arc<Mutex<Vec<Sender<ViewerEvent>>>>,
}

impl ViewerEventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> Receiver<ViewerEvent> {
        let (tx, rx) = unbounded::<ViewerEvent>();
        {
            let mut subscribers = self.subscribers.lock().unwrap();
            subscribers.push(tx);
        }
        rx
    }

    pub fn broadcast(&self, event: ViewerEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Broadcast a toast notification
    pub fn notify(&self, text: impl Into<String>) {
        self.broadcast(ViewerEvent::Notify(text.into()));
    }

    /// Broadcast the loading indicator state
    pub fn loading(&self, active: bool) {
        self.broadcast(ViewerEvent::Loading(active));
    }
}
