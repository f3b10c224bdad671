//! Commands accepted by the playback pipeline

use tokio::sync::mpsc;

/// A navigation or control request, from any input surface
///
/// Commands are funneled through one channel into the session
/// coordinator; input dispatchers, scheduled timers and media-key
/// subscriptions all speak this vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Show the next item; forced requests cancel in-flight loading
    Advance { force: bool },
    /// Show the most recent history item
    Retreat,
    /// The displayed video reached its end
    VideoEnded,
    /// The displayed element reported a load error
    MediaError { url: String },
    /// Toggle the session mute flag
    ToggleMute,
    /// First interaction unmutes playback
    StartPlayback,
    /// Toggle video play/pause
    TogglePlayPause,
    /// Seek the active video by a signed number of seconds
    Seek(i64),
    /// Toggle fullscreen (capability call)
    ToggleFullscreen,
    /// Toggle picture-in-picture (capability call)
    TogglePip,
    /// Export the current item to a local file
    Download,
    /// Select another source and restart the pipeline
    ChangeSource(String),
    /// Stop the coordinator loop
    Shutdown,
}

/// Sending half of the command channel
pub type CommandSender = mpsc::UnboundedSender<PlayerCommand>;

/// Receiving half of the command channel
pub type CommandReceiver = mpsc::UnboundedReceiver<PlayerCommand>;

/// Create the command channel the pipeline listens on
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    mpsc::unbounded_channel()
}
