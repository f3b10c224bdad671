//! # PMOPlayback
//!
//! Playback state machine and session coordination for PMOView.
//!
//! The pipeline drives a single active-media slot through
//! load/display/advance transitions:
//!
//! - [`PlaybackController`]: owns the slot, consumes the prefetch queue,
//!   pushes outgoing items to history, arms and cancels the image dwell
//!   and retry timers.
//! - [`SessionCoordinator`]: the command loop; reacts to source changes
//!   by cancelling in-flight work and restarting the pipeline cleanly.
//! - [`MediaRenderer`] and the capability traits: the presentation
//!   boundary, consumed as optional best-effort collaborators.
//! - [`ViewerEventBus`]: fire-and-forget toast/spinner/now-playing
//!   notifications.
//!
//! Every input surface (keyboard, wheel, touch, media keys, timers)
//! speaks [`PlayerCommand`] over one channel; no component mutates the
//! displayed slot directly.

pub mod capabilities;
pub mod commands;
pub mod controller;
pub mod coordinator;
pub mod download;
pub mod errors;
pub mod events;
pub mod renderer;
pub mod session;
pub mod settings;

pub use capabilities::{
    ExternalOpen, FullscreenCapability, NowPlayingInfo, NowPlayingPublisher,
    PictureInPictureCapability,
};
pub use commands::{command_channel, CommandReceiver, CommandSender, PlayerCommand};
pub use controller::PlaybackController;
pub use coordinator::SessionCoordinator;
pub use download::Downloader;
pub use errors::PlaybackError;
pub use events::{ViewerEvent, ViewerEventBus};
pub use renderer::{LogRenderer, MediaRenderer, VideoStart};
pub use session::{PlaybackSession, PlaybackState};
pub use settings::ViewerSettings;
