//! # PMOInput
//!
//! Maps raw input gestures — keyboard, wheel, touch, external media keys —
//! onto [`PlayerCommand`](pmoplayback::PlayerCommand) values sent into the
//! playback pipeline's command channel.
//!
//! The dispatcher holds no playback state: debounce windows and touch
//! tracking are the only things it remembers. Wheel input is debounced to
//! the first event per window; touch navigation fires only past a vertical
//! displacement threshold.

pub mod dispatcher;

pub use dispatcher::{DispatcherSettings, InputDispatcher, InputEvent, Key, MediaKey};
