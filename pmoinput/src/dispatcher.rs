//! Input dispatcher: raw gestures in, player commands out

use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use pmoconfig::Config;
use pmoplayback::{CommandSender, PlayerCommand};
use tokio::time::Instant;
use tracing::debug;

/// Keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    ArrowRight,
    ArrowLeft,
    Space,
    KeyM,
    KeyF,
    KeyP,
}

/// External media-key commands (host media session)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKey {
    Next,
    Previous,
    Play,
    Pause,
}

/// A raw input occurrence, as delivered by the host surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key(Key),
    /// Wheel movement; positive `delta_y` scrolls down
    Wheel { delta_y: f64 },
    TouchStart { y: f64 },
    TouchEnd { y: f64 },
    /// Plain click anywhere outside the controls
    Click,
    MediaKey(MediaKey),
}

/// Tuning values of the dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    /// Only the first wheel event inside this window navigates
    pub wheel_debounce: Duration,
    /// Minimum vertical displacement for touch navigation, in pixels
    pub touch_threshold_px: f64,
    /// Seek offset mapped onto the arrow keys, in seconds
    pub seek_secs: i64,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            wheel_debounce: Duration::from_millis(800),
            touch_threshold_px: 50.0,
            seek_secs: 5,
        }
    }
}

impl DispatcherSettings {
    /// Build the settings from the `viewer:` configuration section
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            wheel_debounce: Duration::from_millis(config.get_wheel_debounce_ms()?),
            touch_threshold_px: config.get_touch_threshold_px()?,
            seek_secs: config.get_seek_secs()? as i64,
        })
    }
}

/// Maps raw input events onto player commands
///
/// Stateless apart from the wheel debounce timestamp and the pending
/// touch origin. Timing uses the tokio clock, so debounce behavior is
/// deterministic under a paused test runtime.
pub struct InputDispatcher {
    commands: CommandSender,
    settings: DispatcherSettings,
    last_wheel: Mutex<Option<Instant>>,
    touch_start: Mutex<Option<f64>>,
}

impl InputDispatcher {
    pub fn new(commands: CommandSender, settings: DispatcherSettings) -> Self {
        Self {
            commands,
            settings,
            last_wheel: Mutex::new(None),
            touch_start: Mutex::new(None),
        }
    }

    /// Translate one raw event, sending the mapped command if any
    pub fn handle(&self, event: InputEvent) {
        match event {
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::Wheel { delta_y } => self.handle_wheel(delta_y),
            InputEvent::TouchStart { y } => {
                *self.touch_start.lock().unwrap() = Some(y);
            }
            InputEvent::TouchEnd { y } => self.handle_touch_end(y),
            InputEvent::Click => self.send(PlayerCommand::StartPlayback),
            InputEvent::MediaKey(key) => self.handle_media_key(key),
        }
    }

    fn handle_key(&self, key: Key) {
        let command = match key {
            Key::ArrowDown => PlayerCommand::Advance { force: true },
            Key::ArrowUp => PlayerCommand::Retreat,
            Key::ArrowRight => PlayerCommand::Seek(self.settings.seek_secs),
            Key::ArrowLeft => PlayerCommand::Seek(-self.settings.seek_secs),
            Key::Space => PlayerCommand::TogglePlayPause,
            Key::KeyM => PlayerCommand::ToggleMute,
            Key::KeyF => PlayerCommand::ToggleFullscreen,
            Key::KeyP => PlayerCommand::TogglePip,
        };
        self.send(command);
    }

    fn handle_wheel(&self, delta_y: f64) {
        let now = Instant::now();
        let mut last = self.last_wheel.lock().unwrap();
        let in_window = last
            .map(|at| now.duration_since(at) <= self.settings.wheel_debounce)
            .unwrap_or(false);
        if in_window {
            return;
        }
        if delta_y > 0.0 {
            self.send(PlayerCommand::Advance { force: true });
        } else if delta_y < 0.0 {
            self.send(PlayerCommand::Retreat);
        }
        *last = Some(now);
    }

    fn handle_touch_end(&self, end_y: f64) {
        let Some(start_y) = self.touch_start.lock().unwrap().take() else {
            return;
        };
        let diff = start_y - end_y;
        if diff.abs() <= self.settings.touch_threshold_px {
            return;
        }
        if diff > 0.0 {
            // Glissement vers le haut : suivant
            self.send(PlayerCommand::Advance { force: true });
        } else {
            self.send(PlayerCommand::Retreat);
        }
    }

    fn handle_media_key(&self, key: MediaKey) {
        let command = match key {
            MediaKey::Next => PlayerCommand::Advance { force: true },
            MediaKey::Previous => PlayerCommand::Retreat,
            MediaKey::Play | MediaKey::Pause => PlayerCommand::TogglePlayPause,
        };
        self.send(command);
    }

    fn send(&self, command: PlayerCommand) {
        if self.commands.send(command).is_err() {
            debug!("Command channel closed, input dropped");
        }
    }
}
