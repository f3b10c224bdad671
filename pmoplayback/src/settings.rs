//! Tuning values of the playback pipeline

use std::time::Duration;

use anyhow::Result;
use pmoconfig::Config;

/// Tuning values consumed by the controller and its queue
///
/// Defaults mirror the embedded configuration; `from_config` reads the
/// `viewer:` section of the live configuration instead.
#[derive(Debug, Clone)]
pub struct ViewerSettings {
    /// Steady-state lookahead depth of the prefetch queue
    pub preload_count: usize,
    /// Per-item retry factor of the fill budget
    pub max_retries: usize,
    /// Capacity of the backward-navigation history
    pub history_limit: usize,
    /// How long an image stays displayed before auto-advance
    pub image_display: Duration,
    /// Backoff between failed resolutions during a fill
    pub fill_backoff: Duration,
    /// Delay before retrying an advance that found the queue exhausted
    pub refill_retry_delay: Duration,
    /// Delay before advancing past an element that failed to load
    pub error_advance_delay: Duration,
    /// Whether playback starts muted
    pub start_muted: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            preload_count: 5,
            max_retries: 3,
            history_limit: 50,
            image_display: Duration::from_millis(3000),
            fill_backoff: Duration::from_millis(500),
            refill_retry_delay: Duration::from_millis(1500),
            error_advance_delay: Duration::from_millis(500),
            start_muted: true,
        }
    }
}

impl ViewerSettings {
    /// Build the settings from the `viewer:` configuration section
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            preload_count: config.get_preload_count()?,
            max_retries: config.get_max_retries()?,
            history_limit: config.get_history_limit()?,
            image_display: Duration::from_millis(config.get_image_display_ms()?),
            fill_backoff: Duration::from_millis(config.get_fill_backoff_ms()?),
            refill_retry_delay: Duration::from_millis(config.get_refill_retry_delay_ms()?),
            error_advance_delay: Duration::from_millis(config.get_error_advance_delay_ms()?),
            start_muted: config.get_start_muted()?,
        })
    }
}
