//! Error taxonomy of the playback pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The queue yielded nothing even after a forced depth-1 fill
    #[error("No media available after fill attempt")]
    QueueExhausted,

    /// The displayed element reported a load error
    #[error("Displayed media failed to load: {0}")]
    MediaLoad(String),

    /// An optional platform feature is missing or was rejected by the host
    #[error("{0} is not available")]
    CapabilityUnavailable(&'static str),

    /// Export of the current item failed on the transport
    #[error("Download failed: {0}")]
    DownloadFailed(String),
}
