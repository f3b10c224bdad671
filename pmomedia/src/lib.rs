//! # PMOMedia
//!
//! Common traits and types for PMOView media sources.
//!
//! This crate provides the foundational abstractions for the remote origins
//! a viewer session can pull media from:
//!
//! - **`MediaItem` / `MediaKind`**: the unit of playback, identified by URL.
//! - **`MediaSource`**: the async resolution contract (`resolve` one
//!   playable URL, cancellable and timeout-bounded).
//! - **`HttpMediaSource`**: the standard HTTP implementation, with a
//!   dedup-busting query parameter generated per call.
//! - **`SourceRegistry`**: the catalog of registered sources and the
//!   current selection.
//!
//! All source implementations must be `Send + Sync` so they can be shared
//! with background fill tasks.

pub mod config_ext;
pub mod error;
pub mod http;
pub mod models;
pub mod registry;
pub mod source;

pub use config_ext::MediaCatalogConfigExt;
pub use error::{Error, Result};
pub use http::{HttpMediaSource, HttpMediaSourceBuilder};
pub use models::{MediaItem, MediaKind, SourceDescriptor};
pub use registry::SourceRegistry;
pub use source::MediaSource;

pub use async_trait::async_trait;
