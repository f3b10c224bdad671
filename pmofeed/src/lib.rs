//! # PMOFeed
//!
//! Lookahead buffer and navigation history for the PMOView playback
//! pipeline.
//!
//! - [`PrefetchQueue`]: an ordered buffer of resolved media items,
//!   asynchronously refilled toward a target depth, deduplicated by URL
//!   and bounded by a retry budget. A single fill runs at a time per
//!   queue instance; re-entrant fills return immediately.
//! - [`HistoryRing`]: a bounded stack of previously shown items used for
//!   backward navigation, evicting its oldest entry on overflow.
//!
//! Resolver failures are absorbed here: they are logged and retried with a
//! fixed backoff, and the fill silently gives up once the budget is spent.
//! Callers only ever observe "queue shorter than requested".

pub mod history;
pub mod queue;

pub use history::HistoryRing;
pub use queue::{FillOutcome, PrefetchQueue};
