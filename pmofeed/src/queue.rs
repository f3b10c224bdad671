//! Prefetch queue: background lookahead buffer of resolved media items

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pmomedia::{Error, MediaItem, MediaSource};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Why a fill pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Target depth reached
    Completed,
    /// Retry budget spent before reaching the target; queue may be short
    BudgetExhausted,
    /// Cancellation token fired
    Cancelled,
    /// Another fill was already running for this queue instance
    AlreadyFilling,
}

/// Best-effort hook fired for freshly queued image items (eager decode)
pub type DecodeHint = Box<dyn Fn(&MediaItem) + Send + Sync>;

/// Ordered FIFO buffer of resolved media items
///
/// Invariants:
/// - no two queued items share a URL;
/// - at most one `fill` runs at a time per instance (re-entrant calls
///   return [`FillOutcome::AlreadyFilling`] immediately);
/// - length stays at or below the target depth in steady state, transient
///   excess is tolerated while fills and takes interleave.
///
/// After a successful [`take`](Self::take), callers kick a background fill
/// to restore the lookahead depth.
pub struct PrefetchQueue {
    items: Mutex<VecDeque<MediaItem>>,
    filling: AtomicBool,
    backoff: Duration,
    decode_hint: Option<DecodeHint>,
}

impl std::fmt::Debug for PrefetchQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefetchQueue")
            .field("filling", &self.filling.load(Ordering::Relaxed))
            .field("backoff", &self.backoff)
            .finish()
    }
}

// Libère le verrou de remplissage même si la tâche de fill est abandonnée
struct FillingGuard<'a>(&'a AtomicBool);

impl Drop for FillingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PrefetchQueue {
    pub fn new(backoff: Duration) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            filling: AtomicBool::new(false),
            backoff,
            decode_hint: None,
        }
    }

    /// Attach an eager-decode hook, fired for each freshly queued image
    pub fn with_decode_hint(mut self, hint: DecodeHint) -> Self {
        self.decode_hint = Some(hint);
        self
    }

    /// Asynchronously grow the queue toward `target_depth` unique items
    ///
    /// Repeatedly resolves against `source`; a successful, non-duplicate
    /// resolution appends the item and resets the retry counter, anything
    /// else bumps the counter and backs off. The pass ends when the target
    /// is reached, the counter exceeds `max_retries × target_depth`, or
    /// `cancel` fires. Resolver errors are logged and swallowed.
    pub async fn fill(
        &self,
        source: Arc<dyn MediaSource>,
        target_depth: usize,
        max_retries: usize,
        cancel: &CancellationToken,
    ) -> FillOutcome {
        if self
            .filling
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return FillOutcome::AlreadyFilling;
        }
        let _guard = FillingGuard(&self.filling);

        let budget = max_retries.saturating_mul(target_depth);
        let mut retries = 0usize;

        loop {
            if cancel.is_cancelled() {
                return FillOutcome::Cancelled;
            }
            if self.len().await >= target_depth {
                return FillOutcome::Completed;
            }
            if retries >= budget {
                debug!(target_depth, budget, "Fill retry budget spent, giving up");
                return FillOutcome::BudgetExhausted;
            }

            match source.resolve(cancel).await {
                Ok(url) => {
                    let item = MediaItem::new(url, source.kind());
                    if self.try_append(&item, cancel).await {
                        debug!(url = %item.url, "Added to prefetch queue");
                        retries = 0;
                        if item.kind.is_image() {
                            if let Some(hint) = &self.decode_hint {
                                hint(&item);
                            }
                        }
                        continue;
                    }
                    // Doublon : même traitement qu'un échec de résolution
                    retries += 1;
                }
                Err(Error::Aborted) => return FillOutcome::Cancelled,
                Err(e) => {
                    warn!(source = %source.id(), error = %e, "Media resolution failed");
                    retries += 1;
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return FillOutcome::Cancelled,
                _ = tokio::time::sleep(self.backoff) => {}
            }
        }
    }

    /// Append unless the URL is already queued or the token fired
    ///
    /// The cancellation check runs under the queue lock: a fill whose
    /// session was torn down while its last resolution was in flight must
    /// not leak a stale item into the fresh session.
    async fn try_append(&self, item: &MediaItem, cancel: &CancellationToken) -> bool {
        let mut items = self.items.lock().await;
        if cancel.is_cancelled() {
            return false;
        }
        if items.iter().any(|queued| queued.url == item.url) {
            return false;
        }
        items.push_back(item.clone());
        true
    }

    /// Pop the head item, if any
    pub async fn take(&self) -> Option<MediaItem> {
        self.items.lock().await.pop_front()
    }

    /// Drop all queued items
    pub async fn clear(&self) {
        self.items.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.items.lock().await.iter().any(|item| item.url == url)
    }

    /// Copy of the queued items, front first
    pub async fn snapshot(&self) -> Vec<MediaItem> {
        self.items.lock().await.iter().cloned().collect()
    }
}
