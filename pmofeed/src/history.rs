//! Bounded navigation history

use std::collections::VecDeque;

use pmomedia::MediaItem;

/// Bounded stack of previously shown items
///
/// Pushed on each forward advance (the outgoing item), popped on backward
/// navigation. When the capacity is exceeded the oldest entry is evicted;
/// both operations are O(1) amortized.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    items: VecDeque<MediaItem>,
    capacity: usize,
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Append an item, evicting the oldest beyond capacity
    pub fn push(&mut self, item: MediaItem) {
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    /// Remove and return the most recent item
    pub fn pop(&mut self) -> Option<MediaItem> {
        self.items.pop_back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
