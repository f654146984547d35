//! Short-term buffer - per-user recency cache
//!
//! Fixed-capacity FIFO of the most recent exchanges. Not durable by design:
//! it is a cache of recency, not a record of truth, and it is discarded when
//! the process restarts. None of its operations can fail, which is what lets
//! conversation continue when the durable layer is down.

use std::collections::VecDeque;

use crate::types::{ContextLabel, Exchange};

/// Fixed-capacity ordered buffer of recent exchanges
#[derive(Debug, Clone)]
pub struct SessionBuffer {
    /// Maximum number of exchanges retained
    capacity: usize,

    /// Exchanges in insertion order (oldest at front)
    items: VecDeque<Exchange>,
}

impl SessionBuffer {
    /// Create a buffer with the given capacity (at least 1)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: VecDeque::new(),
        }
    }

    /// Append an exchange. If the buffer is at capacity the oldest entry is
    /// evicted first, unconditionally. Always succeeds.
    pub fn append(&mut self, exchange: Exchange) {
        if self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(exchange);
    }

    /// Ordered snapshot of the buffered exchanges, oldest first, optionally
    /// filtered to one context.
    ///
    /// The snapshot is an owned copy: it can be iterated and re-iterated
    /// independently of later appends.
    pub fn snapshot(&self, context: Option<ContextLabel>) -> Vec<Exchange> {
        self.items
            .iter()
            .filter(|ex| context.map_or(true, |c| ex.context == c))
            .cloned()
            .collect()
    }

    /// The most recent exchange, if any
    pub fn latest_mut(&mut self) -> Option<&mut Exchange> {
        self.items.back_mut()
    }

    /// Empty the buffer; idempotent
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Current number of buffered exchanges
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SessionBuffer {
    fn default() -> Self {
        Self::with_capacity(crate::config::DEFAULT_SHORT_TERM_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{now, EmotionTag};

    fn exchange(msg: &str, context: ContextLabel) -> Exchange {
        Exchange::new(now(), context, msg, EmotionTag::Neutral)
    }

    #[test]
    fn test_buffer_creation() {
        let buf = SessionBuffer::default();
        assert_eq!(buf.capacity(), 10);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_fifo_eviction_keeps_newest() {
        let mut buf = SessionBuffer::with_capacity(10);

        for i in 1..=12 {
            buf.append(exchange(&format!("E{}", i), ContextLabel::Other));
        }

        // Exactly E3..E12 survive, in insertion order.
        let snap = buf.snapshot(None);
        assert_eq!(snap.len(), 10);
        assert_eq!(snap[0].user_message, "E3");
        assert_eq!(snap[9].user_message, "E12");
    }

    #[test]
    fn test_snapshot_filters_by_context() {
        let mut buf = SessionBuffer::with_capacity(5);
        buf.append(exchange("standup notes", ContextLabel::Work));
        buf.append(exchange("weekend hike", ContextLabel::Personal));
        buf.append(exchange("sprint review", ContextLabel::Work));

        let work = buf.snapshot(Some(ContextLabel::Work));
        assert_eq!(work.len(), 2);
        assert_eq!(work[0].user_message, "standup notes");
        assert_eq!(work[1].user_message, "sprint review");
    }

    #[test]
    fn test_snapshot_is_independent_of_later_appends() {
        let mut buf = SessionBuffer::with_capacity(3);
        buf.append(exchange("first", ContextLabel::Other));

        let snap = buf.snapshot(None);
        buf.append(exchange("second", ContextLabel::Other));

        assert_eq!(snap.len(), 1);
        // Restartable: iterating twice sees the same sequence.
        assert_eq!(snap.iter().count(), snap.iter().count());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut buf = SessionBuffer::with_capacity(3);
        buf.append(exchange("hello", ContextLabel::Other));

        buf.clear();
        assert!(buf.is_empty());
        buf.clear();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_latest_mut_targets_newest() {
        let mut buf = SessionBuffer::with_capacity(3);
        buf.append(exchange("a", ContextLabel::Other));
        buf.append(exchange("b", ContextLabel::Other));

        buf.latest_mut().unwrap().response_summary = Some("reply".to_string());

        let snap = buf.snapshot(None);
        assert!(snap[0].response_summary.is_none());
        assert_eq!(snap[1].response_summary.as_deref(), Some("reply"));
    }
}
