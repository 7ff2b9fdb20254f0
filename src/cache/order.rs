//! Access Order Module
//!
//! Tracks which keys were used most recently, for recency-based eviction.

use std::collections::VecDeque;

// == Access Order ==
/// Recency ordering over cache keys.
///
/// Keys live in a VecDeque where:
/// - Front = most recently used
/// - Back = least recently used
#[derive(Debug, Default)]
pub struct AccessOrder {
    /// Keys ordered by last access, most recent first
    order: VecDeque<String>,
}

impl AccessOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Touch ==
    /// Marks a key as just used, moving it to the front.
    ///
    /// A key not yet tracked is simply added at the front.
    pub fn touch(&mut self, key: &str) {
        self.forget(key);
        self.order.push_front(key.to_string());
    }

    // == Forget ==
    /// Drops a key from the ordering. No-op for untracked keys.
    pub fn forget(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Pop Least Recent ==
    /// Removes and returns the least recently used key, or None when empty.
    pub fn pop_least_recent(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    // == Peek Least Recent ==
    /// Returns the least recently used key without removing it.
    pub fn peek_least_recent(&self) -> Option<&String> {
        self.order.back()
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Clear ==
    /// Drops every tracked key.
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    #[allow(dead_code)]
    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_new() {
        let order = AccessOrder::new();
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
        assert_eq!(order.peek_least_recent(), None);
    }

    #[test]
    fn test_touch_new_keys() {
        let mut order = AccessOrder::new();

        order.touch("key1");
        order.touch("key2");
        order.touch("key3");

        assert_eq!(order.len(), 3);
        // key1 was added first and never touched again
        assert_eq!(order.peek_least_recent(), Some(&"key1".to_string()));
    }

    #[test]
    fn test_touch_existing_key_moves_to_front() {
        let mut order = AccessOrder::new();

        order.touch("key1");
        order.touch("key2");
        order.touch("key3");

        order.touch("key1");

        assert_eq!(order.len(), 3);
        // key2 is now the stalest
        assert_eq!(order.peek_least_recent(), Some(&"key2".to_string()));
    }

    #[test]
    fn test_pop_least_recent() {
        let mut order = AccessOrder::new();

        order.touch("key1");
        order.touch("key2");
        order.touch("key3");

        assert_eq!(order.pop_least_recent(), Some("key1".to_string()));
        assert_eq!(order.pop_least_recent(), Some("key2".to_string()));
        assert_eq!(order.len(), 1);
    }

    #[test]
    fn test_pop_empty() {
        let mut order = AccessOrder::new();
        assert_eq!(order.pop_least_recent(), None);
    }

    #[test]
    fn test_forget() {
        let mut order = AccessOrder::new();

        order.touch("key1");
        order.touch("key2");
        order.touch("key3");

        order.forget("key2");

        assert_eq!(order.len(), 2);
        assert!(!order.contains("key2"));
        assert!(order.contains("key1"));
        assert!(order.contains("key3"));
    }

    #[test]
    fn test_forget_untracked_key() {
        let mut order = AccessOrder::new();

        order.touch("key1");
        order.forget("nonexistent");

        assert_eq!(order.len(), 1);
    }

    #[test]
    fn test_touch_same_key_keeps_single_slot() {
        let mut order = AccessOrder::new();

        order.touch("key1");
        order.touch("key1");
        order.touch("key1");

        assert_eq!(order.len(), 1);
        assert_eq!(order.pop_least_recent(), Some("key1".to_string()));
        assert!(order.is_empty());
    }

    #[test]
    fn test_eviction_order_after_interleaved_touches() {
        let mut order = AccessOrder::new();

        order.touch("a");
        order.touch("b");
        order.touch("c");

        // Refresh in a different order; staleness now follows the refresh.
        order.touch("a");
        order.touch("c");
        order.touch("b");

        assert_eq!(order.pop_least_recent(), Some("a".to_string()));
        assert_eq!(order.pop_least_recent(), Some("c".to_string()));
        assert_eq!(order.pop_least_recent(), Some("b".to_string()));
    }

    #[test]
    fn test_clear() {
        let mut order = AccessOrder::new();

        order.touch("key1");
        order.touch("key2");
        order.clear();

        assert!(order.is_empty());
        assert_eq!(order.pop_least_recent(), None);
    }
}
