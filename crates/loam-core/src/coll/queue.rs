//! Persistent FIFO queue

use std::fmt::{self, Debug, Formatter};

/// Immutable first-in first-out queue
///
/// `conj` appends at the back and `pop` removes from the front, each
/// returning a new queue that shares structure with the old one.
#[derive(Clone)]
pub struct PersistentQueue<T: Clone> {
    items: im::Vector<T>,
}

impl<T: Clone> PersistentQueue<T> {
    /// Empty queue
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: im::Vector::new(),
        }
    }

    /// Queue with `item` appended
    #[must_use]
    pub fn conj(&self, item: T) -> Self {
        let mut items = self.items.clone();
        items.push_back(item);
        Self { items }
    }

    /// Front element
    #[inline]
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    /// Queue without its front element; popping an empty queue yields it unchanged
    #[must_use]
    pub fn pop(&self) -> Self {
        let mut items = self.items.clone();
        items.pop_front();
        Self { items }
    }

    /// Number of queued elements
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is queued
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate front to back
    #[inline]
    pub fn iter(&self) -> im::vector::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Clone> Default for PersistentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> FromIterator<T> for PersistentQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T: Clone + Debug> Debug for PersistentQueue<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let q: PersistentQueue<i32> = [1, 2, 3].into_iter().collect();
        assert_eq!(q.peek(), Some(&1));
        let q = q.pop();
        assert_eq!(q.peek(), Some(&2));
        assert_eq!(q.conj(4).iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn older_versions_survive() {
        let a = PersistentQueue::new().conj("x");
        let b = a.conj("y");
        let c = b.pop();
        assert_eq!(a.count(), 1);
        assert_eq!(b.count(), 2);
        assert_eq!(c.peek(), Some(&"y"));
    }

    #[test]
    fn pop_empty_is_empty() {
        let q: PersistentQueue<u8> = PersistentQueue::new();
        assert!(q.pop().is_empty());
        assert_eq!(q.peek(), None);
    }
}
