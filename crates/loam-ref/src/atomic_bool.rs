//! Shared boolean flag

use std::sync::atomic::{self, Ordering};

/// Boolean with compare-and-set
#[derive(Debug, Default)]
pub struct AtomicBoolean(atomic::AtomicBool);

impl AtomicBoolean {
    /// Flag holding `value`
    #[inline]
    #[must_use]
    pub const fn new(value: bool) -> Self {
        Self(atomic::AtomicBool::new(value))
    }

    /// Current value
    #[inline]
    #[must_use]
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Store `new` if the flag holds `expected`; returns whether it did
    #[inline]
    pub fn compare_and_set(&self, expected: bool, new: bool) -> bool {
        self.0
            .compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Store `value` and return the previous value
    #[inline]
    pub fn set(&self, value: bool) -> bool {
        self.0.swap(value, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_and_set_only_on_match() {
        let flag = AtomicBoolean::new(false);
        assert!(!flag.compare_and_set(true, false));
        assert!(flag.compare_and_set(false, true));
        assert!(flag.get());
        assert!(flag.set(false));
        assert!(!flag.get());
    }

    #[test]
    fn one_winner_among_racers() {
        let flag = AtomicBoolean::default();
        let winners = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| flag.compare_and_set(false, true)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|won| *won)
                .count()
        });
        assert_eq!(winners, 1);
    }
}
