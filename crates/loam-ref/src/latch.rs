//! Count-down latch

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// One-shot barrier that opens when its count reaches zero
#[derive(Debug)]
pub struct CountDownLatch {
    count: Mutex<usize>,
    zero: Condvar,
}

impl CountDownLatch {
    /// Latch that opens after `count` calls to [`CountDownLatch::count_down`]
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            count: Mutex::new(count),
            zero: Condvar::new(),
        }
    }

    /// Decrement the count, waking all waiters when it reaches zero
    ///
    /// Calls after zero have no effect.
    pub fn count_down(&self) {
        let mut count = self.count.lock();
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            self.zero.notify_all();
        }
    }

    /// Remaining count
    #[must_use]
    pub fn count(&self) -> usize {
        *self.count.lock()
    }

    /// Block until the count is zero
    pub fn await_zero(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.zero.wait(&mut count);
        }
    }

    /// Block until the count is zero or `timeout` passes
    ///
    /// Returns `true` if the latch opened.
    #[must_use]
    pub fn await_timeout(&self, timeout: Duration) -> bool {
        // too far out to represent: wait without a deadline
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.await_zero();
            return true;
        };
        let mut count = self.count.lock();
        while *count > 0 {
            if self.zero.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn opens_at_zero_and_saturates() {
        let latch = CountDownLatch::new(2);
        latch.count_down();
        assert_eq!(latch.count(), 1);
        assert!(!latch.await_timeout(Duration::from_millis(10)));
        latch.count_down();
        latch.count_down();
        assert_eq!(latch.count(), 0);
        latch.await_zero();
        assert!(latch.await_timeout(Duration::ZERO));
    }

    #[test]
    fn wakes_every_waiter() {
        let latch = Arc::new(CountDownLatch::new(1));
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let latch = Arc::clone(&latch);
                std::thread::spawn(move || latch.await_timeout(Duration::from_secs(5)))
            })
            .collect();
        std::thread::sleep(Duration::from_millis(20));
        latch.count_down();
        assert!(waiters.into_iter().all(|w| w.join().unwrap()));
    }

    #[test]
    fn unbounded_timeout_waits_for_zero() {
        let latch = Arc::new(CountDownLatch::new(1));
        let opener = {
            let latch = Arc::clone(&latch);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                latch.count_down();
            })
        };
        assert!(latch.await_timeout(Duration::MAX));
        opener.join().unwrap();
        assert!(latch.await_timeout(Duration::MAX));
    }
}
