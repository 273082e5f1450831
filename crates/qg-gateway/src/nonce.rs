//! Nonce source for signed requests.
//!
//! The venue expects Unix seconds and rejects a nonce that does not exceed
//! the previous one for the same key. Several requests can be signed within
//! the same second, so the manager hands out `max(last + 1, now)`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for obtaining current time, enabling testability.
pub trait Clock: Send + Sync {
    /// Returns current time in seconds since Unix epoch.
    fn now_secs(&self) -> u64;
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_secs(&self) -> u64 {
        (**self).now_secs()
    }
}

/// Strictly increasing nonce generator shared by all callers of a gateway.
pub struct NonceManager<C: Clock> {
    /// Last issued nonce.
    last: AtomicU64,
    clock: C,
}

impl<C: Clock> NonceManager<C> {
    /// Creates a manager whose first nonce is at least the current time.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            last: AtomicU64::new(0),
            clock,
        }
    }

    /// Returns `max(last + 1, now)`.
    ///
    /// Thread-safe via CAS loop.
    pub fn next(&self) -> u64 {
        let target = self.clock.now_secs();

        loop {
            let current = self.last.load(Ordering::Acquire);
            let next_val = current.saturating_add(1).max(target);

            match self.last.compare_exchange_weak(
                current,
                next_val,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next_val,
                Err(_) => continue,
            }
        }
    }

    /// Last nonce handed out, 0 before the first call.
    #[must_use]
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    /// Mock clock for testing with controllable time.
    struct MockClock {
        secs: AtomicU64,
    }

    impl MockClock {
        fn new(initial: u64) -> Self {
            Self {
                secs: AtomicU64::new(initial),
            }
        }

        fn set(&self, secs: u64) {
            self.secs.store(secs, Ordering::Release);
        }
    }

    impl Clock for MockClock {
        fn now_secs(&self) -> u64 {
            self.secs.load(Ordering::Acquire)
        }
    }

    const BASE_TIME: u64 = 1_553_652_297;

    #[test]
    fn test_first_nonce_tracks_clock() {
        let manager = NonceManager::new(MockClock::new(BASE_TIME));
        assert_eq!(manager.last(), 0);
        assert_eq!(manager.next(), BASE_TIME);
    }

    #[test]
    fn test_same_second_still_increases() {
        let manager = NonceManager::new(MockClock::new(BASE_TIME));
        let n1 = manager.next();
        let n2 = manager.next();
        let n3 = manager.next();
        assert_eq!(n2, n1 + 1);
        assert_eq!(n3, n1 + 2);
    }

    #[test]
    fn test_clock_jump_forward_is_followed() {
        let manager = NonceManager::new(MockClock::new(BASE_TIME));
        manager.next();
        manager.clock.set(BASE_TIME + 60);
        assert_eq!(manager.next(), BASE_TIME + 60);
    }

    #[test]
    fn test_clock_regression_no_decrease() {
        let manager = NonceManager::new(MockClock::new(BASE_TIME));
        let n1 = manager.next();
        manager.clock.set(BASE_TIME - 10);
        let n2 = manager.next();
        assert!(n2 > n1, "nonce must not decrease when clock regresses");
    }

    #[test]
    fn test_concurrent_no_duplicates() {
        let manager = Arc::new(NonceManager::new(MockClock::new(BASE_TIME)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || (0..500).map(|_| manager.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        let original_len = all.len();
        all.dedup();

        assert_eq!(all.len(), original_len, "nonces must be unique across threads");
    }
}
