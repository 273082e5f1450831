//! Shared rotation state.
//!
//! One `GatewayState` is shared by every concurrent caller of a gateway, so
//! both cursors only move through atomic read-modify-write operations.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct GatewayState {
    credential_count: usize,
    credential_cursor: AtomicUsize,
    route_count: usize,
    route_cursor: AtomicUsize,
}

impl GatewayState {
    #[must_use]
    pub fn new(credential_count: usize, route_count: usize) -> Self {
        Self {
            credential_count,
            credential_cursor: AtomicUsize::new(0),
            route_count,
            route_cursor: AtomicUsize::new(0),
        }
    }

    /// Index of the credential for the next signed call, advancing the
    /// rotation. `None` when no credentials are configured.
    pub fn select_credential(&self) -> Option<usize> {
        rotate(&self.credential_cursor, self.credential_count)
    }

    /// Route index the next call starts from, without advancing it.
    #[must_use]
    pub fn route_base(&self) -> Option<usize> {
        if self.route_count == 0 {
            return None;
        }
        Some(self.route_cursor.load(Ordering::Acquire) % self.route_count)
    }

    /// Move the shared route index one step, once per completed call.
    pub fn advance_route(&self) {
        let _ = rotate(&self.route_cursor, self.route_count);
    }

    #[must_use]
    pub fn route_count(&self) -> usize {
        self.route_count
    }

    #[must_use]
    pub fn credential_count(&self) -> usize {
        self.credential_count
    }
}

/// Return the current index and store `(current + 1) % count`.
fn rotate(cursor: &AtomicUsize, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    cursor
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % count))
        .ok()
        .map(|prev| prev % count)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_credentials_round_robin() {
        let state = GatewayState::new(3, 0);
        let picked: Vec<_> = (0..5).filter_map(|_| state.select_credential()).collect();
        assert_eq!(picked, vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_no_credentials_or_routes() {
        let state = GatewayState::new(0, 0);
        assert_eq!(state.select_credential(), None);
        assert_eq!(state.route_base(), None);
        state.advance_route();
        assert_eq!(state.route_base(), None);
    }

    #[test]
    fn test_route_advance_wraps() {
        let state = GatewayState::new(1, 2);
        assert_eq!(state.route_base(), Some(0));
        state.advance_route();
        assert_eq!(state.route_base(), Some(1));
        state.advance_route();
        assert_eq!(state.route_base(), Some(0));
    }

    #[test]
    fn test_concurrent_selection_is_balanced() {
        let state = Arc::new(GatewayState::new(4, 0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    (0..100)
                        .filter_map(|_| state.select_credential())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts = [0usize; 4];
        for h in handles {
            for idx in h.join().unwrap() {
                counts[idx] += 1;
            }
        }
        assert_eq!(counts, [100, 100, 100, 100]);
    }
}
