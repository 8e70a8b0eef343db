//! Open-stream accounting

#![allow(clippy::module_name_repetitions)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts generation streams that are currently open
///
/// Clones share counters. A stream registers by holding the
/// [`ConnectionGuard`] returned from [`ConnectionTracker::open`]; dropping
/// the stream drops the guard.
#[derive(Clone, Debug, Default)]
pub struct ConnectionTracker {
    open: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
}

impl ConnectionTracker {
    /// Fresh tracker with no open streams
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open stream
    #[must_use]
    pub fn open(&self) -> ConnectionGuard {
        self.open.fetch_add(1, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            open: Arc::clone(&self.open),
        }
    }

    /// Streams open right now
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Streams ever opened
    #[must_use]
    pub fn total_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

/// Releases its stream's slot on drop
#[derive(Debug)]
pub struct ConnectionGuard {
    open: Arc<AtomicUsize>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let tracker = ConnectionTracker::new();
        let first = tracker.open();
        let second = tracker.clone().open();
        assert_eq!(tracker.open_count(), 2);

        drop(first);
        assert_eq!(tracker.open_count(), 1);
        drop(second);
        assert_eq!(tracker.open_count(), 0);
        assert_eq!(tracker.total_opened(), 2);
    }
}
