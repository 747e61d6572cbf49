//! Per-record serialization of recomputations
//!
//! At most one calculation per reporting record may run its
//! fetch-compute-persist sequence at a time. Different records never block
//! each other.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};

use ghg_types::RecordId;

#[derive(Debug, Default)]
pub struct RecordLocks {
    in_flight: Mutex<HashSet<RecordId>>,
    released: Condvar,
}

/// Held while a record is being recomputed; releases on drop
#[derive(Debug)]
pub struct RecordLockGuard<'a> {
    locks: &'a RecordLocks,
    id: RecordId,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `id` is free, then claim it
    pub fn acquire(&self, id: RecordId) -> RecordLockGuard<'_> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        while in_flight.contains(&id) {
            in_flight = self
                .released
                .wait(in_flight)
                .unwrap_or_else(PoisonError::into_inner);
        }
        in_flight.insert(id);
        RecordLockGuard { locks: self, id }
    }

    pub fn is_locked(&self, id: RecordId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }
}

impl Drop for RecordLockGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self
            .locks
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        in_flight.remove(&self.id);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_guard_releases_on_drop() {
        let locks = RecordLocks::new();
        {
            let _guard = locks.acquire(7);
            assert!(locks.is_locked(7));
            assert!(!locks.is_locked(8));
        }
        assert!(!locks.is_locked(7));
    }

    #[test]
    fn test_different_records_do_not_block() {
        let locks = RecordLocks::new();
        let _a = locks.acquire(1);
        let _b = locks.acquire(2);
        assert!(locks.is_locked(1));
        assert!(locks.is_locked(2));
    }

    #[test]
    fn test_same_record_is_serialized() {
        let locks = Arc::new(RecordLocks::new());
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let active = Arc::clone(&active);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    let _guard = locks.acquire(42);
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(2));
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(!locks.is_locked(42));
    }
}
