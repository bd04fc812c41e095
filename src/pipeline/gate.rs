//! Flow-control gate bounding in-flight decoder input.
//!
//! A counting gate sized to the input pool: one permit per buffer. The
//! submission path blocks here — and only here — when the decoder has every
//! input buffer in flight, which transfers decoder backpressure to the
//! stream source.
//!
//! # Permit accounting
//!
//! `acquire` returns a [`Permit`] guard. Until the buffer is accepted by
//! the input port the submission path owns the permit, and every early
//! return gives it back automatically on drop. Once the port takes the
//! buffer, [`Permit::commit`] hands release responsibility to the
//! completion path, which calls [`release`](FlowControlGate::release)
//! exactly once per input-returned event. A release can therefore never be
//! duplicated: the guard is disarmed before the event exists, and events
//! carry the buffer by move.

use std::sync::{Condvar, Mutex};

use log::error;

pub struct FlowControlGate {
    capacity: usize,
    permits: Mutex<usize>,
    available: Condvar,
}

impl FlowControlGate {
    /// Create a gate with `permits` slots, one per input buffer.
    pub fn new(permits: usize) -> Self {
        Self {
            capacity: permits,
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        *self.permits.lock().unwrap()
    }

    /// Take a permit, blocking until one is available.
    pub fn acquire(&self) -> Permit<'_> {
        let mut permits = self.permits.lock().unwrap();
        while *permits == 0 {
            permits = self.available.wait(permits).unwrap();
        }
        *permits -= 1;
        Permit { gate: self, armed: true }
    }

    /// Return a permit and wake one blocked submitter.
    ///
    /// Refuses to raise the count above capacity; that can only happen when
    /// a completion path releases a permit it does not own.
    pub fn release(&self) -> bool {
        let mut permits = self.permits.lock().unwrap();
        if *permits >= self.capacity {
            error!("FlowControlGate: release would exceed capacity {}", self.capacity);
            return false;
        }
        *permits += 1;
        self.available.notify_one();
        true
    }
}

/// A held gate permit.
///
/// Dropping the guard returns the permit; [`commit`](Permit::commit)
/// disarms it once release responsibility moves to the completion path.
pub struct Permit<'a> {
    gate: &'a FlowControlGate,
    armed: bool,
}

impl Permit<'_> {
    /// Keep the permit slot consumed; the matching completion event will
    /// release it.
    pub fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.gate.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_and_commit() {
        let gate = FlowControlGate::new(3);
        assert_eq!(gate.available(), 3);

        let permit = gate.acquire();
        assert_eq!(gate.available(), 2);
        permit.commit();

        // Committed permits stay consumed until the completion path releases
        assert_eq!(gate.available(), 2);
        assert!(gate.release());
        assert_eq!(gate.available(), 3);
    }

    #[test]
    fn test_dropped_permit_returns() {
        let gate = FlowControlGate::new(2);
        {
            let _permit = gate.acquire();
            assert_eq!(gate.available(), 1);
        }
        assert_eq!(gate.available(), 2);
    }

    #[test]
    fn test_release_capped_at_capacity() {
        let gate = FlowControlGate::new(2);
        assert!(!gate.release());
        assert_eq!(gate.available(), 2);
    }

    #[test]
    fn test_acquire_blocks_until_release() {
        let gate = Arc::new(FlowControlGate::new(1));
        gate.acquire().commit();

        let (tx, rx) = crossbeam_channel::unbounded::<()>();
        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                gate.acquire().commit();
                tx.send(()).unwrap();
            })
        };

        // No permit yet, the waiter must stay blocked
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        assert!(gate.release());
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        waiter.join().unwrap();
    }

    #[test]
    fn test_release_wakes_exactly_one_waiter() {
        let gate = Arc::new(FlowControlGate::new(1));
        gate.acquire().commit();

        let (tx, rx) = crossbeam_channel::unbounded::<usize>();
        let waiters: Vec<_> = (0..2)
            .map(|id| {
                let gate = Arc::clone(&gate);
                let tx = tx.clone();
                thread::spawn(move || {
                    gate.acquire().commit();
                    tx.send(id).unwrap();
                })
            })
            .collect();

        // Give both waiters time to block
        thread::sleep(Duration::from_millis(50));

        gate.release();
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        // Only one permit was returned, so the second waiter stays blocked
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        gate.release();
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        for waiter in waiters {
            waiter.join().unwrap();
        }
    }
}
