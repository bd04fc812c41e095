//! Fixed-capacity buffer pool.
//!
//! Buffers are allocated up front and cycle through acquire/release for the
//! lifetime of a pipeline epoch; the pool never grows. A per-slot free map
//! backs the release guard: a slot can only be marked free once per cycle,
//! so a duplicated or foreign release is caught instead of corrupting the
//! free queue.

use std::collections::VecDeque;
use std::sync::Mutex;

use log::warn;

use crate::hw::HwBuffer;

pub struct BufferPool {
    name: &'static str,
    capacity: usize,
    buffer_size: usize,
    inner: Mutex<PoolInner>,
}

struct PoolInner {
    free: VecDeque<HwBuffer>,
    slot_free: Vec<bool>,
}

impl BufferPool {
    /// Build a pool of `count` buffers of `buffer_size` bytes each.
    ///
    /// `name` distinguishes the input and output pools in logs.
    pub fn new(name: &'static str, count: usize, buffer_size: usize) -> Self {
        let free = (0..count).map(|slot| HwBuffer::new(slot, buffer_size)).collect();
        Self {
            name,
            capacity: count,
            buffer_size,
            inner: Mutex::new(PoolInner { free, slot_free: vec![true; count] }),
        }
    }

    /// Total number of buffers owned by this pool.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Payload capacity of each buffer in bytes.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of buffers currently in the free queue.
    pub fn free_count(&self) -> usize {
        self.inner.lock().unwrap().free.len()
    }

    /// Take a free buffer, or `None` when all buffers are in flight.
    ///
    /// Never blocks; an empty pool is the backpressure signal.
    pub fn acquire(&self) -> Option<HwBuffer> {
        let mut inner = self.inner.lock().unwrap();
        let buffer = inner.free.pop_front()?;
        inner.slot_free[buffer.slot()] = false;
        Some(buffer)
    }

    /// Return a buffer to the free queue, clearing its payload and flags.
    ///
    /// Rejects buffers whose slot is already free (a double release) or not
    /// part of this pool; the offending buffer is dropped, not enqueued.
    pub fn release(&self, mut buffer: HwBuffer) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let slot = buffer.slot();
        match inner.slot_free.get(slot).copied() {
            None => {
                warn!("BufferPool({}): dropping buffer with foreign slot {}", self.name, slot);
                false
            }
            Some(true) => {
                warn!("BufferPool({}): slot {} released twice, dropping buffer", self.name, slot);
                false
            }
            Some(false) => {
                buffer.reset();
                inner.slot_free[slot] = true;
                inner.free.push_back(buffer);
                true
            }
        }
    }
}
