//! Pool-owned hardware buffer.
//!
//! Buffers are allocated once per pipeline epoch by a `BufferPool` and then
//! cycle between the pool, the submission path and the hardware components.
//! Ownership is tracked by moves: a buffer handed to a port is gone until a
//! completion event carries it back, so two owners can never hold the same
//! buffer at the same time.

use bytes::{BufMut, BytesMut};

/// Flags travelling with a buffer through the hardware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferFlags {
    /// The payload ends a complete frame (always set for whole access units).
    pub frame_end: bool,
    /// The payload contains a keyframe.
    pub keyframe: bool,
}

/// A reusable fixed-capacity buffer with a pool slot identity.
#[derive(Debug)]
pub struct HwBuffer {
    slot: usize,
    capacity: usize,
    data: BytesMut,
    flags: BufferFlags,
}

impl HwBuffer {
    pub(crate) fn new(slot: usize, capacity: usize) -> Self {
        Self {
            slot,
            capacity,
            data: BytesMut::with_capacity(capacity),
            flags: BufferFlags::default(),
        }
    }

    /// Slot index within the owning pool.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Fixed payload capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes written so far.
    pub fn payload(&self) -> &[u8] {
        &self.data
    }

    /// Append `payload`, refusing writes that would exceed the fixed capacity.
    ///
    /// `BytesMut` would happily grow; the hardware-side allocation backing a
    /// real buffer cannot, so the bound is enforced here.
    pub fn try_write(&mut self, payload: &[u8]) -> bool {
        if self.data.len() + payload.len() > self.capacity {
            return false;
        }
        self.data.put_slice(payload);
        true
    }

    pub fn flags(&self) -> BufferFlags {
        self.flags
    }

    pub fn flags_mut(&mut self) -> &mut BufferFlags {
        &mut self.flags
    }

    /// Clear payload and flags for the next cycle.
    pub(crate) fn reset(&mut self) {
        self.data.clear();
        self.flags = BufferFlags::default();
    }
}
