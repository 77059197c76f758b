//! Fixed-population buffer pool
//!
//! Models the sensor HAL's frame buffer ring: a small, fixed number of
//! reusable byte buffers. Checkout pops from a lock-free queue so device
//! threads and per-connection session threads never contend on a lock;
//! an empty queue means every buffer is currently in flight.

use crate::error::{Error, Result};
use crossbeam_queue::ArrayQueue;

/// Pool of recycled frame byte buffers
pub struct BufferPool {
    free: ArrayQueue<Vec<u8>>,
    population: usize,
}

impl BufferPool {
    /// Create a pool of `count` buffers, each preallocated to `capacity` bytes
    pub fn new(count: usize, capacity: usize) -> Self {
        let free = ArrayQueue::new(count.max(1));
        for _ in 0..count.max(1) {
            // push cannot fail here: the queue was sized for exactly this many
            let _ = free.push(Vec::with_capacity(capacity));
        }
        Self {
            free,
            population: count.max(1),
        }
    }

    /// Check a buffer out of the pool
    ///
    /// Fails with [`Error::FrameUnavailable`] when every buffer is in flight.
    pub fn checkout(&self) -> Result<Vec<u8>> {
        self.free.pop().ok_or(Error::FrameUnavailable)
    }

    /// Return a buffer to the pool
    ///
    /// The buffer is cleared but keeps its allocation, so steady-state
    /// streaming does not reallocate.
    pub fn checkin(&self, mut buf: Vec<u8>) {
        buf.clear();
        let _ = self.free.push(buf);
    }

    /// Buffers currently available for checkout
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Total buffers owned by the pool
    pub fn population(&self) -> usize {
        self.population
    }
}
