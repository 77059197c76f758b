//! Frame source boundary
//!
//! The sensor HAL owns a small pool of frame buffers. A streaming session
//! borrows one buffer at a time through [`FrameSource::acquire`] and must hand
//! it back with [`FrameSource::release`] before acquiring the next one —
//! on every iteration, whether or not the frame made it onto the wire.

use crate::error::Result;

/// One compressed frame, checked out of a [`FrameSource`]
///
/// Owned exclusively by the holder until released. Release takes the buffer
/// by value, so releasing twice does not compile.
#[derive(Debug)]
pub struct FrameBuffer {
    bytes: Vec<u8>,
}

impl FrameBuffer {
    pub(crate) fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw JPEG payload
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

/// A producer of compressed camera frames backed by a fixed buffer pool
///
/// Implementations must be callable from any worker thread. `acquire` returns
/// [`crate::error::Error::FrameUnavailable`] when no buffer can be produced
/// right now (pool exhausted or source drained); any other error is a
/// hardware-level failure.
pub trait FrameSource: Send + Sync {
    /// Check one populated frame buffer out of the pool
    fn acquire(&self) -> Result<FrameBuffer>;

    /// Return a frame buffer to the pool
    fn release(&self, frame: FrameBuffer);
}
