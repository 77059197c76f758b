//! Core abstractions: the frame source boundary and the buffer pool

pub mod pool;
pub mod source;

pub use pool::BufferPool;
pub use source::{FrameBuffer, FrameSource};
