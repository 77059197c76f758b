//! Mock camera for hardware-free operation
//!
//! Produces JPEG frames from a synthetic moving test pattern, going through
//! the same fixed buffer pool discipline as a real sensor HAL: a bounded set
//! of recycled buffers, acquisition failure when all of them are in flight.
//!
//! The driver is instrumented with acquire/release counters and supports an
//! optional frame limit after which it reports exhaustion, which is what the
//! session-level tests lean on.

mod pattern;

pub use pattern::PatternGenerator;

use crate::config::CameraConfig;
use crate::core::{BufferPool, FrameBuffer, FrameSource};
use crate::error::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Synthetic frame source
pub struct MockCamera {
    pool: BufferPool,
    generator: PatternGenerator,
    quality: u8,
    /// Total frames to produce before reporting exhaustion (None = unlimited)
    frame_limit: Option<u64>,
    seq: Mutex<u64>,
    acquired: AtomicU64,
    released: AtomicU64,
}

impl MockCamera {
    /// Create a mock camera from the `[camera]` configuration
    pub fn new(config: &CameraConfig) -> Self {
        let mock = &config.mock;
        Self::with_settings(
            config.buffer_count,
            mock.width,
            mock.height,
            mock.quality,
            mock.seed,
        )
    }

    /// Create a mock camera with explicit settings
    pub fn with_settings(buffer_count: usize, width: u32, height: u32, quality: u8, seed: u64) -> Self {
        // JPEG output for a busy pattern lands well under a quarter of the
        // raw RGB size; preallocate so steady state does not grow buffers.
        let capacity = (width as usize * height as usize * 3) / 4;
        Self {
            pool: BufferPool::new(buffer_count, capacity.max(1024)),
            generator: PatternGenerator::new(width, height, seed),
            quality: quality.clamp(1, 100),
            frame_limit: None,
            seq: Mutex::new(0),
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    /// Stop producing frames after `limit` acquisitions
    ///
    /// Subsequent acquires fail with [`Error::FrameUnavailable`], mimicking a
    /// drained source.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// (acquired, released) counters
    pub fn counters(&self) -> (u64, u64) {
        (
            self.acquired.load(Ordering::Relaxed),
            self.released.load(Ordering::Relaxed),
        )
    }
}

impl FrameSource for MockCamera {
    fn acquire(&self) -> Result<FrameBuffer> {
        if let Some(limit) = self.frame_limit {
            if self.acquired.load(Ordering::Relaxed) >= limit {
                return Err(Error::FrameUnavailable);
            }
        }

        let mut buf = self.pool.checkout()?;

        // Serialize frame generation: the sensor fills one buffer at a time
        let rgb = {
            let mut seq = self.seq.lock();
            let frame = self.generator.render(*seq);
            *seq = seq.wrapping_add(1);
            frame
        };

        let mut encoder = JpegEncoder::new_with_quality(&mut buf, self.quality);
        encoder
            .encode(
                &rgb,
                self.generator.width(),
                self.generator.height(),
                image::ColorType::Rgb8,
            )
            .map_err(|e| Error::Encode(e.to_string()))?;

        self.acquired.fetch_add(1, Ordering::Relaxed);
        Ok(FrameBuffer::from_vec(buf))
    }

    fn release(&self, frame: FrameBuffer) {
        self.released.fetch_add(1, Ordering::Relaxed);
        self.pool.checkin(frame.into_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_camera(buffers: usize) -> MockCamera {
        MockCamera::with_settings(buffers, 48, 32, 70, 7)
    }

    #[test]
    fn test_produces_jpeg_frames() {
        let cam = small_camera(2);
        let frame = cam.acquire().unwrap();
        assert!(!frame.is_empty());
        // JPEG SOI marker and EOI marker
        assert_eq!(&frame.as_bytes()[..2], &[0xFF, 0xD8]);
        assert_eq!(&frame.as_bytes()[frame.len() - 2..], &[0xFF, 0xD9]);
        cam.release(frame);
        assert_eq!(cam.counters(), (1, 1));
    }

    #[test]
    fn test_pool_exhaustion_surfaces_as_unavailable() {
        let cam = small_camera(2);
        let a = cam.acquire().unwrap();
        let b = cam.acquire().unwrap();
        assert!(matches!(cam.acquire(), Err(Error::FrameUnavailable)));
        cam.release(a);
        assert!(cam.acquire().is_ok());
        cam.release(b);
    }

    #[test]
    fn test_frame_limit_reports_exhaustion() {
        let cam = small_camera(2).with_frame_limit(3);
        for _ in 0..3 {
            let f = cam.acquire().unwrap();
            cam.release(f);
        }
        assert!(matches!(cam.acquire(), Err(Error::FrameUnavailable)));
        // counters balance even at the limit
        assert_eq!(cam.counters(), (3, 3));
    }
}
