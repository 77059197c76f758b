//! Replay camera: loops recorded JPEG frames
//!
//! Plays back a directory of JPEG files through the same buffer pool
//! discipline as a live sensor. Useful for demos and for exercising the
//! streaming path with realistic footage on a development machine.

use crate::core::{BufferPool, FrameBuffer, FrameSource};
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Frame source backed by recorded JPEG files
pub struct ReplayCamera {
    pool: BufferPool,
    frames: Vec<Vec<u8>>,
    cursor: AtomicUsize,
}

impl ReplayCamera {
    /// Load every `.jpg`/`.jpeg` file under `dir`, in name order
    pub fn open<P: AsRef<Path>>(dir: P, buffer_count: usize) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_jpeg = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
                .unwrap_or(false);
            if path.is_file() && is_jpeg {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(Error::InitializationFailed(format!(
                "no JPEG files in {}",
                dir.display()
            )));
        }

        let mut frames = Vec::with_capacity(paths.len());
        let mut largest = 0usize;
        for path in &paths {
            let bytes = fs::read(path)?;
            largest = largest.max(bytes.len());
            frames.push(bytes);
        }

        log::info!(
            "Replay camera loaded {} frames from {} (largest {} bytes)",
            frames.len(),
            dir.display(),
            largest
        );

        Ok(Self {
            pool: BufferPool::new(buffer_count, largest),
            frames,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Number of distinct frames in the loop
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplayCamera {
    fn acquire(&self) -> Result<FrameBuffer> {
        let mut buf = self.pool.checkout()?;
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        buf.extend_from_slice(&self.frames[idx]);
        Ok(FrameBuffer::from_vec(buf))
    }

    fn release(&self, frame: FrameBuffer) {
        self.pool.checkin(frame.into_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("drishti-replay-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_empty_directory_fails_init() {
        let dir = fixture_dir("empty");
        let result = ReplayCamera::open(&dir, 2);
        assert!(matches!(result, Err(Error::InitializationFailed(_))));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_loops_frames_in_name_order() {
        let dir = fixture_dir("loop");
        fs::write(dir.join("b.jpg"), b"frame-b").unwrap();
        fs::write(dir.join("a.jpg"), b"frame-a").unwrap();
        fs::write(dir.join("notes.txt"), b"ignored").unwrap();

        let cam = ReplayCamera::open(&dir, 2).unwrap();
        assert_eq!(cam.frame_count(), 2);

        for expected in [b"frame-a".as_ref(), b"frame-b".as_ref(), b"frame-a".as_ref()] {
            let frame = cam.acquire().unwrap();
            assert_eq!(frame.as_bytes(), expected);
            cam.release(frame);
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_pool_bounds_outstanding_frames() {
        let dir = fixture_dir("pool");
        fs::write(dir.join("a.jpg"), b"frame-a").unwrap();

        let cam = ReplayCamera::open(&dir, 1).unwrap();
        let held = cam.acquire().unwrap();
        assert!(matches!(cam.acquire(), Err(Error::FrameUnavailable)));
        cam.release(held);
        assert!(cam.acquire().is_ok());
        let _ = fs::remove_dir_all(&dir);
    }
}
