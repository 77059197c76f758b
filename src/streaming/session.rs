//! Streaming session: one client, one long-lived multipart response
//!
//! A session turns an accepted connection into an indefinite sequence of
//! JPEG parts. The loop is acquire → write → release, and the release
//! happens on every iteration before the write outcome is acted on, so a
//! dead client can never leak a frame buffer back at the source.
//!
//! Backpressure needs no extra machinery: each write blocks until the
//! client drains it, and the next acquire only happens after the previous
//! write returned, so a slow client simply slows the loop down.
//!
//! Acquisition failure is treated as transient, but only up to a point:
//! after `acquire_retries` consecutive misses (with a short growing pause
//! between attempts) the session ends with [`SessionEnd::SourceStalled`].
//! Unbounded silent retry would spin the CPU forever against a dead sensor.

use crate::core::FrameSource;
use crate::error::Error;
use crate::streaming::multipart;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The opening response header never made it out
    HeaderWriteFailed,
    /// A part write failed (client gone or connection error)
    WriteFailed,
    /// The source reported no frame for too many consecutive attempts
    SourceStalled,
    /// The source failed with a hardware-level error
    SourceFailed,
    /// The daemon is shutting down
    Shutdown,
}

/// Session result: end reason plus how many complete parts were sent
#[derive(Debug)]
pub struct SessionOutcome {
    pub end: SessionEnd,
    pub frames: u64,
}

/// Drives the frame loop for a single connection
pub struct StreamSession<W: Write> {
    conn: W,
    peer: String,
    frame_interval: Duration,
    acquire_retries: u32,
    running: Arc<AtomicBool>,
    frames: u64,
}

impl<W: Write> StreamSession<W> {
    pub fn new(
        conn: W,
        peer: String,
        frame_interval: Duration,
        acquire_retries: u32,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            conn,
            peer,
            frame_interval,
            acquire_retries,
            running,
            frames: 0,
        }
    }

    /// Run the session to completion
    pub fn run(mut self, source: &dyn FrameSource) -> SessionOutcome {
        log::info!("Stream session started for {}", self.peer);

        if let Err(e) = multipart::write_stream_header(&mut self.conn) {
            log::warn!("{}: response header send failed: {}", self.peer, e);
            return self.finish(SessionEnd::HeaderWriteFailed);
        }

        let mut misses: u32 = 0;
        loop {
            if !self.running.load(Ordering::Relaxed) {
                return self.finish(SessionEnd::Shutdown);
            }

            let frame = match source.acquire() {
                Ok(frame) => {
                    misses = 0;
                    frame
                }
                Err(Error::FrameUnavailable) => {
                    misses += 1;
                    if misses > self.acquire_retries {
                        log::warn!(
                            "{}: no frame after {} attempts, ending session",
                            self.peer,
                            misses
                        );
                        return self.finish(SessionEnd::SourceStalled);
                    }
                    thread::sleep(Duration::from_millis(10 * u64::from(misses)));
                    continue;
                }
                Err(e) => {
                    log::error!("{}: frame acquisition failed: {}", self.peer, e);
                    return self.finish(SessionEnd::SourceFailed);
                }
            };

            // Release on every iteration, before the write result is
            // examined: a failed write must not leak the buffer.
            let wrote = multipart::write_part(&mut self.conn, &frame);
            source.release(frame);

            if let Err(e) = wrote {
                log::info!("{}: client gone: {}", self.peer, e);
                return self.finish(SessionEnd::WriteFailed);
            }
            if let Err(e) = self.conn.flush() {
                log::info!("{}: flush failed: {}", self.peer, e);
                return self.finish(SessionEnd::WriteFailed);
            }

            self.frames += 1;
            if !self.frame_interval.is_zero() {
                thread::sleep(self.frame_interval);
            }
        }
    }

    fn finish(self, end: SessionEnd) -> SessionOutcome {
        log::info!(
            "Stream session for {} ended: {:?} after {} frames",
            self.peer,
            end,
            self.frames
        );
        SessionOutcome {
            end,
            frames: self.frames,
        }
    }
}
