//! Mock flash pin for testing

use super::pin::FlashPin;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded pin operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinOp {
    Level(bool),
    Attach { freq_hz: u32, resolution_bits: u8 },
    Duty(u32),
    Detach,
}

struct MockPinInner {
    ops: Vec<PinOp>,
    attached: bool,
}

/// Mock pin backend that records every operation
///
/// Clones share the same log, so a test can keep a handle while the
/// controller owns the boxed pin. Attaching while already attached is an
/// error: the one-drive-mode-at-a-time invariant is enforced, not assumed.
#[derive(Clone)]
pub struct MockPin {
    inner: Arc<Mutex<MockPinInner>>,
}

impl MockPin {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockPinInner {
                ops: Vec::new(),
                attached: false,
            })),
        }
    }

    /// All operations recorded so far, in order
    pub fn ops(&self) -> Vec<PinOp> {
        self.inner.lock().ops.clone()
    }

    /// Whether a PWM attachment is currently active
    pub fn attached(&self) -> bool {
        self.inner.lock().attached
    }

    pub fn clear_ops(&self) {
        self.inner.lock().ops.clear();
    }
}

impl Default for MockPin {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashPin for MockPin {
    fn drive_level(&mut self, high: bool) -> Result<()> {
        self.inner.lock().ops.push(PinOp::Level(high));
        Ok(())
    }

    fn attach_pwm(&mut self, freq_hz: u32, resolution_bits: u8) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.attached {
            return Err(Error::Other("PWM attached while already attached".to_string()));
        }
        inner.attached = true;
        inner.ops.push(PinOp::Attach {
            freq_hz,
            resolution_bits,
        });
        Ok(())
    }

    fn set_duty(&mut self, duty: u32) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.attached {
            return Err(Error::Other("set_duty without PWM attachment".to_string()));
        }
        inner.ops.push(PinOp::Duty(duty));
        Ok(())
    }

    fn detach_pwm(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.attached = false;
        inner.ops.push(PinOp::Detach);
        Ok(())
    }
}
