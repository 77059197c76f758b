//! Flash output control
//!
//! The flash LED is one physical pin multiplexed between two drive
//! strategies: a plain GPIO level, or a PWM channel at a fixed carrier.
//! Only one strategy may be attached to the pin at a time; every mode switch
//! detaches the previous strategy before the next one touches the pin.
//!
//! All mutation goes through [`FlashController`], a process-wide singleton
//! guarded by a mutex, so concurrent toggle requests serialize and can never
//! interleave their attach/drive/detach sequences.

pub mod mock;
pub mod pin;
pub mod sysfs;

pub use mock::{MockPin, PinOp};
pub use pin::FlashPin;
pub use sysfs::SysfsPin;

use crate::config::FlashConfig;
use crate::error::{Error, Result};
use parking_lot::Mutex;

/// Electrical strategy used to drive the flash pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// Force a static logic level
    Level,
    /// Attach a PWM generator and set duty (full duty = on)
    Pwm,
}

impl DriveMode {
    /// Parse the `flash.drive` config value
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "level" => Ok(DriveMode::Level),
            "pwm" => Ok(DriveMode::Pwm),
            other => Err(Error::Config(format!(
                "flash.drive must be \"level\" or \"pwm\", got \"{}\"",
                other
            ))),
        }
    }
}

/// PWM carrier parameters
#[derive(Debug, Clone, Copy)]
pub struct PwmSettings {
    pub freq_hz: u32,
    pub resolution_bits: u8,
}

impl PwmSettings {
    fn max_duty(&self) -> u32 {
        (1u32 << u32::from(self.resolution_bits.min(31))) - 1
    }
}

struct FlashInner {
    pin: Box<dyn FlashPin>,
    on: bool,
    attached: bool,
}

/// Mutex-guarded flash state machine
pub struct FlashController {
    mode: DriveMode,
    active_low: bool,
    pwm: PwmSettings,
    inner: Mutex<FlashInner>,
}

impl FlashController {
    pub fn new(pin: Box<dyn FlashPin>, mode: DriveMode, active_low: bool, pwm: PwmSettings) -> Self {
        Self {
            mode,
            active_low,
            pwm,
            inner: Mutex::new(FlashInner {
                pin,
                on: false,
                attached: false,
            }),
        }
    }

    /// Force the output to the physical "off" state
    ///
    /// Called once at startup, before any request can be served: the
    /// peripheral's power-on level is unspecified, so detach whatever may be
    /// attached and drive the inactive level explicitly.
    pub fn force_off(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.pin.detach_pwm()?;
        inner.attached = false;
        inner.pin.drive_level(self.level_for(false))?;
        inner.on = false;
        Ok(())
    }

    /// Flip the logical flash state, returning the new state
    pub fn toggle(&self) -> Result<bool> {
        let mut inner = self.inner.lock();
        let turning_on = !inner.on;
        if turning_on {
            self.apply_on(&mut inner)?;
        } else {
            self.apply_off(&mut inner)?;
        }
        inner.on = turning_on;
        log::info!("Flash {}", if turning_on { "ON" } else { "OFF" });
        Ok(turning_on)
    }

    /// Current logical state
    pub fn is_on(&self) -> bool {
        self.inner.lock().on
    }

    /// Physical level for a logical state under the configured polarity
    fn level_for(&self, on: bool) -> bool {
        on != self.active_low
    }

    /// PWM duty for a logical state (duty counts high-time, so active-low
    /// modules invert the duty sense)
    fn duty_for(&self, on: bool) -> u32 {
        if on != self.active_low {
            self.pwm.max_duty()
        } else {
            0
        }
    }

    fn apply_on(&self, inner: &mut FlashInner) -> Result<()> {
        match self.mode {
            DriveMode::Level => inner.pin.drive_level(self.level_for(true))?,
            DriveMode::Pwm => {
                inner.pin.attach_pwm(self.pwm.freq_hz, self.pwm.resolution_bits)?;
                inner.attached = true;
                if let Err(e) = inner.pin.set_duty(self.duty_for(true)) {
                    // roll back so a retry can attach again
                    let _ = inner.pin.detach_pwm();
                    inner.attached = false;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn apply_off(&self, inner: &mut FlashInner) -> Result<()> {
        match self.mode {
            DriveMode::Level => inner.pin.drive_level(self.level_for(false))?,
            DriveMode::Pwm => {
                inner.pin.set_duty(self.duty_for(false))?;
                inner.pin.detach_pwm()?;
                inner.attached = false;
                inner.pin.drive_level(self.level_for(false))?;
            }
        }
        Ok(())
    }
}

/// Create a flash controller based on configuration
pub fn create_controller(config: &FlashConfig) -> Result<FlashController> {
    let pin: Box<dyn FlashPin> = match config.backend.as_str() {
        "sysfs" => Box::new(SysfsPin::open(config.gpio, config.pwm_chip, config.pwm_channel)?),
        "mock" => Box::new(MockPin::new()),
        other => return Err(Error::UnknownBackend(other.to_string())),
    };
    let mode = DriveMode::parse(&config.drive)?;
    Ok(FlashController::new(
        pin,
        mode,
        config.active_low,
        PwmSettings {
            freq_hz: config.pwm_freq_hz,
            resolution_bits: config.pwm_resolution_bits,
        },
    ))
}
