//! Sysfs-backed flash pin
//!
//! Drives the flash output through the kernel's GPIO and PWM sysfs
//! interfaces. Level drive writes `/sys/class/gpio/gpioN/value`; PWM drive
//! exports a channel under `/sys/class/pwm/pwmchipN` and programs period,
//! duty cycle and enable.

use super::pin::FlashPin;
use crate::error::{Error, Result};
use std::fs;
use std::path::PathBuf;

const GPIO_ROOT: &str = "/sys/class/gpio";
const PWM_ROOT: &str = "/sys/class/pwm";

struct PwmAttachment {
    channel_dir: PathBuf,
    period_ns: u64,
    max_duty: u32,
}

/// Flash pin over /sys/class/gpio and /sys/class/pwm
pub struct SysfsPin {
    gpio: u32,
    pwm_chip: u32,
    pwm_channel: u32,
    gpio_dir: PathBuf,
    pwm: Option<PwmAttachment>,
}

impl SysfsPin {
    /// Export the GPIO and configure it as an output
    pub fn open(gpio: u32, pwm_chip: u32, pwm_channel: u32) -> Result<Self> {
        let gpio_dir = PathBuf::from(GPIO_ROOT).join(format!("gpio{}", gpio));
        if !gpio_dir.exists() {
            // Export fails with EBUSY when the pin is already exported;
            // only the final state matters.
            let _ = fs::write(PathBuf::from(GPIO_ROOT).join("export"), gpio.to_string());
            if !gpio_dir.exists() {
                return Err(Error::InitializationFailed(format!(
                    "GPIO {} could not be exported",
                    gpio
                )));
            }
        }
        fs::write(gpio_dir.join("direction"), "out")?;

        Ok(Self {
            gpio,
            pwm_chip,
            pwm_channel,
            gpio_dir,
            pwm: None,
        })
    }

    fn chip_dir(&self) -> PathBuf {
        PathBuf::from(PWM_ROOT).join(format!("pwmchip{}", self.pwm_chip))
    }
}

impl FlashPin for SysfsPin {
    fn drive_level(&mut self, high: bool) -> Result<()> {
        fs::write(self.gpio_dir.join("value"), if high { "1" } else { "0" })?;
        log::debug!("GPIO {} driven {}", self.gpio, if high { "high" } else { "low" });
        Ok(())
    }

    fn attach_pwm(&mut self, freq_hz: u32, resolution_bits: u8) -> Result<()> {
        if freq_hz == 0 {
            return Err(Error::InvalidParameter("pwm_freq_hz must be > 0".to_string()));
        }
        let chip_dir = self.chip_dir();
        let channel_dir = chip_dir.join(format!("pwm{}", self.pwm_channel));
        if !channel_dir.exists() {
            let _ = fs::write(chip_dir.join("export"), self.pwm_channel.to_string());
            if !channel_dir.exists() {
                return Err(Error::InitializationFailed(format!(
                    "PWM channel {}/{} could not be exported",
                    self.pwm_chip, self.pwm_channel
                )));
            }
        }

        let period_ns = 1_000_000_000u64 / freq_hz as u64;
        let max_duty = (1u32 << resolution_bits.min(31)) - 1;
        fs::write(channel_dir.join("period"), period_ns.to_string())?;
        fs::write(channel_dir.join("duty_cycle"), "0")?;
        fs::write(channel_dir.join("enable"), "1")?;

        log::debug!(
            "PWM {}/{} attached to GPIO {}: {} Hz, {}-bit duty",
            self.pwm_chip,
            self.pwm_channel,
            self.gpio,
            freq_hz,
            resolution_bits
        );

        self.pwm = Some(PwmAttachment {
            channel_dir,
            period_ns,
            max_duty,
        });
        Ok(())
    }

    fn set_duty(&mut self, duty: u32) -> Result<()> {
        let pwm = self
            .pwm
            .as_ref()
            .ok_or_else(|| Error::Other("set_duty without PWM attachment".to_string()))?;
        let duty = duty.min(pwm.max_duty);
        let duty_ns = pwm.period_ns * duty as u64 / pwm.max_duty.max(1) as u64;
        fs::write(pwm.channel_dir.join("duty_cycle"), duty_ns.to_string())?;
        Ok(())
    }

    fn detach_pwm(&mut self) -> Result<()> {
        let channel_dir = match self.pwm.take() {
            Some(pwm) => pwm.channel_dir,
            None => {
                // A previous run may have left the channel exported and
                // enabled; shut it down too so the pin reaches a known state.
                let dir = self.chip_dir().join(format!("pwm{}", self.pwm_channel));
                if !dir.exists() {
                    return Ok(());
                }
                dir
            }
        };
        fs::write(channel_dir.join("enable"), "0")?;
        let _ = fs::write(self.chip_dir().join("unexport"), self.pwm_channel.to_string());
        log::debug!("PWM {}/{} detached", self.pwm_chip, self.pwm_channel);
        Ok(())
    }
}
