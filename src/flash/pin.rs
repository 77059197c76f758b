//! Flash pin backend trait

use crate::error::Result;

/// Low-level operations on the flash output pin
///
/// A backend drives the physical pin; it knows nothing about logical on/off
/// or polarity. The controller guarantees ordering: `detach_pwm` is always
/// issued before the pin is driven as a plain level, and `attach_pwm` is
/// never issued while a PWM attachment is active. `detach_pwm` must be safe
/// to call when nothing is attached (the startup path uses this to reach a
/// known state from an arbitrary power-on configuration).
pub trait FlashPin: Send {
    /// Drive the pin to a static logic level
    fn drive_level(&mut self, high: bool) -> Result<()>;

    /// Attach the pin to a PWM generator at the given carrier
    fn attach_pwm(&mut self, freq_hz: u32, resolution_bits: u8) -> Result<()>;

    /// Set the PWM duty (0 ..= 2^resolution_bits - 1); requires an attachment
    fn set_duty(&mut self, duty: u32) -> Result<()>;

    /// Detach the PWM generator, leaving the pin free for level drive
    fn detach_pwm(&mut self) -> Result<()>;
}
