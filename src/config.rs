//! Configuration for the DrishtiIO daemon
//!
//! Loads configuration from a TOML file with the minimal parameters needed
//! to run the camera server on an embedded module.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub flash: FlashConfig,
    pub server: ServerConfig,
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
}

/// Camera / frame source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraConfig {
    /// Frame source type ("mock" or "replay")
    pub source: String,

    /// Number of frame buffers in the pool
    ///
    /// Matches the hardware frame buffer count of the sensor HAL. With two
    /// buffers one frame can be on the wire while the next is being filled;
    /// acquisition fails when every buffer is in flight.
    pub buffer_count: usize,

    /// Minimum delay between frames in milliseconds (bounds the frame rate)
    pub frame_interval_ms: u64,

    /// Consecutive failed acquisitions a session tolerates before it ends
    pub acquire_retries: u32,

    /// Mock camera settings (only used when `source = "mock"`)
    #[serde(default)]
    pub mock: MockSettings,

    /// Directory of JPEG files (only used when `source = "replay"`)
    #[serde(default)]
    pub replay_dir: Option<String>,
}

/// Synthetic frame settings for the mock camera
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MockSettings {
    pub width: u32,
    pub height: u32,
    /// JPEG quality (1-100)
    pub quality: u8,
    /// Pattern noise seed (same seed reproduces the same frame sequence)
    pub seed: u64,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            quality: 80,
            seed: 42,
        }
    }
}

/// Flash output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlashConfig {
    /// Pin backend ("sysfs" or "mock")
    pub backend: String,
    /// GPIO number of the flash output (GPIO 4 on AI-Thinker modules)
    pub gpio: u32,
    /// PWM chip index under /sys/class/pwm
    pub pwm_chip: u32,
    /// PWM channel index on the chip
    pub pwm_channel: u32,
    /// Drive strategy ("level" or "pwm")
    pub drive: String,
    /// Some modules wire the flash LED active-low; the logical on/off state
    /// then maps to the opposite physical level.
    pub active_low: bool,
    /// PWM carrier frequency in Hz
    pub pwm_freq_hz: u32,
    /// PWM duty resolution in bits (8 bits = duty 0..=255)
    pub pwm_resolution_bits: u8,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Bind address for the streaming endpoint
    ///
    /// Examples:
    /// - `0.0.0.0:81` - All interfaces, dedicated streaming port
    /// - `0.0.0.0:80` - Same as the control address (single listener)
    pub stream_address: String,

    /// Bind address for the control endpoints (index page, flash toggle)
    ///
    /// When equal to `stream_address` a single listener serves every route.
    pub control_address: String,
}

/// Static network identity
///
/// Provisioned by the network bring-up outside this daemon; recorded here so
/// startup logs show where the module expects to be reachable. Never mutated.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    pub address: String,
    pub gateway: String,
    pub netmask: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log output (stdout or stderr)
    pub output: String,
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Default configuration for the AI-Thinker camera module
    ///
    /// Mirrors the module's stock firmware values: two frame buffers, ~30 ms
    /// frame pacing, flash on GPIO 4 driven by a 5 kHz / 8-bit PWM channel,
    /// control on port 80 and streaming on port 81. Suitable for testing and
    /// development; production deployments should use a TOML file.
    pub fn ai_thinker_defaults() -> Self {
        Self {
            camera: CameraConfig {
                source: "mock".to_string(),
                buffer_count: 2,
                frame_interval_ms: 30,
                acquire_retries: 5,
                mock: MockSettings::default(),
                replay_dir: None,
            },
            flash: FlashConfig {
                backend: "sysfs".to_string(),
                gpio: 4,
                pwm_chip: 0,
                pwm_channel: 0,
                drive: "pwm".to_string(),
                active_low: false,
                pwm_freq_hz: 5000,
                pwm_resolution_bits: 8,
            },
            server: ServerConfig {
                stream_address: "0.0.0.0:81".to_string(),
                control_address: "0.0.0.0:80".to_string(),
            },
            network: NetworkConfig {
                address: "192.168.0.150".to_string(),
                gateway: "192.168.0.254".to_string(),
                netmask: "255.255.252.0".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                output: "stdout".to_string(),
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::ai_thinker_defaults()
    }
}
