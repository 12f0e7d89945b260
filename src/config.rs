//! System configuration parameters
//!
//! All tunable parameters for the RC car firmware.  Defaults reproduce the
//! stock build; a partial JSON overlay can be baked in at compile time
//! through the `RCCAR_CONFIG` environment variable.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::drivers::watchdog;

/// Optional peripherals fitted to the chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    /// Two drive motors only.
    MotorsOnly,
    /// Two drive motors plus a PWM-dimmable headlight.
    MotorsAndLight,
}

impl Capability {
    pub fn has_light(self) -> bool {
        matches!(self, Self::MotorsAndLight)
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarConfig {
    // --- Access point ---
    /// Network name broadcast by the soft AP
    pub ap_ssid: heapless::String<32>,
    /// WPA2 passphrase (empty = open network)
    pub ap_password: heapless::String<64>,
    /// 2.4 GHz channel
    pub ap_channel: u8,
    /// Maximum simultaneously associated stations
    pub ap_max_clients: u16,

    // --- HTTP ---
    /// TCP port of the joypad server
    pub http_port: u16,
    /// Accept timeout; bounds how long a cancellation can go unobserved
    pub accept_timeout_ms: u32,
    /// Single-shot receive buffer for one request
    pub recv_buffer_bytes: usize,

    // --- Lifecycle ---
    /// Number of countdown ticks before a session starts
    pub countdown_ticks: u8,
    /// Length of one countdown tick (milliseconds)
    pub countdown_tick_ms: u32,
    /// Pause after a cancelled countdown (second signal here exits)
    pub cancel_pause_ms: u32,
    /// Grace window after a cancelled session (second signal here exits)
    pub grace_window_ms: u32,
    /// Pause after a faulted session before the next countdown
    pub fault_pause_ms: u32,
    /// Granularity at which interruptible waits poll the latch
    pub poll_slice_ms: u32,

    // --- Vehicle ---
    /// Fitted peripherals
    pub capability: Capability,
    /// Brightness level (1-10) staged at boot
    pub headlight_level: u8,
}

impl Default for CarConfig {
    fn default() -> Self {
        Self {
            // Access point
            ap_ssid: fixed("RC_Car"),
            ap_password: fixed("12345678"),
            ap_channel: 1,
            ap_max_clients: 4,

            // HTTP
            http_port: 80,
            accept_timeout_ms: 3_000,
            recv_buffer_bytes: 1024,

            // Lifecycle
            countdown_ticks: 5,
            countdown_tick_ms: 1_000,
            cancel_pause_ms: 2_000,
            grace_window_ms: 3_000,
            fault_pause_ms: 2_000,
            poll_slice_ms: 50,

            // Vehicle
            capability: Capability::MotorsAndLight,
            headlight_level: 10,
        }
    }
}

impl CarConfig {
    /// Parse a (possibly partial) JSON overlay on top of the defaults and
    /// validate the result.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ap_ssid.is_empty() || !self.ap_ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            return Err(ConfigError::ValidationFailed("ap_ssid must be 1-32 printable ASCII bytes"));
        }
        let pw = self.ap_password.len();
        if pw != 0 && pw < 8 {
            return Err(ConfigError::ValidationFailed("ap_password must be empty or 8-64 bytes"));
        }
        if self.ap_channel == 0 || self.ap_channel > 13 {
            return Err(ConfigError::ValidationFailed("ap_channel must be 1-13"));
        }
        if self.http_port == 0 {
            return Err(ConfigError::ValidationFailed("http_port must be non-zero"));
        }
        if self.recv_buffer_bytes < 64 {
            return Err(ConfigError::ValidationFailed("recv_buffer_bytes must be >= 64"));
        }
        if self.countdown_ticks == 0 {
            return Err(ConfigError::ValidationFailed("countdown_ticks must be >= 1"));
        }
        if self.accept_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("accept_timeout_ms must be non-zero"));
        }
        if self.poll_slice_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll_slice_ms must be non-zero"));
        }
        // Accept (and per-connection I/O) and a single poll slice are the
        // only waits that run without a watchdog feed in between.
        if self.accept_timeout_ms >= watchdog::DEFAULT_TIMEOUT_MS {
            return Err(ConfigError::ValidationFailed(
                "accept_timeout_ms must be below the watchdog timeout",
            ));
        }
        if self.poll_slice_ms >= watchdog::DEFAULT_TIMEOUT_MS {
            return Err(ConfigError::ValidationFailed(
                "poll_slice_ms must be below the watchdog timeout",
            ));
        }
        if !(1..=10).contains(&self.headlight_level) {
            return Err(ConfigError::ValidationFailed("headlight_level must be 1-10"));
        }
        Ok(())
    }

    pub fn accept_timeout(&self) -> Duration {
        Duration::from_millis(self.accept_timeout_ms as u64)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms as u64)
    }

    pub fn cancel_pause(&self) -> Duration {
        Duration::from_millis(self.cancel_pause_ms as u64)
    }

    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms as u64)
    }

    pub fn fault_pause(&self) -> Duration {
        Duration::from_millis(self.fault_pause_ms as u64)
    }

    pub fn poll_slice(&self) -> Duration {
        Duration::from_millis(self.poll_slice_ms as u64)
    }
}

/// Copy a literal into a fixed-capacity string, truncating at capacity.
fn fixed<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
