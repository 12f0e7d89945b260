//! ESP32 time adapter.
//!
//! Implements [`Clock`] for the firmware.
//!
//! - **`target_os = "espidf"`** — `now()` wraps `esp_timer_get_time()`
//!   from the ESP-IDF high-resolution timer (microsecond precision,
//!   monotonic since boot).
//! - **`not(target_os = "espidf")`** — uses `std::time::Instant` for
//!   host-side runs.
//!
//! `sleep()` is `std::thread::sleep` on both: on ESP-IDF it maps to
//! `vTaskDelay`, which yields to the idle task and keeps the watchdog happy.

use core::time::Duration;

use crate::app::ports::Clock;

pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: reads the free-running system timer; no preconditions.
        (unsafe { esp_idf_sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since the adapter was created.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.uptime_us())
    }

    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
