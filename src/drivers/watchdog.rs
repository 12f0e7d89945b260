//! Task Watchdog Timer (TWDT) binding for the main task.
//!
//! The main task blocks in exactly two places: interruptible sleeps and the
//! bounded accept.  Both return well inside the timeout, so a missed feed
//! means the task is wedged and the chip should reset.  Dropping the
//! [`TaskWatchdog`] unsubscribes the task (escalated exit).

#[cfg(target_os = "espidf")]
use esp_idf_sys::{
    ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_delete,
    esp_task_wdt_reconfigure, esp_task_wdt_reset,
};
use log::{info, warn};

use crate::app::ports::WatchdogPort;

/// Default stall budget.  Must exceed the accept timeout and the poll slice.
pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;

pub struct TaskWatchdog {
    timeout_ms: u32,
    subscribed: bool,
    feeds: u64,
}

impl TaskWatchdog {
    /// Reconfigure the TWDT to `timeout_ms` and subscribe the calling task.
    /// A failed subscription is logged and leaves the watchdog inert.
    pub fn subscribe(timeout_ms: u32) -> Self {
        let subscribed = platform_subscribe(timeout_ms);
        if subscribed {
            info!("watchdog: main task subscribed ({} ms, panic on trigger)", timeout_ms);
        } else {
            warn!("watchdog: running without task watchdog");
        }
        Self {
            timeout_ms,
            subscribed,
            feeds: 0,
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Number of feeds since subscription.
    pub fn feeds(&self) -> u64 {
        self.feeds
    }
}

impl WatchdogPort for TaskWatchdog {
    fn feed(&mut self) {
        self.feeds = self.feeds.wrapping_add(1);
        if self.subscribed {
            platform_reset();
        }
    }
}

impl Drop for TaskWatchdog {
    fn drop(&mut self) {
        if self.subscribed {
            platform_unsubscribe();
            info!("watchdog: main task unsubscribed");
        }
    }
}

// ── Platform-specific ─────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn platform_subscribe(timeout_ms: u32) -> bool {
    let cfg = esp_task_wdt_config_t {
        timeout_ms,
        idle_core_mask: 0,
        trigger_panic: true,
    };
    // SAFETY: plain ESP-IDF calls on the current task; `cfg` outlives them.
    unsafe {
        let ret = esp_task_wdt_reconfigure(&cfg);
        if ret != ESP_OK {
            warn!("watchdog: reconfigure returned {} (may already be configured)", ret);
        }
        let ret = esp_task_wdt_add(core::ptr::null_mut());
        if ret != ESP_OK {
            warn!("watchdog: subscribe failed ({})", ret);
            return false;
        }
    }
    true
}

#[cfg(not(target_os = "espidf"))]
fn platform_subscribe(_timeout_ms: u32) -> bool {
    info!("watchdog(sim): no hardware timer");
    false
}

#[cfg(target_os = "espidf")]
fn platform_reset() {
    // SAFETY: the current task subscribed in `platform_subscribe`.
    unsafe {
        esp_task_wdt_reset();
    }
}

#[cfg(not(target_os = "espidf"))]
fn platform_reset() {}

#[cfg(target_os = "espidf")]
fn platform_unsubscribe() {
    // SAFETY: removes the current task, which subscribed earlier.
    unsafe {
        esp_task_wdt_delete(core::ptr::null_mut());
    }
}

#[cfg(not(target_os = "espidf"))]
fn platform_unsubscribe() {}
