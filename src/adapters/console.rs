//! Interrupt sources: console Ctrl+C and the BOOT button.
//!
//! A single background thread feeds the process-wide [`InterruptLatch`]:
//!
//! - every `0x03` byte read from the console (stdin) raises the latch once;
//! - on ESP-IDF, every press of the BOOT button (GPIO0, active low) raises
//!   it once.  The pin is sampled on the same thread, with a simple
//!   release-before-repress rule as debounce.
//!
//! The thread never touches actuators or sockets; the latch is the only
//! state it shares with the main task.

use std::io::{ErrorKind, Read};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, info, warn};

use crate::interrupt::InterruptLatch;

/// ETX, sent by terminals for Ctrl+C.
pub const CTRL_C: u8 = 0x03;

/// Poll period of the console thread.
const POLL: Duration = Duration::from_millis(20);

/// Samples a button must read released before a new press counts.
const RELEASE_SAMPLES: u8 = 3;

/// Number of Ctrl+C bytes in `bytes`.
pub fn interrupts_in(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == CTRL_C).count()
}

/// Edge detector for an active-low push button.
#[derive(Debug)]
pub struct ButtonEdge {
    armed: bool,
    released_for: u8,
}

impl ButtonEdge {
    pub const fn new() -> Self {
        Self {
            armed: true,
            released_for: 0,
        }
    }

    /// Feed one sample (`true` = pressed).  Returns `true` on a new press.
    pub fn sample(&mut self, pressed: bool) -> bool {
        if pressed {
            self.released_for = 0;
            if self.armed {
                self.armed = false;
                return true;
            }
        } else if !self.armed {
            self.released_for = self.released_for.saturating_add(1);
            if self.released_for >= RELEASE_SAMPLES {
                self.armed = true;
            }
        }
        false
    }
}

impl Default for ButtonEdge {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the interrupt-source thread.
pub fn spawn(latch: &'static InterruptLatch) -> std::io::Result<JoinHandle<()>> {
    boot_button_init();
    let handle = std::thread::Builder::new()
        .name("console".into())
        .stack_size(4096)
        .spawn(move || run(latch))?;
    info!("console: Ctrl+C / BOOT button armed");
    Ok(handle)
}

fn run(latch: &'static InterruptLatch) {
    let mut stdin = std::io::stdin();
    let mut buf = [0u8; 32];
    let mut button = ButtonEdge::new();

    loop {
        match stdin.read(&mut buf) {
            Ok(0) => std::thread::sleep(POLL),
            Ok(n) => {
                for _ in 0..interrupts_in(&buf[..n]) {
                    raise(latch, "Ctrl+C");
                }
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {
                std::thread::sleep(POLL);
            }
            Err(e) => {
                warn!("console: stdin read failed: {}", e);
                std::thread::sleep(POLL);
            }
        }

        if button.sample(boot_button_pressed()) {
            raise(latch, "BOOT button");
        }
    }
}

fn raise(latch: &InterruptLatch, source: &str) {
    if latch.raise() {
        info!("console: {} (pending={})", source, latch.pending());
    } else {
        debug!("console: {} dropped, latch saturated", source);
    }
}

// ── Platform-specific ─────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn boot_button_init() {
    use esp_idf_sys::{
        gpio_mode_t_GPIO_MODE_INPUT, gpio_pull_mode_t_GPIO_PULLUP_ONLY, gpio_set_direction,
        gpio_set_pull_mode,
    };
    let pin = crate::pins::BOOT_BUTTON_GPIO;
    // SAFETY: GPIO0 is claimed by nothing else once the chip has booted.
    unsafe {
        gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT);
        gpio_set_pull_mode(pin, gpio_pull_mode_t_GPIO_PULLUP_ONLY);
    }
}

#[cfg(not(target_os = "espidf"))]
fn boot_button_init() {}

#[cfg(target_os = "espidf")]
fn boot_button_pressed() -> bool {
    // SAFETY: plain level read of an input configured in `boot_button_init`.
    unsafe { esp_idf_sys::gpio_get_level(crate::pins::BOOT_BUTTON_GPIO) == 0 }
}

#[cfg(not(target_os = "espidf"))]
fn boot_button_pressed() -> bool {
    false
}
