//! Headlight driver (single LED on a LEDC PWM channel).
//!
//! OFF is duty 0.  ON restores the staged duty, which defaults to full
//! brightness and is changed with [`Headlight::set_brightness`].  Changing
//! the brightness while the light is off only stages the value.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::pwm::SetDutyCycle`: an ESP-IDF `LedcDriver`
//! on the device, an in-memory channel on the host.  The last duty written
//! is tracked here so the on/off state can be read back without touching
//! the peripheral.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

/// Lowest and highest user-facing brightness levels.
pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 10;

/// Duty for brightness `level` on a channel whose full scale is `max_duty`:
/// `round(level / 10 * max_duty)`, with `level` clamped to 1–10.
pub fn duty_for_level(level: u8, max_duty: u16) -> u16 {
    let level = level.clamp(MIN_LEVEL, MAX_LEVEL) as u32;
    let max = max_duty as u32;
    ((level * max + MAX_LEVEL as u32 / 2) / MAX_LEVEL as u32) as u16
}

pub struct Headlight<C> {
    channel: C,
    /// Duty restored by `on()`.
    staged_duty: u16,
    /// Duty last written to the channel.
    hw_duty: u16,
}

impl<C: SetDutyCycle> Headlight<C> {
    /// Take the channel, switch it off and stage full brightness.
    pub fn new(channel: C) -> Self {
        let staged_duty = channel.max_duty_cycle();
        let mut light = Self {
            channel,
            staged_duty,
            hw_duty: 0,
        };
        light.write(0);
        light
    }

    pub fn on(&mut self) {
        self.write(self.staged_duty);
    }

    pub fn off(&mut self) {
        self.write(0);
    }

    /// Stage brightness `level`; apply it only if the light is on right now.
    pub fn set_brightness(&mut self, level: u8) {
        self.staged_duty = duty_for_level(level, self.channel.max_duty_cycle());
        if self.is_on() {
            self.write(self.staged_duty);
        }
    }

    pub fn is_on(&self) -> bool {
        self.hw_duty > 0
    }

    pub fn current_duty(&self) -> u16 {
        self.hw_duty
    }

    pub fn staged_duty(&self) -> u16 {
        self.staged_duty
    }

    pub fn max_duty(&self) -> u16 {
        self.channel.max_duty_cycle()
    }

    fn write(&mut self, duty: u16) {
        match self.channel.set_duty_cycle(duty) {
            Ok(()) => self.hw_duty = duty,
            Err(e) => warn!("headlight: PWM write failed: {:?}", e),
        }
    }
}
