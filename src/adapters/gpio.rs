//! GPIO and PWM bring-up for the actuator drivers.
//!
//! - **`target_os = "espidf"`**: four `PinDriver` outputs for the H-bridge
//!   and one LEDC channel for the headlight.
//! - **all targets**: [`SimLine`] / [`SimPwm`], in-memory stand-ins whose
//!   clones share state, so a test can keep a probe while the driver owns
//!   the line.

use core::cell::Cell;
use core::convert::Infallible;
use std::rc::Rc;

#[cfg(target_os = "espidf")]
use esp_idf_hal::{
    gpio::{AnyOutputPin, Output, PinDriver},
    ledc::{self, LedcDriver, LedcTimerDriver, Resolution, config::TimerConfig},
    units::Hertz,
};
#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins::{self, MotorPins};

// ───────────────────────────────────────────────────────────────
// ESP-IDF wiring
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub type MotorLine = PinDriver<'static, AnyOutputPin, Output>;

/// Claim `[IN1, IN2, IN3, IN4]` as push-pull outputs.
#[cfg(target_os = "espidf")]
pub fn motor_lines(p: MotorPins) -> anyhow::Result<[MotorLine; 4]> {
    // SAFETY: each GPIO number is claimed exactly once, here, at boot; the
    // pin profiles never overlap the headlight or BOOT button pins.
    let out = |gpio: i32| PinDriver::output(unsafe { AnyOutputPin::new(gpio) });
    let lines = [out(p.in1)?, out(p.in2)?, out(p.in3)?, out(p.in4)?];
    info!(
        "gpio: motor lines IN1={} IN2={} IN3={} IN4={}",
        p.in1, p.in2, p.in3, p.in4
    );
    Ok(lines)
}

/// LEDC timer 0 / channel 0 driving the headlight pin.
#[cfg(target_os = "espidf")]
pub fn headlight_channel() -> anyhow::Result<LedcDriver<'static>> {
    let config = TimerConfig::new()
        .resolution(Resolution::Bits10)
        .frequency(Hertz(pins::HEADLIGHT_PWM_FREQ_HZ));
    // SAFETY: timer 0 and channel 0 are used by nothing else in this firmware.
    let timer = LedcTimerDriver::new(unsafe { ledc::TIMER0::new() }, &config)?;
    let channel = LedcDriver::new(
        unsafe { ledc::CHANNEL0::new() },
        timer,
        unsafe { AnyOutputPin::new(pins::HEADLIGHT_GPIO) },
    )?;
    info!(
        "gpio: headlight on GPIO{} @ {} Hz",
        pins::HEADLIGHT_GPIO,
        pins::HEADLIGHT_PWM_FREQ_HZ
    );
    Ok(channel)
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

/// In-memory output line.  Starts high so that parking it is observable.
#[derive(Clone, Debug)]
pub struct SimLine {
    level: Rc<Cell<bool>>,
    writes: Rc<Cell<u32>>,
}

impl SimLine {
    pub fn new() -> Self {
        Self {
            level: Rc::new(Cell::new(true)),
            writes: Rc::new(Cell::new(0)),
        }
    }

    pub fn is_high(&self) -> bool {
        self.level.get()
    }

    pub fn writes(&self) -> u32 {
        self.writes.get()
    }

    fn set(&self, high: bool) {
        self.level.set(high);
        self.writes.set(self.writes.get() + 1);
    }
}

impl Default for SimLine {
    fn default() -> Self {
        Self::new()
    }
}

impl embedded_hal::digital::ErrorType for SimLine {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

/// In-memory PWM channel with a 10-bit full scale by default.
#[derive(Clone, Debug)]
pub struct SimPwm {
    duty: Rc<Cell<u16>>,
    max: u16,
}

impl SimPwm {
    pub fn new() -> Self {
        Self::with_max(((1u32 << crate::pins::HEADLIGHT_PWM_RESOLUTION_BITS) - 1) as u16)
    }

    pub fn with_max(max: u16) -> Self {
        Self {
            duty: Rc::new(Cell::new(max)),
            max,
        }
    }

    pub fn duty(&self) -> u16 {
        self.duty.get()
    }
}

impl Default for SimPwm {
    fn default() -> Self {
        Self::new()
    }
}

impl embedded_hal::pwm::ErrorType for SimPwm {
    type Error = Infallible;
}

impl embedded_hal::pwm::SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.duty.set(duty.min(self.max));
        Ok(())
    }
}

/// Four fresh lines plus probes sharing their state.
pub fn sim_motor_lines() -> ([SimLine; 4], [SimLine; 4]) {
    let lines: [SimLine; 4] = Default::default();
    let probes = lines.clone();
    (lines, probes)
}

/// Levels of four probes in `[IN1, IN2, IN3, IN4]` order.
pub fn levels(probes: &[SimLine; 4]) -> [bool; 4] {
    probes.each_ref().map(SimLine::is_high)
}
