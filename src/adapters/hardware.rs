//! Hardware adapter — bridges the actuator drivers to [`ActuatorPort`].
//!
//! Owns the [`MotorDriver`] and, on the headlight chassis, the
//! [`Headlight`].  One type covers both capabilities: without a headlight
//! every light operation is a no-op.  On non-espidf targets the drivers run
//! over [`SimLine`] / [`SimPwm`].

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::info;

use crate::app::commands::Motion;
use crate::app::ports::ActuatorPort;
use crate::drivers::headlight::Headlight;
use crate::drivers::motor::MotorDriver;

#[cfg(not(target_os = "espidf"))]
use super::gpio::{SimLine, SimPwm};

/// Concrete vehicle: motors plus optional headlight.
pub struct Vehicle<P, C> {
    motors: MotorDriver<P>,
    headlight: Option<Headlight<C>>,
}

/// Vehicle wired to real ESP32 peripherals.
#[cfg(target_os = "espidf")]
pub type EspVehicle = Vehicle<super::gpio::MotorLine, esp_idf_hal::ledc::LedcDriver<'static>>;

/// Vehicle wired to in-memory lines.
#[cfg(not(target_os = "espidf"))]
pub type SimVehicle = Vehicle<SimLine, SimPwm>;

impl<P: OutputPin, C: SetDutyCycle> Vehicle<P, C> {
    pub fn new(motors: MotorDriver<P>, headlight: Option<Headlight<C>>) -> Self {
        info!(
            "hardware: vehicle ready ({})",
            if headlight.is_some() { "motors + headlight" } else { "motors only" }
        );
        Self { motors, headlight }
    }

    pub fn motors(&self) -> &MotorDriver<P> {
        &self.motors
    }

    pub fn headlight(&self) -> Option<&Headlight<C>> {
        self.headlight.as_ref()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P: OutputPin, C: SetDutyCycle> ActuatorPort for Vehicle<P, C> {
    fn drive(&mut self, motion: Motion) {
        self.motors.apply(motion);
    }

    fn motion(&self) -> Motion {
        self.motors.motion()
    }

    fn has_light(&self) -> bool {
        self.headlight.is_some()
    }

    fn light_on(&mut self) {
        if let Some(light) = self.headlight.as_mut() {
            light.on();
        }
    }

    fn light_off(&mut self) {
        if let Some(light) = self.headlight.as_mut() {
            light.off();
        }
    }

    fn set_brightness(&mut self, level: u8) {
        if let Some(light) = self.headlight.as_mut() {
            light.set_brightness(level);
        }
    }

    fn all_off(&mut self) {
        self.motors.stop();
        self.light_off();
    }
}
