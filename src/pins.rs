//! GPIO / peripheral pin assignments for the RC car boards.
//!
//! Single source of truth — the binary wires peripherals from this module
//! rather than hard-coding pin numbers.  Two board revisions exist: the
//! original motors-only chassis and the headlight chassis, which moved the
//! H-bridge lines to free up a LEDC-capable pin for the lamp.

use crate::config::Capability;

// ---------------------------------------------------------------------------
// H-bridge (L298N-style, four digital control lines)
// ---------------------------------------------------------------------------

/// Control lines of one board revision, in `IN1..IN4` order.
///
/// IN1/IN2 drive motor A, IN3/IN4 drive motor B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorPins {
    pub in1: i32,
    pub in2: i32,
    pub in3: i32,
    pub in4: i32,
}

/// Motors-only chassis.
pub const MOTOR_PINS_BASIC: MotorPins = MotorPins {
    in1: 27, // orange
    in2: 26, // red
    in3: 25, // light brown
    in4: 33, // yellow
};

/// Headlight chassis.
pub const MOTOR_PINS_LIGHT: MotorPins = MotorPins {
    in1: 16, // orange
    in2: 26, // red
    in3: 27, // light brown
    in4: 13, // yellow
};

// ---------------------------------------------------------------------------
// Headlight (LEDC PWM)
// ---------------------------------------------------------------------------

/// LEDC-driven headlight LED (headlight chassis only).
pub const HEADLIGHT_GPIO: i32 = 21;
/// LEDC base frequency for the headlight (1 kHz — flicker-free).
pub const HEADLIGHT_PWM_FREQ_HZ: u32 = 1_000;
/// LEDC timer resolution (bits).  10-bit gives 0 – 1023 duty levels.
pub const HEADLIGHT_PWM_RESOLUTION_BITS: u32 = 10;

// ---------------------------------------------------------------------------
// User input
// ---------------------------------------------------------------------------

/// BOOT strapping button (active-low, internal pull-up); doubles as the
/// cancel button once the firmware is running.
pub const BOOT_BUTTON_GPIO: i32 = 0;

/// Pin profile for the selected capability.
pub const fn motor_pins(capability: Capability) -> MotorPins {
    match capability {
        Capability::MotorsOnly => MOTOR_PINS_BASIC,
        Capability::MotorsAndLight => MOTOR_PINS_LIGHT,
    }
}
