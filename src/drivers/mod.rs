//! Actuator drivers and peripheral helpers.

pub mod headlight;
pub mod motor;
pub mod watchdog;
