//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the RC car: command
//! routing, the session lifecycle and the outer restart / exit loop.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod router;
pub mod session;
pub mod supervisor;
