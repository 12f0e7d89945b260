//! RC car firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod interrupt;
pub mod pins;
pub mod web;

// The adapters and drivers compile on every target; the hardware-specific
// parts are cfg-gated inside.
pub mod adapters;
pub mod drivers;
