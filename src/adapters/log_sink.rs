//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART console in production).  Lifecycle events that the driver
//! at the console needs to act on (countdown, "open this URL", how to
//! cancel) are rendered as banners; everything else is one record per
//! event, tagged by subsystem.

use log::{info, warn};

use crate::app::events::{AppEvent, SessionEnd};
use crate::app::ports::EventSink;

const RULE: &str = "==================================================";

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    events: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self { events: 0 }
    }

    /// Events rendered so far.
    pub fn events(&self) -> u64 {
        self.events
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events = self.events.wrapping_add(1);
        match event {
            AppEvent::Booted { capability } => {
                info!("BOOT | capability={:?} | actuators parked", capability);
            }
            AppEvent::PhaseChanged { from, to } => {
                info!("PHASE | {:?} -> {:?}", from, to);
            }
            AppEvent::CountdownStarted { ticks } => {
                info!("{}", RULE);
                info!("ESP32 RC Car");
                info!("{}", RULE);
                info!("Starting in {} seconds...", ticks);
                info!("Press Ctrl+C (or BOOT) to cancel");
                info!("{}", RULE);
            }
            AppEvent::CountdownTick { remaining } => {
                info!("COUNTDOWN | starting in {}...", remaining);
            }
            AppEvent::CountdownCancelled => {
                warn!("COUNTDOWN | cancelled! Press Ctrl+C again to exit completely");
            }
            AppEvent::SessionStateChanged { from, to } => {
                info!("SESSION | {:?} -> {:?}", from, to);
            }
            AppEvent::Serving { ssid, address, port } => {
                info!("SESSION | WiFi: {} | IP: {}", ssid, address);
                info!("{}", RULE);
                if *port == 80 {
                    info!("Open: http://{}", address);
                } else {
                    info!("Open: http://{}:{}", address, port);
                }
                info!("Press Ctrl+C to stop and restart");
                info!("Press Ctrl+C twice to exit completely");
                info!("{}", RULE);
            }
            AppEvent::CommandHandled(cmd) => {
                info!("CMD | {:?}", cmd);
            }
            AppEvent::SessionEnded { reason, requests } => match reason {
                SessionEnd::Cancelled => {
                    info!("SESSION | server stopped after {} requests", requests);
                }
                SessionEnd::Faulted => {
                    warn!("SESSION | ended by fault after {} requests", requests);
                }
            },
            AppEvent::GraceWindowOpened { window_ms } => {
                info!("{}", RULE);
                info!(
                    "Press Ctrl+C again within {} seconds to EXIT",
                    window_ms.div_ceil(1000)
                );
                info!("or wait for the restart...");
                info!("{}", RULE);
            }
            AppEvent::RestartScheduled { delay_ms } => {
                warn!("RESTART | in {} ms", delay_ms);
            }
            AppEvent::Escalated => {
                info!("EXIT | second signal, shutting down...");
            }
            AppEvent::Terminated => {
                info!("EXIT | program terminated");
            }
        }
    }
}
