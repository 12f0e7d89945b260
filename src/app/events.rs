//! Outbound application events.
//!
//! The router, session manager and supervisor emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them — the stock build prints them on the serial
//! console.

use core::net::Ipv4Addr;

use crate::config::Capability;

use super::commands::Command;
use super::session::SessionState;
use super::supervisor::Phase;

/// Why a session returned control to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// A cancellation signal was observed.
    Cancelled,
    /// An unexpected error was caught at the session boundary.
    Faulted,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Firmware booted; actuators parked.
    Booted { capability: Capability },

    /// Supervisor moved between phases.
    PhaseChanged { from: Phase, to: Phase },

    /// A countdown is about to run.
    CountdownStarted { ticks: u8 },
    /// One countdown tick; `remaining` counts down to 1.
    CountdownTick { remaining: u8 },
    /// The countdown was interrupted by a single signal.
    CountdownCancelled,

    /// Session lifecycle moved between states.
    SessionStateChanged { from: SessionState, to: SessionState },
    /// AP up and listener bound; the joypad is reachable.
    Serving {
        ssid: heapless::String<32>,
        address: Ipv4Addr,
        port: u16,
    },
    /// One request was parsed and dispatched.
    CommandHandled(Command),
    /// The session released its resources.
    SessionEnded { reason: SessionEnd, requests: u32 },

    /// Post-cancel window in which a second signal exits.
    GraceWindowOpened { window_ms: u32 },
    /// Fault pause before the automatic restart.
    RestartScheduled { delay_ms: u32 },

    /// A second signal arrived inside a grace window.
    Escalated,
    /// Global cleanup finished; the firmware is about to exit.
    Terminated,
}
