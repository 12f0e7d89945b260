//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Router / SessionManager / Supervisor (domain)
//! ```
//!
//! Driven adapters (vehicle, soft AP, TCP listener, clock, event sink,
//! watchdog) implement these traits.  The domain consumes them via
//! generics, so the core never touches ESP-IDF directly.
//!
//! Individual control lines and the headlight PWM channel are not ports of
//! their own: the drivers are generic over `embedded_hal`'s `OutputPin` and
//! `SetDutyCycle`, which already are the hardware boundary.

use core::fmt;
use core::net::Ipv4Addr;
use core::time::Duration;

use super::commands::Motion;
use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the router and lifecycle code command the vehicle
/// through this trait.  Every call is infallible from the caller's view.
pub trait ActuatorPort {
    /// Drive all four H-bridge lines to the pattern of `motion`.
    fn drive(&mut self, motion: Motion);

    /// The motion whose pattern is currently asserted.
    fn motion(&self) -> Motion;

    /// Whether a headlight is fitted.
    fn has_light(&self) -> bool;

    /// Restore the staged brightness.  No-op without a headlight.
    fn light_on(&mut self);

    /// Drive the headlight duty to zero.  No-op without a headlight.
    fn light_off(&mut self);

    /// Stage brightness `level` (clamped to 1–10); applied immediately only
    /// while the light is on.
    fn set_brightness(&mut self, level: u8);

    /// Stop both motors and switch the headlight off — safe shutdown.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Access point port
// ───────────────────────────────────────────────────────────────

/// Settings handed to [`AccessPointPort::activate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApSettings {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
    pub channel: u8,
    pub max_clients: u16,
}

/// The self-hosted Wi-Fi access point.
pub trait AccessPointPort {
    /// Bring the AP up and return its gateway address.
    fn activate(&mut self, settings: &ApSettings) -> Result<Ipv4Addr, NetError>;

    /// Take the AP down.  Must succeed (and do nothing) when already inactive.
    fn deactivate(&mut self) -> Result<(), NetError>;

    fn is_active(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Socket ports
// ───────────────────────────────────────────────────────────────

/// Factory for listening sockets.
pub trait NetworkPort {
    type Listener: ListenerPort;

    /// Bind and listen on all interfaces at `port`.  Every subsequent
    /// [`ListenerPort::accept`] waits at most `accept_timeout`.
    fn bind(&mut self, port: u16, accept_timeout: Duration) -> Result<Self::Listener, NetError>;
}

/// A bound, listening socket.
pub trait ListenerPort {
    type Connection: ConnectionPort;

    /// Wait for one client.  `Ok(None)` means the accept timeout elapsed
    /// with no pending connection — expected, not an error.
    fn accept(&mut self) -> Result<Option<Self::Connection>, NetError>;

    /// Release the socket.  Idempotent.
    fn close(&mut self) -> Result<(), NetError>;
}

/// One accepted client connection.
pub trait ConnectionPort {
    /// Single bounded receive.  Returns the number of bytes read.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, NetError>;

    /// Write all of `data`.
    fn send_all(&mut self, data: &[u8]) -> Result<(), NetError>;

    /// Close the connection.
    fn close(self) -> Result<(), NetError>;
}

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic time source and the only way the domain blocks.
pub trait Clock {
    /// Time since boot.
    fn now(&self) -> Duration;

    /// Block the calling task for `duration`.
    fn sleep(&mut self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Watchdog port
// ───────────────────────────────────────────────────────────────

/// Liveness heartbeat, fed at every suspension point.
pub trait WatchdogPort {
    fn feed(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Port bundle
// ───────────────────────────────────────────────────────────────

/// Every driven adapter the lifecycle code needs, owned in one place.
///
/// The supervisor owns the bundle for its whole lifetime and lends it to
/// each session, so the actuator lines outlive every network session.
pub struct Ports<V, A, N, C, S, W> {
    pub vehicle: V,
    pub access_point: A,
    pub network: N,
    pub clock: C,
    pub sink: S,
    pub watchdog: W,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from the network ports.  The `&'static str` names the failing
/// operation or driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetError {
    /// Access point could not be started.
    ApStart(&'static str),
    /// Access point could not be stopped.
    ApStop(&'static str),
    /// Socket bind / listen failed.
    Bind(&'static str),
    /// Accept failed for a reason other than the timeout.
    Accept(&'static str),
    /// Receive or send failed on an accepted connection.
    Io(&'static str),
    /// Operation on a socket that is already closed.
    Closed,
    /// Activation requested while the access point is already up.
    AlreadyActive,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApStart(why) => write!(f, "access point start failed: {}", why),
            Self::ApStop(why) => write!(f, "access point stop failed: {}", why),
            Self::Bind(why) => write!(f, "bind failed: {}", why),
            Self::Accept(why) => write!(f, "accept failed: {}", why),
            Self::Io(why) => write!(f, "connection I/O failed: {}", why),
            Self::Closed => write!(f, "socket already closed"),
            Self::AlreadyActive => write!(f, "access point already active"),
        }
    }
}

impl std::error::Error for NetError {}

/// Errors from loading or validating [`CarConfig`](crate::config::CarConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Overlay is not valid JSON for the config schema.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
