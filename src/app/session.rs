//! Session lifecycle manager.
//!
//! One session = one access-point activation plus one listening socket,
//! served until a cancellation or a fault ends it.
//!
//! ```text
//!  Starting ──▶ Listening ──▶ ShuttingDown ──▶ Stopped
//!      │                          ▲
//!      └──── start failure ───────┘
//! ```
//!
//! - **Starting** activates the AP and binds the listener.
//! - **Listening** accepts one client at a time.  An accept timeout is the
//!   normal idle case and returns control so the latch can be polled.
//! - **ShuttingDown** stops the vehicle and tears the network down.  Each
//!   step is guarded on its own and failures are logged, never raised.
//! - **Stopped** reports a [`SessionOutcome`] to the supervisor.
//!
//! No error crosses this boundary: every `Err` becomes
//! [`SessionOutcome::Faulted`].

use core::net::Ipv4Addr;

use log::{error, info, warn};

use crate::config::CarConfig;
use crate::error::{Error, NetError, Result};
use crate::interrupt::InterruptLatch;

use super::events::{AppEvent, SessionEnd};
use super::ports::{
    AccessPointPort, ActuatorPort, ApSettings, Clock, ConnectionPort, EventSink, ListenerPort,
    NetworkPort, Ports, WatchdogPort,
};
use super::router::CommandRouter;

// ───────────────────────────────────────────────────────────────
// State and outcome
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Listening,
    ShuttingDown,
    Stopped,
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A cancellation signal was observed at a suspension point.
    Cancelled,
    /// An unexpected error ended the session.
    Faulted(Error),
}

impl SessionOutcome {
    pub fn end(&self) -> SessionEnd {
        match self {
            Self::Cancelled => SessionEnd::Cancelled,
            Self::Faulted(_) => SessionEnd::Faulted,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkSession
// ───────────────────────────────────────────────────────────────

/// Live network resources of one session, released by
/// [`teardown`](Self::teardown) on every exit path of
/// [`SessionManager::run`].
pub struct NetworkSession<L> {
    ap_active: bool,
    listener: Option<L>,
    address: Ipv4Addr,
}

impl<L: ListenerPort> NetworkSession<L> {
    pub fn new() -> Self {
        Self {
            ap_active: false,
            listener: None,
            address: Ipv4Addr::UNSPECIFIED,
        }
    }

    pub fn ap_active(&self) -> bool {
        self.ap_active
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Release everything this session holds.  Idempotent: a second call
    /// finds nothing to release.  Failures are logged and suppressed, and a
    /// failure on one resource does not skip the other.
    pub fn teardown(&mut self, ap: &mut impl AccessPointPort) {
        if self.ap_active {
            if let Err(e) = ap.deactivate() {
                warn!("session: AP deactivate failed (suppressed): {}", e);
            }
            self.ap_active = false;
        }
        if let Some(mut listener) = self.listener.take() {
            if let Err(e) = listener.close() {
                warn!("session: listener close failed (suppressed): {}", e);
            }
        }
    }
}

impl<L: ListenerPort> Default for NetworkSession<L> {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// SessionManager
// ───────────────────────────────────────────────────────────────

/// Runs one session to completion.  Constructed fresh for every session.
pub struct SessionManager<'a> {
    config: &'a CarConfig,
    router: &'a CommandRouter,
    latch: &'a InterruptLatch,
    state: SessionState,
    requests: u32,
    buf: Vec<u8>,
}

impl<'a> SessionManager<'a> {
    pub fn new(config: &'a CarConfig, router: &'a CommandRouter, latch: &'a InterruptLatch) -> Self {
        Self {
            config,
            router,
            latch,
            state: SessionState::Stopped,
            requests: 0,
            buf: vec![0; config.recv_buffer_bytes],
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Requests answered so far.
    pub fn requests(&self) -> u32 {
        self.requests
    }

    /// Start, serve, and tear down.  Nothing the session acquired is still
    /// held when this returns.
    pub fn run<V, A, N, C, S, W>(&mut self, ports: &mut Ports<V, A, N, C, S, W>) -> SessionOutcome
    where
        V: ActuatorPort,
        A: AccessPointPort,
        N: NetworkPort,
        C: Clock,
        S: EventSink,
        W: WatchdogPort,
    {
        self.transition(SessionState::Starting, &mut ports.sink);
        let mut session: NetworkSession<N::Listener> = NetworkSession::new();

        let outcome = match self.start(ports, &mut session) {
            Ok(()) => {
                self.transition(SessionState::Listening, &mut ports.sink);
                self.listen(ports, &mut session)
            }
            Err(e) => SessionOutcome::Faulted(e),
        };

        if let SessionOutcome::Faulted(e) = &outcome {
            error!("session: fault in {:?}: {}", self.state, e);
        }

        self.transition(SessionState::ShuttingDown, &mut ports.sink);
        ports.vehicle.all_off();
        session.teardown(&mut ports.access_point);
        self.transition(SessionState::Stopped, &mut ports.sink);

        ports.sink.emit(&AppEvent::SessionEnded {
            reason: outcome.end(),
            requests: self.requests,
        });
        outcome
    }

    // ── Starting ──────────────────────────────────────────────

    fn start<V, A, N, C, S, W>(
        &mut self,
        ports: &mut Ports<V, A, N, C, S, W>,
        session: &mut NetworkSession<N::Listener>,
    ) -> Result<()>
    where
        A: AccessPointPort,
        N: NetworkPort,
        S: EventSink,
    {
        let settings = ApSettings {
            ssid: self.config.ap_ssid.clone(),
            password: self.config.ap_password.clone(),
            channel: self.config.ap_channel,
            max_clients: self.config.ap_max_clients,
        };
        let address = ports.access_point.activate(&settings)?;
        session.ap_active = true;
        session.address = address;

        let listener = ports
            .network
            .bind(self.config.http_port, self.config.accept_timeout())?;
        session.listener = Some(listener);

        info!(
            "session: AP '{}' up at {}, listening on port {}",
            self.config.ap_ssid, address, self.config.http_port
        );
        ports.sink.emit(&AppEvent::Serving {
            ssid: self.config.ap_ssid.clone(),
            address,
            port: self.config.http_port,
        });
        Ok(())
    }

    // ── Listening ─────────────────────────────────────────────

    fn listen<V, A, N, C, S, W>(
        &mut self,
        ports: &mut Ports<V, A, N, C, S, W>,
        session: &mut NetworkSession<N::Listener>,
    ) -> SessionOutcome
    where
        V: ActuatorPort,
        N: NetworkPort,
        S: EventSink,
        W: WatchdogPort,
    {
        loop {
            ports.watchdog.feed();
            if self.latch.take() {
                info!("session: cancellation observed");
                return SessionOutcome::Cancelled;
            }

            let Some(listener) = session.listener.as_mut() else {
                return SessionOutcome::Faulted(NetError::Closed.into());
            };
            let conn = match listener.accept() {
                Ok(Some(conn)) => conn,
                Ok(None) => continue,
                Err(e) => return SessionOutcome::Faulted(e.into()),
            };

            if let Err(e) = self.serve(conn, ports) {
                return SessionOutcome::Faulted(e);
            }
        }
    }

    /// Read once, dispatch, reply, close.
    fn serve<V, A, N, C, S, W>(
        &mut self,
        mut conn: impl ConnectionPort,
        ports: &mut Ports<V, A, N, C, S, W>,
    ) -> Result<()>
    where
        V: ActuatorPort,
        S: EventSink,
    {
        let n = conn.recv(&mut self.buf)?;
        let n = n.min(self.buf.len());
        let request = String::from_utf8_lossy(&self.buf[..n]);
        let (command, reply) = self.router.handle(&request, &mut ports.vehicle);

        let header = reply.header()?;
        conn.send_all(header.as_bytes())?;
        conn.send_all(reply.body().as_bytes())?;
        conn.close()?;

        self.requests = self.requests.wrapping_add(1);
        ports.sink.emit(&AppEvent::CommandHandled(command));
        Ok(())
    }

    fn transition(&mut self, to: SessionState, sink: &mut impl EventSink) {
        let from = self.state;
        self.state = to;
        sink.emit(&AppEvent::SessionStateChanged { from, to });
    }
}
