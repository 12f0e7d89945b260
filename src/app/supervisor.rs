//! Outer resilience loop.
//!
//! Wraps the [`SessionManager`] in an explicit restart / exit state machine
//! driven by a cancellable countdown and the two-level interrupt latch.
//!
//! ```text
//!            ┌───────────── elapsed ─────────────┐
//!            ▼                                   │
//!  ┌──▶ Countdown ── signal ──▶ CancelPause ─────┘
//!  │        │                        │
//!  │     elapsed                  signal ──▶ Exit
//!  │        ▼                                 ▲
//!  │     Serving ── cancelled ──▶ Grace ─ signal
//!  │        │                       │
//!  │     faulted                 elapsed ──┐
//!  │        ▼                              │
//!  │    FaultPause ─────── elapsed ────────┤
//!  └───────────────────────────────────────┘
//! ```
//!
//! | Phase        | Waits for            | Signal       | Timeout / result |
//! |--------------|----------------------|--------------|------------------|
//! | `Countdown`  | N ticks              | `CancelPause`| `Serving`        |
//! | `CancelPause`| cancel pause         | `Exit`       | `Countdown`      |
//! | `Serving`    | session to finish    | (session)    | `Grace` / `FaultPause` |
//! | `Grace`      | grace window         | `Exit`       | `Countdown`      |
//! | `FaultPause` | fault pause          | not polled   | `Countdown`      |
//!
//! Every wait is cut into poll slices and the watchdog is fed after each
//! one.  `Exit` runs global cleanup once and ends [`Supervisor::run`].

use log::{error, info};

use crate::config::CarConfig;
use crate::interrupt::{InterruptLatch, WaitOutcome, wait_interruptible_with};

use super::events::AppEvent;
use super::ports::{
    AccessPointPort, ActuatorPort, Clock, EventSink, NetworkPort, Ports, WatchdogPort,
};
use super::router::CommandRouter;
use super::session::{SessionManager, SessionOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Countdown,
    CancelPause,
    Serving,
    Grace,
    FaultPause,
    Exit,
}

/// Where the escalating second signal arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// During the pause after a cancelled countdown.
    DuringCountdown,
    /// During the grace window after a cancelled session.
    AfterSession,
}

pub struct Supervisor<'l, V, A, N, C, S, W> {
    config: CarConfig,
    latch: &'l InterruptLatch,
    router: CommandRouter,
    ports: Ports<V, A, N, C, S, W>,
    phase: Phase,
    exit: Option<ExitReason>,
    sessions: u32,
    last_outcome: Option<SessionOutcome>,
}

impl<'l, V, A, N, C, S, W> Supervisor<'l, V, A, N, C, S, W>
where
    V: ActuatorPort,
    A: AccessPointPort,
    N: NetworkPort,
    C: Clock,
    S: EventSink,
    W: WatchdogPort,
{
    pub fn new(config: CarConfig, latch: &'l InterruptLatch, ports: Ports<V, A, N, C, S, W>) -> Self {
        let router = CommandRouter::new(config.capability);
        Self {
            config,
            latch,
            router,
            ports,
            phase: Phase::Countdown,
            exit: None,
            sessions: 0,
            last_outcome: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Park the actuators and stage the configured brightness.
    pub fn boot(&mut self) {
        self.ports.vehicle.all_off();
        self.ports.vehicle.set_brightness(self.config.headlight_level);
        self.ports.sink.emit(&AppEvent::Booted {
            capability: self.config.capability,
        });
        info!("supervisor: booted ({:?})", self.config.capability);
    }

    /// Boot, then step until a second signal escalates to exit.
    pub fn run(&mut self) -> ExitReason {
        self.boot();
        loop {
            if let Some(reason) = self.step() {
                return reason;
            }
        }
    }

    /// Execute the current phase once and move to the next.  Returns the
    /// exit reason once global cleanup has run.
    pub fn step(&mut self) -> Option<ExitReason> {
        let next = match self.phase {
            Phase::Countdown => self.countdown(),
            Phase::CancelPause => self.cancel_pause(),
            Phase::Serving => self.serve(),
            Phase::Grace => self.grace(),
            Phase::FaultPause => self.fault_pause(),
            Phase::Exit => return self.exit,
        };
        self.enter(next);

        if next == Phase::Exit {
            self.shutdown();
            return self.exit;
        }
        None
    }

    // ── Phases ────────────────────────────────────────────────

    fn countdown(&mut self) -> Phase {
        let ticks = self.config.countdown_ticks;
        self.ports.sink.emit(&AppEvent::CountdownStarted { ticks });

        for remaining in (1..=ticks).rev() {
            self.ports.sink.emit(&AppEvent::CountdownTick { remaining });
            self.ports.watchdog.feed();
            if self.wait(self.config.countdown_tick()) == WaitOutcome::Interrupted {
                self.ports.sink.emit(&AppEvent::CountdownCancelled);
                return Phase::CancelPause;
            }
        }
        Phase::Serving
    }

    fn cancel_pause(&mut self) -> Phase {
        match self.wait(self.config.cancel_pause()) {
            WaitOutcome::Interrupted => self.escalate(ExitReason::DuringCountdown),
            WaitOutcome::Elapsed => Phase::Countdown,
        }
    }

    fn serve(&mut self) -> Phase {
        self.sessions = self.sessions.wrapping_add(1);
        let outcome = SessionManager::new(&self.config, &self.router, self.latch)
            .run(&mut self.ports);
        self.last_outcome = Some(outcome);

        match outcome {
            SessionOutcome::Cancelled => Phase::Grace,
            SessionOutcome::Faulted(e) => {
                error!("supervisor: session {} faulted: {}", self.sessions, e);
                Phase::FaultPause
            }
        }
    }

    fn grace(&mut self) -> Phase {
        self.ports.sink.emit(&AppEvent::GraceWindowOpened {
            window_ms: self.config.grace_window_ms,
        });
        match self.wait(self.config.grace_window()) {
            WaitOutcome::Interrupted => self.escalate(ExitReason::AfterSession),
            WaitOutcome::Elapsed => Phase::Countdown,
        }
    }

    /// Not interruptible: signals arriving here stay latched for the next
    /// countdown.
    fn fault_pause(&mut self) -> Phase {
        self.ports.sink.emit(&AppEvent::RestartScheduled {
            delay_ms: self.config.fault_pause_ms,
        });
        let pause = self.config.fault_pause();
        let slice = self.config.poll_slice();
        let start = self.ports.clock.now();
        loop {
            let elapsed = self.ports.clock.now().saturating_sub(start);
            if elapsed >= pause {
                break;
            }
            self.ports.clock.sleep(slice.min(pause - elapsed));
            self.ports.watchdog.feed();
        }
        Phase::Countdown
    }

    fn escalate(&mut self, reason: ExitReason) -> Phase {
        info!("supervisor: second signal, exiting ({:?})", reason);
        self.ports.sink.emit(&AppEvent::Escalated);
        self.exit = Some(reason);
        Phase::Exit
    }

    // ── Helpers ───────────────────────────────────────────────

    fn wait(&mut self, duration: core::time::Duration) -> WaitOutcome {
        let slice = self.config.poll_slice();
        let watchdog = &mut self.ports.watchdog;
        wait_interruptible_with(&mut self.ports.clock, self.latch, duration, slice, || {
            watchdog.feed();
        })
    }

    fn enter(&mut self, next: Phase) {
        if next != self.phase {
            self.ports.sink.emit(&AppEvent::PhaseChanged {
                from: self.phase,
                to: next,
            });
            self.phase = next;
        }
    }

    /// Global cleanup: stop the vehicle and take the AP down if anything
    /// left it up.  Every step is best-effort.
    fn shutdown(&mut self) {
        self.ports.vehicle.all_off();
        if self.ports.access_point.is_active() {
            if let Err(e) = self.ports.access_point.deactivate() {
                error!("supervisor: AP deactivate failed during cleanup: {}", e);
            }
        }
        self.ports.sink.emit(&AppEvent::Terminated);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &CarConfig {
        &self.config
    }

    /// Sessions started so far.
    pub fn sessions(&self) -> u32 {
        self.sessions
    }

    pub fn last_outcome(&self) -> Option<SessionOutcome> {
        self.last_outcome
    }

    pub fn ports(&self) -> &Ports<V, A, N, C, S, W> {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut Ports<V, A, N, C, S, W> {
        &mut self.ports
    }

    /// Give the adapters back (e.g. after [`run`](Self::run) returned).
    pub fn into_ports(self) -> Ports<V, A, N, C, S, W> {
        self.ports
    }
}
