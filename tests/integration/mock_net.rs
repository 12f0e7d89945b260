//! Mock adapters for integration tests.
//!
//! The vehicle is the crate's own simulated hardware (`SimLine` / `SimPwm`);
//! everything on the network side is scripted here, and time is virtual.
//!
//! - [`MockNetwork`] replays a script of accept results.  When the script
//!   runs dry it raises the latch twice, so every supervisor test ends in an
//!   escalated exit instead of spinning forever.
//! - [`VirtualClock`] advances instantly and raises the latch when it
//!   crosses a scheduled instant.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::rc::Rc;
use std::time::Duration;

use rccar::adapters::gpio::{SimLine, SimPwm, levels, sim_motor_lines};
use rccar::adapters::hardware::{SimVehicle, Vehicle};
use rccar::app::events::AppEvent;
use rccar::app::ports::{
    AccessPointPort, ApSettings, Clock, ConnectionPort, EventSink, ListenerPort, NetError,
    NetworkPort, Ports,
};
use rccar::app::supervisor::Supervisor;
use rccar::config::{CarConfig, Capability};
use rccar::drivers::headlight::Headlight;
use rccar::drivers::motor::MotorDriver;
use rccar::drivers::watchdog::{DEFAULT_TIMEOUT_MS, TaskWatchdog};
use rccar::interrupt::InterruptLatch;

// ── Access point ──────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockAccessPoint {
    pub active: bool,
    pub activations: u32,
    pub deactivations: u32,
    pub fail_activate: bool,
    pub fail_deactivate: bool,
    pub last_settings: Option<ApSettings>,
}

impl AccessPointPort for MockAccessPoint {
    fn activate(&mut self, settings: &ApSettings) -> Result<Ipv4Addr, NetError> {
        if self.fail_activate {
            return Err(NetError::ApStart("scripted"));
        }
        if self.active {
            return Err(NetError::AlreadyActive);
        }
        self.active = true;
        self.activations += 1;
        self.last_settings = Some(settings.clone());
        Ok(Ipv4Addr::new(192, 168, 4, 1))
    }

    fn deactivate(&mut self) -> Result<(), NetError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.deactivations += 1;
        if self.fail_deactivate {
            Err(NetError::ApStop("scripted"))
        } else {
            Ok(())
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// ── Network script ────────────────────────────────────────────

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Step {
    /// Accept timeout, nothing pending.
    Timeout,
    /// A client sends these bytes.
    Request(&'static [u8]),
    /// A client connects, then the receive fails.
    RecvFail,
    /// Accept itself fails.
    Fail,
    /// A cancellation arrives while waiting; the accept then times out.
    Interrupt,
}

#[derive(Debug, Default)]
pub struct NetState {
    pub script: VecDeque<Step>,
    pub binds: u32,
    pub bound_port: Option<u16>,
    pub accept_timeout: Option<Duration>,
    pub listener_closes: u32,
    pub fail_bind: bool,
    /// Full response bytes, one entry per closed connection.
    pub replies: Vec<Vec<u8>>,
    /// Motor line levels sampled when each connection closed.
    pub levels_after: Vec<[bool; 4]>,
}

#[allow(dead_code)]
impl NetState {
    pub fn reply_text(&self, idx: usize) -> String {
        String::from_utf8_lossy(&self.replies[idx]).into_owned()
    }
}

pub struct MockNetwork {
    state: Rc<RefCell<NetState>>,
    latch: &'static InterruptLatch,
    watch: Option<[SimLine; 4]>,
}

#[allow(dead_code)]
impl MockNetwork {
    pub fn new(latch: &'static InterruptLatch, script: Vec<Step>) -> Self {
        let state = NetState {
            script: script.into(),
            ..Default::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            latch,
            watch: None,
        }
    }

    /// Sample these lines whenever a connection closes.
    pub fn watch(&mut self, lines: [SimLine; 4]) {
        self.watch = Some(lines);
    }

    pub fn state(&self) -> std::cell::Ref<'_, NetState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> std::cell::RefMut<'_, NetState> {
        self.state.borrow_mut()
    }
}

impl NetworkPort for MockNetwork {
    type Listener = MockListener;

    fn bind(&mut self, port: u16, accept_timeout: Duration) -> Result<MockListener, NetError> {
        let mut s = self.state.borrow_mut();
        if s.fail_bind {
            return Err(NetError::Bind("scripted"));
        }
        s.binds += 1;
        s.bound_port = Some(port);
        s.accept_timeout = Some(accept_timeout);
        Ok(MockListener {
            state: self.state.clone(),
            latch: self.latch,
            watch: self.watch.clone(),
            open: true,
        })
    }
}

pub struct MockListener {
    state: Rc<RefCell<NetState>>,
    latch: &'static InterruptLatch,
    watch: Option<[SimLine; 4]>,
    open: bool,
}

impl ListenerPort for MockListener {
    type Connection = MockConnection;

    fn accept(&mut self) -> Result<Option<MockConnection>, NetError> {
        if !self.open {
            return Err(NetError::Closed);
        }
        let step = self.state.borrow_mut().script.pop_front();
        let conn = |request: &'static [u8], fail_recv| MockConnection {
            request,
            fail_recv,
            sent: Vec::new(),
            state: self.state.clone(),
            watch: self.watch.clone(),
        };
        match step {
            None => {
                self.latch.raise();
                self.latch.raise();
                Ok(None)
            }
            Some(Step::Timeout) => Ok(None),
            Some(Step::Interrupt) => {
                self.latch.raise();
                Ok(None)
            }
            Some(Step::Fail) => Err(NetError::Accept("scripted")),
            Some(Step::Request(bytes)) => Ok(Some(conn(bytes, false))),
            Some(Step::RecvFail) => Ok(Some(conn(b"", true))),
        }
    }

    fn close(&mut self) -> Result<(), NetError> {
        if self.open {
            self.open = false;
            self.state.borrow_mut().listener_closes += 1;
        }
        Ok(())
    }
}

pub struct MockConnection {
    request: &'static [u8],
    fail_recv: bool,
    sent: Vec<u8>,
    state: Rc<RefCell<NetState>>,
    watch: Option<[SimLine; 4]>,
}

impl ConnectionPort for MockConnection {
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        if self.fail_recv {
            return Err(NetError::Io("connection reset"));
        }
        let n = self.request.len().min(buf.len());
        buf[..n].copy_from_slice(&self.request[..n]);
        Ok(n)
    }

    fn send_all(&mut self, data: &[u8]) -> Result<(), NetError> {
        self.sent.extend_from_slice(data);
        Ok(())
    }

    fn close(self) -> Result<(), NetError> {
        let mut s = self.state.borrow_mut();
        if let Some(lines) = &self.watch {
            s.levels_after.push(levels(lines));
        }
        s.replies.push(self.sent);
        Ok(())
    }
}

// ── Virtual clock ─────────────────────────────────────────────

pub struct VirtualClock {
    now: Duration,
    latch: &'static InterruptLatch,
    /// Pending `(instant, fired)` signals.
    signals: Vec<(Duration, bool)>,
}

#[allow(dead_code)]
impl VirtualClock {
    pub fn new(latch: &'static InterruptLatch) -> Self {
        Self {
            now: Duration::ZERO,
            latch,
            signals: Vec::new(),
        }
    }

    /// Raise the latch once when virtual time first reaches `at_ms`.
    pub fn signal_at(&mut self, at_ms: u64) {
        self.signals.push((Duration::from_millis(at_ms), false));
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.now += duration;
        for (at, fired) in self.signals.iter_mut() {
            if !*fired && *at <= self.now {
                *fired = true;
                self.latch.raise();
            }
        }
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn position(&self, pred: impl Fn(&AppEvent) -> bool) -> Option<usize> {
        self.events.iter().position(pred)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type TestPorts =
    Ports<SimVehicle, MockAccessPoint, MockNetwork, VirtualClock, RecordingSink, TaskWatchdog>;

pub type TestSupervisor = Supervisor<
    'static,
    SimVehicle,
    MockAccessPoint,
    MockNetwork,
    VirtualClock,
    RecordingSink,
    TaskWatchdog,
>;

/// Ports plus probes on the simulated actuators.
pub struct Rig {
    pub config: CarConfig,
    pub latch: &'static InterruptLatch,
    pub ports: TestPorts,
    pub lines: [SimLine; 4],
    pub pwm: SimPwm,
}

/// A fresh latch per test; tests run in parallel.
pub fn latch() -> &'static InterruptLatch {
    Box::leak(Box::new(InterruptLatch::new()))
}

pub fn rig(capability: Capability, script: Vec<Step>) -> Rig {
    let latch = latch();
    let config = CarConfig {
        capability,
        ..CarConfig::default()
    };

    let (lines, probes) = sim_motor_lines();
    let pwm = SimPwm::new();
    let headlight = capability.has_light().then(|| Headlight::new(pwm.clone()));
    let vehicle = Vehicle::new(MotorDriver::new(lines), headlight);

    let mut network = MockNetwork::new(latch, script);
    network.watch(probes.clone());

    Rig {
        config,
        latch,
        ports: Ports {
            vehicle,
            access_point: MockAccessPoint::default(),
            network,
            clock: VirtualClock::new(latch),
            sink: RecordingSink::default(),
            watchdog: TaskWatchdog::subscribe(DEFAULT_TIMEOUT_MS),
        },
        lines: probes,
        pwm,
    }
}
