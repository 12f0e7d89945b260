//! Integration tests: Supervisor restart / exit protocol.
//!
//! Timings are the stock ones (5 × 1 s countdown, 2 s cancel pause, 3 s
//! grace window, 2 s fault pause) on a virtual clock, so a session started
//! by an uninterrupted countdown begins at t = 5 s.

use rccar::adapters::gpio::levels;
use rccar::app::events::AppEvent;
use rccar::app::ports::{ActuatorPort, Clock};
use rccar::app::session::SessionOutcome;
use rccar::app::supervisor::{ExitReason, Phase, Supervisor};
use rccar::config::Capability;
use rccar::drivers::headlight::duty_for_level;

use super::mock_net::{Rig, Step, TestPorts, TestSupervisor, rig};

fn supervisor(r: Rig) -> TestSupervisor {
    Supervisor::new(r.config, r.latch, r.ports)
}

fn events(ports: &TestPorts) -> &[AppEvent] {
    &ports.sink.events
}

fn count(ports: &TestPorts, event: &AppEvent) -> usize {
    ports.sink.count(|e| e == event)
}

#[test]
fn double_signal_in_grace_window_exits_after_first_session() {
    let mut r = rig(Capability::MotorsAndLight, vec![Step::Timeout, Step::Interrupt]);
    r.ports.clock.signal_at(6_000);
    let mut sup = supervisor(r);

    assert_eq!(sup.run(), ExitReason::AfterSession);
    assert_eq!(sup.sessions(), 1);
    assert_eq!(sup.phase(), Phase::Exit);

    let p = sup.ports();
    assert_eq!(count(p, &AppEvent::Escalated), 1);
    assert_eq!(events(p).last(), Some(&AppEvent::Terminated));
    assert!(!p.access_point.active);
}

#[test]
fn single_signal_then_grace_expiry_starts_a_fresh_session() {
    // Session 1 and 2 are cancelled once each; session 3 runs the script
    // dry, which signals twice and ends the run.
    let r = rig(Capability::MotorsAndLight, vec![Step::Interrupt, Step::Timeout, Step::Interrupt]);
    let mut sup = supervisor(r);

    assert_eq!(sup.run(), ExitReason::AfterSession);
    assert_eq!(sup.sessions(), 3);

    let p = sup.ports();
    assert_eq!(p.access_point.activations, 3);
    assert_eq!(p.access_point.deactivations, 3);
    assert_eq!(p.network.state().listener_closes, 3);
    assert_eq!(count(p, &AppEvent::GraceWindowOpened { window_ms: 3_000 }), 3);
    assert_eq!(count(p, &AppEvent::CountdownStarted { ticks: 5 }), 3);
}

#[test]
fn double_signal_during_countdown_exits_without_serving() {
    let mut r = rig(Capability::MotorsAndLight, vec![]);
    r.ports.clock.signal_at(1_500);
    r.ports.clock.signal_at(2_500);
    let mut sup = supervisor(r);

    assert_eq!(sup.run(), ExitReason::DuringCountdown);
    assert_eq!(sup.sessions(), 0);

    let p = sup.ports();
    assert_eq!(p.access_point.activations, 0);
    assert_eq!(p.network.state().binds, 0);
    assert_eq!(count(p, &AppEvent::CountdownCancelled), 1);
    assert_eq!(count(p, &AppEvent::Terminated), 1);
}

#[test]
fn cancelled_countdown_restarts_from_the_top() {
    let mut r = rig(Capability::MotorsAndLight, vec![]);
    r.ports.clock.signal_at(1_500);
    let mut sup = supervisor(r);

    assert_eq!(sup.run(), ExitReason::AfterSession);
    assert_eq!(sup.sessions(), 1);

    let p = sup.ports();
    assert_eq!(count(p, &AppEvent::CountdownCancelled), 1);
    assert_eq!(count(p, &AppEvent::CountdownStarted { ticks: 5 }), 2);
    // Second countdown started after the 2 s pause and ran its full 5 ticks.
    assert_eq!(count(p, &AppEvent::CountdownTick { remaining: 1 }), 1);
}

#[test]
fn faulted_session_skips_grace_and_restarts() {
    let r = rig(Capability::MotorsAndLight, vec![Step::Fail]);
    let mut sup = supervisor(r);

    assert_eq!(sup.run(), ExitReason::AfterSession);
    assert_eq!(sup.sessions(), 2);
    assert_eq!(sup.last_outcome(), Some(SessionOutcome::Cancelled));

    let p = sup.ports();
    assert_eq!(count(p, &AppEvent::RestartScheduled { delay_ms: 2_000 }), 1);
    assert_eq!(count(p, &AppEvent::GraceWindowOpened { window_ms: 3_000 }), 1);
    let restart = p.sink.position(|e| matches!(e, AppEvent::RestartScheduled { .. }));
    let grace = p.sink.position(|e| matches!(e, AppEvent::GraceWindowOpened { .. }));
    assert!(restart < grace, "grace window only after the second, cancelled session");
}

#[test]
fn signal_during_fault_pause_cancels_the_next_countdown() {
    // Session 1 faults at t = 5 s; the fault pause runs 5 s → 7 s.
    let mut r = rig(Capability::MotorsAndLight, vec![Step::Fail]);
    r.ports.clock.signal_at(6_000);
    let mut sup = supervisor(r);

    assert_eq!(sup.run(), ExitReason::AfterSession);
    assert_eq!(sup.sessions(), 2);

    let p = sup.ports();
    let restart = p.sink.position(|e| matches!(e, AppEvent::RestartScheduled { .. }));
    let cancelled = p.sink.position(|e| *e == AppEvent::CountdownCancelled);
    assert!(restart.is_some() && cancelled.is_some());
    assert!(restart < cancelled);
    assert_eq!(count(p, &AppEvent::CountdownStarted { ticks: 5 }), 3);
}

#[test]
fn phases_follow_the_documented_transitions() {
    let r = rig(Capability::MotorsAndLight, vec![Step::Interrupt]);
    let mut sup = supervisor(r);
    sup.boot();

    assert_eq!(sup.phase(), Phase::Countdown);
    assert_eq!(sup.step(), None);
    assert_eq!(sup.phase(), Phase::Serving);
    assert_eq!(sup.step(), None);
    assert_eq!(sup.phase(), Phase::Grace);
    assert!(!sup.ports().access_point.active);
    assert_eq!(sup.step(), None);
    assert_eq!(sup.phase(), Phase::Countdown);
}

#[test]
fn exit_leaves_vehicle_parked() {
    let r = rig(Capability::MotorsAndLight, vec![Step::Request(b"GET /F HTTP/1.1\r\n\r\n")]);
    let lines = r.lines.clone();
    let pwm = r.pwm.clone();
    let mut sup = supervisor(r);

    sup.run();
    assert_eq!(levels(&lines), [false; 4]);
    assert_eq!(pwm.duty(), 0);
}

#[test]
fn boot_parks_actuators_and_stages_brightness() {
    let mut r = rig(Capability::MotorsAndLight, vec![]);
    r.config.headlight_level = 5;
    let lines = r.lines.clone();
    let pwm = r.pwm.clone();
    let mut sup = supervisor(r);

    sup.boot();
    assert_eq!(levels(&lines), [false; 4]);
    assert_eq!(pwm.duty(), 0, "brightness is staged, not applied");

    sup.ports_mut().vehicle.light_on();
    assert_eq!(pwm.duty(), duty_for_level(5, 1023));
}

#[test]
fn watchdog_is_fed_while_waiting() {
    let r = rig(Capability::MotorsAndLight, vec![Step::Timeout, Step::Timeout]);
    let mut sup = supervisor(r);
    sup.run();
    // Five countdown ticks, the accept loop and the grace window all feed.
    assert!(sup.ports().watchdog.feeds() >= 8);
}

#[test]
fn watchdog_is_fed_every_slice_of_the_grace_window() {
    let r = rig(Capability::MotorsAndLight, vec![Step::Interrupt]);
    let mut sup = supervisor(r);
    sup.boot();
    sup.step();
    sup.step();
    assert_eq!(sup.phase(), Phase::Grace);

    let before = sup.ports().watchdog.feeds();
    assert_eq!(sup.step(), None);
    let slices = u64::from(sup.config().grace_window_ms / sup.config().poll_slice_ms);
    assert!(sup.ports().watchdog.feeds() - before >= slices);
}

#[test]
fn watchdog_is_fed_every_slice_of_the_fault_pause() {
    let r = rig(Capability::MotorsAndLight, vec![Step::Fail]);
    let mut sup = supervisor(r);
    sup.boot();
    sup.step();
    sup.step();
    assert_eq!(sup.phase(), Phase::FaultPause);

    let before = sup.ports().watchdog.feeds();
    let start = sup.ports().clock.now();
    assert_eq!(sup.step(), None);
    assert_eq!(sup.phase(), Phase::Countdown);
    assert_eq!(sup.ports().clock.now() - start, sup.config().fault_pause());
    let slices = u64::from(sup.config().fault_pause_ms / sup.config().poll_slice_ms);
    assert!(sup.ports().watchdog.feeds() - before >= slices);
}
