//! RC Car Firmware — Main Entry Point
//!
//! Hexagonal architecture: adapters wire the ESP32 peripherals to the
//! port traits, and the supervisor runs the restart / exit loop on top.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Vehicle          SoftApAdapter     TcpNetwork    SystemClock  │
//! │  (Actuator)       (AccessPoint)     (Network)     (Clock)      │
//! │  LogEventSink     TaskWatchdog      console thread             │
//! │  (EventSink)      (Watchdog)        (InterruptLatch source)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Supervisor ─▶ SessionManager ─▶ CommandRouter         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use log::{info, warn};

use rccar::adapters::{console, gpio};
use rccar::adapters::hardware::Vehicle;
use rccar::adapters::log_sink::LogEventSink;
use rccar::adapters::tcp::TcpNetwork;
use rccar::adapters::time::SystemClock;
use rccar::adapters::wifi::SoftApAdapter;
use rccar::app::ports::Ports;
use rccar::app::supervisor::Supervisor;
use rccar::config::CarConfig;
use rccar::drivers::headlight::Headlight;
use rccar::drivers::motor::MotorDriver;
use rccar::drivers::watchdog::{self, TaskWatchdog};
use rccar::interrupt::INTERRUPTS;
use rccar::pins;

/// Build-time JSON overlay on top of [`CarConfig::default`].
fn load_config() -> CarConfig {
    match option_env!("RCCAR_CONFIG") {
        None => CarConfig::default(),
        Some(json) => match CarConfig::from_json(json) {
            Ok(cfg) => {
                info!("Config overlay applied");
                cfg
            }
            Err(e) => {
                warn!("Config overlay rejected ({}), using defaults", e);
                CarConfig::default()
            }
        },
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  RC Car v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config();
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // ── 2. Actuators (parked low before anything else runs) ───
    let motors = MotorDriver::new(gpio::motor_lines(pins::motor_pins(config.capability))?);
    let headlight = if config.capability.has_light() {
        Some(Headlight::new(gpio::headlight_channel()?))
    } else {
        None
    };
    let vehicle = Vehicle::new(motors, headlight);

    // ── 3. Network + interrupt sources ────────────────────────
    let access_point = SoftApAdapter::new(peripherals.modem, sysloop)?;
    console::spawn(&INTERRUPTS)?;

    // ── 4. Supervisor ─────────────────────────────────────────
    let ports = Ports {
        vehicle,
        access_point,
        network: TcpNetwork::new(),
        clock: SystemClock::new(),
        sink: LogEventSink::new(),
        watchdog: TaskWatchdog::subscribe(watchdog::DEFAULT_TIMEOUT_MS),
    };
    let mut supervisor = Supervisor::new(config, &INTERRUPTS, ports);
    let reason = supervisor.run();

    // Unsubscribe before idling so the parked main task is not reset.
    drop(supervisor);
    info!("Program terminated ({:?})", reason);
    Ok(())
}
