//! Differential drive motor driver (dual H-bridge, four control lines).
//!
//! Binary full-power control only: each line is either asserted or not.
//! There is no speed control.
//!
//! ## Transition ordering
//!
//! Four GPIO writes cannot happen in one instruction, so a transition
//! always releases lines before asserting new ones.  Every intermediate
//! state is therefore a subset of the old pattern or of the new one and
//! never puts both inputs of one bridge high.
//!
//! Such an intermediate state need not be one of the five motion patterns
//! (Backward to Right passes through `[F, F, F, T]`).  A transition is
//! atomic only as seen by callers: `apply` returns with the full new
//! pattern asserted, and nothing reads the lines in between.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::digital::OutputPin`: ESP-IDF `PinDriver`s on
//! the device, in-memory lines on the host.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::commands::Motion;

pub struct MotorDriver<P> {
    lines: [P; 4],
    motion: Motion,
}

impl<P: OutputPin> MotorDriver<P> {
    /// Take ownership of `[IN1, IN2, IN3, IN4]` and park them low.
    pub fn new(lines: [P; 4]) -> Self {
        let mut driver = Self {
            lines,
            motion: Motion::Stopped,
        };
        driver.write_all(Motion::Stopped.pattern());
        driver
    }

    pub fn forward(&mut self) {
        self.apply(Motion::Forward);
    }

    pub fn backward(&mut self) {
        self.apply(Motion::Backward);
    }

    pub fn left(&mut self) {
        self.apply(Motion::Left);
    }

    pub fn right(&mut self) {
        self.apply(Motion::Right);
    }

    pub fn stop(&mut self) {
        self.apply(Motion::Stopped);
    }

    /// Set all four lines to the pattern of `motion`.
    pub fn apply(&mut self, motion: Motion) {
        let target = motion.pattern();

        // Release first …
        for (line, &high) in self.lines.iter_mut().zip(target.iter()) {
            if !high {
                set_line(line, false);
            }
        }
        // … then assert.
        for (line, &high) in self.lines.iter_mut().zip(target.iter()) {
            if high {
                set_line(line, true);
            }
        }

        self.motion = motion;
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn is_moving(&self) -> bool {
        self.motion != Motion::Stopped
    }

    /// Borrow the raw lines (tests inspect their levels).
    pub fn lines(&self) -> &[P; 4] {
        &self.lines
    }

    fn write_all(&mut self, levels: [bool; 4]) {
        for (line, &high) in self.lines.iter_mut().zip(levels.iter()) {
            set_line(line, high);
        }
    }
}

fn set_line<P: OutputPin>(line: &mut P, high: bool) {
    let result = if high { line.set_high() } else { line.set_low() };
    if let Err(e) = result {
        warn!("motor: GPIO write failed: {:?}", e);
    }
}
