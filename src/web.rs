//! Static joypad pages, embedded at build time.

use crate::config::Capability;

/// Joypad with the headlight toggle.
pub const JOYPAD_LIGHT_HTML: &str = include_str!("../assets/joypad_light.html");

/// Joypad for motors-only chassis.
pub const JOYPAD_HTML: &str = include_str!("../assets/joypad.html");

/// The page served on `/` for a chassis with `capability`.
pub fn control_page(capability: Capability) -> &'static str {
    match capability {
        Capability::MotorsAndLight => JOYPAD_LIGHT_HTML,
        Capability::MotorsOnly => JOYPAD_HTML,
    }
}
