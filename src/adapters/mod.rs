//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                  | Connects to                |
//! |------------|-----------------------------|----------------------------|
//! | `console`  | (interrupt source)          | UART stdin, BOOT button    |
//! | `gpio`     | `OutputPin`, `SetDutyCycle` | ESP32 GPIO, LEDC / memory  |
//! | `hardware` | ActuatorPort                | Motor + headlight drivers  |
//! | `log_sink` | EventSink                   | Serial log output          |
//! | `tcp`      | NetworkPort, ListenerPort,  | lwIP sockets via `std::net`|
//! |            | ConnectionPort              |                            |
//! | `time`     | Clock                       | ESP32 system timer         |
//! | `wifi`     | AccessPointPort             | ESP-IDF WiFi soft AP       |

pub mod console;
pub mod gpio;
pub mod hardware;
pub mod log_sink;
pub mod tcp;
pub mod time;
pub mod wifi;
