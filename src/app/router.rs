//! Command router — one request in, one actuation and one reply out.
//!
//! ```text
//!  raw request ──▶ request_path ──▶ Command ──▶ ActuatorPort
//!                                      │
//!                                      └──▶ Reply (page | "OK")
//! ```
//!
//! Dispatch is exact-match on the path token.  Headlight commands on a
//! motors-only chassis resolve to [`Command::Unknown`] and are acknowledged
//! without touching anything.

use core::fmt::Write as _;

use log::debug;

use crate::config::Capability;
use crate::error::RequestError;
use crate::web;

use super::commands::Command;
use super::ports::ActuatorPort;

/// Response header capacity; the longest header is the page header.
const HEADER_CAPACITY: usize = 128;

/// Body of every non-root reply.
const ACK_BODY: &str = "OK";

/// What to send back for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// The joypad page.
    Page(&'static str),
    /// Two-byte `OK` acknowledgement.
    Ack,
}

impl Reply {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Page(_) => "text/html",
            Self::Ack => "text/plain",
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            Self::Page(page) => page,
            Self::Ack => ACK_BODY,
        }
    }

    /// Status line and headers, terminated by the blank line.
    pub fn header(&self) -> Result<heapless::String<HEADER_CAPACITY>, RequestError> {
        let mut h = heapless::String::new();
        write!(
            h,
            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.content_type(),
            self.body().len()
        )
        .map_err(|_| RequestError::HeaderOverflow)?;
        Ok(h)
    }
}

pub struct CommandRouter {
    capability: Capability,
    page: &'static str,
}

impl CommandRouter {
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            page: web::control_page(capability),
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Parse `request` into the command this chassis can execute.
    pub fn resolve(&self, request: &str) -> Command {
        match Command::from_request(request) {
            Command::LightOn | Command::LightOff if !self.capability.has_light() => {
                Command::Unknown
            }
            cmd => cmd,
        }
    }

    /// Actuate `command` and pick the reply.
    pub fn dispatch(&self, command: Command, vehicle: &mut impl ActuatorPort) -> Reply {
        match command {
            Command::Page => return Reply::Page(self.page),
            Command::Drive(motion) => vehicle.drive(motion),
            Command::LightOn => vehicle.light_on(),
            Command::LightOff => vehicle.light_off(),
            Command::Unknown => {}
        }
        Reply::Ack
    }

    /// [`resolve`](Self::resolve) then [`dispatch`](Self::dispatch).
    pub fn handle(&self, request: &str, vehicle: &mut impl ActuatorPort) -> (Command, Reply) {
        let command = self.resolve(request);
        debug!("router: {:?}", command);
        (command, self.dispatch(command, vehicle))
    }
}
