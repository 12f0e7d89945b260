//! Inbound commands and request-line parsing.
//!
//! The joypad page issues bare `GET /<token>` requests.  Only the path
//! token matters; headers are never parsed.

/// One of the five mutually exclusive drive patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    Stopped,
    Forward,
    Backward,
    /// Only motor B engaged (IN3 high) — steering by asymmetric thrust.
    Left,
    /// Only motor A engaged (IN1 high) — steering by asymmetric thrust.
    Right,
}

impl Motion {
    pub const ALL: [Motion; 5] = [
        Motion::Stopped,
        Motion::Forward,
        Motion::Backward,
        Motion::Left,
        Motion::Right,
    ];

    /// Line levels in `[IN1, IN2, IN3, IN4]` order.
    pub const fn pattern(self) -> [bool; 4] {
        match self {
            Self::Stopped => [false, false, false, false],
            Self::Forward => [true, false, true, false],
            Self::Backward => [false, true, false, true],
            Self::Left => [false, false, true, false],
            Self::Right => [true, false, false, false],
        }
    }

    /// Inverse of [`pattern`](Self::pattern).  `None` for any combination
    /// that is not one of the five defined patterns.
    pub fn from_pattern(levels: [bool; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.pattern() == levels)
    }
}

/// Commands the router understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/` — serve the joypad page.
    Page,
    /// `/F`, `/B`, `/L`, `/R`, `/S`.
    Drive(Motion),
    /// `/LED_ON`.
    LightOn,
    /// `/LED_OFF`.
    LightOff,
    /// Anything else: acknowledged, nothing actuated.
    Unknown,
}

impl Command {
    /// Exact-match lookup of a path token.  `/FS` is `Unknown`, not `Stop`.
    pub fn from_path(path: &str) -> Self {
        match path {
            "/" => Self::Page,
            "/F" => Self::Drive(Motion::Forward),
            "/B" => Self::Drive(Motion::Backward),
            "/L" => Self::Drive(Motion::Left),
            "/R" => Self::Drive(Motion::Right),
            "/S" => Self::Drive(Motion::Stopped),
            "/LED_ON" => Self::LightOn,
            "/LED_OFF" => Self::LightOff,
            _ => Self::Unknown,
        }
    }

    /// Parse the command straight from a raw request.
    pub fn from_request(request: &str) -> Self {
        Self::from_path(request_path(request))
    }
}

/// Second whitespace-delimited token of the request (the path of
/// `GET /F HTTP/1.1`), or `/` when the request has fewer than two tokens.
pub fn request_path(request: &str) -> &str {
    request.split_whitespace().nth(1).unwrap_or("/")
}
