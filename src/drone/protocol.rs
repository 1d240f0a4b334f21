//! # Tello SDK Protocol
//!
//! Text commands understood by the Tello SDK (v1.3) and parsing of its replies.
//!
//! Commands are plain ASCII sent as single UDP datagrams to port 8889. Every
//! command except `rc` is answered with `ok`, `error ...` or a value.
//!
//! ## Commands Used
//!
//! | Command | Meaning |
//! |---------|---------|
//! | `command` | Enter SDK mode (required first) |
//! | `speed x` | Set speed, 10-100 cm/s |
//! | `takeoff` | Auto takeoff |
//! | `land` | Auto land |
//! | `flip x` | Flip `f`, `b`, `l` or `r` |
//! | `rc a b c d` | Stick values: left/right, forward/back, up/down, yaw (-100..100) |

use std::fmt;

use bytes::Bytes;

use crate::controller::translator::{FlipDirection, VelocityCommand};

/// Default Tello address on its own access point.
pub const TELLO_HOST: &str = "192.168.10.1";

/// UDP port for commands and replies.
pub const TELLO_COMMAND_PORT: u16 = 8889;

/// UDP port the Tello broadcasts its state to.
pub const TELLO_STATE_PORT: u16 = 8890;

/// Absolute limit of every `rc` channel.
pub const RC_LIMIT: i32 = 100;

/// Slowest accepted `speed` value (cm/s).
pub const SPEED_MIN: u16 = 10;

/// Fastest accepted `speed` value (cm/s).
pub const SPEED_MAX: u16 = 100;

/// A single SDK command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelloCommand {
    /// Enter SDK mode.
    Command,
    /// Set forward speed in cm/s.
    Speed(u16),
    Takeoff,
    Land,
    Flip(FlipDirection),
    /// Remote-control stick values. Clamped to [`RC_LIMIT`] when encoded.
    Rc(VelocityCommand),
}

impl TelloCommand {
    /// Encodes the command as a datagram payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use tello_pad::controller::translator::VelocityCommand;
    /// use tello_pad::drone::protocol::TelloCommand;
    ///
    /// let rc = TelloCommand::Rc(VelocityCommand { lateral: 4800, longitudinal: 0, vertical: -20, yaw: 0 });
    /// assert_eq!(&rc.encode()[..], b"rc 100 0 -20 0");
    /// ```
    #[must_use]
    pub fn encode(&self) -> Bytes {
        Bytes::from(self.to_string())
    }

    /// Whether the drone answers this command.
    #[must_use]
    pub fn expects_reply(&self) -> bool {
        !matches!(self, TelloCommand::Rc(_))
    }
}

impl fmt::Display for TelloCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelloCommand::Command => f.write_str("command"),
            TelloCommand::Speed(speed) => write!(f, "speed {}", speed),
            TelloCommand::Takeoff => f.write_str("takeoff"),
            TelloCommand::Land => f.write_str("land"),
            TelloCommand::Flip(direction) => write!(f, "flip {}", flip_code(*direction)),
            TelloCommand::Rc(velocity) => {
                let v = velocity.clamped(RC_LIMIT);
                write!(f, "rc {} {} {} {}", v.lateral, v.longitudinal, v.vertical, v.yaw)
            }
        }
    }
}

/// SDK letter for a flip direction.
#[must_use]
pub fn flip_code(direction: FlipDirection) -> char {
    match direction {
        FlipDirection::Forward => 'f',
        FlipDirection::Backward => 'b',
        FlipDirection::Left => 'l',
        FlipDirection::Right => 'r',
    }
}

/// A reply datagram from the drone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Command accepted.
    Ok,
    /// Command rejected; carries the drone's message.
    Error(String),
    /// Any other answer, e.g. a queried value.
    Value(String),
}

impl Reply {
    /// Parses a reply datagram. Surrounding whitespace and NUL padding are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use tello_pad::drone::protocol::Reply;
    ///
    /// assert_eq!(Reply::parse(b"ok\r\n"), Reply::Ok);
    /// assert_eq!(Reply::parse(b"error Motor stop"), Reply::Error("error Motor stop".into()));
    /// ```
    #[must_use]
    pub fn parse(datagram: &[u8]) -> Self {
        let text = String::from_utf8_lossy(datagram);
        let text = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');

        if text.eq_ignore_ascii_case("ok") {
            Reply::Ok
        } else if text.to_ascii_lowercase().starts_with("error") {
            Reply::Error(text.to_string())
        } else {
            Reply::Value(text.to_string())
        }
    }

    /// Returns `true` for [`Reply::Ok`].
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("ok"),
            Reply::Error(msg) | Reply::Value(msg) => f.write_str(msg),
        }
    }
}
