use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which path is allowed to emit the open command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Codes scanned by the device are validated against the code table.
    #[default]
    Scan,

    /// A flag in the signal table is polled; the device only reports health.
    Signal,
}

impl TriggerMode {
    /// Configuration value for this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerMode::Scan => "scan",
            TriggerMode::Signal => "signal",
        }
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TriggerMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scan" => Ok(TriggerMode::Scan),
            "signal" => Ok(TriggerMode::Signal),
            other => Err(Error::Config(format!(
                "Unknown trigger_mode '{other}' (expected 'scan' or 'signal')"
            ))),
        }
    }
}

/// Lifecycle of the single device connection.
///
/// The connection manager cycles through these states forever:
///
/// ```text
/// Disconnected → Connecting → Connected → Running → Disconnected
///                     │
///                     └─(connect failed)─> Disconnected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// No socket; either before the first attempt or during backoff.
    #[default]
    Disconnected,

    /// Connection attempt in progress.
    Connecting,

    /// Socket established, keep-alive being configured.
    Connected,

    /// Session loop owns the socket.
    Running,
}

impl LinkState {
    /// Whether a socket currently exists.
    #[must_use]
    pub fn has_socket(&self) -> bool {
        matches!(self, LinkState::Connected | LinkState::Running)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
            LinkState::Running => "running",
        };
        f.write_str(name)
    }
}
