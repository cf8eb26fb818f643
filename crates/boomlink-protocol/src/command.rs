use boomlink_core::constants::OPEN_COMMAND;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Commands the client sends to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceCommand {
    /// Actuate the boom (`|OPENEN%`).
    Open,
}

impl DeviceCommand {
    /// Wire representation, written without any terminator.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            DeviceCommand::Open => OPEN_COMMAND,
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}
