//! Device protocol for the boom gate controller.
//!
//! The device speaks plain ASCII over TCP with no explicit framing: whatever
//! bytes one read delivers form one frame. Inbound frames are either the
//! health check sentinel or a scanned code; the only outbound command is
//! the open token.
//!
//! - [`DeviceFrame`]: a decoded, trimmed inbound chunk
//! - [`DeviceCommand`]: an outbound command
//! - [`DeviceCodec`]: `tokio_util` codec tying both to a byte stream

pub mod codec;
pub mod command;
pub mod frame;

pub use codec::DeviceCodec;
pub use command::DeviceCommand;
pub use frame::DeviceFrame;
