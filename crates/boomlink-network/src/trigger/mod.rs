//! Trigger sources: the only origin of the open command.
//!
//! Two variants exist, selected by `trigger_mode` in the configuration:
//!
//! - [`ScanTrigger`]: the device sends a scanned code, the code table decides
//! - [`SignalTrigger`]: an external writer raises a flag in the signal table
//!
//! The [`Session`](crate::Session) feeds every inbound frame to
//! [`TriggerSource::on_frame`] and, if the source asks for it, calls
//! [`TriggerSource::on_poll`] at a fixed interval. Whenever either returns
//! [`Trigger::Open`], the session writes the open command and then calls
//! [`TriggerSource::on_open_sent`].

#![allow(async_fn_in_trait)]

pub mod scan;
pub mod signal;

pub use scan::ScanTrigger;
pub use signal::SignalTrigger;

use boomlink_protocol::DeviceFrame;
use std::time::Duration;

/// Decision taken by a trigger source for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Send the open command
    Open,

    /// Do nothing
    Idle,
}

/// Decides when the open command is sent.
pub trait TriggerSource {
    /// Handle one inbound frame from the device.
    async fn on_frame(&mut self, frame: &DeviceFrame) -> Trigger;

    /// Interval between two [`on_poll`](TriggerSource::on_poll) calls;
    /// `None` disables polling.
    fn poll_interval(&self) -> Option<Duration> {
        None
    }

    /// Periodic check, only called when a poll interval is set.
    async fn on_poll(&mut self) -> Trigger {
        Trigger::Idle
    }

    /// Called after the open command was written to the device.
    async fn on_open_sent(&mut self) {}
}
