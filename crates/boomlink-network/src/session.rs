//! Per-connection protocol session.
//!
//! A [`Session`] owns nothing but a borrow of the trigger source. It reads
//! frames from the device stream, hands them to the trigger, runs the
//! trigger's poll on schedule, and writes the open command when asked.
//!
//! ```text
//!             ┌──────── frame ────────┐
//! Device ───> │ Session::run (select) │ ──> TriggerSource::on_frame
//!             └──────── tick ─────────┘ ──> TriggerSource::on_poll
//!                        │
//!                        └── Trigger::Open ──> write |OPENEN% ──> on_open_sent
//! ```
//!
//! Everything happens on one task: a trigger decision is fully handled
//! (including the write and the acknowledgment) before the next frame or
//! tick is looked at, so at most one command write is ever in flight.

use boomlink_protocol::{DeviceCodec, DeviceCommand, DeviceFrame};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tokio_util::codec::Framed;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::LinkError;
use crate::trigger::{Trigger, TriggerSource};

/// Counters of a finished session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Frames decoded from the device
    pub frames_received: u64,

    /// Health check frames among them
    pub health_checks: u64,

    /// Open commands written
    pub opens_sent: u64,
}

/// Protocol loop for one live connection
pub struct Session<'a, T> {
    id: Uuid,
    trigger: &'a mut T,
    summary: SessionSummary,
}

impl<'a, T: TriggerSource> Session<'a, T> {
    pub fn new(trigger: &'a mut T) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger,
            summary: SessionSummary::default(),
        }
    }

    /// Run until the device closes the connection.
    ///
    /// Returns the counters when the remote side closes cleanly.
    ///
    /// # Errors
    ///
    /// Returns an error on any read or write failure; the caller tears the
    /// connection down.
    pub async fn run<S>(
        &mut self,
        framed: &mut Framed<S, DeviceCodec>,
    ) -> Result<SessionSummary, LinkError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let poll_interval = self.trigger.poll_interval();
        debug!(session = %self.id, ?poll_interval, "Session started");

        // First poll happens right away
        let poll = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(poll);

        loop {
            tokio::select! {
                inbound = framed.next() => {
                    match inbound {
                        Some(Ok(frame)) => self.handle_frame(framed, frame).await?,
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            info!(session = %self.id, "Connection closed by remote host");
                            return Ok(self.summary);
                        }
                    }
                }
                _ = &mut poll, if poll_interval.is_some() => {
                    if self.trigger.on_poll().await == Trigger::Open {
                        self.send_open(framed).await?;
                    }
                    if let Some(interval) = poll_interval {
                        poll.as_mut().reset(Instant::now() + interval);
                    }
                }
            }
        }
    }

    async fn handle_frame<S>(
        &mut self,
        framed: &mut Framed<S, DeviceCodec>,
        frame: DeviceFrame,
    ) -> Result<(), LinkError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.summary.frames_received += 1;
        if frame.is_health_check() {
            self.summary.health_checks += 1;
        }
        info!(session = %self.id, "Received: {}", frame);

        if self.trigger.on_frame(&frame).await == Trigger::Open {
            self.send_open(framed).await?;
        }
        Ok(())
    }

    async fn send_open<S>(&mut self, framed: &mut Framed<S, DeviceCodec>) -> Result<(), LinkError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        framed.send(DeviceCommand::Open).await?;
        self.summary.opens_sent += 1;
        info!(session = %self.id, "Sent {}", DeviceCommand::Open);

        self.trigger.on_open_sent().await;
        Ok(())
    }
}
