use boomlink_core::constants::DEFAULT_SIGNAL_POLL_INTERVAL_MS;
use boomlink_protocol::DeviceFrame;
use boomlink_storage::SignalRepository;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{Trigger, TriggerSource};

/// Polled flag trigger.
///
/// The signal record is read at a fixed interval. A raised flag opens the
/// boom; once the command is written the flag is reset.
///
/// # Delivery
///
/// Write first, clear second, in separate statements. If the clear fails
/// the flag stays raised and the next poll opens again: at-least-once.
/// Inbound frames never trigger anything in this mode.
pub struct SignalTrigger<R> {
    signal: R,
    interval: Duration,
}

impl<R: SignalRepository> SignalTrigger<R> {
    pub fn new(signal: R) -> Self {
        Self {
            signal,
            interval: Duration::from_millis(DEFAULT_SIGNAL_POLL_INTERVAL_MS),
        }
    }

    /// Set the interval between two polls
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn repository(&self) -> &R {
        &self.signal
    }
}

impl<R: SignalRepository> TriggerSource for SignalTrigger<R> {
    async fn on_frame(&mut self, frame: &DeviceFrame) -> Trigger {
        match frame {
            DeviceFrame::HealthCheck => info!("Health check received from device"),
            DeviceFrame::Empty => debug!("Ignoring empty frame"),
            DeviceFrame::Code(payload) => {
                warn!("Ignoring device payload in signal mode: {}", payload)
            }
        }
        Trigger::Idle
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(self.interval)
    }

    async fn on_poll(&mut self) -> Trigger {
        match self.signal.signal_raised().await {
            Ok(true) => {
                info!("Open signal raised. Sending open command");
                Trigger::Open
            }
            Ok(false) => Trigger::Idle,
            Err(e) => {
                error!("Database error while reading signal: {}", e);
                Trigger::Idle
            }
        }
    }

    async fn on_open_sent(&mut self) {
        match self.signal.clear_signal().await {
            Ok(()) => info!("Open command sent, signal reset"),
            Err(e) => error!(
                "Database error while resetting signal, it will fire again: {}",
                e
            ),
        }
    }
}
