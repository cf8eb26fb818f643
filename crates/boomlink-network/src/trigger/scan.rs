use boomlink_protocol::DeviceFrame;
use boomlink_storage::CodeRepository;
use tracing::{debug, error, info};

use super::{Trigger, TriggerSource};

/// Inbound scan validation.
///
/// Every code frame is looked up in the code table; a hit opens the boom.
/// Health checks are acknowledged in the log only.
///
/// # Fail Closed
///
/// A datastore error never opens the boom: [`ScanTrigger::is_valid`] maps
/// it to `false` after logging it.
pub struct ScanTrigger<R> {
    codes: R,
}

impl<R: CodeRepository> ScanTrigger<R> {
    pub fn new(codes: R) -> Self {
        Self { codes }
    }

    /// Whether `code` may open the boom.
    pub async fn is_valid(&self, code: &str) -> bool {
        match self.codes.code_exists(code).await {
            Ok(found) => found,
            Err(e) => {
                error!(code, "Database error while validating code: {}", e);
                false
            }
        }
    }

    pub fn repository(&self) -> &R {
        &self.codes
    }
}

impl<R: CodeRepository> TriggerSource for ScanTrigger<R> {
    async fn on_frame(&mut self, frame: &DeviceFrame) -> Trigger {
        match frame {
            DeviceFrame::HealthCheck => {
                info!("Health check received from device");
                Trigger::Idle
            }
            DeviceFrame::Empty => {
                debug!("Ignoring empty frame");
                Trigger::Idle
            }
            DeviceFrame::Code(code) => {
                if self.is_valid(code).await {
                    info!("Code valid: {}. Sending open command", code);
                    Trigger::Open
                } else {
                    info!("Code invalid or not found: {}", code);
                    Trigger::Idle
                }
            }
        }
    }
}
