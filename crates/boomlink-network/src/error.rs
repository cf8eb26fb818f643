use thiserror::Error;

/// Errors that end a device session or a connection attempt
///
/// None of these is fatal: the connection manager logs it, tears the
/// socket down and tries again after the backoff.
#[derive(Debug, Error)]
pub enum LinkError {
    /// No socket is open
    #[error("Not connected to device")]
    NotConnected,

    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Frame decoding or command encoding failed
    #[error("Protocol error: {0}")]
    Protocol(boomlink_core::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<boomlink_core::Error> for LinkError {
    fn from(error: boomlink_core::Error) -> Self {
        match error {
            boomlink_core::Error::Io(e) => LinkError::Io(e),
            other => LinkError::Protocol(other),
        }
    }
}
