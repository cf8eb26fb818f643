//! TCP link to the boom gate device.
//!
//! [`DeviceLink`] owns the socket of one connection: it connects with a
//! timeout, tunes keep-alive so a silently dead device is noticed, wraps the
//! stream in a [`DeviceCodec`] and closes it again. It does not retry; the
//! [`ConnectionManager`](crate::ConnectionManager) decides when to reconnect.
//!
//! # Keep-Alive
//!
//! The device only talks when something happens, so without keep-alive a
//! pulled cable would go unnoticed until the next write. The socket gets
//! `SO_KEEPALIVE` first, then the custom probe timing (idle time before the
//! first probe, interval between probes).
//!
//! # Example
//!
//! ```no_run
//! use boomlink_network::{DeviceLink, LinkConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut link = DeviceLink::new(LinkConfig::new("10.0.0.5", 9000));
//! link.connect().await?;
//! assert!(link.is_connected());
//! link.close().await;
//! # Ok(())
//! # }
//! ```

use boomlink_core::ClientConfig;
use boomlink_core::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_KEEPALIVE_IDLE_MS, DEFAULT_KEEPALIVE_INTERVAL_MS,
    DEFAULT_RECONNECT_DELAY_MS,
};
use boomlink_protocol::DeviceCodec;
use socket2::{SockRef, TcpKeepalive};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::error::LinkError;

/// Framed device stream over TCP
pub type DeviceStream = Framed<TcpStream, DeviceCodec>;

/// Connection settings for the device link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Device host (IP address or hostname)
    pub host: String,

    /// Device TCP port
    pub port: u16,

    /// Timeout for a single connection attempt
    pub connect_timeout: Duration,

    /// Idle time before the first keep-alive probe
    pub keepalive_idle: Duration,

    /// Interval between keep-alive probes
    pub keepalive_interval: Duration,

    /// Pause between the end of a session and the next attempt
    pub reconnect_delay: Duration,
}

impl LinkConfig {
    /// Create a link configuration with default timings
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            keepalive_idle: Duration::from_millis(DEFAULT_KEEPALIVE_IDLE_MS),
            keepalive_interval: Duration::from_millis(DEFAULT_KEEPALIVE_INTERVAL_MS),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        }
    }

    /// Set the pause between sessions
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the connection attempt timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// `host:port` of the device
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<&ClientConfig> for LinkConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            host: config.server_host.clone(),
            port: config.server_port,
            connect_timeout: config.connect_timeout,
            keepalive_idle: config.keepalive_idle,
            keepalive_interval: config.keepalive_interval,
            reconnect_delay: config.reconnect_delay,
        }
    }
}

/// Socket owner for one device connection
pub struct DeviceLink {
    config: LinkConfig,

    /// Framed stream (None if not connected)
    framed: Option<DeviceStream>,
}

impl DeviceLink {
    /// Create an unconnected link
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            framed: None,
        }
    }

    /// Connect to the device and configure the socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be resolved, the device refuses
    /// the connection, or the attempt exceeds the connect timeout.
    pub async fn connect(&mut self) -> Result<(), LinkError> {
        let target = self.config.target();

        let stream =
            match tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(&target))
                .await
            {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    return Err(LinkError::ConnectionTimeout(
                        self.config.connect_timeout.as_millis() as u64,
                    ));
                }
            };

        if let Err(e) = enable_keepalive(
            &stream,
            self.config.keepalive_idle,
            self.config.keepalive_interval,
        ) {
            warn!("Failed to configure TCP keep-alive: {} - dead links may go unnoticed", e);
        }

        // The open command is tiny; don't let Nagle hold it back
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        self.framed = Some(Framed::new(stream, DeviceCodec::new()));
        debug!("Link to {} ready", target);
        Ok(())
    }

    /// Framed stream of the open connection.
    pub fn stream(&mut self) -> Result<&mut DeviceStream, LinkError> {
        self.framed.as_mut().ok_or(LinkError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.framed.is_some()
    }

    /// Release the socket.
    ///
    /// Idempotent. Shutdown gets 500ms; failures are logged
    /// because the socket is dropped either way.
    pub async fn close(&mut self) {
        let Some(framed) = self.framed.take() else {
            return;
        };

        let mut stream = framed.into_inner();
        let shutdown_timeout = Duration::from_millis(500);
        match tokio::time::timeout(shutdown_timeout, stream.shutdown()).await {
            Ok(Ok(())) => debug!("Shutdown completed"),
            Ok(Err(e)) => debug!("Error during shutdown: {}", e),
            Err(_) => warn!(
                "Shutdown timeout during close ({}ms)",
                shutdown_timeout.as_millis()
            ),
        }

        info!("Closed connection to {}", self.config.target());
    }
}

impl Drop for DeviceLink {
    fn drop(&mut self) {
        if self.framed.is_some() {
            debug!("DeviceLink dropped while connected - connection will be closed");
        }
    }
}

/// Turn on `SO_KEEPALIVE`, then apply the probe timing.
pub fn enable_keepalive(
    stream: &TcpStream,
    idle: Duration,
    interval: Duration,
) -> std::io::Result<()> {
    let socket = SockRef::from(stream);
    socket.set_keepalive(true)?;

    let keepalive = TcpKeepalive::new().with_time(idle).with_interval(interval);
    socket.set_tcp_keepalive(&keepalive)
}
