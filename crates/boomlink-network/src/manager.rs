//! Reconnect loop around the device link.
//!
//! The [`ConnectionManager`] never gives up. Each cycle connects, runs one
//! [`Session`] until it ends for whatever reason, releases the socket and
//! waits the fixed backoff before the next attempt:
//!
//! ```text
//! Disconnected → Connecting → Connected → Running → Disconnected
//!      ▲              │                                 │
//!      │              └──(connect failed)───────────────┤
//!      └──────────────── sleep(reconnect_delay) ────────┘
//! ```
//!
//! Errors from connecting, from the session or from teardown are logged and
//! feed the next cycle. The current [`LinkState`] is published on a watch
//! channel for anyone who wants to observe the link.

use boomlink_core::LinkState;
use tokio::sync::watch;
use tracing::{error, info};

use crate::error::LinkError;
use crate::link::{DeviceLink, LinkConfig};
use crate::session::{Session, SessionSummary};
use crate::trigger::TriggerSource;

/// Owner of the reconnect/backoff state machine
pub struct ConnectionManager<T> {
    config: LinkConfig,
    trigger: T,
    state: watch::Sender<LinkState>,
    attempts: u64,
}

impl<T: TriggerSource> ConnectionManager<T> {
    pub fn new(config: LinkConfig, trigger: T) -> Self {
        let (state, _) = watch::channel(LinkState::Disconnected);
        Self {
            config,
            trigger,
            state,
            attempts: 0,
        }
    }

    /// Watch the link state
    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.state.subscribe()
    }

    /// Current link state
    pub fn state(&self) -> LinkState {
        *self.state.borrow()
    }

    /// Number of connection attempts made so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Connect, run the session, tear down. Forever.
    ///
    /// There is no exit path; the future only completes if it is dropped.
    pub async fn run(&mut self) {
        loop {
            match self.run_once().await {
                Ok(summary) => info!(
                    frames = summary.frames_received,
                    opens = summary.opens_sent,
                    "Session ended"
                ),
                Err(e) => error!("Socket error: {}", e),
            }

            info!(
                "Disconnected from device. Retrying in {}ms...",
                self.config.reconnect_delay.as_millis()
            );
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    /// One full cycle without the backoff sleep.
    ///
    /// The socket is released before this returns, whatever the outcome.
    pub async fn run_once(&mut self) -> Result<SessionSummary, LinkError> {
        self.attempts += 1;
        let mut link = DeviceLink::new(self.config.clone());

        let result = self.connect_and_serve(&mut link).await;

        link.close().await;
        self.set_state(LinkState::Disconnected);
        result
    }

    async fn connect_and_serve(
        &mut self,
        link: &mut DeviceLink,
    ) -> Result<SessionSummary, LinkError> {
        self.set_state(LinkState::Connecting);
        info!(
            attempt = self.attempts,
            "Trying to connect to {}...",
            self.config.target()
        );

        link.connect().await?;
        self.set_state(LinkState::Connected);
        info!("Connected to device at {}", self.config.target());

        let stream = link.stream()?;
        self.set_state(LinkState::Running);
        let mut session = Session::new(&mut self.trigger);
        session.run(stream).await
    }

    fn set_state(&self, state: LinkState) {
        self.state.send_replace(state);
    }
}
