//! Client configuration loaded from a flat `key=value` file.
//!
//! The file format is deliberately minimal so it can be edited on site:
//!
//! ```text
//! # device controller
//! server_ip=10.0.0.5
//! server_port=9000
//!
//! # datastore
//! db_connection=Server=127.0.0.1;Database=gate;Uid=gate;Pwd=secret;
//! ```
//!
//! - Blank lines and lines starting with `#` are ignored.
//! - Lines without `=` are ignored.
//! - Each line is split on the first `=`; key and value are trimmed.
//! - A repeated key overwrites the earlier value.
//!
//! `server_ip`, `server_port` and `db_connection` are required. Every other key
//! is optional and falls back to the defaults in [`crate::constants`].
//!
//! # Example
//!
//! ```
//! use boomlink_core::ClientConfig;
//!
//! let config: ClientConfig = "server_ip=10.0.0.5\nserver_port=9000\ndb_connection=sqlite://gate.db"
//!     .parse()
//!     .unwrap();
//! assert_eq!(config.target(), "10.0.0.5:9000");
//! ```

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_KEEPALIVE_IDLE_MS, DEFAULT_KEEPALIVE_INTERVAL_MS,
    DEFAULT_QUERY_TIMEOUT_MS, DEFAULT_RECONNECT_DELAY_MS, DEFAULT_SIGNAL_POLL_INTERVAL_MS,
};
use crate::{Error, Result, TriggerMode};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

const KEY_SERVER_IP: &str = "server_ip";
const KEY_SERVER_PORT: &str = "server_port";
const KEY_DB_CONNECTION: &str = "db_connection";
const KEY_TRIGGER_MODE: &str = "trigger_mode";
const KEY_RECONNECT_DELAY: &str = "reconnect_delay_ms";
const KEY_KEEPALIVE_IDLE: &str = "keepalive_idle_ms";
const KEY_KEEPALIVE_INTERVAL: &str = "keepalive_interval_ms";
const KEY_CONNECT_TIMEOUT: &str = "connect_timeout_ms";
const KEY_SIGNAL_POLL_INTERVAL: &str = "signal_poll_interval_ms";
const KEY_QUERY_TIMEOUT: &str = "query_timeout_ms";

/// Immutable process configuration.
///
/// Built once at startup and handed to the connection manager and the
/// datastore gateway; nothing mutates it afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Device controller host (IP address or hostname)
    pub server_host: String,

    /// Device controller TCP port
    pub server_port: u16,

    /// Datastore connection descriptor (URL or `Server=...;` form)
    pub db_connection: String,

    /// Which trigger path emits the open command
    pub trigger_mode: TriggerMode,

    /// Pause between a finished session and the next connection attempt
    pub reconnect_delay: Duration,

    /// Idle time before the first keep-alive probe
    pub keepalive_idle: Duration,

    /// Interval between keep-alive probes
    pub keepalive_interval: Duration,

    /// Upper bound for a single connection attempt
    pub connect_timeout: Duration,

    /// Interval between two reads of the signal record
    pub signal_poll_interval: Duration,

    /// Upper bound for a single datastore statement
    pub query_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with default timings.
    pub fn new(
        server_host: impl Into<String>,
        server_port: u16,
        db_connection: impl Into<String>,
    ) -> Self {
        Self {
            server_host: server_host.into(),
            server_port,
            db_connection: db_connection.into(),
            trigger_mode: TriggerMode::default(),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            keepalive_idle: Duration::from_millis(DEFAULT_KEEPALIVE_IDLE_MS),
            keepalive_interval: Duration::from_millis(DEFAULT_KEEPALIVE_INTERVAL_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            signal_poll_interval: Duration::from_millis(DEFAULT_SIGNAL_POLL_INTERVAL_MS),
            query_timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
        }
    }

    /// Load the configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read or a value is
    /// malformed, and `Error::MissingConfig` if a required key is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {e}", path.display())))?;
        content.parse()
    }

    /// Build a configuration from already parsed key/value pairs.
    pub fn from_pairs(pairs: &HashMap<String, String>) -> Result<Self> {
        let server_host = required(pairs, KEY_SERVER_IP)?.to_string();
        let port = required(pairs, KEY_SERVER_PORT)?;
        let server_port = port
            .parse::<u16>()
            .map_err(|_| Error::Config(format!("{KEY_SERVER_PORT} is not a valid port: '{port}'")))?;
        let db_connection = required(pairs, KEY_DB_CONNECTION)?.to_string();

        let mut config = Self::new(server_host, server_port, db_connection);

        if let Some(mode) = optional(pairs, KEY_TRIGGER_MODE) {
            config.trigger_mode = mode.parse()?;
        }
        if let Some(delay) = millis(pairs, KEY_RECONNECT_DELAY)? {
            config.reconnect_delay = delay;
        }
        if let Some(idle) = millis(pairs, KEY_KEEPALIVE_IDLE)? {
            config.keepalive_idle = idle;
        }
        if let Some(interval) = millis(pairs, KEY_KEEPALIVE_INTERVAL)? {
            config.keepalive_interval = interval;
        }
        if let Some(timeout) = millis(pairs, KEY_CONNECT_TIMEOUT)? {
            config.connect_timeout = timeout;
        }
        if let Some(interval) = millis(pairs, KEY_SIGNAL_POLL_INTERVAL)? {
            config.signal_poll_interval = interval;
        }
        if let Some(timeout) = millis(pairs, KEY_QUERY_TIMEOUT)? {
            config.query_timeout = timeout;
        }

        Ok(config)
    }

    /// `host:port` string used for connecting and logging.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl std::str::FromStr for ClientConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_pairs(&parse_pairs(s))
    }
}

// The datastore descriptor usually carries a password.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("db_connection", &"<redacted>")
            .field("trigger_mode", &self.trigger_mode)
            .field("reconnect_delay", &self.reconnect_delay)
            .field("keepalive_idle", &self.keepalive_idle)
            .field("keepalive_interval", &self.keepalive_interval)
            .field("connect_timeout", &self.connect_timeout)
            .field("signal_poll_interval", &self.signal_poll_interval)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

/// Parse `key=value` lines into a map.
///
/// Comment lines, blank lines and lines without `=` are skipped.
pub fn parse_pairs(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn required<'a>(pairs: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    optional(pairs, key).ok_or_else(|| Error::MissingConfig(key.to_string()))
}

fn optional<'a>(pairs: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    pairs
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

fn millis(pairs: &HashMap<String, String>, key: &str) -> Result<Option<Duration>> {
    optional(pairs, key)
        .map(|value| {
            value
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| Error::Config(format!("{key} must be a number of milliseconds: '{value}'")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    const MINIMAL: &str = "server_ip=10.0.0.5\nserver_port=9000\ndb_connection=sqlite://gate.db\n";

    #[test]
    fn test_parse_minimal_config() {
        let config: ClientConfig = MINIMAL.parse().unwrap();

        assert_eq!(config.server_host, "10.0.0.5");
        assert_eq!(config.server_port, 9000);
        assert_eq!(config.db_connection, "sqlite://gate.db");
        assert_eq!(config.trigger_mode, TriggerMode::Scan);
        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
        assert_eq!(config.keepalive_idle, Duration::from_secs(5));
        assert_eq!(config.keepalive_interval, Duration::from_secs(1));
        assert_eq!(config.signal_poll_interval, Duration::from_secs(1));
        assert_eq!(config.query_timeout, Duration::from_secs(30));
        assert_eq!(config.target(), "10.0.0.5:9000");
    }

    #[test]
    fn test_comments_blank_and_malformed_lines_are_ignored() {
        let content = "\
# controller
server_ip = 10.0.0.5

   # indented comment
this line has no separator
server_port= 9000
db_connection =Server=db;Database=gate;Uid=u;Pwd=a=b;
";
        let config: ClientConfig = content.parse().unwrap();

        assert_eq!(config.server_host, "10.0.0.5");
        assert_eq!(config.server_port, 9000);
        // Only the first '=' separates key from value
        assert_eq!(config.db_connection, "Server=db;Database=gate;Uid=u;Pwd=a=b;");
    }

    #[test]
    fn test_later_key_overwrites_earlier() {
        let content = format!("{MINIMAL}server_port=9100\n");
        let config: ClientConfig = content.parse().unwrap();
        assert_eq!(config.server_port, 9100);
    }

    #[rstest]
    #[case::no_ip("server_port=9000\ndb_connection=x", "server_ip")]
    #[case::no_port("server_ip=10.0.0.5\ndb_connection=x", "server_port")]
    #[case::no_db("server_ip=10.0.0.5\nserver_port=9000", "db_connection")]
    #[case::empty_db("server_ip=10.0.0.5\nserver_port=9000\ndb_connection=", "db_connection")]
    fn test_missing_required_key(#[case] content: &str, #[case] key: &str) {
        let err = content.parse::<ClientConfig>().unwrap_err();
        match err {
            Error::MissingConfig(missing) => assert_eq!(missing, key),
            other => panic!("expected MissingConfig, got {other:?}"),
        }
    }

    #[rstest]
    #[case("abc")]
    #[case("-1")]
    #[case("70000")]
    fn test_invalid_port(#[case] port: &str) {
        let content = format!("server_ip=h\nserver_port={port}\ndb_connection=x");
        let err = content.parse::<ClientConfig>().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_optional_overrides() {
        let content = format!(
            "{MINIMAL}trigger_mode=signal\nreconnect_delay_ms=250\nkeepalive_idle_ms=7000\n\
             keepalive_interval_ms=2000\nconnect_timeout_ms=900\nsignal_poll_interval_ms=500\n\
             query_timeout_ms=1500\n"
        );
        let config: ClientConfig = content.parse().unwrap();

        assert_eq!(config.trigger_mode, TriggerMode::Signal);
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
        assert_eq!(config.keepalive_idle, Duration::from_millis(7000));
        assert_eq!(config.keepalive_interval, Duration::from_millis(2000));
        assert_eq!(config.connect_timeout, Duration::from_millis(900));
        assert_eq!(config.signal_poll_interval, Duration::from_millis(500));
        assert_eq!(config.query_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_invalid_optional_value() {
        let content = format!("{MINIMAL}reconnect_delay_ms=soon\n");
        assert!(matches!(
            content.parse::<ClientConfig>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.target(), "10.0.0.5:9000");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load(dir.path().join("config.txt")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_redacts_db_connection() {
        let config = ClientConfig::new("h", 1, "mysql://u:secret@db/gate");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
