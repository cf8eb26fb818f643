//! Core constants for the boom gate device link.
//!
//! This module defines the wire tokens exchanged with the device and the
//! default timings used by the connection manager and the trigger sources.
//! Timings are defaults only: every one of them can be overridden from the
//! configuration file (see [`crate::config`]).
//!
//! # Wire Tokens
//!
//! The device speaks a minimal ASCII protocol without line terminators:
//!
//! | Token | Direction | Meaning |
//! |-------|-----------|---------|
//! | `\|HLT%` | device → client | Health check, no reply expected |
//! | `\|OPENEN%` | client → device | Actuate (open the boom) |
//!
//! Any other inbound payload is treated as a scanned code.
//!
//! # Usage
//!
//! ```
//! use boomlink_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(HEALTH_CHECK_TOKEN, "|HLT%");
//! let backoff = Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS);
//! assert_eq!(backoff.as_secs(), 3);
//! ```

// ============================================================================
// Wire Tokens
// ============================================================================

/// Health check sentinel sent periodically by the device.
pub const HEALTH_CHECK_TOKEN: &str = "|HLT%";

/// Command instructing the device to open. Sent as-is, no terminator.
pub const OPEN_COMMAND: &[u8] = b"|OPENEN%";

/// Maximum number of bytes consumed for a single inbound frame.
///
/// Matches the device firmware's transmit buffer; longer payloads are split
/// into several frames.
pub const READ_BUFFER_SIZE: usize = 1024;

// ============================================================================
// Signal Record
// ============================================================================

/// Flag value meaning "open requested" in the signal record.
pub const SIGNAL_RAISED: &str = "Y";

/// Flag value written back after the open command has been sent.
pub const SIGNAL_CLEARED: &str = "N";

// ============================================================================
// Default Timings (milliseconds)
// ============================================================================

/// Pause between the end of a session and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3000;

/// Idle time before the first TCP keep-alive probe.
pub const DEFAULT_KEEPALIVE_IDLE_MS: u64 = 5000;

/// Interval between TCP keep-alive probes.
pub const DEFAULT_KEEPALIVE_INTERVAL_MS: u64 = 1000;

/// Upper bound for a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Interval between two reads of the signal record.
pub const DEFAULT_SIGNAL_POLL_INTERVAL_MS: u64 = 1000;

/// Upper bound for a single datastore statement.
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// Fixed Paths
// ============================================================================

/// Configuration file, relative to the working directory.
pub const CONFIG_PATH: &str = "config.txt";

/// Append-only log file, relative to the working directory.
pub const LOG_PATH: &str = "connectivitylog.txt";
