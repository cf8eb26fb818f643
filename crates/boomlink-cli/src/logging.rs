//! Logging setup: console echo plus an append-only log file.
//!
//! Every line in the file starts with a `[yyyy-MM-dd HH:mm:ss]` local
//! timestamp. The file is written from a background worker; if it cannot be
//! opened or a write fails, the line is lost and nothing else happens.

use std::fmt;
use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt as subscriber_fmt};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The process takes no environment variables, so the level is fixed.
const DEFAULT_FILTER: &str = "info";

/// `[yyyy-MM-dd HH:mm:ss]` in local time
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTimestamp;

impl FormatTime for LogTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "[{}]", chrono::Local::now().format(TIMESTAMP_FORMAT))
    }
}

/// Non-blocking appender for `path`, or `None` if the file can't be opened.
pub fn file_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name()?.to_string_lossy().into_owned();

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
        .ok()?;

    Some(tracing_appender::non_blocking(appender))
}

/// Plain-text layer for the log file: timestamp, then the message.
pub fn file_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    subscriber_fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_level(false)
        .with_timer(LogTimestamp)
}

/// Install the global subscriber.
///
/// The returned guard flushes the file on drop and must live as long as
/// the process logs.
pub fn init(path: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::new(DEFAULT_FILTER);
    let console = subscriber_fmt::layer()
        .with_target(false)
        .with_timer(LogTimestamp);

    match file_writer(path) {
        Some((writer, guard)) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(file_layer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .init();
            tracing::warn!(
                "Cannot open log file {}, logging to console only",
                path.display()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boomlink_network::{ConnectionManager, LinkConfig, ScanTrigger};
    use boomlink_storage::{Datastore, SqlCodeRepository};
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    fn assert_timestamped(line: &str) {
        assert!(line.len() > 22, "line too short: {line:?}");
        assert!(line.starts_with('['), "no timestamp: {line:?}");
        assert_eq!(&line[20..22], "] ", "no timestamp: {line:?}");
        assert!(
            chrono::NaiveDateTime::parse_from_str(&line[1..20], TIMESTAMP_FORMAT).is_ok(),
            "bad timestamp: {line:?}"
        );
    }

    #[test]
    fn test_timestamp_shape() {
        let mut line = String::new();
        LogTimestamp.format_time(&mut Writer::new(&mut line)).unwrap();

        // [2025-10-27 14:30:00]
        assert_eq!(line.len(), 21);
        assert!(line.starts_with('[') && line.ends_with(']'));
        let body = &line[1..20];
        assert!(chrono::NaiveDateTime::parse_from_str(body, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn test_file_writer_in_writable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connectivitylog.txt");

        let writer = file_writer(&path);
        assert!(writer.is_some());
        drop(writer);
        assert!(path.exists());
    }

    #[test]
    fn test_file_writer_unusable_directory() {
        // A regular file cannot be the log directory
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().join("connectivitylog.txt");

        assert!(file_writer(&path).is_none());
    }

    #[tokio::test]
    async fn test_health_check_acknowledged_in_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connectivitylog.txt");
        let (writer, guard) = file_writer(&path).unwrap();
        let default = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(file_layer(writer)),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let codes = SqlCodeRepository::new(Datastore::new("sqlite::memory:"));
        let mut manager =
            ConnectionManager::new(LinkConfig::new("127.0.0.1", port), ScanTrigger::new(codes));

        let device = async {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(b"|HLT%").await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            drop(stream);
        };

        let (result, ()) = tokio::join!(manager.run_once(), device);
        assert_eq!(result.unwrap().health_checks, 1);

        // Flush the background writer
        drop(default);
        drop(guard);

        let log = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = log.lines().filter(|line| !line.is_empty()).collect();
        assert!(!lines.is_empty());
        for line in &lines {
            assert_timestamped(line);
        }
        assert!(
            lines
                .iter()
                .any(|line| line.ends_with("] Health check received from device")),
            "no acknowledgment in:\n{log}"
        );
    }
}
