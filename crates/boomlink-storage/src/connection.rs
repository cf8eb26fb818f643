use crate::descriptor;
use crate::error::{StorageError, StorageResult};
use boomlink_core::constants::{DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_QUERY_TIMEOUT_MS};
use sqlx::any::AnyConnectOptions;
use sqlx::{AnyConnection, ConnectOptions, Connection};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Datastore handle: a connection descriptor plus the connect bound.
///
/// There is no pool. Every operation opens its own connection with
/// [`Datastore::connect`] and gives it back with [`Datastore::release`], so a
/// long-lived process never holds a stale connection between polls.
///
/// Statements run through [`Datastore::bounded`] so a stalled server cannot
/// hold the caller longer than the query timeout.
///
/// The descriptor is checked lazily: an unusable descriptor does not stop the
/// process, it makes every operation fail with `StorageError::Configuration`.
///
/// # Example
///
/// ```no_run
/// use boomlink_storage::Datastore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let datastore = Datastore::new("Server=127.0.0.1;Database=gate;Uid=gate;Pwd=secret;");
/// let conn = datastore.connect().await?;
/// datastore.release(conn).await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Datastore {
    /// Raw descriptor from the configuration file
    descriptor: String,

    /// Timeout for opening a connection
    connect_timeout: Duration,

    /// Timeout for a single statement
    query_timeout: Duration,
}

impl Datastore {
    /// Create a handle with the default connect timeout.
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            query_timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
        }
    }

    /// Set the timeout for opening a connection
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the timeout for a single statement
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Connection URL derived from the descriptor.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` if the descriptor is unusable.
    pub fn url(&self) -> StorageResult<String> {
        descriptor::normalize(&self.descriptor)
    }

    /// Check the descriptor without connecting.
    pub fn validate(&self) -> StorageResult<()> {
        let url = self.url()?;
        AnyConnectOptions::from_str(&url)?;
        Ok(())
    }

    /// Open a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor is unusable, the server refuses the
    /// connection, or the connection is not established within the timeout.
    pub async fn connect(&self) -> StorageResult<AnyConnection> {
        sqlx::any::install_default_drivers();

        let options = AnyConnectOptions::from_str(&self.url()?)?.disable_statement_logging();

        match tokio::time::timeout(self.connect_timeout, options.connect()).await {
            Ok(Ok(conn)) => {
                debug!("Datastore connection opened");
                Ok(conn)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(StorageError::Timeout(
                self.connect_timeout.as_millis() as u64
            )),
        }
    }

    /// Run a statement future under the query timeout.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Timeout` if the statement does not finish in
    /// time, otherwise the statement's own error.
    pub async fn bounded<T, F>(&self, statement: F) -> StorageResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, statement).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StorageError::Timeout(self.query_timeout.as_millis() as u64)),
        }
    }

    /// Close a connection obtained from [`Datastore::connect`].
    ///
    /// Close failures are logged only; the operation's result already stands.
    pub async fn release(&self, conn: AnyConnection) {
        if let Err(e) = conn.close().await {
            warn!("Error closing datastore connection: {}", e);
        }
    }

    /// Check that the datastore answers a trivial query.
    pub async fn health_check(&self) -> StorageResult<()> {
        let mut conn = self.connect().await?;
        let result = self
            .bounded(sqlx::query("SELECT 1").execute(&mut conn))
            .await;
        self.release(conn).await;
        result?;
        Ok(())
    }
}

// The descriptor usually carries a password.
impl fmt::Debug for Datastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datastore")
            .field("descriptor", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        let datastore = Datastore::new("sqlite::memory:");
        assert_eq!(
            datastore.connect_timeout,
            Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS)
        );
    }

    #[test]
    fn test_query_timeout_builder() {
        let datastore = Datastore::new("sqlite::memory:");
        assert_eq!(
            datastore.query_timeout,
            Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS)
        );

        let datastore = datastore.query_timeout(Duration::from_millis(75));
        assert_eq!(datastore.query_timeout, Duration::from_millis(75));
    }

    #[tokio::test]
    async fn test_stalled_statement_times_out() {
        let datastore = Datastore::new("sqlite::memory:").query_timeout(Duration::from_millis(20));

        let stalled = std::future::pending::<Result<(), sqlx::Error>>();
        assert!(matches!(
            datastore.bounded(stalled).await,
            Err(StorageError::Timeout(20))
        ));
    }

    #[tokio::test]
    async fn test_bounded_statement_passes_result_through() {
        let datastore = Datastore::new("sqlite::memory:");

        assert_eq!(datastore.bounded(async { Ok(7) }).await.unwrap(), 7);
        assert!(matches!(
            datastore
                .bounded(async { Err::<(), _>(sqlx::Error::RowNotFound) })
                .await,
            Err(StorageError::Database(_))
        ));
    }

    #[test]
    fn test_connect_timeout_builder() {
        let datastore = Datastore::new("sqlite::memory:").connect_timeout(Duration::from_millis(50));
        assert_eq!(datastore.connect_timeout, Duration::from_millis(50));
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let datastore = Datastore::new("definitely not a descriptor");
        assert!(matches!(
            datastore.validate(),
            Err(StorageError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_accepts_ado_descriptor() {
        let datastore = Datastore::new("Server=127.0.0.1;Database=gate;Uid=u;Pwd=p;");
        assert!(datastore.validate().is_ok());
    }

    #[tokio::test]
    async fn test_connect_with_garbage_descriptor_fails() {
        let datastore = Datastore::new("definitely not a descriptor");
        assert!(datastore.connect().await.is_err());
    }

    #[tokio::test]
    async fn test_health_check_in_memory() {
        let datastore = Datastore::new("sqlite::memory:");
        datastore.health_check().await.unwrap();
    }

    #[test]
    fn test_debug_redacts_descriptor() {
        let datastore = Datastore::new("mysql://u:secret@db/gate");
        assert!(!format!("{datastore:?}").contains("secret"));
    }
}
