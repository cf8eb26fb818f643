#![allow(async_fn_in_trait)]

use crate::connection::Datastore;
use crate::error::StorageResult;
use boomlink_core::constants::{SIGNAL_CLEARED, SIGNAL_RAISED};
use sqlx::Row;
use tracing::{debug, warn};

/// Whether a flag value read from the signal record means "open requested".
///
/// Surrounding whitespace is ignored and the comparison is case-insensitive,
/// so `'y'` and `'Y '` (a space-padded CHAR column) both count.
pub fn is_raised(flag: &str) -> bool {
    flag.trim().eq_ignore_ascii_case(SIGNAL_RAISED)
}

/// Repository trait for the single-row signal record
///
/// Reading and clearing are separate operations with no transaction between
/// them. If the clear fails after the open command was sent, the flag stays
/// raised and the command is sent again on the next poll (at-least-once).
pub trait SignalRepository: Send + Sync {
    /// Read the raw flag value; `None` if the row is missing or NULL
    async fn read_flag(&self) -> StorageResult<Option<String>>;

    /// Reset the flag to "not raised"
    async fn clear_signal(&self) -> StorageResult<()>;

    /// Whether the flag currently requests an open
    async fn signal_raised(&self) -> StorageResult<bool> {
        Ok(self.read_flag().await?.as_deref().is_some_and(is_raised))
    }

    /// Read the flag and clear it if it was raised.
    ///
    /// Returns whether it was raised. The read and the clear are two
    /// independent statements.
    async fn check_and_clear_signal(&self) -> StorageResult<bool> {
        if !self.signal_raised().await? {
            return Ok(false);
        }
        self.clear_signal().await?;
        Ok(true)
    }
}

/// SQL implementation of SignalRepository over the `boomsig` table
#[derive(Debug, Clone)]
pub struct SqlSignalRepository {
    datastore: Datastore,
}

impl SqlSignalRepository {
    /// Create a new signal repository on the given datastore
    pub fn new(datastore: Datastore) -> Self {
        Self { datastore }
    }
}

impl SignalRepository for SqlSignalRepository {
    async fn read_flag(&self) -> StorageResult<Option<String>> {
        let mut conn = self.datastore.connect().await?;

        let query = sqlx::query("SELECT entryboom FROM boomsig WHERE id = 1");
        let row = self.datastore.bounded(query.fetch_optional(&mut conn)).await;

        self.datastore.release(conn).await;

        let flag = match row? {
            Some(row) => row.try_get::<Option<String>, _>(0)?,
            None => {
                warn!("Signal record with id = 1 is missing");
                None
            }
        };
        Ok(flag)
    }

    async fn clear_signal(&self) -> StorageResult<()> {
        let mut conn = self.datastore.connect().await?;

        let query =
            sqlx::query("UPDATE boomsig SET entryboom = ? WHERE id = 1").bind(SIGNAL_CLEARED);
        let result = self.datastore.bounded(query.execute(&mut conn)).await;

        self.datastore.release(conn).await;

        let rows = result?.rows_affected();
        debug!(rows, "Signal cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use rstest::rstest;
    use std::path::Path;

    async fn setup_test_db(dir: &Path, flag: Option<&str>) -> Datastore {
        let path = dir.join("gate.db");
        let datastore = Datastore::new(format!("sqlite://{}?mode=rwc", path.display()));

        let mut conn = datastore.connect().await.unwrap();
        sqlx::query("CREATE TABLE boomsig (id INTEGER PRIMARY KEY, entryboom TEXT)")
            .execute(&mut conn)
            .await
            .unwrap();
        if let Some(flag) = flag {
            sqlx::query("INSERT INTO boomsig (id, entryboom) VALUES (1, ?)")
                .bind(flag)
                .execute(&mut conn)
                .await
                .unwrap();
        }
        datastore.release(conn).await;

        datastore
    }

    #[rstest]
    #[case("Y", true)]
    #[case("y", true)]
    #[case(" Y ", true)]
    #[case(SIGNAL_CLEARED, false)]
    #[case("", false)]
    #[case("YES", false)]
    #[case("1", false)]
    fn test_is_raised(#[case] flag: &str, #[case] expected: bool) {
        assert_eq!(is_raised(flag), expected);
    }

    #[tokio::test]
    async fn test_read_flag() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqlSignalRepository::new(setup_test_db(dir.path(), Some("Y")).await);

        assert_eq!(repo.read_flag().await.unwrap().as_deref(), Some("Y"));
        assert!(repo.signal_raised().await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_signal() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqlSignalRepository::new(setup_test_db(dir.path(), Some("Y")).await);

        repo.clear_signal().await.unwrap();

        assert_eq!(repo.read_flag().await.unwrap().as_deref(), Some(SIGNAL_CLEARED));
        assert!(!repo.signal_raised().await.unwrap());
    }

    #[tokio::test]
    async fn test_check_and_clear_when_raised() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqlSignalRepository::new(setup_test_db(dir.path(), Some("y")).await);

        assert!(repo.check_and_clear_signal().await.unwrap());
        assert_eq!(repo.read_flag().await.unwrap().as_deref(), Some(SIGNAL_CLEARED));

        // Second call sees the cleared flag
        assert!(!repo.check_and_clear_signal().await.unwrap());
    }

    #[tokio::test]
    async fn test_check_and_clear_leaves_other_values_alone() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqlSignalRepository::new(setup_test_db(dir.path(), Some("X")).await);

        assert!(!repo.check_and_clear_signal().await.unwrap());
        assert_eq!(repo.read_flag().await.unwrap().as_deref(), Some("X"));
    }

    #[tokio::test]
    async fn test_missing_row_is_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqlSignalRepository::new(setup_test_db(dir.path(), None).await);

        assert_eq!(repo.read_flag().await.unwrap(), None);
        assert!(!repo.signal_raised().await.unwrap());
    }

    #[tokio::test]
    async fn test_unreachable_datastore_is_error() {
        let repo = SqlSignalRepository::new(Datastore::new("Database=gate;"));

        assert!(matches!(
            repo.signal_raised().await,
            Err(StorageError::Configuration(_))
        ));
        assert!(repo.check_and_clear_signal().await.is_err());
    }
}
