#![allow(async_fn_in_trait)]

use crate::connection::Datastore;
use crate::error::StorageResult;
use tracing::debug;

/// Repository trait for the scanned-code lookup table
///
/// Implementations report errors instead of guessing; the caller decides
/// what a failed lookup means (the scan trigger treats it as "not valid").
pub trait CodeRepository: Send + Sync {
    /// Check whether `code` is present in the lookup table
    async fn code_exists(&self, code: &str) -> StorageResult<bool>;
}

/// SQL implementation of CodeRepository over the `qr_codes` table
#[derive(Debug, Clone)]
pub struct SqlCodeRepository {
    datastore: Datastore,
}

impl SqlCodeRepository {
    /// Create a new code repository on the given datastore
    pub fn new(datastore: Datastore) -> Self {
        Self { datastore }
    }
}

impl CodeRepository for SqlCodeRepository {
    async fn code_exists(&self, code: &str) -> StorageResult<bool> {
        let mut conn = self.datastore.connect().await?;

        // Selecting a constant keeps the row decodable whatever the table's column types are
        let query = sqlx::query("SELECT 1 FROM qr_codes WHERE code = ? LIMIT 1").bind(code);
        let row = self.datastore.bounded(query.fetch_optional(&mut conn)).await;

        self.datastore.release(conn).await;

        let found = row?.is_some();
        debug!(code, found, "Code lookup finished");
        Ok(found)
    }
}
