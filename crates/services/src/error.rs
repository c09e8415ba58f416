//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StoreError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `SyncService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    /// Some per-medal writes failed. Writes that succeeded are not rolled
    /// back; the aggregate counter is not written.
    #[error("{failed} of {total} medal writes failed")]
    Partial { failed: usize, total: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
