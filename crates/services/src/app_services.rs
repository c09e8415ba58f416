use std::sync::Arc;

use storage::repository::RemoteStore;

use crate::Clock;
use crate::activity_service::ActivityService;
use crate::error::AppServicesError;
use crate::progress_tracker::ProgressTracker;
use crate::session_service::SessionService;
use crate::sync_service::SyncService;

/// Assembles the session, progress, sync, and activity services over one
/// shared progress tracker and remote store.
#[derive(Clone)]
pub struct AppServices {
    progress: ProgressTracker,
    session: Arc<SessionService>,
    sync: Arc<SyncService>,
    activities: Arc<ActivityService>,
}

impl AppServices {
    /// Build services over an arbitrary remote store.
    #[must_use]
    pub fn new(store: RemoteStore, clock: Clock) -> Self {
        let progress = ProgressTracker::new();
        let session = Arc::new(SessionService::new(progress.clone()));
        let sync = Arc::new(SyncService::new(store, progress.clone()).with_clock(clock));
        let activities = Arc::new(
            ActivityService::new(Arc::clone(&session), progress.clone(), Arc::clone(&sync))
                .with_clock(clock),
        );
        Self {
            progress,
            session,
            sync,
            activities,
        }
    }

    /// Build services backed by in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(RemoteStore::in_memory(), clock)
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        Ok(Self::new(RemoteStore::sqlite(db_url).await?, clock))
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    #[must_use]
    pub fn session(&self) -> Arc<SessionService> {
        Arc::clone(&self.session)
    }

    #[must_use]
    pub fn sync(&self) -> Arc<SyncService> {
        Arc::clone(&self.sync)
    }

    #[must_use]
    pub fn activities(&self) -> Arc<ActivityService> {
        Arc::clone(&self.activities)
    }
}
