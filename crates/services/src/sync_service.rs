//! Reconciliation between the local progress tracker and the per-user remote
//! collections.
//!
//! Two directions: `load_medals` (remote → local) and `sync_medals`
//! (local → remote). Both are gated on a user id — guest sessions pass `None`
//! and get a cheap no-op. Reading positions and exercise results go through
//! the same service so there is a single sync path for all progress data.

use std::sync::Arc;

use futures::future::join_all;

use storage::repository::{ExerciseResult, MedalRecord, MedalStats, RemoteStore};
use yachay_core::Clock;
use yachay_core::model::{BookId, Medal, ReadingPosition, UserId};

use crate::error::SyncError;
use crate::progress_tracker::ProgressTracker;

pub struct SyncService {
    store: RemoteStore,
    progress: ProgressTracker,
    clock: Clock,
}

impl SyncService {
    #[must_use]
    pub fn new(store: RemoteStore, progress: ProgressTracker) -> Self {
        Self {
            store,
            progress,
            clock: Clock::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Hydrates local medals from the user's remote collection.
    ///
    /// Only a **non-empty** remote result overwrites local state: an empty
    /// collection returns an empty vec and leaves local medals alone, so
    /// medals earned before the first sync survive an empty remote read.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Store` if the fetch fails; local state is left
    /// untouched. Callers that want the source's degrade-to-empty behavior
    /// use [`load_medals_or_empty`](Self::load_medals_or_empty).
    pub async fn load_medals(&self, user: Option<&UserId>) -> Result<Vec<Medal>, SyncError> {
        let Some(user) = user else {
            return Ok(Vec::new());
        };

        let records = self.store.medals.list_medals(user).await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let medals: Vec<Medal> = records.into_iter().map(MedalRecord::into_medal).collect();
        self.progress.replace_medals(medals.clone());
        Ok(medals)
    }

    /// Like [`load_medals`](Self::load_medals) but treats a fetch failure as
    /// "no remote data": the error is logged and an empty vec is returned.
    pub async fn load_medals_or_empty(&self, user: Option<&UserId>) -> Vec<Medal> {
        match self.load_medals(user).await {
            Ok(medals) => medals,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load medals, treating remote as empty");
                Vec::new()
            }
        }
    }

    /// Pushes every local medal to the user's remote collection, stamping
    /// `synced_at`, then writes the aggregate counter document.
    ///
    /// Per-medal writes are issued concurrently with no ordering between
    /// them. The counter write happens only after all of them have settled
    /// successfully.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Partial` if any per-medal write failed. Writes
    /// that succeeded stand (no rollback) and the counter is not written.
    pub async fn sync_medals(&self, user: Option<&UserId>) -> Result<u32, SyncError> {
        let Some(user) = user else {
            return Ok(0);
        };

        let medals = self.progress.medals();
        let now = self.clock.now();

        let writes = medals.iter().map(|medal| {
            let repo = Arc::clone(&self.store.medals);
            let record = MedalRecord::from_medal(medal, Some(now));
            let user = user.clone();
            async move { repo.merge_medal(&user, &record).await }
        });
        let results = join_all(writes).await;

        let total = results.len();
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            for err in results.iter().filter_map(|r| r.as_ref().err()) {
                tracing::warn!(error = %err, "medal write failed during sync");
            }
            return Err(SyncError::Partial { failed, total });
        }

        let count = u32::try_from(total).unwrap_or(u32::MAX);
        self.store
            .medals
            .put_stats(
                user,
                &MedalStats {
                    count,
                    updated_at: now,
                },
            )
            .await?;
        Ok(count)
    }

    /// Mirrors a reading position to the remote store.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Store` if the write fails.
    pub async fn push_reading_position(
        &self,
        user: Option<&UserId>,
        book: &BookId,
        position: &ReadingPosition,
    ) -> Result<(), SyncError> {
        let Some(user) = user else {
            return Ok(());
        };
        self.store
            .progress
            .upsert_reading_position(user, book, position)
            .await?;
        Ok(())
    }

    /// Mirrors a completed exercise result to the remote store.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Store` if the write fails.
    pub async fn push_exercise_result(
        &self,
        user: Option<&UserId>,
        result: &ExerciseResult,
    ) -> Result<(), SyncError> {
        let Some(user) = user else {
            return Ok(());
        };
        self.store.progress.upsert_exercise_result(user, result).await?;
        Ok(())
    }

    /// Zeroes the remote aggregate counter after an explicit progress reset.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Store` if the write fails.
    pub async fn reset_remote_stats(&self, user: &UserId) -> Result<(), SyncError> {
        self.store
            .medals
            .put_stats(
                user,
                &MedalStats {
                    count: 0,
                    updated_at: self.clock.now(),
                },
            )
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn store(&self) -> &RemoteStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::MedalRepository;
    use yachay_core::model::{MedalCategory, MedalId};
    use yachay_core::time::{fixed_clock, fixed_now};

    fn medal(id: &str) -> Medal {
        Medal::new(
            MedalId::new(id),
            MedalCategory::Quiz,
            "Reading expert",
            "desc",
            fixed_now(),
        )
    }

    fn service(progress: ProgressTracker) -> SyncService {
        SyncService::new(RemoteStore::in_memory(), progress).with_clock(fixed_clock())
    }

    #[tokio::test]
    async fn guest_paths_are_no_ops() {
        let progress = ProgressTracker::new();
        progress.add_medal(medal("m1"));
        let sync = service(progress.clone());

        assert!(sync.load_medals(None).await.unwrap().is_empty());
        assert_eq!(sync.sync_medals(None).await.unwrap(), 0);
        // local state untouched either way
        assert_eq!(progress.medal_count(), 1);
    }

    #[tokio::test]
    async fn empty_remote_preserves_local_medals() {
        let progress = ProgressTracker::new();
        progress.add_medal(medal("local"));
        let sync = service(progress.clone());

        let loaded = sync.load_medals(Some(&UserId::new("u1"))).await.unwrap();
        assert!(loaded.is_empty());
        assert!(progress.has_medal(&MedalId::new("local")));
    }

    #[tokio::test]
    async fn nonempty_remote_replaces_local_medals() {
        let user = UserId::new("u1");
        let progress = ProgressTracker::new();
        progress.add_medal(medal("local_only"));
        let sync = service(progress.clone());

        for id in ["r1", "r2"] {
            sync.store
                .medals
                .merge_medal(&user, &MedalRecord::from_medal(&medal(id), Some(fixed_now())))
                .await
                .unwrap();
        }

        let loaded = sync.load_medals(Some(&user)).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(progress.medal_count(), 2);
        assert!(!progress.has_medal(&MedalId::new("local_only")));
    }

    #[tokio::test]
    async fn sync_stamps_synced_at_and_writes_stats() {
        let user = UserId::new("u1");
        let progress = ProgressTracker::new();
        progress.add_medal(medal("m1"));
        progress.add_medal(medal("m2"));
        let sync = service(progress);

        assert_eq!(sync.sync_medals(Some(&user)).await.unwrap(), 2);

        let remote = sync.store.medals.list_medals(&user).await.unwrap();
        assert_eq!(remote.len(), 2);
        assert!(remote.iter().all(|r| r.synced_at == Some(fixed_now())));

        let stats = sync.store.medals.get_stats(&user).await.unwrap().unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.updated_at, fixed_now());
    }
}
