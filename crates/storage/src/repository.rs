use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use yachay_core::model::{
    BookId, ExerciseId, Medal, MedalCategory, MedalId, ReadingPosition, UserId,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for a medal.
///
/// Mirrors the domain `Medal` plus the `synced_at` stamp the sync service
/// writes. Completion handlers never set `synced_at`; a `None` means the
/// record has only ever lived locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalRecord {
    pub id: MedalId,
    pub category: MedalCategory,
    pub title: String,
    pub description: String,
    pub earned_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl MedalRecord {
    #[must_use]
    pub fn from_medal(medal: &Medal, synced_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: medal.id().clone(),
            category: medal.category(),
            title: medal.title().to_owned(),
            description: medal.description().to_owned(),
            earned_at: medal.earned_at(),
            synced_at,
        }
    }

    #[must_use]
    pub fn into_medal(self) -> Medal {
        Medal::new(
            self.id,
            self.category,
            self.title,
            self.description,
            self.earned_at,
        )
    }
}

/// Per-user aggregate medal counter, stored at a fixed location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalStats {
    pub count: u32,
    pub updated_at: DateTime<Utc>,
}

/// Which activity family produced an exercise result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Quiz,
    Verbal,
}

impl ExerciseKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::Quiz => "quiz",
            ExerciseKind::Verbal => "verbal",
        }
    }
}

/// Decodes a stored kind label. Shared by the storage adapters.
pub(crate) fn parse_kind(s: &str) -> Result<ExerciseKind, StoreError> {
    match s {
        "quiz" => Ok(ExerciseKind::Quiz),
        "verbal" => Ok(ExerciseKind::Verbal),
        _ => Err(StoreError::Serialization(format!("invalid kind: {s}"))),
    }
}

/// Decodes a stored score, enforcing the 0..=100 range. Shared by the
/// storage adapters.
pub(crate) fn score_from_i64(v: i64) -> Result<u8, StoreError> {
    u8::try_from(v)
        .ok()
        .filter(|s| *s <= 100)
        .ok_or_else(|| StoreError::Serialization(format!("invalid score: {v}")))
}

/// Persisted outcome of a completed quiz or verbal exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseResult {
    pub exercise_id: ExerciseId,
    pub kind: ExerciseKind,
    pub score: u8,
    pub completed_at: DateTime<Utc>,
}

/// Repository contract for the per-user medal collection and its aggregate
/// counter document.
#[async_trait]
pub trait MedalRepository: Send + Sync {
    /// Fetch every medal document in the user's collection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on fetch failure. An empty collection is `Ok` with
    /// an empty vec, not an error.
    async fn list_medals(&self, user: &UserId) -> Result<Vec<MedalRecord>, StoreError>;

    /// Upsert a medal document keyed by its id, merging over any existing
    /// fields.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    async fn merge_medal(&self, user: &UserId, record: &MedalRecord) -> Result<(), StoreError>;

    /// Fetch the user's aggregate counter, if one has ever been written.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on fetch failure.
    async fn get_stats(&self, user: &UserId) -> Result<Option<MedalStats>, StoreError>;

    /// Overwrite the user's aggregate counter.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    async fn put_stats(&self, user: &UserId, stats: &MedalStats) -> Result<(), StoreError>;
}

/// Repository contract for per-user reading positions and exercise results.
///
/// In the source application these were written straight from screens; here
/// they share the storage boundary with medals so there is a single sync
/// path.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    async fn upsert_reading_position(
        &self,
        user: &UserId,
        book: &BookId,
        position: &ReadingPosition,
    ) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError` on fetch failure; a missing position is `Ok(None)`.
    async fn get_reading_position(
        &self,
        user: &UserId,
        book: &BookId,
    ) -> Result<Option<ReadingPosition>, StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    async fn upsert_exercise_result(
        &self,
        user: &UserId,
        result: &ExerciseResult,
    ) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError` on fetch failure.
    async fn list_exercise_results(&self, user: &UserId) -> Result<Vec<ExerciseResult>, StoreError>;
}

/// Aggregates the per-user repositories behind trait objects so backends can
/// be swapped without touching the services layer.
#[derive(Clone)]
pub struct RemoteStore {
    pub medals: Arc<dyn MedalRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl RemoteStore {
    #[must_use]
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        let medals: Arc<dyn MedalRepository> = Arc::new(store.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(store);
        Self { medals, progress }
    }
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    medals: Arc<Mutex<HashMap<(UserId, MedalId), MedalRecord>>>,
    stats: Arc<Mutex<HashMap<UserId, MedalStats>>>,
    reading: Arc<Mutex<HashMap<(UserId, BookId), ReadingPosition>>>,
    exercises: Arc<Mutex<HashMap<(UserId, ExerciseId), ExerciseResult>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MedalRepository for InMemoryStore {
    async fn list_medals(&self, user: &UserId) -> Result<Vec<MedalRecord>, StoreError> {
        let guard = self
            .medals
            .lock()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let mut records: Vec<MedalRecord> = guard
            .iter()
            .filter(|((u, _), _)| u == user)
            .map(|(_, record)| record.clone())
            .collect();
        // Same ordering as the SQLite adapter's `ORDER BY earned_at, medal_id`.
        records.sort_by(|a, b| a.earned_at.cmp(&b.earned_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn merge_medal(&self, user: &UserId, record: &MedalRecord) -> Result<(), StoreError> {
        let mut guard = self
            .medals
            .lock()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        guard.insert((user.clone(), record.id.clone()), record.clone());
        Ok(())
    }

    async fn get_stats(&self, user: &UserId) -> Result<Option<MedalStats>, StoreError> {
        let guard = self
            .stats
            .lock()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(guard.get(user).copied())
    }

    async fn put_stats(&self, user: &UserId, stats: &MedalStats) -> Result<(), StoreError> {
        let mut guard = self
            .stats
            .lock()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        guard.insert(user.clone(), *stats);
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryStore {
    async fn upsert_reading_position(
        &self,
        user: &UserId,
        book: &BookId,
        position: &ReadingPosition,
    ) -> Result<(), StoreError> {
        let mut guard = self
            .reading
            .lock()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        guard.insert((user.clone(), book.clone()), *position);
        Ok(())
    }

    async fn get_reading_position(
        &self,
        user: &UserId,
        book: &BookId,
    ) -> Result<Option<ReadingPosition>, StoreError> {
        let guard = self
            .reading
            .lock()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(guard.get(&(user.clone(), book.clone())).copied())
    }

    async fn upsert_exercise_result(
        &self,
        user: &UserId,
        result: &ExerciseResult,
    ) -> Result<(), StoreError> {
        let mut guard = self
            .exercises
            .lock()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        guard.insert((user.clone(), result.exercise_id.clone()), result.clone());
        Ok(())
    }

    async fn list_exercise_results(&self, user: &UserId) -> Result<Vec<ExerciseResult>, StoreError> {
        let guard = self
            .exercises
            .lock()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let mut results: Vec<ExerciseResult> = guard
            .iter()
            .filter(|((u, _), _)| u == user)
            .map(|(_, r)| r.clone())
            .collect();
        results.sort_by(|a, b| {
            a.completed_at
                .cmp(&b.completed_at)
                .then_with(|| a.exercise_id.cmp(&b.exercise_id))
        });
        Ok(results)
    }
}
