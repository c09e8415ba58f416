use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use yachay_core::model::{
    BookId, ExerciseId, Medal, MedalId, ProgressStore, ReadingPosition,
};

/// Shared handle to the in-process [`ProgressStore`].
///
/// The store itself is a plain owned value; this wrapper is the single
/// synchronization boundary around it, so screens and services on any thread
/// see one consistent view. Each operation takes the lock for exactly one
/// store call; callers must not assume atomicity across multiple calls.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<Mutex<ProgressStore>>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, ProgressStore> {
        // Every operation leaves the store structurally valid, so a poisoned
        // lock is still safe to recover.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_reading_position(&self, book_id: BookId, position: ReadingPosition) {
        self.store().record_reading_position(book_id, position);
    }

    pub fn record_exercise_score(&self, exercise_id: ExerciseId, score: u8) {
        self.store().record_exercise_score(exercise_id, score);
    }

    pub fn record_verbal_score(&self, exercise_id: ExerciseId, score: u8) {
        self.store().record_verbal_score(exercise_id, score);
    }

    /// Appends a medal unless one with the same id exists. Returns whether
    /// the medal was inserted.
    pub fn add_medal(&self, medal: Medal) -> bool {
        self.store().add_medal(medal)
    }

    /// Replaces the entire medal list (remote hydration path).
    pub fn replace_medals(&self, medals: Vec<Medal>) {
        self.store().replace_medals(medals);
    }

    /// Clears all progress. Runs synchronously as part of sign-out.
    pub fn clear(&self) {
        self.store().clear();
    }

    #[must_use]
    pub fn medals(&self) -> Vec<Medal> {
        self.store().medals().to_vec()
    }

    #[must_use]
    pub fn medal_count(&self) -> usize {
        self.store().medal_count()
    }

    #[must_use]
    pub fn has_medal(&self, id: &MedalId) -> bool {
        self.store().has_medal(id)
    }

    #[must_use]
    pub fn reading_position(&self, book_id: &BookId) -> Option<ReadingPosition> {
        self.store().reading_position(book_id).copied()
    }

    #[must_use]
    pub fn exercise_score(&self, exercise_id: &ExerciseId) -> Option<u8> {
        self.store().exercise_score(exercise_id)
    }

    #[must_use]
    pub fn verbal_score(&self, exercise_id: &ExerciseId) -> Option<u8> {
        self.store().verbal_score(exercise_id)
    }

    /// Owned copy of the whole store, for read-heavy views.
    #[must_use]
    pub fn snapshot(&self) -> ProgressStore {
        self.store().clone()
    }
}
