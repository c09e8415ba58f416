use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{BookId, ExerciseId, Medal, MedalId};

/// Position within a reading-content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingPosition {
    pub current_unit: u32,
    pub total_units: u32,
    pub last_accessed: DateTime<Utc>,
}

impl ReadingPosition {
    #[must_use]
    pub fn new(current_unit: u32, total_units: u32, last_accessed: DateTime<Utc>) -> Self {
        Self {
            current_unit,
            total_units,
            last_accessed,
        }
    }

    /// Completion percentage, rounded to the nearest whole percent.
    #[must_use]
    pub fn percent_complete(&self) -> u8 {
        if self.total_units == 0 {
            return 0;
        }
        let pct = (f64::from(self.current_unit) / f64::from(self.total_units)) * 100.0;
        pct.round().clamp(0.0, 100.0) as u8
    }
}

/// In-process view of a user's activity progress and earned medals.
///
/// Holds four collections: reading positions, quiz scores, verbal-exercise
/// scores, and the ordered medal list. The medal list never contains two
/// entries with the same id; `add_medal` enforces this on every insert.
///
/// The store itself is a plain owned value. Shared access is the caller's
/// concern (the services layer wraps it in a mutex).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressStore {
    reading: HashMap<BookId, ReadingPosition>,
    exercises: HashMap<ExerciseId, u8>,
    verbal: HashMap<ExerciseId, u8>,
    medals: Vec<Medal>,
}

impl ProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the reading position for a book. Last writer wins.
    pub fn record_reading_position(&mut self, book_id: BookId, position: ReadingPosition) {
        self.reading.insert(book_id, position);
    }

    /// Upserts a quiz score. Scores above 100 are clamped.
    pub fn record_exercise_score(&mut self, exercise_id: ExerciseId, score: u8) {
        self.exercises.insert(exercise_id, score.min(100));
    }

    /// Upserts a verbal-exercise score. Scores above 100 are clamped.
    pub fn record_verbal_score(&mut self, exercise_id: ExerciseId, score: u8) {
        self.verbal.insert(exercise_id, score.min(100));
    }

    /// Appends a medal unless one with the same id already exists.
    ///
    /// Returns `true` if the medal was inserted. Completion handlers may fire
    /// more than once for the same logical event; the duplicate insert is a
    /// silent no-op rather than an error.
    pub fn add_medal(&mut self, medal: Medal) -> bool {
        if self.medals.iter().any(|m| m.id() == medal.id()) {
            return false;
        }
        self.medals.push(medal);
        true
    }

    /// Replaces the entire medal list, preserving the given order.
    ///
    /// Used when hydrating from the remote collection. Prior local content is
    /// discarded, not merged.
    pub fn replace_medals(&mut self, medals: Vec<Medal>) {
        self.medals = medals;
    }

    /// Resets all four collections to empty.
    ///
    /// Must run synchronously as part of sign-out so the next session never
    /// observes the previous user's local state.
    pub fn clear(&mut self) {
        self.reading.clear();
        self.exercises.clear();
        self.verbal.clear();
        self.medals.clear();
    }

    #[must_use]
    pub fn reading_position(&self, book_id: &BookId) -> Option<&ReadingPosition> {
        self.reading.get(book_id)
    }

    #[must_use]
    pub fn exercise_score(&self, exercise_id: &ExerciseId) -> Option<u8> {
        self.exercises.get(exercise_id).copied()
    }

    #[must_use]
    pub fn verbal_score(&self, exercise_id: &ExerciseId) -> Option<u8> {
        self.verbal.get(exercise_id).copied()
    }

    #[must_use]
    pub fn medals(&self) -> &[Medal] {
        &self.medals
    }

    #[must_use]
    pub fn has_medal(&self, id: &MedalId) -> bool {
        self.medals.iter().any(|m| m.id() == id)
    }

    #[must_use]
    pub fn medal_count(&self) -> usize {
        self.medals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reading.is_empty()
            && self.exercises.is_empty()
            && self.verbal.is_empty()
            && self.medals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BookId, MedalCategory};
    use crate::time::fixed_now;

    fn medal(id: &str) -> Medal {
        Medal::new(
            MedalId::new(id),
            MedalCategory::Other,
            "Test",
            "Test medal",
            fixed_now(),
        )
    }

    #[test]
    fn add_medal_dedups_by_id() {
        let mut store = ProgressStore::new();
        assert!(store.add_medal(medal("quiz_a")));
        assert!(!store.add_medal(medal("quiz_a")));
        assert!(!store.add_medal(medal("quiz_a")));
        assert_eq!(store.medal_count(), 1);
    }

    #[test]
    fn replace_discards_prior_medals_and_keeps_order() {
        let mut store = ProgressStore::new();
        store.add_medal(medal("local_only"));

        let remote = vec![medal("r2"), medal("r1"), medal("r3")];
        store.replace_medals(remote.clone());

        assert_eq!(store.medals(), remote.as_slice());
        assert!(!store.has_medal(&MedalId::new("local_only")));
    }

    #[test]
    fn clear_empties_every_collection() {
        let mut store = ProgressStore::new();
        store.record_reading_position(
            BookId::new("b1"),
            ReadingPosition::new(3, 10, fixed_now()),
        );
        store.record_exercise_score(ExerciseId::new("e1"), 90);
        store.record_verbal_score(ExerciseId::new("v1"), 70);
        store.add_medal(medal("m1"));
        assert!(!store.is_empty());

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.medals().len(), 0);
        assert!(store.reading_position(&BookId::new("b1")).is_none());
        assert!(store.exercise_score(&ExerciseId::new("e1")).is_none());
        assert!(store.verbal_score(&ExerciseId::new("v1")).is_none());
    }

    #[test]
    fn scores_clamp_at_one_hundred() {
        let mut store = ProgressStore::new();
        store.record_exercise_score(ExerciseId::new("e1"), 250);
        assert_eq!(store.exercise_score(&ExerciseId::new("e1")), Some(100));
    }

    #[test]
    fn reading_percent_rounds() {
        let pos = ReadingPosition::new(1, 3, fixed_now());
        assert_eq!(pos.percent_complete(), 33);
        let done = ReadingPosition::new(3, 3, fixed_now());
        assert_eq!(done.percent_complete(), 100);
        let empty = ReadingPosition::new(0, 0, fixed_now());
        assert_eq!(empty.percent_complete(), 0);
    }
}
