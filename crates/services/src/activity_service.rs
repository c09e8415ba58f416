//! Activity-completion handlers.
//!
//! Screens hand finished activities to this service; it updates the local
//! progress tracker, awards medals with deterministic ids, and mirrors the
//! result to the remote store when the session is authenticated. Sync
//! failures are logged and reported in the completion value, never raised —
//! a finished quiz stays finished whether or not the network cooperated.

use std::sync::Arc;

use storage::repository::{ExerciseKind, ExerciseResult};
use yachay_core::Clock;
use yachay_core::model::{
    BookId, ExerciseId, Medal, NarrativeId, Quiz, ReadingPosition, UserId,
};

use crate::progress_tracker::ProgressTracker;
use crate::session_service::SessionService;
use crate::sync_service::SyncService;

/// Minimum quiz score that earns a medal.
pub const PASSING_SCORE: u8 = 80;

/// Outcome of a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizCompletion {
    pub score: u8,
    pub medal_awarded: bool,
    pub synced: bool,
}

/// Outcome of a finished verbal exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbalCompletion {
    pub medal_awarded: bool,
    pub synced: bool,
}

/// Outcome of a narrative reaching its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrativeCompletion {
    pub medal_awarded: bool,
    pub synced: bool,
}

pub struct ActivityService {
    session: Arc<SessionService>,
    progress: ProgressTracker,
    sync: Arc<SyncService>,
    clock: Clock,
}

impl ActivityService {
    #[must_use]
    pub fn new(
        session: Arc<SessionService>,
        progress: ProgressTracker,
        sync: Arc<SyncService>,
    ) -> Self {
        Self {
            session,
            progress,
            sync,
            clock: Clock::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Scores a finished quiz, records the result, and awards the quiz medal
    /// at [`PASSING_SCORE`] and above.
    ///
    /// The medal id is derived from the book, so running the handler twice
    /// for the same quiz can never award twice.
    pub async fn complete_quiz(&self, quiz: &Quiz, answers: &[Option<usize>]) -> QuizCompletion {
        let score = quiz.score(answers);
        let now = self.clock.now();
        let exercise_id = ExerciseId::new(quiz.book_id().as_str());

        self.progress.record_exercise_score(exercise_id.clone(), score);
        let medal_awarded = if score >= PASSING_SCORE {
            self.progress
                .add_medal(Medal::for_quiz(quiz.book_id(), score, now))
        } else {
            false
        };

        let result = ExerciseResult {
            exercise_id,
            kind: ExerciseKind::Quiz,
            score,
            completed_at: now,
        };
        let synced = self.mirror_completion(Some(&result)).await;

        QuizCompletion {
            score,
            medal_awarded,
            synced,
        }
    }

    /// Records a verbal-exercise score and awards its medal unconditionally.
    pub async fn complete_verbal_exercise(
        &self,
        exercise_id: &ExerciseId,
        score: u8,
    ) -> VerbalCompletion {
        let now = self.clock.now();
        self.progress
            .record_verbal_score(exercise_id.clone(), score);
        let medal_awarded = self
            .progress
            .add_medal(Medal::for_verbal(exercise_id, now));

        let result = ExerciseResult {
            exercise_id: exercise_id.clone(),
            kind: ExerciseKind::Verbal,
            score: score.min(100),
            completed_at: now,
        };
        let synced = self.mirror_completion(Some(&result)).await;

        VerbalCompletion {
            medal_awarded,
            synced,
        }
    }

    /// Awards the narrative medal. Callers invoke this when a traversal
    /// reports its terminal state.
    pub async fn complete_narrative(&self, narrative_id: &NarrativeId) -> NarrativeCompletion {
        let medal_awarded = self
            .progress
            .add_medal(Medal::for_narrative(narrative_id, self.clock.now()));
        let synced = self.mirror_completion(None).await;

        NarrativeCompletion {
            medal_awarded,
            synced,
        }
    }

    /// Upserts a reading position locally and mirrors it remotely for
    /// authenticated sessions. Returns whether the remote write happened.
    pub async fn record_reading_progress(
        &self,
        book_id: &BookId,
        position: ReadingPosition,
    ) -> bool {
        self.progress
            .record_reading_position(book_id.clone(), position);

        let user = self.session.current_user_id();
        if user.is_none() {
            return false;
        }
        match self
            .sync
            .push_reading_position(user.as_ref(), book_id, &position)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, book = %book_id, "failed to push reading position");
                false
            }
        }
    }

    /// Hydrates local medals from the remote collection for the current
    /// session. Guests get an empty result and untouched local state.
    pub async fn hydrate_from_remote(&self) -> Vec<Medal> {
        let user = self.session.current_user_id();
        self.sync.load_medals_or_empty(user.as_ref()).await
    }

    /// Clears all local progress and, for authenticated sessions, zeroes the
    /// remote aggregate counter. Returns whether the remote write happened.
    pub async fn reset_progress(&self) -> bool {
        self.progress.clear();

        let Some(user) = self.session.current_user_id() else {
            return false;
        };
        match self.sync.reset_remote_stats(&user).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "failed to reset remote stats");
                false
            }
        }
    }

    /// Pushes an exercise result (if any) and the medal list for the current
    /// session. Guests skip both; failures are logged, not raised.
    async fn mirror_completion(&self, result: Option<&ExerciseResult>) -> bool {
        let user = self.session.current_user_id();
        if user.is_none() {
            return false;
        }

        let mut ok = true;
        if let Some(result) = result {
            if let Err(err) = self.sync.push_exercise_result(user.as_ref(), result).await {
                tracing::warn!(error = %err, "failed to push exercise result");
                ok = false;
            }
        }
        if let Err(err) = self.sync.sync_medals(user.as_ref()).await {
            tracing::warn!(error = %err, "failed to sync medals");
            ok = false;
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::{MedalRepository, RemoteStore};
    use yachay_core::model::{MedalId, QuizQuestion, UserProfile};
    use yachay_core::time::{fixed_clock, fixed_now};

    fn quiz() -> Quiz {
        let questions = [0, 1, 2, 1, 0]
            .iter()
            .map(|&c| QuizQuestion::new("q", vec!["a".into(), "b".into(), "c".into()], c))
            .collect();
        Quiz::new(BookId::new("kuntur"), questions).unwrap()
    }

    fn build() -> (Arc<SessionService>, ProgressTracker, Arc<SyncService>, ActivityService) {
        let progress = ProgressTracker::new();
        let session = Arc::new(SessionService::new(progress.clone()));
        let sync = Arc::new(
            SyncService::new(RemoteStore::in_memory(), progress.clone())
                .with_clock(fixed_clock()),
        );
        let activities = ActivityService::new(
            Arc::clone(&session),
            progress.clone(),
            Arc::clone(&sync),
        )
        .with_clock(fixed_clock());
        (session, progress, sync, activities)
    }

    #[tokio::test]
    async fn passing_quiz_awards_medal_once() {
        let (session, progress, _sync, activities) = build();
        session.continue_as_guest("Amaru");

        let answers = [Some(0), Some(1), Some(2), Some(1), Some(1)];
        let first = activities.complete_quiz(&quiz(), &answers).await;
        assert_eq!(first.score, 80);
        assert!(first.medal_awarded);
        assert!(!first.synced);

        // handler fired again for the same completion
        let second = activities.complete_quiz(&quiz(), &answers).await;
        assert!(!second.medal_awarded);
        assert_eq!(progress.medal_count(), 1);
        assert!(progress.has_medal(&MedalId::new("quiz_kuntur")));
    }

    #[tokio::test]
    async fn failing_quiz_records_score_without_medal() {
        let (session, progress, _sync, activities) = build();
        session.continue_as_guest("Amaru");

        let answers = [Some(0), None, None, None, None];
        let completion = activities.complete_quiz(&quiz(), &answers).await;
        assert_eq!(completion.score, 20);
        assert!(!completion.medal_awarded);
        assert_eq!(progress.medal_count(), 0);
        assert_eq!(
            progress.exercise_score(&ExerciseId::new("kuntur")),
            Some(20)
        );
    }

    #[tokio::test]
    async fn authenticated_completion_reaches_the_remote_store() {
        let (session, _progress, sync, activities) = build();
        session.sign_in(UserProfile::new(UserId::new("u1"), "Quilla", None));

        let answers = [Some(0), Some(1), Some(2), Some(1), Some(0)];
        let completion = activities.complete_quiz(&quiz(), &answers).await;
        assert_eq!(completion.score, 100);
        assert!(completion.synced);

        let remote = sync
            .store()
            .medals
            .list_medals(&UserId::new("u1"))
            .await
            .unwrap();
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0].id, MedalId::new("quiz_kuntur"));
        assert_eq!(remote[0].synced_at, Some(fixed_now()));
    }

    #[tokio::test]
    async fn verbal_exercise_always_awards() {
        let (session, progress, _sync, activities) = build();
        session.continue_as_guest("Amaru");

        let id = ExerciseId::new("saludos");
        let completion = activities.complete_verbal_exercise(&id, 55).await;
        assert!(completion.medal_awarded);
        assert!(progress.has_medal(&MedalId::new("verbal_saludos")));
        assert_eq!(progress.verbal_score(&id), Some(55));
    }

    #[tokio::test]
    async fn narrative_completion_awards_once() {
        let (session, progress, _sync, activities) = build();
        session.continue_as_guest("Amaru");

        let id = NarrativeId::new("atuq");
        assert!(activities.complete_narrative(&id).await.medal_awarded);
        assert!(!activities.complete_narrative(&id).await.medal_awarded);
        assert_eq!(progress.medal_count(), 1);
    }
}
