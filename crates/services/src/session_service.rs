use std::sync::{Mutex, MutexGuard, PoisonError};

use yachay_core::model::{SessionState, UserId, UserProfile};

use crate::progress_tracker::ProgressTracker;

/// Owns the current session state and its coupling to local progress.
///
/// The one cross-component invariant lives here: ending a session clears the
/// progress tracker synchronously, so a later sign-in can never observe the
/// previous user's local medals or scores.
pub struct SessionService {
    state: Mutex<SessionState>,
    progress: ProgressTracker,
}

impl SessionService {
    #[must_use]
    pub fn new(progress: ProgressTracker) -> Self {
        Self {
            state: Mutex::new(SessionState::SignedOut),
            progress,
        }
    }

    fn state_guard(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Establishes an authenticated session.
    pub fn sign_in(&self, profile: UserProfile) {
        *self.state_guard() = SessionState::authenticated(profile);
    }

    /// Establishes a local-only guest session. Guests never sync.
    pub fn continue_as_guest(&self, display_name: impl Into<String>) {
        *self.state_guard() = SessionState::guest(display_name);
    }

    /// Ends the session and clears all local progress before returning.
    pub fn sign_out(&self) {
        {
            let mut state = self.state_guard();
            *state = SessionState::SignedOut;
        }
        self.progress.clear();
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state_guard().clone()
    }

    /// Remote user id, present iff the session is authenticated.
    #[must_use]
    pub fn current_user_id(&self) -> Option<UserId> {
        self.state_guard().user_id().cloned()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state_guard().is_authenticated()
    }

    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.state_guard().is_guest()
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yachay_core::model::{ExerciseId, Medal, MedalCategory, MedalId};
    use yachay_core::time::fixed_now;

    fn profile() -> UserProfile {
        UserProfile::new(UserId::new("u-1"), "Quilla", None)
    }

    #[test]
    fn transitions_cover_the_tri_state() {
        let service = SessionService::new(ProgressTracker::new());
        assert!(!service.is_authenticated());
        assert!(!service.is_guest());

        service.continue_as_guest("Amaru");
        assert!(service.is_guest());
        assert_eq!(service.current_user_id(), None);

        service.sign_in(profile());
        assert!(service.is_authenticated());
        assert_eq!(service.current_user_id(), Some(UserId::new("u-1")));
    }

    #[test]
    fn sign_out_clears_progress_synchronously() {
        let progress = ProgressTracker::new();
        let service = SessionService::new(progress.clone());
        service.sign_in(profile());

        progress.record_exercise_score(ExerciseId::new("e1"), 90);
        progress.add_medal(Medal::new(
            MedalId::new("m1"),
            MedalCategory::Other,
            "Test",
            "Test medal",
            fixed_now(),
        ));

        service.sign_out();
        assert!(!service.is_authenticated());
        assert_eq!(progress.medal_count(), 0);
        assert!(progress.exercise_score(&ExerciseId::new("e1")).is_none());
    }
}
