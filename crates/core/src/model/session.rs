use serde::{Deserialize, Serialize};

use crate::model::UserId;

/// Profile fields of an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub display_name: String,
    pub email: Option<String>,
}

impl UserProfile {
    #[must_use]
    pub fn new(user_id: UserId, display_name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            email,
        }
    }
}

/// Current session tri-state.
///
/// The source of this model kept `isAuthenticated`/`isGuest` booleans next to
/// a nullable identity; the enum makes the legal combinations the only
/// representable ones: an identity exists exactly when the session is
/// authenticated, and a session is never both guest and authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No session established.
    #[default]
    SignedOut,
    /// Local-only session with a display name and no remote identity.
    Guest { display_name: String },
    /// Session backed by a remote identity.
    Authenticated { profile: UserProfile },
}

impl SessionState {
    #[must_use]
    pub fn signed_out() -> Self {
        Self::SignedOut
    }

    #[must_use]
    pub fn guest(display_name: impl Into<String>) -> Self {
        Self::Guest {
            display_name: display_name.into(),
        }
    }

    #[must_use]
    pub fn authenticated(profile: UserProfile) -> Self {
        Self::Authenticated { profile }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    #[must_use]
    pub fn is_guest(&self) -> bool {
        matches!(self, SessionState::Guest { .. })
    }

    /// Remote user id, present iff authenticated.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            SessionState::Authenticated { profile } => Some(&profile.user_id),
            _ => None,
        }
    }

    /// Name to show in the UI, regardless of session kind.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match self {
            SessionState::SignedOut => None,
            SessionState::Guest { display_name } => Some(display_name),
            SessionState::Authenticated { profile } => Some(&profile.display_name),
        }
    }
}
