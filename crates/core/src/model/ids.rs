use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new id from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the id, returning the owned string.
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Opaque identifier of an authenticated user, assigned by the identity provider.
    UserId,
    "UserId"
);

string_id!(
    /// Identifier of a reading-content item (book).
    BookId,
    "BookId"
);

string_id!(
    /// Identifier of a quiz or verbal exercise.
    ExerciseId,
    "ExerciseId"
);

string_id!(
    /// Identifier of a branching narrative.
    NarrativeId,
    "NarrativeId"
);

string_id!(
    /// Identifier of an earned medal. Deterministic per accomplishment, so
    /// repeated completions map to the same id.
    MedalId,
    "MedalId"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_raw_value() {
        let id = BookId::new("kuntur");
        assert_eq!(id.to_string(), "kuntur");
    }

    #[test]
    fn debug_is_labeled() {
        let id = MedalId::new("quiz_kuntur");
        assert_eq!(format!("{id:?}"), "MedalId(quiz_kuntur)");
    }

    #[test]
    fn ids_round_trip_through_strings() {
        let original = UserId::new("u-42");
        let raw = original.clone().into_string();
        assert_eq!(UserId::from(raw), original);
    }

    #[test]
    fn serde_is_transparent() {
        let id = ExerciseId::new("verbal-3");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"verbal-3\"");
    }
}
