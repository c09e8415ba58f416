use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{BookId, ExerciseId, MedalId, NarrativeId};

/// Activity family a medal was earned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedalCategory {
    Quiz,
    Verbal,
    Narrative,
    Other,
}

impl MedalCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MedalCategory::Quiz => "quiz",
            MedalCategory::Verbal => "verbal",
            MedalCategory::Narrative => "narrative",
            MedalCategory::Other => "other",
        }
    }
}

/// Error returned when a stored category label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError {
    raw: String,
}

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown medal category: {}", self.raw)
    }
}

impl std::error::Error for ParseCategoryError {}

impl FromStr for MedalCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quiz" => Ok(MedalCategory::Quiz),
            "verbal" => Ok(MedalCategory::Verbal),
            "narrative" => Ok(MedalCategory::Narrative),
            "other" => Ok(MedalCategory::Other),
            _ => Err(ParseCategoryError { raw: s.to_string() }),
        }
    }
}

/// An earned, one-time accomplishment.
///
/// Medal ids are deterministic per accomplishment (`quiz_<book>`,
/// `verbal_<exercise>`, `narrative_<narrative>`), which is what makes the
/// progress store's dedup check effective when a completion handler fires
/// more than once for the same logical event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medal {
    id: MedalId,
    category: MedalCategory,
    title: String,
    description: String,
    earned_at: DateTime<Utc>,
}

impl Medal {
    #[must_use]
    pub fn new(
        id: MedalId,
        category: MedalCategory,
        title: impl Into<String>,
        description: impl Into<String>,
        earned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            category,
            title: title.into(),
            description: description.into(),
            earned_at,
        }
    }

    /// Medal awarded for finishing a book quiz with a passing score.
    #[must_use]
    pub fn for_quiz(book_id: &BookId, score: u8, earned_at: DateTime<Utc>) -> Self {
        Self::new(
            MedalId::new(format!("quiz_{book_id}")),
            MedalCategory::Quiz,
            "Reading expert",
            format!("Completed the reading and quiz with a score of {score}%"),
            earned_at,
        )
    }

    /// Medal awarded for finishing a verbal exercise.
    #[must_use]
    pub fn for_verbal(exercise_id: &ExerciseId, earned_at: DateTime<Utc>) -> Self {
        Self::new(
            MedalId::new(format!("verbal_{exercise_id}")),
            MedalCategory::Verbal,
            "Confident speaker",
            "Completed a verbal exercise out loud",
            earned_at,
        )
    }

    /// Medal awarded for reaching the end of a branching narrative.
    #[must_use]
    pub fn for_narrative(narrative_id: &NarrativeId, earned_at: DateTime<Utc>) -> Self {
        Self::new(
            MedalId::new(format!("narrative_{narrative_id}")),
            MedalCategory::Narrative,
            "Storyteller",
            "Followed an interactive story to one of its endings",
            earned_at,
        )
    }

    #[must_use]
    pub fn id(&self) -> &MedalId {
        &self.id
    }

    #[must_use]
    pub fn category(&self) -> MedalCategory {
        self.category
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn earned_at(&self) -> DateTime<Utc> {
        self.earned_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn quiz_medal_id_is_deterministic() {
        let book = BookId::new("kuntur");
        let a = Medal::for_quiz(&book, 80, fixed_now());
        let b = Medal::for_quiz(&book, 100, fixed_now());
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().as_str(), "quiz_kuntur");
        assert_eq!(a.category(), MedalCategory::Quiz);
    }

    #[test]
    fn verbal_and_narrative_ids_carry_prefixes() {
        let verbal = Medal::for_verbal(&ExerciseId::new("v1"), fixed_now());
        assert_eq!(verbal.id().as_str(), "verbal_v1");

        let narrative = Medal::for_narrative(&NarrativeId::new("n1"), fixed_now());
        assert_eq!(narrative.id().as_str(), "narrative_n1");
    }

    #[test]
    fn category_round_trips_through_labels() {
        for category in [
            MedalCategory::Quiz,
            MedalCategory::Verbal,
            MedalCategory::Narrative,
            MedalCategory::Other,
        ] {
            assert_eq!(category.as_str().parse::<MedalCategory>().unwrap(), category);
        }
        assert!("trophy".parse::<MedalCategory>().is_err());
    }
}
