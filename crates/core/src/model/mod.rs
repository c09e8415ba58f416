mod ids;
mod medal;
mod progress;
mod quiz;
mod session;

pub use ids::{BookId, ExerciseId, MedalId, NarrativeId, UserId};
pub use medal::{Medal, MedalCategory, ParseCategoryError};
pub use progress::{ProgressStore, ReadingPosition};
pub use quiz::{Quiz, QuizError, QuizQuestion};
pub use session::{SessionState, UserProfile};
