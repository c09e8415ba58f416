use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::BookId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    NoQuestions,
}

/// A multiple-choice question. `correct_answer` indexes into `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

impl QuizQuestion {
    #[must_use]
    pub fn new(prompt: impl Into<String>, options: Vec<String>, correct_answer: usize) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            correct_answer,
        }
    }
}

/// The quiz attached to a reading-content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    book_id: BookId,
    questions: Vec<QuizQuestion>,
}

impl Quiz {
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` for an empty question list.
    pub fn new(book_id: BookId, questions: Vec<QuizQuestion>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        Ok(Self { book_id, questions })
    }

    #[must_use]
    pub fn book_id(&self) -> &BookId {
        &self.book_id
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Scores a set of answers as a whole percentage: `round(100 * correct / total)`.
    ///
    /// `answers[i]` is the chosen option index for question `i`; `None`,
    /// missing, or out-of-range answers count as incorrect.
    #[must_use]
    pub fn score(&self, answers: &[Option<usize>]) -> u8 {
        let correct = self
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| answers.get(*i).copied().flatten() == Some(q.correct_answer))
            .count();

        let pct = (correct as f64 / self.questions.len() as f64) * 100.0;
        pct.round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz_with_answers(correct: &[usize]) -> Quiz {
        let questions = correct
            .iter()
            .map(|&c| {
                QuizQuestion::new(
                    "q",
                    vec!["a".into(), "b".into(), "c".into()],
                    c,
                )
            })
            .collect();
        Quiz::new(BookId::new("b1"), questions).unwrap()
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let err = Quiz::new(BookId::new("b1"), Vec::new()).unwrap_err();
        assert!(matches!(err, QuizError::NoQuestions));
    }

    #[test]
    fn four_of_five_scores_eighty() {
        let quiz = quiz_with_answers(&[0, 1, 2, 1, 0]);
        let answers = [Some(0), Some(1), Some(2), Some(1), Some(1)];
        assert_eq!(quiz.score(&answers), 80);
    }

    #[test]
    fn perfect_and_blank_sheets() {
        let quiz = quiz_with_answers(&[0, 1, 2]);
        assert_eq!(quiz.score(&[Some(0), Some(1), Some(2)]), 100);
        assert_eq!(quiz.score(&[]), 0);
        assert_eq!(quiz.score(&[None, None, None]), 0);
    }

    #[test]
    fn one_of_three_rounds_to_thirty_three() {
        let quiz = quiz_with_answers(&[0, 0, 0]);
        assert_eq!(quiz.score(&[Some(0), Some(1), Some(1)]), 33);
    }

    #[test]
    fn two_of_three_rounds_to_sixty_seven() {
        let quiz = quiz_with_answers(&[0, 0, 0]);
        assert_eq!(quiz.score(&[Some(0), Some(0), Some(1)]), 67);
    }
}
