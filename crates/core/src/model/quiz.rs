use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{LessonId, QuizId, QuizResultId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz question cannot be empty")]
    EmptyQuestion,

    #[error("quiz needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("quiz options cannot be blank")]
    BlankOption,

    #[error("duplicate quiz option: {0}")]
    DuplicateOption(String),

    #[error("answer does not match any option")]
    AnswerNotAnOption,
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Unvalidated input for a new quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDraft {
    pub lesson_id: LessonId,
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

/// A gradable question tied to one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub lesson_id: LessonId,
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    /// Validate a draft into a quiz.
    ///
    /// Options are trimmed; the answer must equal one of them after trimming.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for a blank question, fewer than two options,
    /// blank or duplicate options, or an answer outside the option set.
    pub fn new(id: QuizId, draft: QuizDraft, created_at: DateTime<Utc>) -> Result<Self, QuizError> {
        let question = draft.question.trim().to_owned();
        if question.is_empty() {
            return Err(QuizError::EmptyQuestion);
        }
        if draft.options.len() < 2 {
            return Err(QuizError::TooFewOptions(draft.options.len()));
        }

        let mut seen = HashSet::new();
        let mut options = Vec::with_capacity(draft.options.len());
        for option in draft.options {
            let option = option.trim().to_owned();
            if option.is_empty() {
                return Err(QuizError::BlankOption);
            }
            if !seen.insert(option.clone()) {
                return Err(QuizError::DuplicateOption(option));
            }
            options.push(option);
        }

        let answer = draft.answer.trim().to_owned();
        if !seen.contains(&answer) {
            return Err(QuizError::AnswerNotAnOption);
        }

        Ok(Self {
            id,
            lesson_id: draft.lesson_id,
            question,
            options,
            answer,
            created_at,
        })
    }

    /// Returns true if `choice` is the correct answer.
    #[must_use]
    pub fn is_correct(&self, choice: &str) -> bool {
        self.answer == choice.trim()
    }
}

//
// ─── QUIZ RESULT ───────────────────────────────────────────────────────────────
//

/// A recorded completion of a quiz by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: QuizResultId,
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub score: i64,
    pub completed_at: DateTime<Utc>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft(options: &[&str], answer: &str) -> QuizDraft {
        QuizDraft {
            lesson_id: LessonId::new(1),
            question: "2 + 2?".into(),
            options: options.iter().map(|o| (*o).to_owned()).collect(),
            answer: answer.into(),
        }
    }

    #[test]
    fn valid_quiz_trims_options_and_answer() {
        let quiz = Quiz::new(QuizId::new(1), draft(&[" 3", "4 "], " 4"), fixed_now()).unwrap();
        assert_eq!(quiz.options, vec!["3", "4"]);
        assert_eq!(quiz.answer, "4");
        assert!(quiz.is_correct("4"));
        assert!(!quiz.is_correct("3"));
    }

    #[test]
    fn single_option_is_rejected() {
        let err = Quiz::new(QuizId::new(1), draft(&["4"], "4"), fixed_now()).unwrap_err();
        assert_eq!(err, QuizError::TooFewOptions(1));
    }

    #[test]
    fn duplicate_option_is_rejected() {
        let err = Quiz::new(QuizId::new(1), draft(&["4", " 4"], "4"), fixed_now()).unwrap_err();
        assert_eq!(err, QuizError::DuplicateOption("4".into()));
    }

    #[test]
    fn answer_outside_options_is_rejected() {
        let err = Quiz::new(QuizId::new(1), draft(&["3", "5"], "4"), fixed_now()).unwrap_err();
        assert_eq!(err, QuizError::AnswerNotAnOption);
    }
}
