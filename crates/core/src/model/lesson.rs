use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, LessonId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("lesson content cannot be empty")]
    EmptyContent,
}

/// Unvalidated input for creating or replacing a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDraft {
    pub course_id: CourseId,
    pub title: String,
    pub content: String,
    pub order: i32,
    pub image: Option<String>,
}

impl LessonDraft {
    #[must_use]
    pub fn new(
        course_id: CourseId,
        title: impl Into<String>,
        content: impl Into<String>,
        order: i32,
    ) -> Self {
        Self {
            course_id,
            title: title.into(),
            content: content.into(),
            order,
            image: None,
        }
    }
}

/// An ordered unit of content within a course.
///
/// `order` is a sort key only; several lessons may share a value and gaps are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub content: String,
    pub order: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Lesson {
    /// Validate a draft into a lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the title or content is blank.
    pub fn new(
        id: LessonId,
        draft: LessonDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LessonError> {
        let title = draft.title.trim().to_owned();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        if draft.content.trim().is_empty() {
            return Err(LessonError::EmptyContent);
        }

        Ok(Self {
            id,
            course_id: draft.course_id,
            title,
            content: draft.content,
            order: draft.order,
            image: draft
                .image
                .map(|i| i.trim().to_owned())
                .filter(|i| !i.is_empty()),
            created_at,
        })
    }
}

/// Sort lessons the way a course presents them: by `order`, ties broken by id.
pub fn sort_lessons(lessons: &mut [Lesson]) {
    lessons.sort_by_key(|l| (l.order, l.id));
}
