use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("course description cannot be empty")]
    EmptyDescription,
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Unvalidated input for a new course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
}

impl CourseDraft {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            image: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Partial update for an existing course.
///
/// Fields left as `None` (or blank) keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A container of ordered lessons owned by an instructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    id: CourseId,
    owner_id: UserId,
    title: String,
    description: String,
    image: Option<String>,
    created_at: DateTime<Utc>,
}

impl Course {
    /// Validate a draft into a course owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if the title or description is blank.
    pub fn new(
        id: CourseId,
        owner_id: UserId,
        draft: CourseDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        let title = draft.title.trim().to_owned();
        if title.is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        let description = draft.description.trim().to_owned();
        if description.is_empty() {
            return Err(CourseError::EmptyDescription);
        }

        Ok(Self {
            id,
            owner_id,
            title,
            description,
            image: non_blank(draft.image),
            created_at,
        })
    }

    /// Apply a partial update, returning the updated course.
    #[must_use]
    pub fn apply_patch(mut self, patch: CoursePatch) -> Self {
        if let Some(title) = non_blank(patch.title) {
            self.title = title;
        }
        if let Some(description) = non_blank(patch.description) {
            self.description = description;
        }
        if let Some(image) = non_blank(patch.image) {
            self.image = Some(image);
        }
        self
    }

    /// Returns a copy with the identifier assigned by storage.
    #[must_use]
    pub fn with_id(mut self, id: CourseId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn owner_id(&self) -> UserId {
        self.owner_id
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
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
