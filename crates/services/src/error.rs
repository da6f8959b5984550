//! Shared error types for the services crate.

use thiserror::Error;

use course_core::AccessError;
use course_core::model::{CourseError, LessonError, ProfileError, QuizError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::config::ConfigError;

/// Coarse classification handed to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    AlreadyCompleted,
    AlreadyEnrolled,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    /// HTTP status a REST front end should answer with.
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::AlreadyCompleted | ErrorKind::AlreadyEnrolled => 409,
            ErrorKind::InvalidInput => 400,
            ErrorKind::Internal => 500,
        }
    }
}

/// Errors emitted by every service in this crate.
///
/// No variant is retried; callers surface them as-is.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Forbidden(#[from] AccessError),
    #[error("quiz already completed")]
    AlreadyCompleted,
    #[error("already enrolled in this course")]
    AlreadyEnrolled,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("storage failure: {0}")]
    Internal(StorageError),
}

impl ServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::AlreadyCompleted => ErrorKind::AlreadyCompleted,
            ServiceError::AlreadyEnrolled => ErrorKind::AlreadyEnrolled,
            ServiceError::InvalidInput(_) => ErrorKind::InvalidInput,
            ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Classify a failed write whose parent row is `parent`.
    pub(crate) fn from_write(err: StorageError, parent: &'static str) -> Self {
        match err {
            StorageError::MissingReference => ServiceError::NotFound(parent),
            other => other.into(),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => ServiceError::NotFound("record"),
            StorageError::MissingReference => ServiceError::NotFound("referenced record"),
            other => ServiceError::Internal(other),
        }
    }
}

macro_rules! invalid_input_from {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for ServiceError {
                fn from(err: $err) -> Self {
                    ServiceError::InvalidInput(err.to_string())
                }
            }
        )*
    };
}

invalid_input_from!(CourseError, LessonError, QuizError, ProfileError);

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
