use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_core::model::{
    Course, CourseId, Enrollment, EnrollmentId, Lesson, LessonId, Profile, Quiz, QuizId, QuizResult,
    QuizResultId, User, UserId,
};
use thiserror::Error;

pub use crate::memory::InMemoryRepository;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint rejected the write.
    #[error("duplicate record")]
    Duplicate,

    /// The parent row a write points at does not exist.
    #[error("referenced record is missing")]
    MissingReference,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── INSERT RECORDS ────────────────────────────────────────────────────────────
//

/// Insert shape for a course; storage assigns the id.
#[derive(Debug, Clone)]
pub struct NewCourseRecord {
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewCourseRecord {
    #[must_use]
    pub fn from_course(course: &Course) -> Self {
        Self {
            owner_id: course.owner_id(),
            title: course.title().to_owned(),
            description: course.description().to_owned(),
            image: course.image().map(str::to_owned),
            created_at: course.created_at(),
        }
    }
}

/// Insert shape for a lesson; storage assigns the id.
#[derive(Debug, Clone)]
pub struct NewLessonRecord {
    pub course_id: CourseId,
    pub title: String,
    pub content: String,
    pub order: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewLessonRecord {
    #[must_use]
    pub fn from_lesson(lesson: &Lesson) -> Self {
        Self {
            course_id: lesson.course_id,
            title: lesson.title.clone(),
            content: lesson.content.clone(),
            order: lesson.order,
            image: lesson.image.clone(),
            created_at: lesson.created_at,
        }
    }
}

/// Insert shape for a quiz; storage assigns the id.
#[derive(Debug, Clone)]
pub struct NewQuizRecord {
    pub lesson_id: LessonId,
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl NewQuizRecord {
    #[must_use]
    pub fn from_quiz(quiz: &Quiz) -> Self {
        Self {
            lesson_id: quiz.lesson_id,
            question: quiz.question.clone(),
            options: quiz.options.clone(),
            answer: quiz.answer.clone(),
            created_at: quiz.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewQuizResultRecord {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub score: i64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewEnrollmentRecord {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
}

/// First sign-in of a user: account row plus initial profile.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub subject: String,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Repository contract for courses.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Insert a new course and return its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn insert_course(&self, course: NewCourseRecord) -> Result<CourseId, StorageError>;

    /// Fetch a course by ID; `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// All courses ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// Courses created by `owner`, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn courses_by_owner(&self, owner: UserId) -> Result<Vec<Course>, StorageError>;

    /// Overwrite the mutable fields of an existing course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course does not exist.
    async fn update_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Delete a course together with its lessons, quizzes, results, and enrollments.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course does not exist.
    async fn delete_course(&self, id: CourseId) -> Result<(), StorageError>;
}

/// Repository contract for lessons.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::MissingReference` if the course does not exist.
    async fn insert_lesson(&self, lesson: NewLessonRecord) -> Result<LessonId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;

    /// Lessons of a course sorted by `(order, id)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the lesson does not exist.
    async fn update_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// Delete a lesson together with its quizzes and their results.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the lesson does not exist.
    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError>;
}

/// Repository contract for quizzes and the course-level projections progress needs.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::MissingReference` if the lesson does not exist.
    async fn insert_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn quizzes_for_lesson(&self, lesson_id: LessonId) -> Result<Vec<Quiz>, StorageError>;

    /// Delete a quiz together with its results.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz does not exist.
    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError>;

    /// Number of quizzes whose lesson belongs to the course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn count_quizzes_in_course(&self, course_id: CourseId) -> Result<u64, StorageError>;

    /// IDs of quizzes whose lesson belongs to the course, ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn quizzes_in_course(&self, course_id: CourseId) -> Result<Vec<QuizId>, StorageError>;

    /// Course a quiz belongs to, through its lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn course_of_quiz(&self, quiz_id: QuizId) -> Result<Option<CourseId>, StorageError>;
}

//
// ─── LEDGER ────────────────────────────────────────────────────────────────────
//

/// Repository contract for recorded quiz completions.
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn result_exists(&self, user_id: UserId, quiz_id: QuizId) -> Result<bool, StorageError>;

    /// Insert a completion. At most one row exists per `(user, quiz)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Duplicate` if the user already has a result for the quiz.
    /// Returns `StorageError::MissingReference` if the quiz does not exist.
    async fn insert_result(&self, result: NewQuizResultRecord) -> Result<QuizResultId, StorageError>;

    /// Distinct quizzes of the course the user has a result for.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn count_distinct_completed(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<u64, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn get_result(&self, id: QuizResultId) -> Result<Option<QuizResult>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn results_for_user(&self, user_id: UserId) -> Result<Vec<QuizResult>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the result does not exist.
    async fn delete_result(&self, id: QuizResultId) -> Result<(), StorageError>;
}

//
// ─── ENROLLMENTS ───────────────────────────────────────────────────────────────
//

/// Repository contract for enrollments and their cached progress.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Insert an enrollment with progress `0.0`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Duplicate` if the pair is already enrolled.
    /// Returns `StorageError::MissingReference` if the course does not exist.
    async fn insert_enrollment(
        &self,
        enrollment: NewEnrollmentRecord,
    ) -> Result<EnrollmentId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn find_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn get_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn enrollments_for_user(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError>;

    /// Overwrite the cached progress of the `(user, course)` enrollment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the pair is not enrolled.
    async fn update_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
        progress: f64,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the enrollment does not exist.
    async fn delete_enrollment(&self, id: EnrollmentId) -> Result<(), StorageError>;
}

//
// ─── USERS ─────────────────────────────────────────────────────────────────────
//

/// Repository contract for users and profiles.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn find_user_by_subject(&self, subject: &str) -> Result<Option<User>, StorageError>;

    /// Create the user and its profile together.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Duplicate` if the subject or email is taken.
    async fn insert_user(&self, user: NewUserRecord) -> Result<User, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError>;
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub results: Arc<dyn QuizResultRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Storage {
    /// Expose one repository value through every trait object.
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: CourseRepository
            + LessonRepository
            + QuizRepository
            + QuizResultRepository
            + EnrollmentRepository
            + UserRepository
            + Clone
            + 'static,
    {
        Self {
            courses: Arc::new(repo.clone()),
            lessons: Arc::new(repo.clone()),
            quizzes: Arc::new(repo.clone()),
            results: Arc::new(repo.clone()),
            enrollments: Arc::new(repo.clone()),
            users: Arc::new(repo),
        }
    }
}
