mod course;
mod enrollment;
mod ids;
mod lesson;
mod quiz;
mod user;

pub use ids::{CourseId, EnrollmentId, LessonId, ParseIdError, QuizId, QuizResultId, UserId};

pub use course::{Course, CourseDraft, CourseError, CoursePatch};
pub use enrollment::Enrollment;
pub use lesson::{Lesson, LessonDraft, LessonError, sort_lessons};
pub use quiz::{Quiz, QuizDraft, QuizError, QuizResult};
pub use user::{Profile, ProfileError, User, VerifiedIdentity};
