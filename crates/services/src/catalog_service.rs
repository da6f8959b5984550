use std::sync::Arc;

use course_core::ensure_owner;
use course_core::model::{
    Course, CourseDraft, CourseId, CoursePatch, Lesson, LessonDraft, LessonId, Quiz, QuizDraft,
    QuizId, UserId,
};
use storage::repository::{
    CourseRepository, LessonRepository, NewCourseRecord, NewLessonRecord, NewQuizRecord,
    QuizRepository,
};

use crate::Clock;
use crate::error::ServiceError;

/// A course together with its lessons in presentation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDetail {
    pub course: Course,
    pub lessons: Vec<Lesson>,
}

/// A lesson together with its quizzes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDetail {
    pub lesson: Lesson,
    pub quizzes: Vec<Quiz>,
}

/// Course, lesson and quiz management with owner checks on every mutation.
#[derive(Clone)]
pub struct CatalogService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    quizzes: Arc<dyn QuizRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
        quizzes: Arc<dyn QuizRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            lessons,
            quizzes,
        }
    }

    //
    // ─── COURSES ───────────────────────────────────────────────────────────────
    //

    /// Validate and persist a new course owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for validation failures.
    /// Returns `ServiceError::Internal` if persistence fails.
    pub async fn create_course(
        &self,
        owner: UserId,
        draft: CourseDraft,
    ) -> Result<Course, ServiceError> {
        let course = Course::new(CourseId::new(0), owner, draft, self.clock.now())?;
        let id = self
            .courses
            .insert_course(NewCourseRecord::from_course(&course))
            .await?;
        tracing::info!(course = %id, owner = %owner, "course created");
        Ok(course.with_id(id))
    }

    /// Fetch a course with its ordered lessons.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the course does not exist.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn get_course(&self, course_id: CourseId) -> Result<CourseDetail, ServiceError> {
        let course = self.require_course(course_id).await?;
        let lessons = self.lessons.lessons_for_course(course_id).await?;
        Ok(CourseDetail { course, lessons })
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn list_courses(&self) -> Result<Vec<Course>, ServiceError> {
        Ok(self.courses.list_courses().await?)
    }

    /// Apply a partial update; blank fields keep their current value.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the course does not exist.
    /// Returns `ServiceError::Forbidden` if `actor` does not own it.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn update_course(
        &self,
        actor: UserId,
        course_id: CourseId,
        patch: CoursePatch,
    ) -> Result<Course, ServiceError> {
        let course = self.owned_course(actor, course_id).await?;
        let updated = course.apply_patch(patch);
        self.courses.update_course(&updated).await?;
        Ok(updated)
    }

    /// Delete a course along with its lessons, quizzes, results and enrollments.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the course does not exist.
    /// Returns `ServiceError::Forbidden` if `actor` does not own it.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn delete_course(&self, actor: UserId, course_id: CourseId) -> Result<(), ServiceError> {
        self.owned_course(actor, course_id).await?;
        self.courses.delete_course(course_id).await?;
        tracing::info!(course = %course_id, "course deleted");
        Ok(())
    }

    //
    // ─── LESSONS ───────────────────────────────────────────────────────────────
    //

    /// Add a lesson to a course the actor owns.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the course does not exist.
    /// Returns `ServiceError::Forbidden` if `actor` does not own the course.
    /// Returns `ServiceError::InvalidInput` for validation failures.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn create_lesson(
        &self,
        actor: UserId,
        draft: LessonDraft,
    ) -> Result<Lesson, ServiceError> {
        self.owned_course(actor, draft.course_id).await?;
        let mut lesson = Lesson::new(LessonId::new(0), draft, self.clock.now())?;
        lesson.id = self
            .lessons
            .insert_lesson(NewLessonRecord::from_lesson(&lesson))
            .await
            .map_err(|e| ServiceError::from_write(e, "course"))?;
        tracing::info!(lesson = %lesson.id, course = %lesson.course_id, "lesson created");
        Ok(lesson)
    }

    /// Fetch a lesson with its quizzes.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the lesson does not exist.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn get_lesson(&self, lesson_id: LessonId) -> Result<LessonDetail, ServiceError> {
        let lesson = self.require_lesson(lesson_id).await?;
        let quizzes = self.quizzes.quizzes_for_lesson(lesson_id).await?;
        Ok(LessonDetail { lesson, quizzes })
    }

    /// Lessons of a course sorted by `(order, id)`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the course does not exist.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, ServiceError> {
        self.require_course(course_id).await?;
        Ok(self.lessons.lessons_for_course(course_id).await?)
    }

    /// Replace a lesson's fields. Moving it to another course requires owning both.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the lesson or target course does not exist.
    /// Returns `ServiceError::Forbidden` if `actor` does not own the courses involved.
    /// Returns `ServiceError::InvalidInput` for validation failures.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn update_lesson(
        &self,
        actor: UserId,
        lesson_id: LessonId,
        draft: LessonDraft,
    ) -> Result<Lesson, ServiceError> {
        let current = self.require_lesson(lesson_id).await?;
        self.owned_course(actor, current.course_id).await?;
        if draft.course_id != current.course_id {
            self.owned_course(actor, draft.course_id).await?;
        }

        let updated = Lesson::new(lesson_id, draft, current.created_at)?;
        self.lessons
            .update_lesson(&updated)
            .await
            .map_err(|e| ServiceError::from_write(e, "course"))?;
        Ok(updated)
    }

    /// Delete a lesson along with its quizzes and their results.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the lesson does not exist.
    /// Returns `ServiceError::Forbidden` if `actor` does not own its course.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn delete_lesson(&self, actor: UserId, lesson_id: LessonId) -> Result<(), ServiceError> {
        let lesson = self.require_lesson(lesson_id).await?;
        self.owned_course(actor, lesson.course_id).await?;
        self.lessons.delete_lesson(lesson_id).await?;
        tracing::info!(lesson = %lesson_id, "lesson deleted");
        Ok(())
    }

    //
    // ─── QUIZZES ───────────────────────────────────────────────────────────────
    //

    /// Attach a quiz to a lesson in a course the actor owns.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the lesson does not exist.
    /// Returns `ServiceError::Forbidden` if `actor` does not own its course.
    /// Returns `ServiceError::InvalidInput` for validation failures.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn create_quiz(&self, actor: UserId, draft: QuizDraft) -> Result<Quiz, ServiceError> {
        let lesson = self.require_lesson(draft.lesson_id).await?;
        self.owned_course(actor, lesson.course_id).await?;

        let mut quiz = Quiz::new(QuizId::new(0), draft, self.clock.now())?;
        quiz.id = self
            .quizzes
            .insert_quiz(NewQuizRecord::from_quiz(&quiz))
            .await
            .map_err(|e| ServiceError::from_write(e, "lesson"))?;
        tracing::info!(quiz = %quiz.id, lesson = %quiz.lesson_id, "quiz created");
        Ok(quiz)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn list_quizzes(&self) -> Result<Vec<Quiz>, ServiceError> {
        Ok(self.quizzes.list_quizzes().await?)
    }

    /// Delete a quiz along with its results.
    ///
    /// Cached enrollment progress for the course is not recomputed here.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the quiz does not exist.
    /// Returns `ServiceError::Forbidden` if `actor` does not own its course.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn delete_quiz(&self, actor: UserId, quiz_id: QuizId) -> Result<(), ServiceError> {
        let course_id = self
            .quizzes
            .course_of_quiz(quiz_id)
            .await?
            .ok_or(ServiceError::NotFound("quiz"))?;
        self.owned_course(actor, course_id).await?;
        self.quizzes.delete_quiz(quiz_id).await?;
        tracing::info!(quiz = %quiz_id, "quiz deleted");
        Ok(())
    }

    //
    // ─── LOOKUPS ───────────────────────────────────────────────────────────────
    //

    async fn require_course(&self, course_id: CourseId) -> Result<Course, ServiceError> {
        self.courses
            .get_course(course_id)
            .await?
            .ok_or(ServiceError::NotFound("course"))
    }

    async fn require_lesson(&self, lesson_id: LessonId) -> Result<Lesson, ServiceError> {
        self.lessons
            .get_lesson(lesson_id)
            .await?
            .ok_or(ServiceError::NotFound("lesson"))
    }

    async fn owned_course(&self, actor: UserId, course_id: CourseId) -> Result<Course, ServiceError> {
        let course = self.require_course(course_id).await?;
        ensure_owner(actor, course.owner_id(), "course")?;
        Ok(course)
    }
}
