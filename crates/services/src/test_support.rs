//! Fixtures shared by the service unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use course_core::model::{
    CourseId, Enrollment, EnrollmentId, LessonId, QuizId, QuizResult, QuizResultId, UserId,
};
use course_core::time::fixed_now;
use storage::repository::{
    CourseRepository, EnrollmentRepository, InMemoryRepository, LessonRepository,
    NewCourseRecord, NewEnrollmentRecord, NewLessonRecord, NewQuizRecord, NewQuizResultRecord,
    QuizRepository, QuizResultRepository, StorageError,
};

pub(crate) const OWNER: UserId = UserId::new(1);

pub(crate) struct DemoCatalog {
    pub course_id: CourseId,
    pub lesson_ids: Vec<LessonId>,
    pub quiz_ids: Vec<QuizId>,
}

/// One course owned by `OWNER` with two lessons; quizzes alternate between them.
pub(crate) async fn seed_catalog(repo: &InMemoryRepository, quizzes: usize) -> DemoCatalog {
    let course_id = repo
        .insert_course(NewCourseRecord {
            owner_id: OWNER,
            title: "Rust basics".into(),
            description: "Ownership and borrowing".into(),
            image: None,
            created_at: fixed_now(),
        })
        .await
        .unwrap();

    let mut lesson_ids = Vec::new();
    for order in 1..=2 {
        let id = repo
            .insert_lesson(NewLessonRecord {
                course_id,
                title: format!("Lesson {order}"),
                content: "Read the chapter.".into(),
                order,
                image: None,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        lesson_ids.push(id);
    }

    let mut quiz_ids = Vec::new();
    for i in 0..quizzes {
        let id = repo
            .insert_quiz(NewQuizRecord {
                lesson_id: lesson_ids[i % lesson_ids.len()],
                question: format!("Question {i}"),
                options: vec!["yes".into(), "no".into()],
                answer: "yes".into(),
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        quiz_ids.push(id);
    }

    DemoCatalog {
        course_id,
        lesson_ids,
        quiz_ids,
    }
}

/// Write that another request slips in right after an existence check.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Interleave {
    Nothing,
    DeleteQuiz(QuizId),
    DeleteCourse(CourseId),
}

/// Result and enrollment store whose existence checks always answer "absent"
/// and then run one interleaved write, so a service reaches its insert with a
/// stale view of the data.
#[derive(Clone)]
pub(crate) struct StaleChecks {
    inner: InMemoryRepository,
    pending: Arc<Mutex<Option<Interleave>>>,
}

impl StaleChecks {
    pub(crate) fn new(inner: &InMemoryRepository, interleave: Interleave) -> Self {
        Self {
            inner: inner.clone(),
            pending: Arc::new(Mutex::new(Some(interleave))),
        }
    }

    async fn interleave(&self) {
        let next = self.pending.lock().unwrap().take();
        match next {
            Some(Interleave::DeleteQuiz(id)) => self.inner.delete_quiz(id).await.unwrap(),
            Some(Interleave::DeleteCourse(id)) => self.inner.delete_course(id).await.unwrap(),
            Some(Interleave::Nothing) | None => {}
        }
    }
}

#[async_trait]
impl QuizResultRepository for StaleChecks {
    async fn result_exists(&self, _: UserId, _: QuizId) -> Result<bool, StorageError> {
        self.interleave().await;
        Ok(false)
    }

    async fn insert_result(&self, result: NewQuizResultRecord) -> Result<QuizResultId, StorageError> {
        self.inner.insert_result(result).await
    }

    async fn count_distinct_completed(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<u64, StorageError> {
        self.inner.count_distinct_completed(user_id, course_id).await
    }

    async fn get_result(&self, id: QuizResultId) -> Result<Option<QuizResult>, StorageError> {
        self.inner.get_result(id).await
    }

    async fn results_for_user(&self, user_id: UserId) -> Result<Vec<QuizResult>, StorageError> {
        QuizResultRepository::results_for_user(&self.inner, user_id).await
    }

    async fn delete_result(&self, id: QuizResultId) -> Result<(), StorageError> {
        self.inner.delete_result(id).await
    }
}

#[async_trait]
impl EnrollmentRepository for StaleChecks {
    async fn insert_enrollment(
        &self,
        enrollment: NewEnrollmentRecord,
    ) -> Result<EnrollmentId, StorageError> {
        self.inner.insert_enrollment(enrollment).await
    }

    async fn find_enrollment(
        &self,
        _: UserId,
        _: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        self.interleave().await;
        Ok(None)
    }

    async fn get_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>, StorageError> {
        self.inner.get_enrollment(id).await
    }

    async fn enrollments_for_user(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError> {
        EnrollmentRepository::enrollments_for_user(&self.inner, user_id).await
    }

    async fn update_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
        progress: f64,
    ) -> Result<(), StorageError> {
        self.inner.update_progress(user_id, course_id, progress).await
    }

    async fn delete_enrollment(&self, id: EnrollmentId) -> Result<(), StorageError> {
        self.inner.delete_enrollment(id).await
    }
}
