use std::sync::Arc;

use course_core::ProgressSnapshot;
use course_core::model::{CourseId, UserId};
use storage::repository::{QuizRepository, QuizResultRepository};

use crate::error::ServiceError;

/// Derives a user's percent-complete for a course from the ledger and catalog.
///
/// Read-only: callers are expected to have validated that the user and course
/// exist. Nothing is cached here.
#[derive(Clone)]
pub struct ProgressCalculator {
    quizzes: Arc<dyn QuizRepository>,
    results: Arc<dyn QuizResultRepository>,
}

impl ProgressCalculator {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizRepository>, results: Arc<dyn QuizResultRepository>) -> Self {
        Self { quizzes, results }
    }

    /// Gather the quiz total and the distinct completed count for a course.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn snapshot(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<ProgressSnapshot, ServiceError> {
        let total = self.quizzes.count_quizzes_in_course(course_id).await?;
        let completed = self
            .results
            .count_distinct_completed(user_id, course_id)
            .await?;
        Ok(ProgressSnapshot::new(completed, total))
    }

    /// Percent of the course's quizzes the user has completed, in `[0, 100]`.
    ///
    /// A course without quizzes yields `0.0`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn compute(&self, user_id: UserId, course_id: CourseId) -> Result<f64, ServiceError> {
        let snapshot = self.snapshot(user_id, course_id).await?;
        tracing::debug!(
            user = %user_id,
            course = %course_id,
            completed = snapshot.completed,
            total = snapshot.total,
            "progress computed"
        );
        Ok(snapshot.percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use course_core::model::QuizId;
    use course_core::time::fixed_now;
    use storage::repository::{
        CourseRepository, InMemoryRepository, LessonRepository, NewCourseRecord,
        NewLessonRecord, NewQuizRecord, NewQuizResultRecord,
    };

    async fn course_with_quizzes(
        repo: &InMemoryRepository,
        quizzes: usize,
    ) -> (CourseId, Vec<QuizId>) {
        let course_id = repo
            .insert_course(NewCourseRecord {
                owner_id: UserId::new(1),
                title: "Algebra".into(),
                description: "Linear equations".into(),
                image: None,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let lesson_id = repo
            .insert_lesson(NewLessonRecord {
                course_id,
                title: "Intro".into(),
                content: "x + 1 = 2".into(),
                order: 1,
                image: None,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let mut ids = Vec::new();
        for i in 0..quizzes {
            let id = repo
                .insert_quiz(NewQuizRecord {
                    lesson_id,
                    question: format!("Question {i}"),
                    options: vec!["a".into(), "b".into()],
                    answer: "a".into(),
                    created_at: fixed_now(),
                })
                .await
                .unwrap();
            ids.push(id);
        }
        (course_id, ids)
    }

    fn calculator(repo: &InMemoryRepository) -> ProgressCalculator {
        ProgressCalculator::new(Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn empty_course_is_zero_percent() {
        let repo = InMemoryRepository::new();
        let (course_id, _) = course_with_quizzes(&repo, 0).await;

        let percent = calculator(&repo)
            .compute(UserId::new(9), course_id)
            .await
            .unwrap();
        assert_eq!(percent, 0.0);
    }

    #[tokio::test]
    async fn counts_only_the_users_completions() {
        let repo = InMemoryRepository::new();
        let (course_id, quizzes) = course_with_quizzes(&repo, 2).await;
        repo.insert_result(NewQuizResultRecord {
            user_id: UserId::new(2),
            quiz_id: quizzes[0],
            score: 10,
            completed_at: fixed_now(),
        })
        .await
        .unwrap();

        let calc = calculator(&repo);
        assert_eq!(calc.compute(UserId::new(2), course_id).await.unwrap(), 50.0);
        assert_eq!(calc.compute(UserId::new(3), course_id).await.unwrap(), 0.0);

        let snapshot = calc.snapshot(UserId::new(2), course_id).await.unwrap();
        assert_eq!(snapshot.remaining(), 1);
    }
}
