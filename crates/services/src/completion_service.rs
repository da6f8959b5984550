use std::sync::Arc;

use course_core::ensure_owner;
use course_core::model::{CourseId, QuizId, QuizResult, QuizResultId, UserId};
use storage::repository::{
    NewQuizResultRecord, QuizRepository, QuizResultRepository, StorageError,
};

use crate::Clock;
use crate::enrollment_service::EnrollmentManager;
use crate::error::ServiceError;

/// Records quiz completions and keeps the enrolled progress cache current.
#[derive(Clone)]
pub struct CompletionLedger {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    results: Arc<dyn QuizResultRepository>,
    enrollments: EnrollmentManager,
}

impl CompletionLedger {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        results: Arc<dyn QuizResultRepository>,
        enrollments: EnrollmentManager,
    ) -> Self {
        Self {
            clock,
            quizzes,
            results,
            enrollments,
        }
    }

    /// Record one completion of `quiz_id` by `user_id` and refresh progress.
    ///
    /// The result stays recorded even when the refresh fails; the cache then
    /// lags until the next successful refresh.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the quiz does not exist, including
    /// when it is deleted before the result is written.
    /// Returns `ServiceError::AlreadyCompleted` if the user already has a result
    /// for this quiz.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn record_completion(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
        score: i64,
    ) -> Result<QuizResult, ServiceError> {
        let course_id = self
            .quizzes
            .course_of_quiz(quiz_id)
            .await?
            .ok_or(ServiceError::NotFound("quiz"))?;

        if self.results.result_exists(user_id, quiz_id).await? {
            return Err(ServiceError::AlreadyCompleted);
        }

        let completed_at = self.clock.now();
        let id = self
            .results
            .insert_result(NewQuizResultRecord {
                user_id,
                quiz_id,
                score,
                completed_at,
            })
            .await
            .map_err(|e| match e {
                // UNIQUE (user_id, quiz_id) caught a concurrent submission
                StorageError::Duplicate => ServiceError::AlreadyCompleted,
                other => ServiceError::from_write(other, "quiz"),
            })?;
        tracing::info!(user = %user_id, quiz = %quiz_id, score, "quiz completed");

        self.refresh_after_change(user_id, course_id).await?;

        Ok(QuizResult {
            id,
            user_id,
            quiz_id,
            score,
            completed_at,
        })
    }

    /// All results recorded for a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn results_for_user(&self, user_id: UserId) -> Result<Vec<QuizResult>, ServiceError> {
        Ok(self.results.results_for_user(user_id).await?)
    }

    /// Delete a result on behalf of its owner and refresh the affected progress.
    ///
    /// Progress may go down here.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the result does not exist.
    /// Returns `ServiceError::Forbidden` if `actor` did not record it.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn delete_result(
        &self,
        actor: UserId,
        result_id: QuizResultId,
    ) -> Result<(), ServiceError> {
        let result = self
            .results
            .get_result(result_id)
            .await?
            .ok_or(ServiceError::NotFound("quiz result"))?;
        ensure_owner(actor, result.user_id, "quiz result")?;

        let course_id = self.quizzes.course_of_quiz(result.quiz_id).await?;
        self.results.delete_result(result_id).await?;
        tracing::info!(user = %actor, result = %result_id, "quiz result deleted");

        match course_id {
            Some(course_id) => self.refresh_after_change(actor, course_id).await,
            None => Ok(()),
        }
    }

    async fn refresh_after_change(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<(), ServiceError> {
        match self.enrollments.refresh_progress(user_id, course_id).await {
            Ok(_) => Ok(()),
            Err(ServiceError::NotFound("enrollment")) => {
                tracing::debug!(
                    user = %user_id,
                    course = %course_id,
                    "no enrollment for completion; progress refresh skipped"
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    user = %user_id,
                    course = %course_id,
                    error = %err,
                    "progress refresh failed after ledger change"
                );
                Err(err)
            }
        }
    }
}
