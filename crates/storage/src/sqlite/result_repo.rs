use course_core::model::{CourseId, QuizId, QuizResult, QuizResultId, UserId};

use super::SqliteRepository;
use super::mapping::{count_from_i64, db_err, id_from_i64, id_i64, map_result_row};
use crate::repository::{NewQuizResultRecord, QuizResultRepository, StorageError};

#[async_trait::async_trait]
impl QuizResultRepository for SqliteRepository {
    async fn result_exists(&self, user_id: UserId, quiz_id: QuizId) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM quiz_results WHERE user_id = ?1 AND quiz_id = ?2")
            .bind(id_i64("user_id", user_id.value())?)
            .bind(id_i64("quiz_id", quiz_id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.is_some())
    }

    async fn insert_result(&self, result: NewQuizResultRecord) -> Result<QuizResultId, StorageError> {
        // UNIQUE (user_id, quiz_id) turns a concurrent duplicate into `Duplicate`.
        let res = sqlx::query(
            r"
            INSERT INTO quiz_results (user_id, quiz_id, score, completed_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(id_i64("user_id", result.user_id.value())?)
        .bind(id_i64("quiz_id", result.quiz_id.value())?)
        .bind(result.score)
        .bind(result.completed_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(QuizResultId::new(id_from_i64(
            "quiz_result_id",
            res.last_insert_rowid(),
        )?))
    }

    async fn count_distinct_completed(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<u64, StorageError> {
        let completed: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(DISTINCT r.quiz_id)
            FROM quiz_results r
            JOIN quizzes q ON q.id = r.quiz_id
            JOIN lessons l ON l.id = q.lesson_id
            WHERE r.user_id = ?1 AND l.course_id = ?2
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(id_i64("course_id", course_id.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        count_from_i64(completed)
    }

    async fn get_result(&self, id: QuizResultId) -> Result<Option<QuizResult>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, quiz_id, score, completed_at
            FROM quiz_results WHERE id = ?1
            ",
        )
        .bind(id_i64("quiz_result_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_result_row).transpose()
    }

    async fn results_for_user(&self, user_id: UserId) -> Result<Vec<QuizResult>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, quiz_id, score, completed_at
            FROM quiz_results
            WHERE user_id = ?1
            ORDER BY completed_at ASC, id ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_result_row).collect()
    }

    async fn delete_result(&self, id: QuizResultId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM quiz_results WHERE id = ?1")
            .bind(id_i64("quiz_result_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
