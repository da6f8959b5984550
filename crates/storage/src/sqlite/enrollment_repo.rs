use course_core::model::{CourseId, Enrollment, EnrollmentId, UserId};

use super::SqliteRepository;
use super::mapping::{db_err, id_from_i64, id_i64, map_enrollment_row};
use crate::repository::{EnrollmentRepository, NewEnrollmentRecord, StorageError};

const ENROLLMENT_COLUMNS: &str = "id, user_id, course_id, progress, enrolled_at";

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn insert_enrollment(
        &self,
        enrollment: NewEnrollmentRecord,
    ) -> Result<EnrollmentId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO enrollments (user_id, course_id, progress, enrolled_at)
            VALUES (?1, ?2, 0, ?3)
            ",
        )
        .bind(id_i64("user_id", enrollment.user_id.value())?)
        .bind(id_i64("course_id", enrollment.course_id.value())?)
        .bind(enrollment.enrolled_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(EnrollmentId::new(id_from_i64(
            "enrollment_id",
            res.last_insert_rowid(),
        )?))
    }

    async fn find_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE user_id = ?1 AND course_id = ?2"
        ))
        .bind(id_i64("user_id", user_id.value())?)
        .bind(id_i64("course_id", course_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_enrollment_row).transpose()
    }

    async fn get_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = ?1"
        ))
        .bind(id_i64("enrollment_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_enrollment_row).transpose()
    }

    async fn enrollments_for_user(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE user_id = ?1 ORDER BY id ASC"
        ))
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_enrollment_row).collect()
    }

    async fn update_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
        progress: f64,
    ) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE enrollments
            SET progress = ?3
            WHERE user_id = ?1 AND course_id = ?2
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(id_i64("course_id", course_id.value())?)
        .bind(progress)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_enrollment(&self, id: EnrollmentId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM enrollments WHERE id = ?1")
            .bind(id_i64("enrollment_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
