use course_core::model::{Course, CourseId, Lesson, LessonId, Quiz, QuizId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    count_from_i64, db_err, encode_options, id_from_i64, id_i64, map_course_row, map_lesson_row, map_quiz_row,
    ser,
};
use crate::repository::{
    CourseRepository, LessonRepository, NewCourseRecord, NewLessonRecord, NewQuizRecord,
    QuizRepository, StorageError,
};

const COURSE_COLUMNS: &str = "id, owner_id, title, description, image, created_at";
const LESSON_COLUMNS: &str = "id, course_id, title, content, sort_order, image, created_at";
const QUIZ_COLUMNS: &str = "id, lesson_id, question, options, answer, created_at";

fn affected_or_not_found(rows: u64) -> Result<(), StorageError> {
    if rows == 0 {
        Err(StorageError::NotFound)
    } else {
        Ok(())
    }
}

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn insert_course(&self, course: NewCourseRecord) -> Result<CourseId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO courses (owner_id, title, description, image, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id_i64("owner_id", course.owner_id.value())?)
        .bind(course.title)
        .bind(course.description)
        .bind(course.image)
        .bind(course.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(CourseId::new(id_from_i64("course_id", res.last_insert_rowid())?))
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let row = sqlx::query(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1"))
            .bind(id_i64("course_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_course_row).transpose()
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(&format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_course_row).collect()
    }

    async fn courses_by_owner(&self, owner: UserId) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE owner_id = ?1 ORDER BY id ASC"
        ))
        .bind(id_i64("owner_id", owner.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_course_row).collect()
    }

    async fn update_course(&self, course: &Course) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE courses
            SET title = ?2, description = ?3, image = ?4
            WHERE id = ?1
            ",
        )
        .bind(id_i64("course_id", course.id().value())?)
        .bind(course.title())
        .bind(course.description())
        .bind(course.image())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        affected_or_not_found(res.rows_affected())
    }

    async fn delete_course(&self, id: CourseId) -> Result<(), StorageError> {
        // lessons, quizzes, results and enrollments go through ON DELETE CASCADE
        let res = sqlx::query("DELETE FROM courses WHERE id = ?1")
            .bind(id_i64("course_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        affected_or_not_found(res.rows_affected())
    }
}

#[async_trait::async_trait]
impl LessonRepository for SqliteRepository {
    async fn insert_lesson(&self, lesson: NewLessonRecord) -> Result<LessonId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO lessons (course_id, title, content, sort_order, image, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(id_i64("course_id", lesson.course_id.value())?)
        .bind(lesson.title)
        .bind(lesson.content)
        .bind(lesson.order)
        .bind(lesson.image)
        .bind(lesson.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(LessonId::new(id_from_i64("lesson_id", res.last_insert_rowid())?))
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let row = sqlx::query(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = ?1"))
            .bind(id_i64("lesson_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_lesson_row).transpose()
    }

    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = ?1 ORDER BY sort_order ASC, id ASC"
        ))
        .bind(id_i64("course_id", course_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_lesson_row).collect()
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE lessons
            SET course_id = ?2, title = ?3, content = ?4, sort_order = ?5, image = ?6
            WHERE id = ?1
            ",
        )
        .bind(id_i64("lesson_id", lesson.id.value())?)
        .bind(id_i64("course_id", lesson.course_id.value())?)
        .bind(&lesson.title)
        .bind(&lesson.content)
        .bind(lesson.order)
        .bind(lesson.image.as_deref())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        affected_or_not_found(res.rows_affected())
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM lessons WHERE id = ?1")
            .bind(id_i64("lesson_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        affected_or_not_found(res.rows_affected())
    }
}

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO quizzes (lesson_id, question, options, answer, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id_i64("lesson_id", quiz.lesson_id.value())?)
        .bind(quiz.question)
        .bind(encode_options(&quiz.options)?)
        .bind(quiz.answer)
        .bind(quiz.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(QuizId::new(id_from_i64("quiz_id", res.last_insert_rowid())?))
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let row = sqlx::query(&format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ?1"))
            .bind(id_i64("quiz_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_quiz_row).transpose()
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StorageError> {
        let rows = sqlx::query(&format!("SELECT {QUIZ_COLUMNS} FROM quizzes ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_quiz_row).collect()
    }

    async fn quizzes_for_lesson(&self, lesson_id: LessonId) -> Result<Vec<Quiz>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE lesson_id = ?1 ORDER BY id ASC"
        ))
        .bind(id_i64("lesson_id", lesson_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_quiz_row).collect()
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM quizzes WHERE id = ?1")
            .bind(id_i64("quiz_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        affected_or_not_found(res.rows_affected())
    }

    async fn count_quizzes_in_course(&self, course_id: CourseId) -> Result<u64, StorageError> {
        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM quizzes q
            JOIN lessons l ON l.id = q.lesson_id
            WHERE l.course_id = ?1
            ",
        )
        .bind(id_i64("course_id", course_id.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        count_from_i64(total)
    }

    async fn quizzes_in_course(&self, course_id: CourseId) -> Result<Vec<QuizId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT q.id
            FROM quizzes q
            JOIN lessons l ON l.id = q.lesson_id
            WHERE l.course_id = ?1
            ORDER BY q.id ASC
            ",
        )
        .bind(id_i64("course_id", course_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                let id: i64 = row.try_get("id").map_err(ser)?;
                Ok(QuizId::new(id_from_i64("quiz_id", id)?))
            })
            .collect()
    }

    async fn course_of_quiz(&self, quiz_id: QuizId) -> Result<Option<CourseId>, StorageError> {
        let course: Option<i64> = sqlx::query_scalar(
            r"
            SELECT l.course_id
            FROM quizzes q
            JOIN lessons l ON l.id = q.lesson_id
            WHERE q.id = ?1
            ",
        )
        .bind(id_i64("quiz_id", quiz_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        course
            .map(|id| id_from_i64("course_id", id).map(CourseId::new))
            .transpose()
    }
}
