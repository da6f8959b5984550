use course_core::model::{
    Course, CourseDraft, CourseId, Enrollment, EnrollmentId, Lesson, LessonId, Profile, Quiz,
    QuizId, QuizResult, QuizResultId, User, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps driver errors onto the storage contract.
///
/// Unique violations become `Duplicate` and foreign-key violations
/// `MissingReference`; everything else is a connection-level failure.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Duplicate;
        }
        if db.is_foreign_key_violation() {
            return StorageError::MissingReference;
        }
    }
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn id_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn count_from_i64(v: i64) -> Result<u64, StorageError> {
    id_from_i64("count", v)
}

fn get_id(row: &SqliteRow, column: &'static str) -> Result<u64, StorageError> {
    id_from_i64(column, row.try_get::<i64, _>(column).map_err(ser)?)
}

pub(crate) fn encode_options(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

fn decode_options(raw: &str) -> Result<Vec<String>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_course_row(row: &SqliteRow) -> Result<Course, StorageError> {
    let draft = CourseDraft {
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        image: row.try_get("image").map_err(ser)?,
    };
    Course::new(
        CourseId::new(get_id(row, "id")?),
        UserId::new(get_id(row, "owner_id")?),
        draft,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    Ok(Lesson {
        id: LessonId::new(get_id(row, "id")?),
        course_id: CourseId::new(get_id(row, "course_id")?),
        title: row.try_get("title").map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
        order: row.try_get("sort_order").map_err(ser)?,
        image: row.try_get("image").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_quiz_row(row: &SqliteRow) -> Result<Quiz, StorageError> {
    let options: String = row.try_get("options").map_err(ser)?;
    Ok(Quiz {
        id: QuizId::new(get_id(row, "id")?),
        lesson_id: LessonId::new(get_id(row, "lesson_id")?),
        question: row.try_get("question").map_err(ser)?,
        options: decode_options(&options)?,
        answer: row.try_get("answer").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_result_row(row: &SqliteRow) -> Result<QuizResult, StorageError> {
    Ok(QuizResult {
        id: QuizResultId::new(get_id(row, "id")?),
        user_id: UserId::new(get_id(row, "user_id")?),
        quiz_id: QuizId::new(get_id(row, "quiz_id")?),
        score: row.try_get("score").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}

pub(crate) fn map_enrollment_row(row: &SqliteRow) -> Result<Enrollment, StorageError> {
    let progress: f64 = row.try_get("progress").map_err(ser)?;
    if !(0.0..=100.0).contains(&progress) {
        return Err(StorageError::Serialization(format!(
            "invalid progress: {progress}"
        )));
    }
    Ok(Enrollment {
        id: EnrollmentId::new(get_id(row, "id")?),
        user_id: UserId::new(get_id(row, "user_id")?),
        course_id: CourseId::new(get_id(row, "course_id")?),
        progress,
        enrolled_at: row.try_get("enrolled_at").map_err(ser)?,
    })
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    Ok(User {
        id: UserId::new(get_id(row, "id")?),
        subject: row.try_get("subject").map_err(ser)?,
        email: row.try_get("email").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_profile_row(row: &SqliteRow) -> Result<Profile, StorageError> {
    Ok(Profile {
        user_id: UserId::new(get_id(row, "user_id")?),
        name: row.try_get("name").map_err(ser)?,
        image: row.try_get("image").map_err(ser)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_survive_json_encoding() {
        let options = vec!["a, b".to_string(), "\"quoted\"".to_string()];
        let raw = encode_options(&options).unwrap();
        assert_eq!(decode_options(&raw).unwrap(), options);
    }

    #[test]
    fn malformed_options_are_a_serialization_error() {
        let err = decode_options("not json").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn id_overflow_is_reported() {
        let err = id_i64("quiz_id", u64::MAX).unwrap_err();
        assert_eq!(err.to_string(), "serialization error: quiz_id overflow");
    }
}
