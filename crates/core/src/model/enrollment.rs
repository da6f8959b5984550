use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{CourseId, EnrollmentId, UserId};

/// A user's registration in a course.
///
/// `progress` caches the last computed percent-complete and can lag behind
/// the completion ledger until the next refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub progress: f64,
    pub enrolled_at: DateTime<Utc>,
}
