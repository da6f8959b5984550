use std::sync::Arc;

use course_core::ensure_owner;
use course_core::model::{Course, CourseId, Enrollment, EnrollmentId, UserId};
use storage::repository::{
    CourseRepository, EnrollmentRepository, NewEnrollmentRecord, StorageError,
};

use crate::Clock;
use crate::error::ServiceError;
use crate::progress::ProgressCalculator;

/// An enrollment joined with the course it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrolledCourse {
    pub enrollment: Enrollment,
    pub course: Course,
}

/// Owns creation, lookup, cancellation and progress refresh of enrollments.
#[derive(Clone)]
pub struct EnrollmentManager {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    calculator: ProgressCalculator,
}

impl EnrollmentManager {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        calculator: ProgressCalculator,
    ) -> Self {
        Self {
            clock,
            courses,
            enrollments,
            calculator,
        }
    }

    /// Enroll a user in a course with progress starting at zero.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the course does not exist.
    /// Returns `ServiceError::AlreadyEnrolled` if the pair is already enrolled.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn enroll(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Enrollment, ServiceError> {
        if self.courses.get_course(course_id).await?.is_none() {
            return Err(ServiceError::NotFound("course"));
        }
        if self
            .enrollments
            .find_enrollment(user_id, course_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::AlreadyEnrolled);
        }

        let enrolled_at = self.clock.now();
        let id = self
            .enrollments
            .insert_enrollment(NewEnrollmentRecord {
                user_id,
                course_id,
                enrolled_at,
            })
            .await
            .map_err(|e| match e {
                // lost a race against a concurrent enroll for the same pair
                StorageError::Duplicate => ServiceError::AlreadyEnrolled,
                other => ServiceError::from_write(other, "course"),
            })?;

        tracing::info!(user = %user_id, course = %course_id, enrollment = %id, "user enrolled");
        Ok(Enrollment {
            id,
            user_id,
            course_id,
            progress: 0.0,
            enrolled_at,
        })
    }

    /// Recompute progress from the ledger and overwrite the cached value.
    ///
    /// Returns the freshly written percentage.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound("enrollment")` if the user is not enrolled.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn refresh_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<f64, ServiceError> {
        let progress = self.calculator.compute(user_id, course_id).await?;
        self.enrollments
            .update_progress(user_id, course_id, progress)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => ServiceError::NotFound("enrollment"),
                other => other.into(),
            })?;

        tracing::debug!(user = %user_id, course = %course_id, progress, "progress refreshed");
        Ok(progress)
    }

    /// Delete an enrollment on behalf of its owner.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the enrollment does not exist.
    /// Returns `ServiceError::Forbidden` if `requester` does not own it.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn cancel(
        &self,
        enrollment_id: EnrollmentId,
        requester: UserId,
    ) -> Result<(), ServiceError> {
        let enrollment = self
            .enrollments
            .get_enrollment(enrollment_id)
            .await?
            .ok_or(ServiceError::NotFound("enrollment"))?;
        ensure_owner(requester, enrollment.user_id, "enrollment")?;

        self.enrollments.delete_enrollment(enrollment_id).await?;
        tracing::info!(enrollment = %enrollment_id, user = %requester, "enrollment cancelled");
        Ok(())
    }

    /// List a user's enrollments together with their courses.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn enrollments_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<EnrolledCourse>, ServiceError> {
        let enrollments = self.enrollments.enrollments_for_user(user_id).await?;
        let mut joined = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            // deleting a course cascades to its enrollments, so a miss is a race
            let Some(course) = self.courses.get_course(enrollment.course_id).await? else {
                continue;
            };
            joined.push(EnrolledCourse { enrollment, course });
        }
        Ok(joined)
    }

    /// Fresh progress for an enrolled user; the cached value is not consulted.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user is not enrolled in the course.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn course_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<f64, ServiceError> {
        if self
            .enrollments
            .find_enrollment(user_id, course_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound("enrollment"));
        }
        self.calculator.compute(user_id, course_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use course_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    use crate::error::ErrorKind;
    use crate::test_support::{DemoCatalog, Interleave, StaleChecks, seed_catalog};

    fn manager(repo: &InMemoryRepository) -> EnrollmentManager {
        let calculator = ProgressCalculator::new(Arc::new(repo.clone()), Arc::new(repo.clone()));
        EnrollmentManager::new(
            Clock::Fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            calculator,
        )
    }

    #[tokio::test]
    async fn enroll_starts_at_zero() {
        let repo = InMemoryRepository::new();
        let DemoCatalog { course_id, .. } = seed_catalog(&repo, 4).await;

        let enrollment = manager(&repo).enroll(UserId::new(5), course_id).await.unwrap();
        assert_eq!(enrollment.progress, 0.0);
        assert_eq!(enrollment.enrolled_at, fixed_now());
    }

    #[tokio::test]
    async fn enrolling_twice_is_rejected_and_keeps_one_row() {
        let repo = InMemoryRepository::new();
        let DemoCatalog { course_id, .. } = seed_catalog(&repo, 4).await;
        let manager = manager(&repo);
        let user = UserId::new(5);

        manager.enroll(user, course_id).await.unwrap();
        let err = manager.enroll(user, course_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyEnrolled);

        let rows = manager.enrollments_for_user(user).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].course.id(), course_id);
    }

    #[tokio::test]
    async fn enrolling_in_missing_course_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = manager(&repo)
            .enroll(UserId::new(5), CourseId::new(404))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("course")));
    }

    #[tokio::test]
    async fn cancel_by_another_user_is_forbidden() {
        let repo = InMemoryRepository::new();
        let DemoCatalog { course_id, .. } = seed_catalog(&repo, 1).await;
        let manager = manager(&repo);
        let owner = UserId::new(5);
        let enrollment = manager.enroll(owner, course_id).await.unwrap();

        let err = manager
            .cancel(enrollment.id, UserId::new(6))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(manager.enrollments_for_user(owner).await.unwrap().len(), 1);

        manager.cancel(enrollment.id, owner).await.unwrap();
        assert!(manager.enrollments_for_user(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn refresh_without_enrollment_is_not_found() {
        let repo = InMemoryRepository::new();
        let DemoCatalog { course_id, .. } = seed_catalog(&repo, 2).await;

        let err = manager(&repo)
            .refresh_progress(UserId::new(5), course_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("enrollment")));
    }

    #[tokio::test]
    async fn zero_quiz_course_reports_zero_progress() {
        let repo = InMemoryRepository::new();
        let DemoCatalog { course_id, .. } = seed_catalog(&repo, 0).await;
        let manager = manager(&repo);
        let user = UserId::new(5);
        manager.enroll(user, course_id).await.unwrap();

        assert_eq!(manager.refresh_progress(user, course_id).await.unwrap(), 0.0);
        assert_eq!(manager.course_progress(user, course_id).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn course_progress_requires_enrollment() {
        let repo = InMemoryRepository::new();
        let DemoCatalog { course_id, .. } = seed_catalog(&repo, 2).await;

        let err = manager(&repo)
            .course_progress(UserId::new(5), course_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    fn manager_with_stale_checks(repo: &InMemoryRepository, interleave: Interleave) -> EnrollmentManager {
        let calculator = ProgressCalculator::new(Arc::new(repo.clone()), Arc::new(repo.clone()));
        EnrollmentManager::new(
            Clock::Fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(StaleChecks::new(repo, interleave)),
            calculator,
        )
    }

    #[tokio::test]
    async fn concurrent_enroll_rejected_at_insert_is_already_enrolled() {
        let repo = InMemoryRepository::new();
        let DemoCatalog { course_id, .. } = seed_catalog(&repo, 2).await;
        let user = UserId::new(5);
        manager(&repo).enroll(user, course_id).await.unwrap();

        let err = manager_with_stale_checks(&repo, Interleave::Nothing)
            .enroll(user, course_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyEnrolled);
        assert_eq!(manager(&repo).enrollments_for_user(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn course_deleted_before_insert_is_not_found() {
        let repo = InMemoryRepository::new();
        let DemoCatalog { course_id, .. } = seed_catalog(&repo, 2).await;
        let user = UserId::new(5);

        let err = manager_with_stale_checks(&repo, Interleave::DeleteCourse(course_id))
            .enroll(user, course_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("course")));
        assert!(manager(&repo).enrollments_for_user(user).await.unwrap().is_empty());
    }
}
