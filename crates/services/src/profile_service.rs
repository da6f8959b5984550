use std::sync::Arc;

use serde::Serialize;

use course_core::ensure_owner;
use course_core::model::{Course, CourseId, EnrollmentId, Profile, User, UserId, VerifiedIdentity};
use storage::repository::{CourseRepository, NewUserRecord, StorageError, UserRepository};

use crate::Clock;
use crate::enrollment_service::EnrollmentManager;
use crate::error::ServiceError;
use crate::media::MediaUrls;

/// Course as shown on a profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseCard {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrolledCourseCard {
    pub enrollment_id: EnrollmentId,
    pub course: CourseCard,
    /// Cached percentage; may lag the ledger.
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileOverview {
    pub user_id: UserId,
    pub name: String,
    pub image_url: Option<String>,
    pub created_courses: Vec<CourseCard>,
    pub enrolled_courses: Vec<EnrolledCourseCard>,
}

/// Sign-in bookkeeping and profile views.
#[derive(Clone)]
pub struct ProfileService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    courses: Arc<dyn CourseRepository>,
    enrollments: EnrollmentManager,
    media: MediaUrls,
}

impl ProfileService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        courses: Arc<dyn CourseRepository>,
        enrollments: EnrollmentManager,
        media: MediaUrls,
    ) -> Self {
        Self {
            clock,
            users,
            courses,
            enrollments,
            media,
        }
    }

    /// Return the user for a verified identity, creating user and profile on
    /// first sign-in.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for a blank subject or email, or an
    /// email already linked to another subject.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn sign_in(&self, identity: VerifiedIdentity) -> Result<User, ServiceError> {
        identity.validate()?;
        if let Some(user) = self.users.find_user_by_subject(identity.subject.trim()).await? {
            return Ok(user);
        }

        let name = if identity.name.trim().is_empty() {
            identity.email.trim().to_owned()
        } else {
            identity.name.trim().to_owned()
        };
        let record = NewUserRecord {
            subject: identity.subject.trim().to_owned(),
            email: identity.email.trim().to_owned(),
            name,
            image: identity.picture.filter(|p| !p.trim().is_empty()),
            created_at: self.clock.now(),
        };

        match self.users.insert_user(record).await {
            Ok(user) => {
                tracing::info!(user = %user.id, "user registered");
                Ok(user)
            }
            Err(StorageError::Duplicate) => {
                // a concurrent first sign-in for the same subject won
                self.users
                    .find_user_by_subject(identity.subject.trim())
                    .await?
                    .ok_or_else(|| {
                        ServiceError::InvalidInput("email already linked to another account".into())
                    })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user has no profile.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn profile(&self, user_id: UserId) -> Result<Profile, ServiceError> {
        self.users
            .get_profile(user_id)
            .await?
            .ok_or(ServiceError::NotFound("profile"))
    }

    /// Change display name and, when given, the image reference.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` if `actor` is not `user_id`.
    /// Returns `ServiceError::NotFound` if the user has no profile.
    /// Returns `ServiceError::InvalidInput` for a blank name.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn update_profile(
        &self,
        actor: UserId,
        user_id: UserId,
        name: String,
        image: Option<String>,
    ) -> Result<Profile, ServiceError> {
        ensure_owner(actor, user_id, "profile")?;
        let current = self.profile(user_id).await?;
        let image = image.filter(|i| !i.trim().is_empty()).or(current.image);
        let updated = Profile::new(user_id, name, image)?;
        self.users.upsert_profile(&updated).await?;
        Ok(updated)
    }

    /// Profile page data: created courses and enrolled courses with progress.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user has no profile.
    /// Returns `ServiceError::Internal` if repository access fails.
    pub async fn overview(&self, user_id: UserId) -> Result<ProfileOverview, ServiceError> {
        let profile = self.profile(user_id).await?;
        let created_courses = self
            .courses
            .courses_by_owner(user_id)
            .await?
            .iter()
            .map(|course| self.card(course))
            .collect();
        let enrolled_courses = self
            .enrollments
            .enrollments_for_user(user_id)
            .await?
            .into_iter()
            .map(|row| EnrolledCourseCard {
                enrollment_id: row.enrollment.id,
                course: self.card(&row.course),
                progress: row.enrollment.progress,
            })
            .collect();

        Ok(ProfileOverview {
            user_id,
            image_url: profile.image.as_deref().and_then(|i| self.media.resolve(i)),
            name: profile.name,
            created_courses,
            enrolled_courses,
        })
    }

    fn card(&self, course: &Course) -> CourseCard {
        CourseCard {
            id: course.id(),
            title: course.title().to_owned(),
            description: course.description().to_owned(),
            image_url: course.image().and_then(|i| self.media.resolve(i)),
        }
    }
}
