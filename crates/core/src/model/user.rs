use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("identity subject cannot be empty")]
    EmptySubject,

    #[error("email cannot be empty")]
    EmptyEmail,

    #[error("display name cannot be empty")]
    EmptyName,
}

/// Identity handed over by the external sign-in exchange, already verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Stable subject identifier issued by the identity provider.
    pub subject: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

impl VerifiedIdentity {
    /// # Errors
    ///
    /// Returns `ProfileError` if the subject or email is blank.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.subject.trim().is_empty() {
            return Err(ProfileError::EmptySubject);
        }
        if self.email.trim().is_empty() {
            return Err(ProfileError::EmptyEmail);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub subject: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Display data for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub name: String,
    pub image: Option<String>,
}

impl Profile {
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyName` if `name` is blank.
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        image: Option<String>,
    ) -> Result<Self, ProfileError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        Ok(Self {
            user_id,
            name,
            image: image.filter(|i| !i.trim().is_empty()),
        })
    }
}
