use thiserror::Error;

use crate::model::UserId;

/// Ownership check failure. The model has a single role: the owner.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("user {actor} does not own this {resource}")]
pub struct AccessError {
    pub actor: UserId,
    pub resource: &'static str,
}

/// Succeeds only when `actor` is the resource owner.
///
/// # Errors
///
/// Returns `AccessError` when `actor != owner`.
pub fn ensure_owner(actor: UserId, owner: UserId, resource: &'static str) -> Result<(), AccessError> {
    if actor == owner {
        Ok(())
    } else {
        Err(AccessError { actor, resource })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_passes() {
        assert!(ensure_owner(UserId::new(1), UserId::new(1), "course").is_ok());
    }

    #[test]
    fn other_user_is_rejected() {
        let err = ensure_owner(UserId::new(2), UserId::new(1), "enrollment").unwrap_err();
        assert_eq!(err.to_string(), "user 2 does not own this enrollment");
    }
}
