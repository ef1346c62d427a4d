//! Authorization rules for request handlers.
//!
//! - No IO
//! - No panics
//! - Pure policy checks over an already-authenticated [`Principal`]

use thiserror::Error;

use finhub_core::UserId;

use crate::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not authorized")]
    NotOwner,

    #[error("not authorized as an admin")]
    AdminRequired,
}

/// Allow the record owner or any admin.
pub fn authorize_owner_or_admin(principal: &Principal, owner: UserId) -> Result<(), AuthzError> {
    if principal.is_admin() || principal.user_id == owner {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

pub fn require_admin(principal: &Principal) -> Result<(), AuthzError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::AdminRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn owner_is_allowed() {
        let owner = UserId::new();
        let p = Principal::new(owner, Role::User);
        assert!(authorize_owner_or_admin(&p, owner).is_ok());
    }

    #[test]
    fn admin_is_allowed_on_foreign_records() {
        let p = Principal::new(UserId::new(), Role::Admin);
        assert!(authorize_owner_or_admin(&p, UserId::new()).is_ok());
        assert!(require_admin(&p).is_ok());
    }

    #[test]
    fn other_users_are_rejected() {
        let p = Principal::new(UserId::new(), Role::User);
        assert_eq!(authorize_owner_or_admin(&p, UserId::new()), Err(AuthzError::NotOwner));
        assert_eq!(require_admin(&p), Err(AuthzError::AdminRequired));
    }
}
