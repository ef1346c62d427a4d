//! API-side authorization guards.
//!
//! Policy lives in `finhub-auth`; these helpers adapt it to the request
//! context and the API error type.

use finhub_auth::{authorize_owner_or_admin, require_admin as require_admin_role};
use finhub_core::UserId;
use finhub_requests::Owned;

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

pub fn require_admin(principal: &PrincipalContext) -> Result<(), ApiError> {
    Ok(require_admin_role(principal.principal())?)
}

pub fn require_owner_or_admin(principal: &PrincipalContext, owner: UserId) -> Result<(), ApiError> {
    Ok(authorize_owner_or_admin(principal.principal(), owner)?)
}

/// Return `record` if the caller may read it.
pub fn readable<T: Owned>(principal: &PrincipalContext, record: T) -> Result<T, ApiError> {
    require_owner_or_admin(principal, record.owner())?;
    Ok(record)
}
