use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use finhub_auth::{Principal, Role};
use finhub_core::UserId;

use crate::app::errors::ApiError;

/// Principal context for a request (authenticated identity + role).
///
/// Inserted by the auth middleware when the request carries a valid bearer
/// token. Extracting it from a request without one is a 401.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn is_admin(&self) -> bool {
        self.principal.is_admin()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for PrincipalContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PrincipalContext>()
            .copied()
            .ok_or_else(|| ApiError::Unauthorized("not authorized, no token".to_string()))
    }
}
