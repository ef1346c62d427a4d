//! `finhub-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, authorize_owner_or_admin, require_admin};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, Hs256TokenIssuer, JwtValidator, TokenError};
pub use password::{PasswordError, hash_password, verify_password};
pub use principal::Principal;
pub use roles::Role;
pub use user::{AdminUserUpdate, NewUser, ProfileUpdate, UserAccount, normalize_email};
