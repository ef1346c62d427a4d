//! User account record.
//!
//! `balance` is a cached value owned by the account ledger: only the ledger
//! service writes it, after appending an entry.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use finhub_core::{Amount, DomainError, DomainResult, UserId};

use crate::Role;

pub const DEFAULT_ACCOUNT_STATUS: &str = "pending_verification";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub balance: Amount,
    pub full_name: String,
    pub phone: String,
    pub withdrawal_account: String,
    pub profile_image_url: String,
    pub account_status: String,
    pub total_income: Amount,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Validated registration input (password still in plain text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn new(username: &str, email: &str, password: &str) -> DomainResult<Self> {
        let username = username.trim();
        if username.is_empty() {
            return Err(DomainError::validation("username is required"));
        }
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(DomainError::validation("password is required"));
        }
        Ok(Self {
            username: username.to_string(),
            email,
            password: password.to_string(),
        })
    }
}

/// Self-service profile update. Missing or blank fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

impl UserAccount {
    pub fn register(
        id: UserId,
        new_user: NewUser,
        password_hash: String,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username: new_user.username,
            email: new_user.email,
            password_hash,
            role,
            balance: Decimal::ZERO,
            full_name: String::new(),
            phone: String::new(),
            withdrawal_account: String::new(),
            profile_image_url: String::new(),
            account_status: DEFAULT_ACCOUNT_STATUS.to_string(),
            total_income: Decimal::ZERO,
            last_login: None,
            created_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn apply_profile(&mut self, update: ProfileUpdate) -> DomainResult<()> {
        if let Some(username) = non_blank(update.username) {
            self.username = username;
        }
        if let Some(email) = non_blank(update.email) {
            self.email = normalize_email(&email)?;
        }
        if let Some(full_name) = non_blank(update.full_name) {
            self.full_name = full_name;
        }
        if let Some(phone) = non_blank(update.phone) {
            self.phone = phone;
        }
        Ok(())
    }
}

/// Admin edit of another account. Balance is not part of it: balance changes
/// go through the ledger as adjustments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminUserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub profile_image_url: Option<String>,
    pub withdrawal_account: Option<String>,
    pub account_status: Option<String>,
}

impl UserAccount {
    pub fn apply_admin_update(&mut self, update: AdminUserUpdate) -> DomainResult<()> {
        self.apply_profile(ProfileUpdate {
            username: update.username,
            email: update.email,
            full_name: update.full_name,
            phone: update.phone,
        })?;
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(url) = update.profile_image_url {
            self.profile_image_url = url.trim().to_string();
        }
        if let Some(account) = update.withdrawal_account {
            self.withdrawal_account = account.trim().to_string();
        }
        if let Some(status) = non_blank(update.account_status) {
            self.account_status = status;
        }
        Ok(())
    }
}

pub fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(DomainError::validation("email is invalid")),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
