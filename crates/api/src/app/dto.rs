//! Request bodies that are not domain drafts, and response projections.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use finhub_auth::{AdminUserUpdate, Role, UserAccount};
use finhub_catalog::{Asset, LoanType};
use finhub_core::{Amount, AssetId, LoanTypeId, UserId};
use finhub_ledger::LedgerEntry;
use finhub_requests::{AssetOrder, LoanOrder, Owned};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminUpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub profile_image_url: Option<String>,
    pub withdrawal_account: Option<String>,
    pub account_status: Option<String>,
    /// Target balance; applied as a ledger adjustment.
    pub balance: Option<Amount>,
}

impl AdminUpdateUserRequest {
    pub fn into_parts(self) -> (AdminUserUpdate, Option<Amount>) {
        let update = AdminUserUpdate {
            username: self.username,
            email: self.email,
            role: self.role,
            full_name: self.full_name,
            phone: self.phone,
            profile_image_url: self.profile_image_url,
            withdrawal_account: self.withdrawal_account,
            account_status: self.account_status,
        };
        (update, self.balance)
    }
}

/// `PUT /:id/status` body. The status is parsed by the record's own status type.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub status: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// Account as returned to clients (never includes the password hash).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
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

impl From<&UserAccount> for UserView {
    fn from(u: &UserAccount) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            role: u.role,
            balance: u.balance,
            full_name: u.full_name.clone(),
            phone: u.phone.clone(),
            withdrawal_account: u.withdrawal_account.clone(),
            profile_image_url: u.profile_image_url.clone(),
            account_status: u.account_status.clone(),
            total_income: u.total_income,
            last_login: u.last_login,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

impl AuthResponse {
    pub fn new(token: String, user: &UserAccount) -> Self {
        Self {
            token,
            user: user.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    pub id: AssetId,
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTypeSummary {
    pub id: LoanTypeId,
    pub name: String,
    pub interest_rate: Decimal,
}

/// A record with its owner populated.
#[derive(Debug, Clone, Serialize)]
pub struct WithUser<T> {
    #[serde(flatten)]
    pub record: T,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetOrderView {
    #[serde(flatten)]
    pub order: AssetOrder,
    pub asset: Option<AssetSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanOrderView {
    #[serde(flatten)]
    pub order: LoanOrder,
    pub loan_type: Option<LoanTypeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerView {
    pub user_id: UserId,
    pub cached_balance: Amount,
    pub derived_balance: Amount,
    pub entries: Vec<LedgerEntry>,
}

// -------------------------
// Populate helpers
// -------------------------

impl From<&UserAccount> for UserSummary {
    fn from(u: &UserAccount) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
        }
    }
}

impl From<&Asset> for AssetSummary {
    fn from(a: &Asset) -> Self {
        Self {
            id: a.id,
            name: a.name.clone(),
            symbol: a.symbol.clone(),
        }
    }
}

impl From<&LoanType> for LoanTypeSummary {
    fn from(t: &LoanType) -> Self {
        Self {
            id: t.id,
            name: t.name.clone(),
            interest_rate: t.interest_rate,
        }
    }
}

/// Id-indexed summaries used to populate list responses in one pass.
pub struct Directory<K, S>(HashMap<K, S>);

impl<K: Eq + Hash, S: Clone> Directory<K, S> {
    pub fn get(&self, id: K) -> Option<S> {
        self.0.get(&id).cloned()
    }
}

pub type UserDirectory = Directory<UserId, UserSummary>;
pub type AssetDirectory = Directory<AssetId, AssetSummary>;
pub type LoanTypeDirectory = Directory<LoanTypeId, LoanTypeSummary>;

impl UserDirectory {
    pub fn new(users: impl IntoIterator<Item = UserAccount>) -> Self {
        Self(users.into_iter().map(|u| (u.id, UserSummary::from(&u))).collect())
    }

    pub fn attach<T: Owned>(&self, record: T) -> WithUser<T> {
        let user = self.get(record.owner());
        WithUser { record, user }
    }
}

impl AssetDirectory {
    pub fn new(assets: impl IntoIterator<Item = Asset>) -> Self {
        Self(assets.into_iter().map(|a| (a.id, AssetSummary::from(&a))).collect())
    }
}

impl LoanTypeDirectory {
    pub fn new(loan_types: impl IntoIterator<Item = LoanType>) -> Self {
        Self(
            loan_types
                .into_iter()
                .map(|t| (t.id, LoanTypeSummary::from(&t)))
                .collect(),
        )
    }
}
