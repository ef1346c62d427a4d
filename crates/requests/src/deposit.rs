use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use finhub_core::{Amount, DepositRequestId, DomainResult, UserId, check_transition, ensure_positive};

use crate::{Owned, SettlementStatus, Transition};

/// Placeholder stored until an admin records the on-chain transaction id.
pub const NO_TRANSACTION_ID: &str = "N/A";

/// Crypto deposit notice. Confirming it does not move the balance; admins
/// credit confirmed deposits separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub id: DepositRequestId,
    pub user_id: UserId,
    pub username: String,
    pub amount: Amount,
    pub crypto: String,
    pub blockchain: String,
    pub wallet_address: String,
    pub payment_method: String,
    pub transaction_id: String,
    pub status: SettlementStatus,
    pub request_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DepositRequestDraft {
    pub amount: Amount,
    pub crypto: String,
    pub blockchain: String,
    pub wallet_address: String,
    #[serde(alias = "method")]
    pub payment_method: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl DepositRequest {
    pub fn submit(
        id: DepositRequestId,
        user_id: UserId,
        username: impl Into<String>,
        draft: DepositRequestDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            user_id,
            username: username.into(),
            amount: ensure_positive(draft.amount, "amount")?,
            crypto: draft.crypto,
            blockchain: draft.blockchain,
            wallet_address: draft.wallet_address,
            payment_method: draft.payment_method,
            transaction_id: non_blank(draft.transaction_id)
                .unwrap_or_else(|| NO_TRANSACTION_ID.to_string()),
            status: SettlementStatus::Pending,
            request_date: now,
        })
    }

    /// Moves the status and records `transaction_id` when one is given.
    pub fn set_status(
        &mut self,
        to: SettlementStatus,
        transaction_id: Option<String>,
    ) -> DomainResult<Transition<SettlementStatus>> {
        let change = check_transition(self.status, to)?;
        self.status = change.target();
        if let Some(tx) = non_blank(transaction_id) {
            self.transaction_id = tx;
        }
        Ok(Transition::without_posting(change))
    }
}

impl Owned for DepositRequest {
    fn owner(&self) -> UserId {
        self.user_id
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
