use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use finhub_core::{Amount, DomainResult, UserId, WithdrawalRequestId, check_transition, ensure_positive};
use finhub_ledger::{Posting, PostingReason, TransitionId};

use crate::{Owned, SettlementStatus, Transition};

const COLLECTION: &str = "withdrawal_request";

/// Payout request. Funds are held (debited) as soon as the request is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub id: WithdrawalRequestId,
    pub user_id: UserId,
    pub username: String,
    pub amount: Amount,
    pub wallet_address: String,
    pub method: String,
    pub status: SettlementStatus,
    pub request_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WithdrawalRequestDraft {
    pub amount: Amount,
    #[serde(alias = "accountDetails")]
    pub wallet_address: String,
    #[serde(default)]
    pub method: String,
}

impl WithdrawalRequest {
    /// New pending request plus the hold posting debiting the owner.
    pub fn open(
        id: WithdrawalRequestId,
        user_id: UserId,
        username: impl Into<String>,
        draft: WithdrawalRequestDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<(Self, Posting)> {
        let amount = ensure_positive(draft.amount, "amount")?;
        let request = Self {
            id,
            user_id,
            username: username.into(),
            amount,
            wallet_address: draft.wallet_address.trim().to_string(),
            method: draft.method,
            status: SettlementStatus::Pending,
            request_date: now,
        };
        let hold = Posting::debit(
            user_id,
            TransitionId::new(COLLECTION, id, "hold"),
            amount,
            PostingReason::WithdrawalHold,
        );
        Ok((request, hold))
    }

    /// Rejecting a pending request refunds the held amount.
    pub fn set_status(&mut self, to: SettlementStatus) -> DomainResult<Transition<SettlementStatus>> {
        let change = check_transition(self.status, to)?;
        let posting = change.enters(SettlementStatus::Rejected).then(|| {
            Posting::credit(
                self.user_id,
                TransitionId::new(COLLECTION, self.id, "refund"),
                self.amount,
                PostingReason::WithdrawalRefund,
            )
        });
        self.status = change.target();
        Ok(Transition { change, posting })
    }
}

impl Owned for WithdrawalRequest {
    fn owner(&self) -> UserId {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finhub_core::DomainError;
    use finhub_ledger::Direction;
    use rust_decimal::Decimal;

    fn open(amount: i64) -> (WithdrawalRequest, Posting) {
        let draft = WithdrawalRequestDraft {
            amount: Decimal::from(amount),
            wallet_address: " bc1qxyz ".into(),
            method: "bitcoin".into(),
        };
        WithdrawalRequest::open(WithdrawalRequestId::new(), UserId::new(), "alice", draft, Utc::now())
            .unwrap()
    }

    #[test]
    fn opening_holds_the_amount() {
        let (request, hold) = open(40);
        assert_eq!(request.status, SettlementStatus::Pending);
        assert_eq!(request.wallet_address, "bc1qxyz");
        assert_eq!(hold.direction, Direction::Debit);
        assert_eq!(hold.amount, Decimal::from(40));
        assert!(hold.transition_id.as_str().ends_with(":hold"));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let draft = WithdrawalRequestDraft {
            amount: Decimal::ZERO,
            wallet_address: "w".into(),
            method: String::new(),
        };
        let err = WithdrawalRequest::open(WithdrawalRequestId::new(), UserId::new(), "a", draft, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejection_refunds_and_confirmation_does_not() {
        let (mut rejected, _) = open(40);
        let t = rejected.set_status(SettlementStatus::Rejected).unwrap();
        let refund = t.posting.unwrap();
        assert_eq!(refund.direction, Direction::Credit);
        assert_eq!(refund.amount, Decimal::from(40));

        let (mut confirmed, _) = open(40);
        let t = confirmed.set_status(SettlementStatus::Confirmed).unwrap();
        assert!(t.posting.is_none());
        assert_eq!(confirmed.status, SettlementStatus::Confirmed);
    }

    #[test]
    fn repeating_rejection_is_a_no_op_and_reopening_conflicts() {
        let (mut request, _) = open(10);
        request.set_status(SettlementStatus::Rejected).unwrap();
        let again = request.set_status(SettlementStatus::Rejected).unwrap();
        assert!(again.posting.is_none());
        let err = request.set_status(SettlementStatus::Confirmed).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn draft_accepts_account_details_alias() {
        let draft: WithdrawalRequestDraft =
            serde_json::from_value(serde_json::json!({"amount": 25, "accountDetails": "T9yD"})).unwrap();
        assert_eq!(draft.wallet_address, "T9yD");
        assert_eq!(draft.amount, Decimal::from(25));
    }
}
