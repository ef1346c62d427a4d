use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use finhub_catalog::LoanType;
use finhub_core::{Amount, DomainResult, LoanOrderId, LoanTypeId, UserId, check_transition};
use finhub_ledger::{Posting, PostingReason, TransitionId};

use crate::{ApprovalStatus, Owned, Transition};

const COLLECTION: &str = "loan_order";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanOrder {
    pub id: LoanOrderId,
    pub user_id: UserId,
    pub loan_type_id: LoanTypeId,
    pub amount: Amount,
    /// Months.
    pub duration: u32,
    pub interest_rate: Decimal,
    pub monthly_payment: Amount,
    pub total_repayment: Amount,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoanOrderDraft {
    pub loan_type_id: LoanTypeId,
    pub amount: Amount,
    #[serde(alias = "durationMonths")]
    pub duration: u32,
}

impl LoanOrder {
    /// Prices the loan against `loan_type` and opens it as pending.
    pub fn apply_for(
        id: LoanOrderId,
        user_id: UserId,
        loan_type: &LoanType,
        draft: LoanOrderDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let quote = loan_type.quote(draft.amount, draft.duration)?;
        Ok(Self {
            id,
            user_id,
            loan_type_id: loan_type.id,
            amount: draft.amount,
            duration: draft.duration,
            interest_rate: quote.interest_rate,
            monthly_payment: quote.monthly_payment,
            total_repayment: quote.total_repayment,
            status: ApprovalStatus::Pending,
            created_at: now,
        })
    }

    /// Approval disburses the principal to the borrower.
    pub fn set_status(&mut self, to: ApprovalStatus) -> DomainResult<Transition<ApprovalStatus>> {
        let change = check_transition(self.status, to)?;
        let posting = change.enters(ApprovalStatus::Approved).then(|| {
            Posting::credit(
                self.user_id,
                TransitionId::new(COLLECTION, self.id, "disbursement"),
                self.amount,
                PostingReason::LoanDisbursement,
            )
        });
        self.status = change.target();
        Ok(Transition { change, posting })
    }
}

impl Owned for LoanOrder {
    fn owner(&self) -> UserId {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finhub_catalog::LoanTypeDraft;
    use finhub_core::DomainError;

    fn loan_type() -> LoanType {
        let draft: LoanTypeDraft = serde_json::from_value(serde_json::json!({
            "name": "Personal",
            "interestRate": 12,
            "term": "1 year",
            "amountRange": "$100 - $2,000",
            "maxAmount": 2000,
            "quota": "unlimited",
            "applicationFee": 0
        }))
        .unwrap();
        LoanType::create(LoanTypeId::new(), draft, Utc::now()).unwrap()
    }

    fn apply(amount: i64) -> DomainResult<LoanOrder> {
        let lt = loan_type();
        let draft = LoanOrderDraft {
            loan_type_id: lt.id,
            amount: Decimal::from(amount),
            duration: 12,
        };
        LoanOrder::apply_for(LoanOrderId::new(), UserId::new(), &lt, draft, Utc::now())
    }

    #[test]
    fn application_is_priced_from_the_loan_type() {
        let order = apply(1_000).unwrap();
        assert_eq!(order.status, ApprovalStatus::Pending);
        assert_eq!(order.interest_rate, Decimal::from(12));
        assert_eq!(order.monthly_payment, "88.85".parse::<Decimal>().unwrap());
        assert_eq!(order.total_repayment, "1066.19".parse::<Decimal>().unwrap());
    }

    #[test]
    fn amount_over_the_maximum_is_rejected() {
        assert!(matches!(apply(2_001), Err(DomainError::Validation(_))));
    }

    #[test]
    fn approval_credits_once() {
        let mut order = apply(500).unwrap();
        let first = order.set_status(ApprovalStatus::Approved).unwrap();
        let credit = first.posting.unwrap();
        assert_eq!(credit.amount, Decimal::from(500));
        assert_eq!(credit.transition_id.as_str(), format!("loan_order:{}:disbursement", order.id));

        let second = order.set_status(ApprovalStatus::Approved).unwrap();
        assert!(second.posting.is_none());
    }

    #[test]
    fn rejection_has_no_balance_effect() {
        let mut order = apply(500).unwrap();
        let t = order.set_status(ApprovalStatus::Rejected).unwrap();
        assert!(t.posting.is_none());
        assert!(order.set_status(ApprovalStatus::Approved).is_err());
    }
}
