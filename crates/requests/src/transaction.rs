use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use finhub_core::{Amount, DomainResult, TransactionId, UserId, check_transition, ensure_positive};
use finhub_ledger::{Posting, PostingReason, TransitionId};

use crate::reference::reference;
use crate::{Owned, Transition, TransactionStatus};

const COLLECTION: &str = "transaction";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: Amount,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    /// `TXN-<millis>-<suffix>`.
    pub reference: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransactionDraft {
    pub amount: Amount,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub description: String,
}

impl Transaction {
    pub fn record(
        id: TransactionId,
        user_id: UserId,
        draft: TransactionDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            user_id,
            amount: ensure_positive(draft.amount, "amount")?,
            transaction_type: draft.transaction_type,
            status: TransactionStatus::Pending,
            reference: reference("TXN", id, now),
            description: draft.description,
            created_at: now,
        })
    }

    /// Completion settles the transaction against the balance: deposits
    /// credit, withdrawals debit.
    pub fn set_status(&mut self, to: TransactionStatus) -> DomainResult<Transition<TransactionStatus>> {
        let change = check_transition(self.status, to)?;
        let posting = change.enters(TransactionStatus::Completed).then(|| {
            let tid = TransitionId::new(COLLECTION, self.id, "completed");
            match self.transaction_type {
                TransactionType::Deposit => {
                    Posting::credit(self.user_id, tid, self.amount, PostingReason::DepositCompleted)
                }
                TransactionType::Withdrawal => {
                    Posting::debit(self.user_id, tid, self.amount, PostingReason::WithdrawalCompleted)
                }
            }
        });
        self.status = change.target();
        Ok(Transition { change, posting })
    }
}

impl Owned for Transaction {
    fn owner(&self) -> UserId {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finhub_ledger::Direction;
    use rust_decimal::Decimal;

    fn record(kind: TransactionType) -> Transaction {
        let draft = TransactionDraft {
            amount: Decimal::from(75),
            transaction_type: kind,
            description: "top up".into(),
        };
        Transaction::record(TransactionId::new(), UserId::new(), draft, Utc::now()).unwrap()
    }

    #[test]
    fn new_transactions_are_pending_with_a_reference() {
        let tx = record(TransactionType::Deposit);
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.reference.starts_with("TXN-"));
    }

    #[test]
    fn completion_direction_follows_the_type() {
        let mut deposit = record(TransactionType::Deposit);
        let posting = deposit.set_status(TransactionStatus::Completed).unwrap().posting.unwrap();
        assert_eq!(posting.direction, Direction::Credit);

        let mut withdrawal = record(TransactionType::Withdrawal);
        let posting = withdrawal.set_status(TransactionStatus::Completed).unwrap().posting.unwrap();
        assert_eq!(posting.direction, Direction::Debit);
        assert_eq!(posting.reason, PostingReason::WithdrawalCompleted);
    }

    #[test]
    fn completing_twice_posts_once() {
        let mut tx = record(TransactionType::Deposit);
        tx.set_status(TransactionStatus::Completed).unwrap();
        assert!(tx.set_status(TransactionStatus::Completed).unwrap().posting.is_none());
    }

    #[test]
    fn type_is_serialized_under_its_wire_name() {
        let json = serde_json::to_value(record(TransactionType::Withdrawal)).unwrap();
        assert_eq!(json["type"], "withdrawal");
        assert_eq!(json["status"], "pending");
    }
}
