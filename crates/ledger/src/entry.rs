use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use finhub_core::{Amount, LedgerEntryId, UserId};

/// Deterministic key of a balance-affecting event: `<collection>:<record id>:<event>`.
///
/// The ledger applies a given transition id at most once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionId(String);

impl TransitionId {
    pub fn new(collection: &str, record_id: impl core::fmt::Display, event: &str) -> Self {
        Self(format!("{collection}:{record_id}:{event}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for TransitionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Credit raises the balance, debit lowers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    /// Signed delta for a positive `amount`.
    pub fn signed(self, amount: Amount) -> Amount {
        match self {
            Direction::Credit => amount,
            Direction::Debit => -amount,
        }
    }
}

/// Why a balance moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingReason {
    WithdrawalHold,
    WithdrawalRefund,
    LoanDisbursement,
    BonusCredit,
    DepositCompleted,
    WithdrawalCompleted,
    AssetPurchase,
    AdminAdjustment,
}

/// A requested balance change, not yet applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub user_id: UserId,
    pub transition_id: TransitionId,
    pub direction: Direction,
    /// Always positive; the direction carries the sign.
    pub amount: Amount,
    pub reason: PostingReason,
}

impl Posting {
    pub fn credit(
        user_id: UserId,
        transition_id: TransitionId,
        amount: Amount,
        reason: PostingReason,
    ) -> Self {
        Self {
            user_id,
            transition_id,
            direction: Direction::Credit,
            amount,
            reason,
        }
    }

    pub fn debit(
        user_id: UserId,
        transition_id: TransitionId,
        amount: Amount,
        reason: PostingReason,
    ) -> Self {
        Self {
            user_id,
            transition_id,
            direction: Direction::Debit,
            amount,
            reason,
        }
    }

    /// Posting that moves `current` to `target`, or `None` if they are equal.
    pub fn adjustment(
        user_id: UserId,
        transition_id: TransitionId,
        current: Amount,
        target: Amount,
    ) -> Option<Self> {
        let delta = target - current;
        if delta > Decimal::ZERO {
            Some(Self::credit(user_id, transition_id, delta, PostingReason::AdminAdjustment))
        } else if delta < Decimal::ZERO {
            Some(Self::debit(user_id, transition_id, -delta, PostingReason::AdminAdjustment))
        } else {
            None
        }
    }
}

/// One applied posting (immutable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub user_id: UserId,
    pub transition_id: TransitionId,
    pub direction: Direction,
    pub amount: Amount,
    pub reason: PostingReason,
    pub occurred_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn delta(&self) -> Amount {
        self.direction.signed(self.amount)
    }
}
