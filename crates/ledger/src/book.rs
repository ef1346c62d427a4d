use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use finhub_core::{Amount, LedgerEntryId, UserId};

use crate::entry::{Direction, LedgerEntry, Posting, TransitionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("posting amount must be positive (got {0})")]
    InvalidAmount(Amount),

    #[error("insufficient balance (balance {balance}, requested {requested})")]
    InsufficientFunds { balance: Amount, requested: Amount },

    #[error("posting for user {got} applied to the book of user {expected}")]
    WrongAccount { expected: UserId, got: UserId },

    #[error("balance overflow (balance {balance}, delta {delta})")]
    Overflow { balance: Amount, delta: Amount },
}

/// Result of offering a posting to the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    Applied(LedgerEntry),
    /// The transition id was applied before; nothing changed.
    Duplicate(TransitionId),
}

impl PostOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, PostOutcome::Applied(_))
    }
}

/// In-memory view of one user's entry log.
///
/// # Invariants
/// - `balance()` equals the sum of entry deltas.
/// - A transition id appears in at most one entry.
/// - No debit takes the balance below zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBook {
    user_id: UserId,
    entries: Vec<LedgerEntry>,
    applied: HashSet<TransitionId>,
    balance: Amount,
}

impl AccountBook {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            entries: Vec::new(),
            applied: HashSet::new(),
            balance: Decimal::ZERO,
        }
    }

    /// Rebuild a book from stored entries (any order).
    ///
    /// Entries of other users and repeated transition ids are skipped.
    pub fn replay(
        user_id: UserId,
        entries: impl IntoIterator<Item = LedgerEntry>,
    ) -> Result<Self, LedgerError> {
        let mut entries: Vec<LedgerEntry> = entries
            .into_iter()
            .filter(|e| e.user_id == user_id)
            .collect();
        entries.sort_by_key(|e| (e.occurred_at, e.id));

        let mut book = Self::new(user_id);
        for entry in entries {
            if book.applied.insert(entry.transition_id.clone()) {
                book.balance = checked_balance(book.balance, entry.delta())?;
                book.entries.push(entry);
            }
        }
        Ok(book)
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn contains(&self, transition_id: &TransitionId) -> bool {
        self.applied.contains(transition_id)
    }

    pub fn post(
        &mut self,
        posting: Posting,
        occurred_at: DateTime<Utc>,
    ) -> Result<PostOutcome, LedgerError> {
        if posting.user_id != self.user_id {
            return Err(LedgerError::WrongAccount {
                expected: self.user_id,
                got: posting.user_id,
            });
        }
        if self.applied.contains(&posting.transition_id) {
            return Ok(PostOutcome::Duplicate(posting.transition_id));
        }
        if posting.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(posting.amount));
        }
        if posting.direction == Direction::Debit && posting.amount > self.balance {
            return Err(LedgerError::InsufficientFunds {
                balance: self.balance,
                requested: posting.amount,
            });
        }
        let balance = checked_balance(self.balance, posting.direction.signed(posting.amount))?;

        let entry = LedgerEntry {
            id: LedgerEntryId::new(),
            user_id: posting.user_id,
            transition_id: posting.transition_id,
            direction: posting.direction,
            amount: posting.amount,
            reason: posting.reason,
            occurred_at,
        };

        self.applied.insert(entry.transition_id.clone());
        self.balance = balance;
        self.entries.push(entry.clone());

        Ok(PostOutcome::Applied(entry))
    }
}

fn checked_balance(balance: Amount, delta: Amount) -> Result<Amount, LedgerError> {
    balance
        .checked_add(delta)
        .ok_or(LedgerError::Overflow { balance, delta })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::PostingReason;
    use proptest::prelude::*;

    fn tid(n: u32) -> TransitionId {
        TransitionId::new("test", n, "event")
    }

    fn credit(user: UserId, n: u32, amount: i64) -> Posting {
        Posting::credit(user, tid(n), Decimal::from(amount), PostingReason::BonusCredit)
    }

    fn debit(user: UserId, n: u32, amount: i64) -> Posting {
        Posting::debit(user, tid(n), Decimal::from(amount), PostingReason::WithdrawalHold)
    }

    #[test]
    fn credit_then_debit_updates_balance() {
        let user = UserId::new();
        let mut book = AccountBook::new(user);

        assert!(book.post(credit(user, 1, 100), Utc::now()).unwrap().is_applied());
        assert!(book.post(debit(user, 2, 40), Utc::now()).unwrap().is_applied());

        assert_eq!(book.balance(), Decimal::from(60));
        assert_eq!(book.entries().len(), 2);
    }

    #[test]
    fn same_transition_id_is_applied_once() {
        let user = UserId::new();
        let mut book = AccountBook::new(user);

        book.post(credit(user, 7, 500), Utc::now()).unwrap();
        let second = book.post(credit(user, 7, 500), Utc::now()).unwrap();

        assert_eq!(second, PostOutcome::Duplicate(tid(7)));
        assert_eq!(book.balance(), Decimal::from(500));
    }

    #[test]
    fn debit_beyond_balance_is_rejected_and_leaves_book_unchanged() {
        let user = UserId::new();
        let mut book = AccountBook::new(user);
        book.post(credit(user, 1, 30), Utc::now()).unwrap();

        let err = book.post(debit(user, 2, 31), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                balance: Decimal::from(30),
                requested: Decimal::from(31),
            }
        );
        assert_eq!(book.balance(), Decimal::from(30));
        assert!(!book.contains(&tid(2)));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let user = UserId::new();
        let mut book = AccountBook::new(user);
        let err = book.post(credit(user, 1, 0), Utc::now()).unwrap_err();
        assert_eq!(err, LedgerError::InvalidAmount(Decimal::ZERO));
    }

    #[test]
    fn credit_past_the_decimal_range_is_rejected_and_leaves_book_unchanged() {
        let user = UserId::new();
        let mut book = AccountBook::new(user);
        let max = Posting::credit(user, tid(1), Decimal::MAX, PostingReason::AdminAdjustment);
        book.post(max, Utc::now()).unwrap();

        let err = book.post(credit(user, 2, 1), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Overflow {
                balance: Decimal::MAX,
                delta: Decimal::ONE,
            }
        );
        assert_eq!(book.balance(), Decimal::MAX);
        assert!(!book.contains(&tid(2)));
        assert_eq!(book.entries().len(), 1);
    }

    #[test]
    fn replay_reports_overflowing_logs() {
        let user = UserId::new();
        let mut first = AccountBook::new(user);
        first
            .post(Posting::credit(user, tid(1), Decimal::MAX, PostingReason::BonusCredit), Utc::now())
            .unwrap();
        let mut second = AccountBook::new(user);
        second.post(credit(user, 2, 1), Utc::now()).unwrap();

        let stored = first.entries().iter().chain(second.entries()).cloned();
        assert!(matches!(
            AccountBook::replay(user, stored),
            Err(LedgerError::Overflow { .. })
        ));
    }

    #[test]
    fn posting_for_another_user_is_rejected() {
        let mut book = AccountBook::new(UserId::new());
        let other = UserId::new();
        assert!(matches!(
            book.post(credit(other, 1, 10), Utc::now()),
            Err(LedgerError::WrongAccount { .. })
        ));
    }

    #[test]
    fn replay_skips_foreign_entries_and_repeated_transitions() {
        let user = UserId::new();
        let mut book = AccountBook::new(user);
        book.post(credit(user, 1, 100), Utc::now()).unwrap();
        book.post(debit(user, 2, 25), Utc::now()).unwrap();

        let mut stored = book.entries().to_vec();
        stored.push(stored[0].clone());

        let mut foreign = AccountBook::new(UserId::new());
        foreign.post(credit(foreign.user_id(), 9, 1_000), Utc::now()).unwrap();
        stored.extend(foreign.entries().iter().cloned());

        let replayed = AccountBook::replay(user, stored).unwrap();
        assert_eq!(replayed.balance(), Decimal::from(75));
        assert_eq!(replayed.entries().len(), 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any sequence of postings (with repeated transition ids),
        /// the balance equals the sum of applied deltas, never goes negative, and
        /// replaying the entries yields the same book.
        #[test]
        fn balance_is_sum_of_entries_and_never_negative(
            ops in prop::collection::vec((any::<bool>(), 0u32..20, 1i64..1_000i64), 1..60)
        ) {
            let user = UserId::new();
            let mut book = AccountBook::new(user);

            for (is_credit, n, amount) in ops {
                let posting = if is_credit { credit(user, n, amount) } else { debit(user, n, amount) };
                let _ = book.post(posting, Utc::now());
                prop_assert!(book.balance() >= Decimal::ZERO);
            }

            let sum: Decimal = book.entries().iter().map(|e| e.delta()).sum();
            prop_assert_eq!(sum, book.balance());

            let ids: HashSet<_> = book.entries().iter().map(|e| e.transition_id.clone()).collect();
            prop_assert_eq!(ids.len(), book.entries().len());

            let replayed = AccountBook::replay(user, book.entries().to_vec()).unwrap();
            prop_assert_eq!(replayed.balance(), book.balance());
        }
    }
}
