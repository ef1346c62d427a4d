//! `finhub-requests`: user requests that move money.
//!
//! Every record here is created `pending` and later moved by an admin into a
//! terminal status. Creation and status changes return the [`Posting`] (if
//! any) the caller must apply to the owner's ledger before saving the record.

pub mod asset_order;
pub mod bonus;
pub mod deposit;
pub mod loan_order;
pub mod reference;
pub mod status;
pub mod transaction;
pub mod withdrawal;

use finhub_core::{StatusChange, UserId};
use finhub_ledger::Posting;

pub use asset_order::{AssetOrder, AssetOrderDraft, OrderType};
pub use bonus::{Bonus, BonusDraft};
pub use deposit::{DepositRequest, DepositRequestDraft};
pub use loan_order::{LoanOrder, LoanOrderDraft};
pub use status::{ApprovalStatus, BonusStatus, SettlementStatus, TransactionStatus};
pub use transaction::{Transaction, TransactionDraft, TransactionType};
pub use withdrawal::{WithdrawalRequest, WithdrawalRequestDraft};

/// Records that belong to a single user.
pub trait Owned {
    fn owner(&self) -> UserId;
}

/// Result of a status update: what changed, and the balance effect to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<S> {
    pub change: StatusChange<S>,
    pub posting: Option<Posting>,
}

impl<S> Transition<S> {
    pub fn without_posting(change: StatusChange<S>) -> Self {
        Self {
            change,
            posting: None,
        }
    }
}
