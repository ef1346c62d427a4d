//! `finhub-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod money;
pub mod status;

pub use error::{DomainError, DomainResult};
pub use id::{
    ActivityId, AssetId, AssetOrderId, BonusId, DepositRequestId, LedgerEntryId, LoanOrderId,
    LoanTypeId, TransactionId, UserId, WithdrawalRequestId,
};
pub use money::{Amount, ensure_positive};
pub use status::{RequestStatus, StatusChange, check_transition};
