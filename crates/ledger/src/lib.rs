//! Account ledger (append-only, per-user balance log).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. Balances
//! are derived from entries; a posting is applied at most once per transition id.

pub mod book;
pub mod entry;

pub use book::{AccountBook, LedgerError, PostOutcome};
pub use entry::{Direction, LedgerEntry, Posting, PostingReason, TransitionId};
