//! Admin-managed catalog: tradable assets and loan products.
//!
//! Pure domain logic only; these are the only records that can be deleted.

pub mod asset;
pub mod loan_type;

pub use asset::{Asset, AssetDraft, AssetUpdate, Feature};
pub use loan_type::{LoanQuote, LoanType, LoanTypeDraft, LoanTypeUpdate, MAX_LOAN_DURATION_MONTHS};
