//! Infrastructure layer: document persistence and the account ledger service.

pub mod account_ledger;
pub mod store;

pub use account_ledger::{AccountLedger, AccountLedgerError, LedgerGuard, PostingReceipt};
pub use store::{DocumentStore, InMemoryDocumentStore, StoreError, StoreResult};

#[cfg(feature = "postgres")]
pub use sqlx::PgPool;
#[cfg(feature = "postgres")]
pub use store::postgres::{PostgresDocumentStore, connect, migrate};
