//! Account ledger service: applies postings to a user's entry log and keeps
//! the cached balance on the user record in step with it.
//!
//! Callers take the owner's [`LedgerGuard`] before loading the record whose
//! status drives the posting, and hold it until the record is saved. Writes
//! happen in this order: ledger entry, cached balance, then (by the caller)
//! the record itself. Replaying the same request after a partial failure
//! hits the duplicate path and completes the remaining writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

use finhub_auth::UserAccount;
use finhub_core::{Amount, UserId};
use finhub_ledger::{AccountBook, LedgerEntry, LedgerError, PostOutcome, Posting, TransitionId};

use crate::store::{DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum AccountLedgerError {
    #[error("user {0} not found")]
    UnknownUser(UserId),

    #[error("ledger guard for user {held} used to post for user {requested}")]
    GuardMismatch { held: UserId, requested: UserId },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Exclusive right to move one user's balance.
#[derive(Debug)]
pub struct LedgerGuard {
    user_id: UserId,
    _lock: OwnedMutexGuard<()>,
}

impl LedgerGuard {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// What a posting did, and the owner as saved afterwards.
#[derive(Debug, Clone)]
pub struct PostingReceipt {
    pub outcome: PostOutcome,
    pub user: UserAccount,
}

impl PostingReceipt {
    pub fn balance(&self) -> Amount {
        self.user.balance
    }
}

pub struct AccountLedger {
    users: Arc<dyn DocumentStore<UserId, UserAccount>>,
    entries: Arc<dyn DocumentStore<TransitionId, LedgerEntry>>,
    locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl AccountLedger {
    pub fn new(
        users: Arc<dyn DocumentStore<UserId, UserAccount>>,
        entries: Arc<dyn DocumentStore<TransitionId, LedgerEntry>>,
    ) -> Self {
        Self {
            users,
            entries,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive access to `user_id`'s balance.
    pub async fn lock(&self, user_id: UserId) -> LedgerGuard {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(user_id).or_default().clone()
        };
        LedgerGuard {
            user_id,
            _lock: mutex.lock_owned().await,
        }
    }

    /// All entries of `user_id`, oldest first.
    pub async fn entries(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, AccountLedgerError> {
        Ok(self.book(user_id).await?.entries().to_vec())
    }

    /// Replay `user_id`'s entries. Reads only that user's documents.
    pub async fn book(&self, user_id: UserId) -> Result<AccountBook, AccountLedgerError> {
        let entries = self
            .entries
            .list_where("user_id", &user_id.to_string())
            .await?;
        Ok(AccountBook::replay(user_id, entries)?)
    }

    /// Apply `posting` at most once and refresh the owner's cached balance.
    ///
    /// A duplicate transition id is not an error: nothing is appended, and the
    /// cached balance is still rewritten from the log.
    pub async fn post(
        &self,
        guard: &LedgerGuard,
        posting: Posting,
        now: DateTime<Utc>,
    ) -> Result<PostingReceipt, AccountLedgerError> {
        if guard.user_id != posting.user_id {
            return Err(AccountLedgerError::GuardMismatch {
                held: guard.user_id,
                requested: posting.user_id,
            });
        }

        let mut user = self.load_user(posting.user_id).await?;
        let mut book = self.book(posting.user_id).await?;

        let outcome = match book.post(posting, now)? {
            PostOutcome::Applied(entry) => {
                let inserted = self
                    .entries
                    .insert(entry.transition_id.clone(), entry.clone())
                    .await?;
                if inserted {
                    tracing::info!(
                        user_id = %entry.user_id,
                        transition_id = %entry.transition_id,
                        direction = ?entry.direction,
                        amount = %entry.amount,
                        "ledger entry posted"
                    );
                    PostOutcome::Applied(entry)
                } else {
                    // Written by another process between our read and insert.
                    book = self.book(user.id).await?;
                    tracing::debug!(user_id = %user.id, transition_id = %entry.transition_id, "duplicate posting ignored");
                    PostOutcome::Duplicate(entry.transition_id)
                }
            }
            PostOutcome::Duplicate(tid) => {
                tracing::debug!(user_id = %user.id, transition_id = %tid, "duplicate posting ignored");
                PostOutcome::Duplicate(tid)
            }
        };

        user.balance = book.balance();
        self.users.upsert(user.id, user.clone()).await?;

        Ok(PostingReceipt { outcome, user })
    }

    /// Rewrite the cached balance from the entry log.
    pub async fn reconcile(&self, guard: &LedgerGuard) -> Result<UserAccount, AccountLedgerError> {
        let mut user = self.load_user(guard.user_id).await?;
        let derived = self.book(guard.user_id).await?.balance();
        if user.balance != derived {
            tracing::warn!(
                user_id = %user.id,
                cached = %user.balance,
                derived = %derived,
                "cached balance drifted from ledger; rewriting"
            );
            user.balance = derived;
            self.users.upsert(user.id, user.clone()).await?;
        }
        Ok(user)
    }

    async fn load_user(&self, user_id: UserId) -> Result<UserAccount, AccountLedgerError> {
        self.users
            .get(&user_id)
            .await?
            .ok_or(AccountLedgerError::UnknownUser(user_id))
    }
}
