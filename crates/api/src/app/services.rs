//! Service wiring: one document store per collection, the account ledger,
//! token issuing and password hashing, plus the shared write sequences used
//! by the route handlers.

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use finhub_auth::{Hs256TokenIssuer, NewUser, Role, UserAccount, hash_password, verify_password};
use finhub_catalog::{Asset, LoanType};
use finhub_core::{
    ActivityId, AssetId, AssetOrderId, BonusId, DepositRequestId, DomainResult, LoanOrderId,
    LoanTypeId, TransactionId, UserId, WithdrawalRequestId,
};
use finhub_infra::{AccountLedger, DocumentStore, InMemoryDocumentStore};
use finhub_ledger::{LedgerEntry, Posting, TransitionId};
use finhub_platform::{Activity, AdminSettings};
use finhub_requests::{
    AssetOrder, Bonus, DepositRequest, LoanOrder, Owned, Transaction, Transition, WithdrawalRequest,
};

use crate::app::errors::ApiError;
use crate::config::{AppConfig, AuthConfig, BootstrapAdmin, StorageConfig};

pub type Store<K, V> = Arc<dyn DocumentStore<K, V>>;

/// Opens the store backing one collection.
pub trait StoreFactory {
    fn open<K, V>(&self, collection: &'static str) -> Store<K, V>
    where
        K: Clone + Eq + Hash + Display + Send + Sync + 'static,
        V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;
}

pub struct InMemoryStores;

impl StoreFactory for InMemoryStores {
    fn open<K, V>(&self, _collection: &'static str) -> Store<K, V>
    where
        K: Clone + Eq + Hash + Display + Send + Sync + 'static,
        V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Arc::new(InMemoryDocumentStore::<K, V>::new())
    }
}

#[cfg(feature = "postgres")]
pub struct PostgresStores(pub finhub_infra::PgPool);

#[cfg(feature = "postgres")]
impl StoreFactory for PostgresStores {
    fn open<K, V>(&self, collection: &'static str) -> Store<K, V>
    where
        K: Clone + Eq + Hash + Display + Send + Sync + 'static,
        V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Arc::new(finhub_infra::PostgresDocumentStore::<K, V>::new(
            self.0.clone(),
            collection,
        ))
    }
}

pub struct AppServices {
    pub users: Store<UserId, UserAccount>,
    pub assets: Store<AssetId, Asset>,
    pub asset_orders: Store<AssetOrderId, AssetOrder>,
    pub loan_types: Store<LoanTypeId, LoanType>,
    pub loan_orders: Store<LoanOrderId, LoanOrder>,
    pub transactions: Store<TransactionId, Transaction>,
    pub deposits: Store<DepositRequestId, DepositRequest>,
    pub withdrawals: Store<WithdrawalRequestId, WithdrawalRequest>,
    pub bonuses: Store<BonusId, Bonus>,
    pub activities: Store<ActivityId, Activity>,
    pub settings: Store<String, AdminSettings>,
    pub ledger: AccountLedger,
    tokens: Hs256TokenIssuer,
    bcrypt_cost: u32,
    /// Serializes writes guarded by a uniqueness check (usernames, emails,
    /// asset symbols, loan type names).
    unique_writes: tokio::sync::Mutex<()>,
}

impl AppServices {
    pub fn new(stores: &impl StoreFactory, auth: &AuthConfig) -> Self {
        let users = stores.open::<UserId, UserAccount>("users");
        let entries = stores.open::<TransitionId, LedgerEntry>("ledger_entries");

        Self {
            ledger: AccountLedger::new(users.clone(), entries),
            users,
            assets: stores.open("assets"),
            asset_orders: stores.open("asset_orders"),
            loan_types: stores.open("loan_types"),
            loan_orders: stores.open("loan_orders"),
            transactions: stores.open("transactions"),
            deposits: stores.open("deposit_requests"),
            withdrawals: stores.open("withdrawal_requests"),
            bonuses: stores.open("bonuses"),
            activities: stores.open("activities"),
            settings: stores.open("admin_settings"),
            tokens: Hs256TokenIssuer::new(
                auth.jwt_secret.as_bytes(),
                Duration::days(auth.token_ttl_days),
            ),
            bcrypt_cost: auth.bcrypt_cost,
            unique_writes: tokio::sync::Mutex::new(()),
        }
    }

    pub fn issue_token(&self, user: &UserAccount) -> Result<String, ApiError> {
        Ok(self.tokens.issue(user.id, user.role, Utc::now())?)
    }

    /// bcrypt on the blocking pool.
    pub async fn hash_password(&self, plain: String) -> Result<String, ApiError> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password(&plain, cost))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .map_err(ApiError::from)
    }

    pub async fn verify_password(&self, plain: String, hash: String) -> Result<bool, ApiError> {
        tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .map_err(ApiError::from)
    }

    pub async fn unique_write(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.unique_writes.lock().await
    }

    pub async fn user(&self, id: UserId) -> Result<UserAccount, ApiError> {
        find(&*self.users, &id, "user").await
    }

    /// Conflict if another account already uses `username` or `email`.
    /// Call while holding [`Self::unique_write`].
    pub async fn ensure_unique_user(
        &self,
        username: &str,
        email: &str,
        except: Option<UserId>,
    ) -> Result<(), ApiError> {
        let taken = self.users.list().await?.into_iter().any(|u| {
            Some(u.id) != except
                && (u.username.eq_ignore_ascii_case(username) || u.email == email)
        });
        if taken {
            return Err(ApiError::Conflict("user already exists".to_string()));
        }
        Ok(())
    }

    /// Register a new account; the caller decides the role.
    pub async fn register(&self, new_user: NewUser, role: Role) -> Result<UserAccount, ApiError> {
        let _unique = self.unique_write().await;
        self.ensure_unique_user(&new_user.username, &new_user.email, None)
            .await?;

        let hash = self.hash_password(new_user.password.clone()).await?;
        let user = UserAccount::register(UserId::new(), new_user, hash, role, Utc::now());
        self.users.insert(user.id, user.clone()).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Create the configured admin account if its email is not registered yet.
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<(), ApiError> {
        let new_user = NewUser::new(&admin.username, &admin.email, &admin.password)?;
        let exists = self
            .users
            .list()
            .await?
            .into_iter()
            .any(|u| u.email == new_user.email);
        if exists {
            tracing::debug!(email = %new_user.email, "bootstrap admin already present");
            return Ok(());
        }
        self.register(new_user, Role::Admin).await?;
        Ok(())
    }

    /// Persist a freshly created record together with its opening posting.
    ///
    /// The posting (if any) is applied first, under the owner's ledger lock.
    pub async fn open_record<K, V>(
        &self,
        store: &dyn DocumentStore<K, V>,
        key: K,
        record: V,
        posting: Option<Posting>,
    ) -> Result<V, ApiError>
    where
        K: Send + Sync,
        V: Owned + Clone + Send + Sync,
    {
        let guard = self.ledger.lock(record.owner()).await;
        if let Some(posting) = posting {
            self.ledger.post(&guard, posting, Utc::now()).await?;
        }
        store.insert(key, record.clone()).await?;
        Ok(record)
    }

    /// Load a record, move its status with `apply`, post the resulting
    /// balance change and save the record, all under the owner's ledger lock.
    pub async fn transition<K, V, S>(
        &self,
        store: &dyn DocumentStore<K, V>,
        key: K,
        kind: &str,
        apply: impl FnOnce(&mut V) -> DomainResult<Transition<S>> + Send,
    ) -> Result<V, ApiError>
    where
        K: Send + Sync,
        V: Owned + Clone + Send + Sync,
        S: core::fmt::Debug + Send,
    {
        let owner = find(store, &key, kind).await?.owner();
        let guard = self.ledger.lock(owner).await;

        // Reload under the lock: a concurrent update may have moved it.
        let mut record = find(store, &key, kind).await?;
        let transition = apply(&mut record)?;

        if let Some(posting) = transition.posting {
            self.ledger.post(&guard, posting, Utc::now()).await?;
        }
        store.upsert(key, record.clone()).await?;

        tracing::info!(kind, owner = %owner, change = ?transition.change, "status updated");
        Ok(record)
    }
}

/// Fetch `key` or fail with a 404 naming `kind`.
pub async fn find<K, V>(store: &dyn DocumentStore<K, V>, key: &K, kind: &str) -> Result<V, ApiError>
where
    K: Sync,
{
    store
        .get(key)
        .await?
        .ok_or_else(|| ApiError::not_found(kind))
}

/// Build services for the configured storage backend.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let services = match &config.storage {
        StorageConfig::Memory => AppServices::new(&InMemoryStores, &config.auth),
        #[cfg(feature = "postgres")]
        StorageConfig::Postgres {
            url,
            max_connections,
        } => {
            let pool = finhub_infra::connect(url, *max_connections).await?;
            finhub_infra::migrate(&pool).await?;
            AppServices::new(&PostgresStores(pool), &config.auth)
        }
        #[cfg(not(feature = "postgres"))]
        StorageConfig::Postgres { .. } => {
            anyhow::bail!("postgres storage requires the `postgres` feature")
        }
    };

    if let Some(admin) = &config.auth.bootstrap_admin {
        services
            .bootstrap_admin(admin)
            .await
            .map_err(|e| anyhow::anyhow!("bootstrap admin: {e}"))?;
    }

    Ok(services)
}
