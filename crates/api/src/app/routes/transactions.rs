use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, put},
};
use chrono::Utc;

use finhub_core::TransactionId;
use finhub_requests::{Transaction, TransactionDraft, TransactionStatus};

use crate::app::dto::{StatusUpdateRequest, UserDirectory, WithUser};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::services::{AppServices, find};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(my_transactions).post(create_transaction))
        .route("/all", get(all_transactions))
        .route("/:id", get(get_transaction))
        .route("/:id/status", put(update_status))
}

pub async fn create_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(body): ApiJson<TransactionDraft>,
) -> Result<(StatusCode, ApiJson<Transaction>), ApiError> {
    services.user(principal.user_id()).await?;
    let transaction =
        Transaction::record(TransactionId::new(), principal.user_id(), body, Utc::now())?;
    let transaction = services
        .open_record(&*services.transactions, transaction.id, transaction, None)
        .await?;

    tracing::info!(
        transaction_id = %transaction.id,
        reference = %transaction.reference,
        "transaction recorded"
    );
    Ok((StatusCode::CREATED, ApiJson(transaction)))
}

pub async fn my_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<Transaction>>, ApiError> {
    let mine = services
        .transactions
        .list()
        .await?
        .into_iter()
        .filter(|t| t.user_id == principal.user_id())
        .collect();
    Ok(ApiJson(mine))
}

pub async fn all_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<WithUser<Transaction>>>, ApiError> {
    authz::require_admin(&principal)?;
    let users = UserDirectory::new(services.users.list().await?);
    let all = services.transactions.list().await?;
    Ok(ApiJson(all.into_iter().map(|t| users.attach(t)).collect()))
}

pub async fn get_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<ApiJson<Transaction>, ApiError> {
    let id: TransactionId = parse_id(&id)?;
    let transaction = find(&*services.transactions, &id, "transaction").await?;
    Ok(ApiJson(authz::readable(&principal, transaction)?))
}

/// Completing settles the amount: deposits credit, withdrawals debit.
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusUpdateRequest>,
) -> Result<ApiJson<Transaction>, ApiError> {
    authz::require_admin(&principal)?;
    let id: TransactionId = parse_id(&id)?;
    let status: TransactionStatus = body.status.parse()?;

    let transaction = services
        .transition(&*services.transactions, id, "transaction", |t| {
            t.set_status(status)
        })
        .await?;
    Ok(ApiJson(transaction))
}
