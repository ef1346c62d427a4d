use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, put},
};
use chrono::Utc;

use finhub_core::WithdrawalRequestId;
use finhub_requests::{SettlementStatus, WithdrawalRequest, WithdrawalRequestDraft};

use crate::app::dto::{StatusUpdateRequest, UserDirectory, WithUser};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::services::{AppServices, find};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(my_withdrawals).post(request_withdrawal))
        .route("/all", get(all_withdrawals))
        .route("/:id", get(get_withdrawal))
        .route("/:id/status", put(update_status))
}

/// Holds the amount immediately; fails with 400 when the balance is short.
pub async fn request_withdrawal(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(body): ApiJson<WithdrawalRequestDraft>,
) -> Result<(StatusCode, ApiJson<WithdrawalRequest>), ApiError> {
    let user = services.user(principal.user_id()).await?;
    let (request, hold) = WithdrawalRequest::open(
        WithdrawalRequestId::new(),
        user.id,
        user.username,
        body,
        Utc::now(),
    )?;
    let request = services
        .open_record(&*services.withdrawals, request.id, request, Some(hold))
        .await?;

    tracing::info!(withdrawal_id = %request.id, user_id = %request.user_id, amount = %request.amount, "withdrawal requested");
    Ok((StatusCode::CREATED, ApiJson(request)))
}

pub async fn my_withdrawals(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<WithdrawalRequest>>, ApiError> {
    let mine = services
        .withdrawals
        .list()
        .await?
        .into_iter()
        .filter(|w| w.user_id == principal.user_id())
        .collect();
    Ok(ApiJson(mine))
}

pub async fn all_withdrawals(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<WithUser<WithdrawalRequest>>>, ApiError> {
    authz::require_admin(&principal)?;
    let users = UserDirectory::new(services.users.list().await?);
    let all = services.withdrawals.list().await?;
    Ok(ApiJson(all.into_iter().map(|w| users.attach(w)).collect()))
}

pub async fn get_withdrawal(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<ApiJson<WithdrawalRequest>, ApiError> {
    let id: WithdrawalRequestId = parse_id(&id)?;
    let request = find(&*services.withdrawals, &id, "withdrawal request").await?;
    Ok(ApiJson(authz::readable(&principal, request)?))
}

/// Rejecting a pending request refunds the held amount, once.
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusUpdateRequest>,
) -> Result<ApiJson<WithdrawalRequest>, ApiError> {
    authz::require_admin(&principal)?;
    let id: WithdrawalRequestId = parse_id(&id)?;
    let status: SettlementStatus = body.status.parse()?;

    let request = services
        .transition(&*services.withdrawals, id, "withdrawal request", |request| {
            request.set_status(status)
        })
        .await?;
    Ok(ApiJson(request))
}
