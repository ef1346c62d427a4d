use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, put},
};
use chrono::Utc;

use finhub_core::DepositRequestId;
use finhub_requests::{DepositRequest, DepositRequestDraft, SettlementStatus};

use crate::app::dto::{StatusUpdateRequest, UserDirectory, WithUser};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::services::{AppServices, find};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(my_deposits).post(submit_deposit))
        .route("/all", get(all_deposits))
        .route("/:id", get(get_deposit))
        .route("/:id/status", put(update_status))
}

pub async fn submit_deposit(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(body): ApiJson<DepositRequestDraft>,
) -> Result<(StatusCode, ApiJson<DepositRequest>), ApiError> {
    let user = services.user(principal.user_id()).await?;
    let request = DepositRequest::submit(
        DepositRequestId::new(),
        user.id,
        user.username,
        body,
        Utc::now(),
    )?;
    let request = services
        .open_record(&*services.deposits, request.id, request, None)
        .await?;

    tracing::info!(deposit_id = %request.id, user_id = %request.user_id, amount = %request.amount, "deposit submitted");
    Ok((StatusCode::CREATED, ApiJson(request)))
}

pub async fn my_deposits(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<DepositRequest>>, ApiError> {
    let mine = services
        .deposits
        .list()
        .await?
        .into_iter()
        .filter(|d| d.user_id == principal.user_id())
        .collect();
    Ok(ApiJson(mine))
}

pub async fn all_deposits(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<WithUser<DepositRequest>>>, ApiError> {
    authz::require_admin(&principal)?;
    let users = UserDirectory::new(services.users.list().await?);
    let all = services.deposits.list().await?;
    Ok(ApiJson(all.into_iter().map(|d| users.attach(d)).collect()))
}

pub async fn get_deposit(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<ApiJson<DepositRequest>, ApiError> {
    let id: DepositRequestId = parse_id(&id)?;
    let request = find(&*services.deposits, &id, "deposit request").await?;
    Ok(ApiJson(authz::readable(&principal, request)?))
}

/// Confirming a deposit does not credit the balance; admins settle it with a
/// transaction or a balance adjustment.
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusUpdateRequest>,
) -> Result<ApiJson<DepositRequest>, ApiError> {
    authz::require_admin(&principal)?;
    let id: DepositRequestId = parse_id(&id)?;
    let status: SettlementStatus = body.status.parse()?;
    let transaction_id = body.transaction_id;

    let request = services
        .transition(&*services.deposits, id, "deposit request", move |request| {
            request.set_status(status, transaction_id)
        })
        .await?;
    Ok(ApiJson(request))
}
