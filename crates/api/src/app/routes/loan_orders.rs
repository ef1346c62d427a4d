use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, put},
};
use chrono::Utc;

use finhub_core::LoanOrderId;
use finhub_requests::{ApprovalStatus, LoanOrder, LoanOrderDraft};

use crate::app::dto::{
    LoanOrderView, LoanTypeDirectory, LoanTypeSummary, StatusUpdateRequest, UserDirectory,
    UserSummary,
};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::services::{AppServices, find};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(my_loans).post(apply_for_loan))
        .route("/all", get(all_loans))
        .route("/:id", get(get_loan))
        .route("/:id/status", put(update_status))
}

pub async fn apply_for_loan(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(body): ApiJson<LoanOrderDraft>,
) -> Result<(StatusCode, ApiJson<LoanOrder>), ApiError> {
    let loan_type = find(&*services.loan_types, &body.loan_type_id, "loan type").await?;
    let order = LoanOrder::apply_for(
        LoanOrderId::new(),
        principal.user_id(),
        &loan_type,
        body,
        Utc::now(),
    )?;
    services.user(principal.user_id()).await?;
    let order = services
        .open_record(&*services.loan_orders, order.id, order, None)
        .await?;

    tracing::info!(loan_order_id = %order.id, user_id = %order.user_id, amount = %order.amount, "loan requested");
    Ok((StatusCode::CREATED, ApiJson(order)))
}

pub async fn my_loans(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<LoanOrderView>>, ApiError> {
    let loan_types = LoanTypeDirectory::new(services.loan_types.list().await?);
    let views = services
        .loan_orders
        .list()
        .await?
        .into_iter()
        .filter(|o| o.user_id == principal.user_id())
        .map(|order| LoanOrderView {
            loan_type: loan_types.get(order.loan_type_id),
            user: None,
            order,
        })
        .collect();
    Ok(ApiJson(views))
}

pub async fn all_loans(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<LoanOrderView>>, ApiError> {
    authz::require_admin(&principal)?;
    let loan_types = LoanTypeDirectory::new(services.loan_types.list().await?);
    let users = UserDirectory::new(services.users.list().await?);
    let views = services
        .loan_orders
        .list()
        .await?
        .into_iter()
        .map(|order| LoanOrderView {
            loan_type: loan_types.get(order.loan_type_id),
            user: users.get(order.user_id),
            order,
        })
        .collect();
    Ok(ApiJson(views))
}

pub async fn get_loan(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<ApiJson<LoanOrderView>, ApiError> {
    let id: LoanOrderId = parse_id(&id)?;
    let order = authz::readable(
        &principal,
        find(&*services.loan_orders, &id, "loan order").await?,
    )?;

    let loan_type = services.loan_types.get(&order.loan_type_id).await?;
    let user = services.users.get(&order.user_id).await?;
    Ok(ApiJson(LoanOrderView {
        loan_type: loan_type.as_ref().map(LoanTypeSummary::from),
        user: user.as_ref().map(UserSummary::from),
        order,
    }))
}

/// Approving a pending loan credits the principal to the borrower, once.
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusUpdateRequest>,
) -> Result<ApiJson<LoanOrder>, ApiError> {
    authz::require_admin(&principal)?;
    let id: LoanOrderId = parse_id(&id)?;
    let status: ApprovalStatus = body.status.parse()?;

    let order = services
        .transition(&*services.loan_orders, id, "loan order", |order| {
            order.set_status(status)
        })
        .await?;
    Ok(ApiJson(order))
}
