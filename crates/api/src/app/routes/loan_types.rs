use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use serde_json::{Value, json};

use finhub_catalog::{LoanType, LoanTypeDraft, LoanTypeUpdate};
use finhub_core::LoanTypeId;

use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::services::{AppServices, find};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_loan_types).post(create_loan_type))
        .route(
            "/:id",
            get(get_loan_type).put(update_loan_type).delete(delete_loan_type),
        )
}

pub async fn list_loan_types(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<ApiJson<Vec<LoanType>>, ApiError> {
    Ok(ApiJson(services.loan_types.list().await?))
}

pub async fn get_loan_type(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<ApiJson<LoanType>, ApiError> {
    let id: LoanTypeId = parse_id(&id)?;
    Ok(ApiJson(find(&*services.loan_types, &id, "loan type").await?))
}

pub async fn create_loan_type(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(body): ApiJson<LoanTypeDraft>,
) -> Result<(StatusCode, ApiJson<LoanType>), ApiError> {
    authz::require_admin(&principal)?;
    let loan_type = LoanType::create(LoanTypeId::new(), body, Utc::now())?;

    let _unique = services.unique_write().await;
    ensure_unique_name(&services, &loan_type).await?;
    services
        .loan_types
        .insert(loan_type.id, loan_type.clone())
        .await?;

    tracing::info!(loan_type_id = %loan_type.id, name = %loan_type.name, "loan type created");
    Ok((StatusCode::CREATED, ApiJson(loan_type)))
}

pub async fn update_loan_type(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<LoanTypeUpdate>,
) -> Result<ApiJson<LoanType>, ApiError> {
    authz::require_admin(&principal)?;
    let id: LoanTypeId = parse_id(&id)?;

    let _unique = services.unique_write().await;
    let mut loan_type = find(&*services.loan_types, &id, "loan type").await?;
    loan_type.apply(body)?;
    ensure_unique_name(&services, &loan_type).await?;
    services.loan_types.upsert(id, loan_type.clone()).await?;

    Ok(ApiJson(loan_type))
}

pub async fn delete_loan_type(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<ApiJson<Value>, ApiError> {
    authz::require_admin(&principal)?;
    let id: LoanTypeId = parse_id(&id)?;

    if !services.loan_types.remove(&id).await? {
        return Err(ApiError::not_found("loan type"));
    }
    tracing::info!(loan_type_id = %id, "loan type removed");
    Ok(ApiJson(json!({ "message": "Loan type removed" })))
}

async fn ensure_unique_name(services: &AppServices, loan_type: &LoanType) -> Result<(), ApiError> {
    let taken = services
        .loan_types
        .list()
        .await?
        .into_iter()
        .any(|t| t.id != loan_type.id && t.name.eq_ignore_ascii_case(&loan_type.name));
    if taken {
        return Err(ApiError::Conflict(format!(
            "loan type {} already exists",
            loan_type.name
        )));
    }
    Ok(())
}
