use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, put},
};
use chrono::Utc;

use finhub_core::BonusId;
use finhub_requests::{Bonus, BonusDraft, BonusStatus};

use crate::app::dto::{StatusUpdateRequest, UserDirectory, WithUser};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::services::{AppServices, find};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(my_bonuses).post(grant_bonus))
        .route("/all", get(all_bonuses))
        .route("/:id", get(get_bonus))
        .route("/:id/status", put(update_status))
}

pub async fn grant_bonus(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(body): ApiJson<BonusDraft>,
) -> Result<(StatusCode, ApiJson<Bonus>), ApiError> {
    authz::require_admin(&principal)?;
    let user = services.user(body.user_id).await?;
    let bonus = Bonus::grant(BonusId::new(), user.username, body, Utc::now())?;
    let bonus = services
        .open_record(&*services.bonuses, bonus.id, bonus, None)
        .await?;

    tracing::info!(bonus_id = %bonus.id, user_id = %bonus.user_id, amount = %bonus.amount, "bonus granted");
    Ok((StatusCode::CREATED, ApiJson(bonus)))
}

fn newest_first(bonuses: &mut [Bonus]) {
    bonuses.sort_by(|a, b| b.date_added.cmp(&a.date_added));
}

pub async fn my_bonuses(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<Bonus>>, ApiError> {
    let mut mine: Vec<Bonus> = services
        .bonuses
        .list()
        .await?
        .into_iter()
        .filter(|b| b.user_id == principal.user_id())
        .collect();
    newest_first(&mut mine);
    Ok(ApiJson(mine))
}

pub async fn all_bonuses(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<WithUser<Bonus>>>, ApiError> {
    authz::require_admin(&principal)?;
    let users = UserDirectory::new(services.users.list().await?);
    let mut all = services.bonuses.list().await?;
    newest_first(&mut all);
    Ok(ApiJson(all.into_iter().map(|b| users.attach(b)).collect()))
}

pub async fn get_bonus(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<ApiJson<Bonus>, ApiError> {
    let id: BonusId = parse_id(&id)?;
    let bonus = find(&*services.bonuses, &id, "bonus").await?;
    Ok(ApiJson(authz::readable(&principal, bonus)?))
}

/// Marking a bonus `credited` adds it to the balance, once.
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusUpdateRequest>,
) -> Result<ApiJson<Bonus>, ApiError> {
    authz::require_admin(&principal)?;
    let id: BonusId = parse_id(&id)?;
    let status: BonusStatus = body.status.parse()?;

    let bonus = services
        .transition(&*services.bonuses, id, "bonus", |bonus| bonus.set_status(status))
        .await?;
    Ok(ApiJson(bonus))
}
