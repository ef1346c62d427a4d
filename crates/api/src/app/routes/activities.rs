use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    http::StatusCode,
    routing::get,
};
use chrono::Utc;

use finhub_core::ActivityId;
use finhub_platform::{Activity, ActivityDraft, newest_first};

use crate::app::dto::{UserDirectory, WithUser};
use crate::app::errors::ApiError;
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(all_activities).post(record_activity))
        .route("/all", get(all_activities))
        .route("/myactivities", get(my_activities))
}

pub async fn record_activity(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(body): ApiJson<ActivityDraft>,
) -> Result<(StatusCode, ApiJson<Activity>), ApiError> {
    let activity = Activity::record(ActivityId::new(), principal.user_id(), body, Utc::now())?;
    services
        .activities
        .insert(activity.id, activity.clone())
        .await?;

    tracing::debug!(activity_id = %activity.id, activity_type = %activity.activity_type, "activity recorded");
    Ok((StatusCode::CREATED, ApiJson(activity)))
}

pub async fn my_activities(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<Activity>>, ApiError> {
    let mut mine: Vec<Activity> = services
        .activities
        .list()
        .await?
        .into_iter()
        .filter(|a| a.user_id == principal.user_id())
        .collect();
    newest_first(&mut mine);
    Ok(ApiJson(mine))
}

pub async fn all_activities(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<WithUser<Activity>>>, ApiError> {
    authz::require_admin(&principal)?;
    let users = UserDirectory::new(services.users.list().await?);
    let mut all = services.activities.list().await?;
    newest_first(&mut all);

    let views = all
        .into_iter()
        .map(|activity| WithUser {
            user: users.get(activity.user_id),
            record: activity,
        })
        .collect();
    Ok(ApiJson(views))
}
