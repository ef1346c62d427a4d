use std::sync::Arc;

use axum::{Router, extract::Extension, routing::get};
use chrono::Utc;

use finhub_platform::{AdminSettings, AdminSettingsUpdate, SETTINGS_KEY};

use crate::app::errors::ApiError;
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/view", get(view_settings))
        .route("/edit", get(edit_settings).put(update_settings))
}

/// Returns the singleton, creating it with defaults on first read.
async fn load_or_create(services: &AppServices) -> Result<AdminSettings, ApiError> {
    let key = SETTINGS_KEY.to_string();
    if let Some(settings) = services.settings.get(&key).await? {
        return Ok(settings);
    }

    let defaults = AdminSettings::defaults(Utc::now());
    if services.settings.insert(key.clone(), defaults.clone()).await? {
        tracing::info!("admin settings created with defaults");
        return Ok(defaults);
    }
    // Lost the race to another first read.
    services
        .settings
        .get(&key)
        .await?
        .ok_or_else(|| ApiError::not_found("admin settings"))
}

pub async fn view_settings(
    Extension(services): Extension<Arc<AppServices>>,
    _principal: PrincipalContext,
) -> Result<ApiJson<AdminSettings>, ApiError> {
    Ok(ApiJson(load_or_create(&services).await?))
}

pub async fn edit_settings(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<AdminSettings>, ApiError> {
    authz::require_admin(&principal)?;
    Ok(ApiJson(load_or_create(&services).await?))
}

pub async fn update_settings(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(body): ApiJson<AdminSettingsUpdate>,
) -> Result<ApiJson<AdminSettings>, ApiError> {
    authz::require_admin(&principal)?;
    let _write = services.unique_write().await;

    let mut settings = load_or_create(&services).await?;
    settings.apply(body, Utc::now());
    services
        .settings
        .upsert(SETTINGS_KEY.to_string(), settings.clone())
        .await?;

    tracing::info!(updated_by = %principal.user_id(), "admin settings updated");
    Ok(ApiJson(settings))
}
