use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use serde_json::{Value, json};

use finhub_catalog::{Asset, AssetDraft, AssetUpdate};
use finhub_core::AssetId;

use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::services::{AppServices, find};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_assets).post(create_asset))
        .route("/all", get(list_all_assets))
        .route("/:id", get(get_asset).put(update_asset).delete(delete_asset))
}

pub async fn list_assets(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<ApiJson<Vec<Asset>>, ApiError> {
    Ok(ApiJson(services.assets.list().await?))
}

pub async fn list_all_assets(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<Asset>>, ApiError> {
    authz::require_admin(&principal)?;
    Ok(ApiJson(services.assets.list().await?))
}

pub async fn get_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<ApiJson<Asset>, ApiError> {
    let id: AssetId = parse_id(&id)?;
    Ok(ApiJson(find(&*services.assets, &id, "asset").await?))
}

pub async fn create_asset(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(body): ApiJson<AssetDraft>,
) -> Result<(StatusCode, ApiJson<Asset>), ApiError> {
    authz::require_admin(&principal)?;
    let asset = Asset::create(AssetId::new(), body, Utc::now())?;

    let _unique = services.unique_write().await;
    ensure_unique_symbol(&services, &asset).await?;
    services.assets.insert(asset.id, asset.clone()).await?;

    tracing::info!(asset_id = %asset.id, symbol = %asset.symbol, "asset created");
    Ok((StatusCode::CREATED, ApiJson(asset)))
}

pub async fn update_asset(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<AssetUpdate>,
) -> Result<ApiJson<Asset>, ApiError> {
    authz::require_admin(&principal)?;
    let id: AssetId = parse_id(&id)?;

    let _unique = services.unique_write().await;
    let mut asset = find(&*services.assets, &id, "asset").await?;
    asset.apply(body)?;
    ensure_unique_symbol(&services, &asset).await?;
    services.assets.upsert(id, asset.clone()).await?;

    Ok(ApiJson(asset))
}

pub async fn delete_asset(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<ApiJson<Value>, ApiError> {
    authz::require_admin(&principal)?;
    let id: AssetId = parse_id(&id)?;

    if !services.assets.remove(&id).await? {
        return Err(ApiError::not_found("asset"));
    }
    tracing::info!(asset_id = %id, "asset removed");
    Ok(ApiJson(json!({ "message": "Asset removed" })))
}

async fn ensure_unique_symbol(services: &AppServices, asset: &Asset) -> Result<(), ApiError> {
    let taken = services
        .assets
        .list()
        .await?
        .into_iter()
        .any(|a| a.id != asset.id && a.symbol == asset.symbol);
    if taken {
        return Err(ApiError::Conflict(format!(
            "asset with symbol {} already exists",
            asset.symbol
        )));
    }
    Ok(())
}
