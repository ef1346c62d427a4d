use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, put},
};
use chrono::Utc;

use finhub_core::AssetOrderId;
use finhub_requests::{ApprovalStatus, AssetOrder, AssetOrderDraft};

use crate::app::dto::{
    AssetDirectory, AssetOrderView, AssetSummary, StatusUpdateRequest, UserDirectory, UserSummary,
};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::services::{AppServices, find};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(my_orders).post(create_order))
        .route("/all", get(all_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_status))
}

/// Places an order at the asset's current price; buys debit `amount * price`.
pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(body): ApiJson<AssetOrderDraft>,
) -> Result<(StatusCode, ApiJson<AssetOrder>), ApiError> {
    let asset = find(&*services.assets, &body.asset_id, "asset").await?;
    services.user(principal.user_id()).await?;

    let (order, purchase) = AssetOrder::place(
        AssetOrderId::new(),
        principal.user_id(),
        &asset,
        body,
        Utc::now(),
    )?;
    let order = services
        .open_record(&*services.asset_orders, order.id, order, purchase)
        .await?;

    tracing::info!(order_id = %order.id, user_id = %order.user_id, total = %order.total_cost, "asset order placed");
    Ok((StatusCode::CREATED, ApiJson(order)))
}

pub async fn my_orders(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<AssetOrderView>>, ApiError> {
    let assets = AssetDirectory::new(services.assets.list().await?);
    let views = services
        .asset_orders
        .list()
        .await?
        .into_iter()
        .filter(|o| o.user_id == principal.user_id())
        .map(|order| AssetOrderView {
            asset: assets.get(order.asset_id),
            user: None,
            order,
        })
        .collect();
    Ok(ApiJson(views))
}

pub async fn all_orders(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<AssetOrderView>>, ApiError> {
    authz::require_admin(&principal)?;
    let assets = AssetDirectory::new(services.assets.list().await?);
    let users = UserDirectory::new(services.users.list().await?);
    let views = services
        .asset_orders
        .list()
        .await?
        .into_iter()
        .map(|order| AssetOrderView {
            asset: assets.get(order.asset_id),
            user: users.get(order.user_id),
            order,
        })
        .collect();
    Ok(ApiJson(views))
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<ApiJson<AssetOrderView>, ApiError> {
    let id: AssetOrderId = parse_id(&id)?;
    let order = authz::readable(&principal, find(&*services.asset_orders, &id, "order").await?)?;

    let asset = services.assets.get(&order.asset_id).await?;
    let user = services.users.get(&order.user_id).await?;
    Ok(ApiJson(AssetOrderView {
        asset: asset.as_ref().map(AssetSummary::from),
        user: user.as_ref().map(UserSummary::from),
        order,
    }))
}

/// Status only; rejecting a buy does not refund its purchase.
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusUpdateRequest>,
) -> Result<ApiJson<AssetOrder>, ApiError> {
    authz::require_admin(&principal)?;
    let id: AssetOrderId = parse_id(&id)?;
    let status: ApprovalStatus = body.status.parse()?;

    let order = services
        .transition(&*services.asset_orders, id, "order", |order| {
            order.set_status(status)
        })
        .await?;
    Ok(ApiJson(order))
}
