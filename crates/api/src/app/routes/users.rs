use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use rust_decimal::Decimal;

use finhub_auth::{NewUser, ProfileUpdate, Role, normalize_email};
use finhub_core::UserId;
use finhub_ledger::{Posting, TransitionId};

use crate::app::dto::{
    AdminUpdateUserRequest, AuthResponse, LedgerView, LoginRequest, RegisterRequest,
    UpdateProfileRequest, UserView,
};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(register))
        .route("/login", post(login))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/all", get(list_users))
        .route("/:id", get(get_user).patch(admin_update_user))
        .route("/:id/ledger", get(get_ledger))
        .route("/:id/reconcile", post(reconcile))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, ApiJson<AuthResponse>), ApiError> {
    let new_user = NewUser::new(&body.username, &body.email, &body.password)?;
    let user = services.register(new_user, Role::User).await?;
    let token = services.issue_token(&user)?;
    Ok((StatusCode::CREATED, ApiJson(AuthResponse::new(token, &user))))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<ApiJson<AuthResponse>, ApiError> {
    let invalid = || ApiError::Unauthorized("invalid email or password".to_string());

    let email = normalize_email(&body.email).map_err(|_| invalid())?;
    let found = services
        .users
        .list()
        .await?
        .into_iter()
        .find(|u| u.email == email)
        .ok_or_else(invalid)?;

    if !services
        .verify_password(body.password, found.password_hash.clone())
        .await?
    {
        return Err(invalid());
    }

    let _guard = services.ledger.lock(found.id).await;
    let mut user = services.user(found.id).await?;
    user.last_login = Some(Utc::now());
    services.users.upsert(user.id, user.clone()).await?;

    tracing::info!(user_id = %user.id, "user logged in");
    let token = services.issue_token(&user)?;
    Ok(ApiJson(AuthResponse::new(token, &user)))
}

pub async fn get_profile(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<UserView>, ApiError> {
    let user = services.user(principal.user_id()).await?;
    Ok(ApiJson(UserView::from(&user)))
}

pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> Result<ApiJson<AuthResponse>, ApiError> {
    let _unique = services.unique_write().await;
    let _guard = services.ledger.lock(principal.user_id()).await;

    let mut user = services.user(principal.user_id()).await?;
    user.apply_profile(ProfileUpdate {
        username: body.username,
        email: body.email,
        full_name: body.full_name,
        phone: body.phone,
    })?;
    services
        .ensure_unique_user(&user.username, &user.email, Some(user.id))
        .await?;

    if let Some(password) = body.password.filter(|p| !p.is_empty()) {
        user.password_hash = services.hash_password(password).await?;
    }
    services.users.upsert(user.id, user.clone()).await?;

    let token = services.issue_token(&user)?;
    Ok(ApiJson(AuthResponse::new(token, &user)))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<ApiJson<Vec<UserView>>, ApiError> {
    authz::require_admin(&principal)?;
    let users = services.users.list().await?;
    Ok(ApiJson(users.iter().map(UserView::from).collect()))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<ApiJson<UserView>, ApiError> {
    let id: UserId = parse_id(&id)?;
    authz::require_owner_or_admin(&principal, id)?;
    let user = services.user(id).await?;
    Ok(ApiJson(UserView::from(&user)))
}

/// Admin edit. A `balance` field sets the balance through a ledger adjustment.
pub async fn admin_update_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<AdminUpdateUserRequest>,
) -> Result<ApiJson<UserView>, ApiError> {
    authz::require_admin(&principal)?;
    let id: UserId = parse_id(&id)?;
    let (update, target_balance) = body.into_parts();

    let _unique = services.unique_write().await;
    let guard = services.ledger.lock(id).await;

    let mut user = services.user(id).await?;
    user.apply_admin_update(update.clone())?;
    services
        .ensure_unique_user(&user.username, &user.email, Some(id))
        .await?;

    if let Some(target) = target_balance {
        if target < Decimal::ZERO {
            return Err(ApiError::Validation("balance must not be negative".to_string()));
        }
        let transition_id = TransitionId::new(
            "user",
            id,
            &format!("adjustment:{}", uuid::Uuid::now_v7()),
        );
        let current = services.ledger.book(id).await?.balance();
        if let Some(posting) = Posting::adjustment(id, transition_id, current, target) {
            let receipt = services.ledger.post(&guard, posting, Utc::now()).await?;
            tracing::info!(
                user_id = %id,
                admin_id = %principal.user_id(),
                balance = %receipt.balance(),
                "balance adjusted by admin"
            );
            user = receipt.user;
            user.apply_admin_update(update)?;
        }
    }

    services.users.upsert(id, user.clone()).await?;
    Ok(ApiJson(UserView::from(&user)))
}

pub async fn get_ledger(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<ApiJson<LedgerView>, ApiError> {
    authz::require_admin(&principal)?;
    let id: UserId = parse_id(&id)?;
    let user = services.user(id).await?;
    let book = services.ledger.book(id).await?;

    Ok(ApiJson(LedgerView {
        user_id: id,
        cached_balance: user.balance,
        derived_balance: book.balance(),
        entries: book.entries().to_vec(),
    }))
}

pub async fn reconcile(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<ApiJson<UserView>, ApiError> {
    authz::require_admin(&principal)?;
    let id: UserId = parse_id(&id)?;
    let guard = services.ledger.lock(id).await;
    let user = services.ledger.reconcile(&guard).await?;
    Ok(ApiJson(UserView::from(&user)))
}
