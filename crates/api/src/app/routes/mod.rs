use axum::Router;

pub mod activities;
pub mod admin_settings;
pub mod asset_orders;
pub mod assets;
pub mod bonuses;
pub mod deposits;
pub mod loan_orders;
pub mod loan_types;
pub mod system;
pub mod transactions;
pub mod users;
pub mod withdrawals;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .nest("/users", users::router())
        .nest("/assets", assets::router())
        .nest("/assetOrders", asset_orders::router())
        .nest("/loanTypes", loan_types::router())
        .nest("/loanOrders", loan_orders::router())
        .nest("/transactions", transactions::router())
        .nest("/depositRequests", deposits::router())
        .nest("/withdrawalRequests", withdrawals::router())
        .nest("/bonuses", bonuses::router())
        .nest("/activities", activities::router())
        .nest("/adminSettings", admin_settings::router())
}
