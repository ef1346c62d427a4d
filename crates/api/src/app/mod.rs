//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store wiring and the shared ledger-locked write sequences
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and populate helpers
//! - `errors.rs`: consistent error responses
//! - `extract.rs`: extractors reporting failures as `ApiError`

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config).await?);
    Ok(router_with_services(config, services))
}

/// Router over already-built services.
pub fn router_with_services(config: &AppConfig, services: Arc<services::AppServices>) -> Router {
    let jwt = Arc::new(finhub_auth::Hs256JwtValidator::new(
        config.auth.jwt_secret.as_bytes(),
    ));
    let auth_state = middleware::AuthState { jwt };

    let api = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    let app = Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    if config.server.enable_cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}
