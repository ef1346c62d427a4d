//! Request extractors that report failures as [`ApiError`].

use std::str::FromStr;

use axum::extract::FromRequest;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use finhub_core::DomainError;

use crate::app::errors::ApiError;

/// `axum::Json` with malformed bodies reported as 400 validation errors.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Parse a path id, reporting failures as 400 `invalid_id`.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    Ok(raw.parse::<T>()?)
}
