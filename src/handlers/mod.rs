use axum::extract::Extension;
use axum::http::Uri;
use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::Locale;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod auth;
pub mod events;
pub mod users;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "eventide-api",
    };

    success(payload, "Health check successful")
}

/// Page rendering lives in the frontend; page paths that get past the guard
/// have nothing to serve here.
pub async fn page_fallback(uri: Uri, locale: Option<Extension<Locale>>) -> AppError {
    let locale = locale.map_or("en", |Extension(Locale(l))| l);
    AppError::NotFound(format!("No page at '{}' (locale {})", uri.path(), locale))
}

/// A malformed id can never match a row, so it reads as not-found.
pub(crate) fn parse_id(raw: &str, resource: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::NotFound(format!("{resource} with id '{raw}' was not found")))
}
