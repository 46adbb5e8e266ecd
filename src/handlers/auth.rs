use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::auth::{expired_session_cookie, session_cookie};
use crate::models::user::normalize_email;
use crate::models::{SignInInput, UserProfile};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::password::verify_password;
use crate::utils::response::{empty_success, success};

#[derive(Serialize)]
struct SignInPayload {
    token: String,
    user: UserProfile,
}

fn invalid_credentials() -> AppError {
    AppError::AuthError("Invalid credentials".into())
}

pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(input) = payload?;
    let email = normalize_email(&input.email).map_err(|_| invalid_credentials())?;

    let user = state
        .users
        .find_user_by_email(&email)
        .await?
        .ok_or_else(invalid_credentials)?;

    // Accounts created through an external provider have no password to check
    let hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;
    if !verify_password(input.password, hash).await? {
        return Err(invalid_credentials());
    }

    let token = state.sessions.issue(&user)?;
    let cookie = session_cookie(
        &token,
        state.sessions.max_age_secs(),
        state.config.production,
    );

    info!(user_id = %user.id, "User signed in");
    let body = SignInPayload {
        token,
        user: user.into(),
    };
    Ok(([(SET_COOKIE, cookie)], success(body, "Signed in successfully")).into_response())
}

pub async fn sign_out() -> Response {
    (
        [(SET_COOKIE, expired_session_cookie())],
        empty_success("Signed out successfully"),
    )
        .into_response()
}
