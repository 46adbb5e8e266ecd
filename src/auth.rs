//! Session tokens and the capability checks built on top of them.
//!
//! A session is an HS256 JWT carrying the user id and role. Handlers take a
//! [`Session`] argument to require one. Writes resolve the session back to the
//! stored [`User`] so a deleted or demoted account loses its rights at once.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, User};
use crate::state::AppState;
use crate::utils::error::AppError;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    role: Role,
    iat: i64,
    exp: i64,
}

pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    /// Cookie `Max-Age` matching the token lifetime.
    pub fn max_age_secs(&self) -> i64 {
        self.ttl_hours.saturating_mul(3600)
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires = Duration::try_hours(self.ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::InternalServerError(format!(
                    "session lifetime of {} hours is out of range",
                    self.ttl_hours
                ))
            })?;
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("token encoding failed: {e}")))
    }

    /// Expired, tampered and malformed tokens all yield `None`.
    pub fn verify(&self, token: &str) -> Option<Session> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Some(Session {
                user_id: data.claims.sub,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
}

impl Session {
    /// Loads the account behind the session. A token that outlived its user is a 401.
    pub async fn current_user(&self, state: &AppState) -> Result<User, AppError> {
        state
            .users
            .find_user(self.user_id)
            .await?
            .ok_or_else(|| AppError::AuthError("Session user no longer exists".into()))
    }
}

/// Bearer header first, then the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    bearer.or_else(|| cookie(headers, SESSION_COOKIE))
}

pub fn cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|v| !v.is_empty())
}

pub fn resolve_session(keys: &SessionKeys, headers: &HeaderMap) -> Option<Session> {
    token_from_headers(headers).and_then(|token| keys.verify(token))
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_session(&state.sessions, &parts.headers)
            .ok_or_else(|| AppError::AuthError("A valid session is required".into()))
    }
}

/// Writes are allowed for the owner of a resource or an admin.
pub fn ensure_can_modify(actor: &User, owner_id: Uuid, resource: &str) -> Result<(), AppError> {
    if actor.id == owner_id || actor.is_admin() {
        return Ok(());
    }
    Err(AppError::Forbidden(format!(
        "Only the owner or an admin may modify this {resource}"
    )))
}

pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
