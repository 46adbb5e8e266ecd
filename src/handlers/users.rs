use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use tracing::{debug, info, instrument};

use super::parse_id;
use crate::auth::{ensure_can_modify, Session};
use crate::models::user::{normalize_email, normalize_name};
use crate::models::{NewUserInput, UpdateUserInput, User, UserProfile, UserWithEvents};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::password::hash_password;
use crate::utils::response::{created, empty_success, success};

fn not_found(id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("User with id '{id}' was not found"))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Response, AppError> {
    let users: Vec<UserProfile> = state
        .users
        .list_users()
        .await?
        .into_iter()
        .map(UserProfile::from)
        .collect();
    debug!(count = users.len(), "Listed users");
    Ok(success(users, "Users retrieved successfully"))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "User")?;
    let user = state.users.find_user(id).await?.ok_or_else(|| not_found(id))?;
    let events = state.events.events_by_organizer(id).await?;

    let body = UserWithEvents {
        profile: user.into(),
        events,
    };
    Ok(success(body, "User retrieved successfully"))
}

#[instrument(name = "users.create", skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUserInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(input) = payload?;
    let name = normalize_name(&input.name)?;
    let email = normalize_email(&input.email)?;

    let password_hash = match input.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_password(password, state.config.bcrypt_cost).await?),
        None => None,
    };

    let user = User::new(name, email, input.image, password_hash);
    state.users.insert_user(&user).await?;

    info!(user_id = %user.id, "Created user");
    Ok(created(UserProfile::from(user), "User created successfully"))
}

#[instrument(name = "users.update", skip_all, fields(user_id = %id))]
pub async fn update_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "User")?;
    let Json(patch) = payload?;
    let actor = session.current_user(&state).await?;

    let mut user = state.users.find_user(id).await?.ok_or_else(|| not_found(id))?;
    ensure_can_modify(&actor, user.id, "user")?;

    if let Some(name) = patch.name {
        user.name = normalize_name(&name)?;
    }
    if let Some(email) = patch.email {
        user.email = normalize_email(&email)?;
    }
    if let Some(image) = patch.image {
        user.image = Some(image.trim().to_string()).filter(|i| !i.is_empty());
    }
    if let Some(favorites) = patch.favorite_event_ids {
        user.favorite_event_ids = favorites;
    }
    // Only rehash when a new password is actually supplied
    if let Some(password) = patch.password.filter(|p| !p.is_empty()) {
        user.password_hash = Some(hash_password(password, state.config.bcrypt_cost).await?);
    }
    user.updated_at = Utc::now();

    if !state.users.update_user(&user).await? {
        return Err(not_found(id));
    }

    info!("Updated user");
    Ok(success(UserProfile::from(user), "User updated successfully"))
}

#[instrument(name = "users.delete", skip_all, fields(user_id = %id))]
pub async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "User")?;
    let actor = session.current_user(&state).await?;
    let user = state.users.find_user(id).await?.ok_or_else(|| not_found(id))?;
    ensure_can_modify(&actor, user.id, "user")?;

    if !state.users.delete_user(id).await? {
        return Err(not_found(id));
    }

    info!("Deleted user");
    Ok(empty_success("User deleted successfully"))
}
