//! bcrypt hashing, run on the blocking pool so request tasks never stall.

use crate::utils::error::AppError;

pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::InternalServerError(format!("bcrypt hash failed: {e}")))
}

/// Malformed hashes verify as `false`.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::InternalServerError(format!("verify task failed: {e}")))
}
