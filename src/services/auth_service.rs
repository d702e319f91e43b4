use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use sea_orm::{ColumnTrait, Condition};

use crate::{
    dto::auth::{LoginRequest, LoginResponse},
    entity::users::Column,
    error::{AppError, AppResult},
    models::{DocumentId, Role},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<LoginResponse> {
    let LoginRequest { email, password } = payload;
    let user = state
        .users
        .find_one(Condition::all().add(Column::Email.eq(email.trim())))
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    if !verify_password(&password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }
    if !user.is_active {
        tracing::debug!(user_id = %user.id, "inactive account");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let role = user
        .role
        .parse::<Role>()
        .map_err(|err| AppError::Internal(anyhow::anyhow!(err)))?;
    let token = state
        .tokens
        .issue(&DocumentId::from_stored(user.id.clone()), role)?;
    tracing::info!(user_id = %user.id, role = %role, "user logged in");

    Ok(LoginResponse { token })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn garbage_hash_is_internal_error() {
        let err = verify_password("x", "not-a-phc-string").unwrap_err();
        assert_eq!(err.status().as_u16(), 500);
    }
}
