use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::notify::{self, templates};
use crate::utils::reset_token;
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 6;

pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "stored password hash is unreadable");
            false
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

async fn find_by_email(db: &DatabaseConnection, email: &str) -> AppResult<Option<user::Model>> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?)
}

/// Create a customer or mower account
pub async fn register(state: &AppState, input: Registration) -> AppResult<user::Model> {
    if !input.role.is_self_registrable() {
        return Err(AppError::InvalidInput(
            "Role must be either customer or mower".to_string(),
        ));
    }

    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Name is required".to_string()));
    }

    let email = normalize_email(&input.email);
    if !email.contains('@') {
        return Err(AppError::InvalidInput("A valid email is required".to_string()));
    }
    validate_password(&input.password)?;

    if find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Duplicate("Email already registered".to_string()));
    }

    let now = Utc::now().fixed_offset();
    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email),
        password_hash: Set(hash_password(&input.password)?),
        role: Set(input.role),
        is_verified: Set(false),
        is_approved: Set(false),
        phone_number: Set(None),
        reset_token: Set(None),
        reset_token_expires_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    // The pre-check above can race with a concurrent registration; the unique
    // index is the final word.
    let user = new_user.insert(&state.db).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Duplicate("Email already registered".to_string())
        }
        _ => AppError::Database(err),
    })?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user registered");
    Ok(user)
}

/// Check credentials and mint a session token
pub async fn login(
    state: &AppState,
    email: &str,
    password: &str,
) -> AppResult<(user::Model, String)> {
    let invalid = || AppError::Unauthenticated("Invalid email or password".to_string());

    let user = find_by_email(&state.db, &normalize_email(email))
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(password, &user.password_hash) {
        tracing::debug!(user_id = %user.id, "login with wrong password");
        return Err(invalid());
    }

    let token = state.tokens.issue(user.id, user.role)?;
    Ok((user, token))
}

/// Store a reset token for `email` and mail the link. Succeeds whether or
/// not the address belongs to an account.
pub async fn forgot_password(state: &AppState, email: &str) -> AppResult<()> {
    let Some(user) = find_by_email(&state.db, &normalize_email(email)).await? else {
        tracing::info!(email = %email, "password reset requested for unknown email");
        return Ok(());
    };

    let token = reset_token::generate();
    let now = Utc::now().fixed_offset();
    let expires_at = now + Duration::minutes(state.config.reset_token_ttl_minutes);

    let to = user.email.clone();
    let name = user.name.clone();
    let mut active: user::ActiveModel = user.into();
    active.reset_token = Set(Some(token.clone()));
    active.reset_token_expires_at = Set(Some(expires_at));
    active.updated_at = Set(now);
    active.update(&state.db).await?;

    let reset_url = format!("{}?token={}", state.config.password_reset_url, token);
    let email = templates::password_reset(&name, &reset_url, state.config.reset_token_ttl_minutes);
    notify::deliver(state.mailer.as_ref(), &to, email).await;

    Ok(())
}

/// Replace the password of the account holding `token`
pub async fn reset_password(state: &AppState, token: &str, new_password: &str) -> AppResult<()> {
    let invalid = || AppError::Unauthenticated("Invalid or expired token".to_string());

    if token.is_empty() {
        return Err(invalid());
    }

    let user = user::Entity::find()
        .filter(user::Column::ResetToken.eq(token))
        .one(&state.db)
        .await?
        .ok_or_else(invalid)?;

    let now = Utc::now().fixed_offset();
    match user.reset_token_expires_at {
        Some(expires_at) if expires_at > now => {}
        _ => return Err(invalid()),
    }

    validate_password(new_password)?;

    let user_id = user.id;
    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(hash_password(new_password)?);
    active.reset_token = Set(None);
    active.reset_token_expires_at = Set(None);
    active.updated_at = Set(now);
    active.update(&state.db).await?;

    tracing::info!(user_id = %user_id, "password reset");
    Ok(())
}

/// Create the configured administrator account unless the email is taken.
pub async fn seed_admin(db: &DatabaseConnection, email: &str, password: &str) -> AppResult<()> {
    let email = normalize_email(email);
    if find_by_email(db, &email).await?.is_some() {
        return Ok(());
    }

    let now = Utc::now().fixed_offset();
    let admin = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Admin".to_string()),
        email: Set(email.clone()),
        password_hash: Set(hash_password(password)?),
        role: Set(UserRole::Admin),
        is_verified: Set(true),
        is_approved: Set(true),
        phone_number: Set(None),
        reset_token: Set(None),
        reset_token_expires_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match admin.insert(db).await {
        Ok(_) => {
            tracing::info!(email = %email, "admin account created");
            Ok(())
        }
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(()),
        Err(err) => Err(err.into()),
    }
}
