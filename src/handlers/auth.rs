use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::entities::profile::{self, ProfileRole};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::create_token;
use crate::utils::validate::is_valid_phone;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub role: ProfileRole,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub profile: ProfileInfo,
}

#[derive(Debug, Serialize)]
pub struct ProfileInfo {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub role: ProfileRole,
}

/// Register a new driver or passenger account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    if payload.full_name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AppError::BadRequest(
            "Please fill in all fields".to_string(),
        ));
    }

    if !is_valid_phone(&payload.phone_number) {
        return Err(AppError::BadRequest(
            "Please enter a valid 10-digit phone number".to_string(),
        ));
    }

    // Check if email already exists
    let existing = profile::Entity::find()
        .filter(profile::Column::Email.eq(&payload.email))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    // Hash password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    // Create profile
    let profile_id = Uuid::new_v4();
    let new_profile = profile::ActiveModel {
        id: Set(profile_id),
        full_name: Set(payload.full_name.clone()),
        email: Set(payload.email.clone()),
        phone_number: Set(payload.phone_number.clone()),
        password_hash: Set(password_hash),
        role: Set(payload.role),
        ..Default::default()
    };

    let created = new_profile.insert(&state.db).await?;

    // Generate token
    let token = create_token(
        created.id,
        &created.email,
        created.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(Json(AuthResponse {
        token,
        profile: ProfileInfo {
            id: created.id,
            full_name: created.full_name,
            email: created.email,
            phone_number: created.phone_number,
            role: created.role,
        },
    }))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    // Find profile by email
    let found = profile::Entity::find()
        .filter(profile::Column::Email.eq(&payload.email))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    // Verify password
    let parsed_hash = PasswordHash::new(&found.password_hash)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {}", e)))?;

    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized("Invalid email or password".to_string()))?;

    // Generate token
    let token = create_token(
        found.id,
        &found.email,
        found.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(Json(AuthResponse {
        token,
        profile: ProfileInfo {
            id: found.id,
            full_name: found.full_name,
            email: found.email,
            phone_number: found.phone_number,
            role: found.role,
        },
    }))
}
