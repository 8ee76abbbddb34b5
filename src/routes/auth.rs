// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: registration, login, logout and profiles.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::{ProfileUpdate, PublicUser, User};
use crate::time_utils::now_rfc3339;
use crate::AppState;

/// Public account routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/user/{username}", get(get_user))
}

/// Account routes that need a session; auth is layered on in routes/mod.rs.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/user/{username}", put(update_profile))
}

fn validate_username(username: &str) -> std::result::Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset"))
    }
}

fn validate_picture_url(url: &str) -> std::result::Result<(), ValidationError> {
    if url.is_empty() || url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(ValidationError::new("picture_url"))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 32), custom(function = "validate_username"))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Session response for register and login.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

/// Session cookie carrying the JWT. `Secure` unless the frontend is plain HTTP.
fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.frontend_url.starts_with("https://"))
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

fn issue_session(state: &AppState, jar: CookieJar, user: User) -> Result<(CookieJar, AuthResponse)> {
    let token = create_jwt(&user.username, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    let jar = jar.add(session_cookie(state, token.clone()));
    Ok((
        jar,
        AuthResponse {
            user: user.into(),
            token,
        },
    ))
}

/// Create an account and start a session.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(body), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>)> {
    body.validate()?;

    let password_hash = state
        .passwords
        .hash(&body.password)
        .map_err(|e| AppError::Internal(e.into()))?;
    let user = User::new(
        body.username,
        body.email.trim().to_string(),
        password_hash,
        &now_rfc3339(),
    );

    state.db.create_user(&user).await?;
    tracing::info!(username = %user.username, "User registered");

    let (jar, response) = issue_session(&state, jar, user)?;
    Ok((StatusCode::CREATED, jar, Json(response)))
}

/// Verify credentials and start a session.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let user = state
        .db
        .get_user(&body.username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !state.passwords.verify(&body.password, &user.password_hash) {
        tracing::info!(username = %body.username, "Login rejected: bad password");
        return Err(AppError::Unauthorized);
    }

    tracing::info!(username = %user.username, "User logged in");
    let (jar, response) = issue_session(&state, jar, user)?;
    Ok((jar, Json(response)))
}

/// Clear the session cookie. Bearer tokens simply expire.
///
/// The removal cookie is always sent, even if the request carried none.
async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let mut removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    removal.make_removal();
    let jar = jar.add(removal);
    (
        jar,
        Json(MessageResponse {
            message: "User logged out successfully".to_string(),
        }),
    )
}

/// Public profile by username.
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<PublicUser>> {
    let user = state
        .db
        .get_user(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;
    Ok(Json(user.into()))
}

/// Profile fields a user may change. Absent fields are left alone; an
/// empty string clears the field.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(max = 2048), custom(function = "validate_picture_url"))]
    pub profile_picture: Option<String>,
    #[validate(length(max = 64))]
    pub country: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(body: UpdateProfileRequest) -> Self {
        Self {
            profile_picture: body.profile_picture,
            country: body.country,
            bio: body.bio,
            location: body.location,
        }
    }
}

/// Update the caller's own profile.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(username): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateProfileRequest>, AppError>,
) -> Result<Json<PublicUser>> {
    if auth.username != username {
        return Err(AppError::Forbidden(
            "Cannot modify another user's profile".to_string(),
        ));
    }
    body.validate()?;

    let update = ProfileUpdate::from(body);
    let user = state
        .db
        .update_profile(&username, &update, &now_rfc3339())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;
    tracing::info!(username = %username, "Profile updated");

    Ok(Json(user.into()))
}
