use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{
    clear_session_cookie, generate_session_token, hash_password, normalize_email,
    session_cookie, session_token_from_cookies, verify_password, RequireUser,
};
use crate::db::{self as queries, User, UserRole};
use crate::error::{AppError, AppResult};
use crate::web::AppState;

const MAX_NAME_LENGTH: usize = 80;
const MAX_IMAGE_LENGTH: usize = 700_000;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Start a session for `user` and build the response carrying its cookie.
async fn start_session(state: &AppState, user: &User, status: StatusCode) -> AppResult<Response> {
    let token = generate_session_token();
    let duration = state.config.session_duration();

    queries::create_session(state.db.pool(), user.id, &token, &duration.expires_at()).await?;

    let cookie = session_cookie(&token, duration, state.config.cookie_secure);
    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "ok": true, "role": user.role, "user": user })),
    )
        .into_response())
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Response> {
    let name = body.name.trim();
    let email = normalize_email(&body.email);
    if name.is_empty() || email.is_empty() || body.password.is_empty() {
        return Err(AppError::validation("All fields are required"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::validation("Name is too long."));
    }

    let pool = state.db.pool();
    if queries::email_exists(pool, &email).await? {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&body.password)?;
    let user_id = queries::create_user(pool, name, &email, &password_hash, UserRole::User).await?;
    let user = queries::get_user_by_id(pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    tracing::info!(user_id, "Registered user");
    start_session(&state, &user, StatusCode::CREATED).await
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Response> {
    let email = normalize_email(&body.email);
    if email.is_empty() || body.password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    let user = queries::get_user_by_email(state.db.pool(), &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&body.password, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "Rejected login");
        return Err(AppError::InvalidCredentials);
    }

    start_session(&state, &user, StatusCode::OK).await
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    RequireUser(user): RequireUser,
) -> AppResult<Response> {
    let token = headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(session_token_from_cookies);

    if let Some(token) = token {
        queries::delete_session(state.db.pool(), token).await?;
    }
    tracing::debug!(user_id = user.id, "Logged out");

    Ok((
        [(header::SET_COOKIE, clear_session_cookie(state.config.cookie_secure))],
        Json(json!({ "ok": true })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    name: Option<String>,
    /// Absent: unchanged. `null` or blank: cleared.
    #[serde(default, deserialize_with = "present")]
    image: Option<Option<String>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// PATCH /api/profile
pub async fn update_profile(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<ProfileRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let name = body.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    if name.is_some_and(|n| n.chars().count() > MAX_NAME_LENGTH) {
        return Err(AppError::validation("Name is too long."));
    }

    let image = body
        .image
        .map(|image| image.map(|i| i.trim().to_string()).filter(|i| !i.is_empty()));
    if let Some(Some(image)) = &image {
        if image.len() > MAX_IMAGE_LENGTH {
            return Err(AppError::validation("Profile image is too large."));
        }
    }

    let updated = queries::update_user_profile(
        state.db.pool(),
        user.id,
        name,
        image.as_ref().map(Option::as_deref),
    )
    .await?
    .ok_or(AppError::NotFound("User"))?;

    Ok(Json(json!({
        "ok": true,
        "user": { "id": updated.id, "name": updated.name, "image": updated.image }
    })))
}
