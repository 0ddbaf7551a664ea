use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;

use super::capability::Viewer;
use super::session::session_token_from_cookies;
use crate::db::{self as queries, User};
use crate::error::AppError;

/// Current authenticated user (if any).
/// Use this extractor when authentication is optional.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    #[must_use]
    pub fn viewer(&self) -> Option<Viewer> {
        self.0.as_ref().map(Viewer::from)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = SqlitePool::from_ref(state);

        let token = parts
            .headers
            .get(header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(session_token_from_cookies);

        let Some(token) = token else {
            return Ok(Self(None));
        };

        let session = match queries::get_session_by_token(&pool, token).await {
            Ok(Some(s)) => s,
            Ok(None) => return Ok(Self(None)),
            Err(e) => {
                tracing::warn!("Session lookup failed: {e:#}");
                return Ok(Self(None));
            }
        };

        let now = chrono::Utc::now().to_rfc3339();
        if session.expires_at < now {
            let _ = queries::delete_session(&pool, token).await;
            return Ok(Self(None));
        }

        let user = match queries::get_user_by_id(&pool, session.user_id).await {
            Ok(Some(u)) => u,
            _ => return Ok(Self(None)),
        };

        let _ = queries::update_session_last_used(&pool, session.id).await;

        Ok(Self(Some(user)))
    }
}

/// Current authenticated user (required).
/// Rejects with a JSON 401 when nobody is logged in.
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

impl RequireUser {
    #[must_use]
    pub fn viewer(&self) -> Viewer {
        Viewer::from(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;

        match user {
            Some(u) => Ok(Self(u)),
            None => Err(AppError::Unauthorized.into_response()),
        }
    }
}
