//! Comment endpoints. Storage is synchronous, so store calls run on the
//! blocking pool.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{MaybeUser, Viewer};
use crate::comments::{CommentEntry, NewComment, ThreadNode};
use crate::error::{AppError, AppResult};
use crate::moderation::service::visible_post_by_slug;
use crate::web::AppState;

async fn blocking<T, F>(f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
}

/// Resolve the essay and the viewer. Comments only exist on essays the
/// viewer can see.
async fn essay_scope(state: &AppState, user: &MaybeUser, slug: &str) -> AppResult<Option<Viewer>> {
    let viewer = user.viewer();
    visible_post_by_slug(state.db.pool(), viewer.as_ref(), slug).await?;
    Ok(viewer)
}

/// GET /api/essays/:slug/comments
pub async fn list(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    user: MaybeUser,
) -> AppResult<Json<Vec<ThreadNode>>> {
    let viewer = essay_scope(&state, &user, &slug).await?;
    let store = state.comments.clone();
    let thread = blocking(move || Ok(store.thread(&slug, viewer.as_ref()))).await?;
    Ok(Json(thread))
}

/// POST /api/essays/:slug/comments
pub async fn add(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    user: MaybeUser,
    Json(body): Json<NewComment>,
) -> AppResult<(StatusCode, Json<CommentEntry>)> {
    let viewer = essay_scope(&state, &user, &slug).await?;
    let image = user.0.as_ref().and_then(|u| u.image.clone());
    let store = state.comments.clone();

    let entry = blocking(move || store.add(&slug, viewer.as_ref(), image.as_deref(), &body)).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    message: String,
}

/// PATCH /api/essays/:slug/comments/:id
pub async fn update(
    State(state): State<AppState>,
    Path((slug, comment_id)): Path<(String, String)>,
    user: MaybeUser,
    Json(body): Json<UpdateRequest>,
) -> AppResult<Json<CommentEntry>> {
    let viewer = essay_scope(&state, &user, &slug).await?;
    let store = state.comments.clone();

    let entry = blocking(move || store.update(&slug, viewer.as_ref(), &comment_id, &body.message))
        .await?;
    Ok(Json(entry))
}

/// DELETE /api/essays/:slug/comments/:id
pub async fn delete_thread(
    State(state): State<AppState>,
    Path((slug, comment_id)): Path<(String, String)>,
    user: MaybeUser,
) -> AppResult<Json<Value>> {
    let viewer = essay_scope(&state, &user, &slug).await?;
    let store = state.comments.clone();

    let removed = blocking(move || store.delete_thread(&slug, viewer.as_ref(), &comment_id)).await?;
    Ok(Json(json!({ "ok": true, "removed": removed })))
}

/// POST /api/essays/:slug/comments/:id/like
pub async fn toggle_like(
    State(state): State<AppState>,
    Path((slug, comment_id)): Path<(String, String)>,
    user: MaybeUser,
) -> AppResult<Json<CommentEntry>> {
    let viewer = essay_scope(&state, &user, &slug).await?;
    let store = state.comments.clone();

    let entry = blocking(move || store.toggle_like(&slug, viewer.as_ref(), &comment_id)).await?;
    Ok(Json(entry))
}
