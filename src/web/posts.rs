use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{MaybeUser, RequireUser};
use crate::content::ChecklistItem;
use crate::db::{self as queries, NewMedia, Notification, Post, PostRevision, PostSummary};
use crate::error::{AppError, AppResult};
use crate::moderation::{service, PostDetail, PostDraft, RevisionDiff};
use crate::web::AppState;

/// Cache policy for media blobs; ids are never reused.
const MEDIA_CACHE_CONTROL: &str = "public, max-age=604800, immutable";

#[derive(Debug, Deserialize)]
pub struct PageParams {
    page: Option<u32>,
    per_page: Option<u32>,
}

/// GET /api/essays
pub async fn list_essays(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Vec<PostSummary>>> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    let offset = i64::from(page - 1) * i64::from(per_page);

    let posts = service::public_posts(state.db.pool(), i64::from(per_page), offset).await?;
    Ok(Json(posts))
}

/// GET /api/essays/:slug
pub async fn essay_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    user: MaybeUser,
) -> AppResult<Json<PostDetail>> {
    let detail = service::visible_post(state.db.pool(), user.viewer().as_ref(), &slug).await?;
    Ok(Json(detail))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    user: RequireUser,
    Json(draft): Json<PostDraft>,
) -> AppResult<(StatusCode, Json<Post>)> {
    let post = service::create_post(state.db.pool(), &user.viewer(), &draft).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/posts/:id
pub async fn edit_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    user: RequireUser,
    Json(draft): Json<PostDraft>,
) -> AppResult<Json<Post>> {
    let post = service::edit_post(state.db.pool(), &user.viewer(), post_id, &draft).await?;
    Ok(Json(post))
}

/// GET /api/posts/:id/revisions
pub async fn revisions(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    user: RequireUser,
) -> AppResult<Json<Vec<PostRevision>>> {
    let revisions = service::revision_history(state.db.pool(), &user.viewer(), post_id).await?;
    Ok(Json(revisions))
}

/// GET /api/posts/:id/revisions/:rev/diff/:to
pub async fn revision_diff(
    State(state): State<AppState>,
    Path((post_id, from, to)): Path<(i64, i64, i64)>,
    user: RequireUser,
) -> AppResult<Json<RevisionDiff>> {
    let diff = service::revision_diff(state.db.pool(), &user.viewer(), post_id, from, to).await?;
    Ok(Json(diff))
}

/// POST /api/posts/:id/revisions/:rev/restore
pub async fn restore_revision(
    State(state): State<AppState>,
    Path((post_id, revision)): Path<(i64, i64)>,
    user: RequireUser,
) -> AppResult<Json<Post>> {
    let post = service::restore_revision(state.db.pool(), &user.viewer(), post_id, revision).await?;
    Ok(Json(post))
}

/// GET /api/posts/:id/checklist
pub async fn checklist(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    user: RequireUser,
) -> AppResult<Json<Vec<ChecklistItem>>> {
    let items = service::checklist_for(state.db.pool(), &user.viewer(), post_id).await?;
    Ok(Json(items))
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    file_name: Option<String>,
    #[serde(default)]
    alt_text: String,
}

/// POST /api/posts/:id/media
///
/// The request body is the raw file. The MIME type comes from
/// `Content-Type`, falling back to a guess from `file_name`.
pub async fn upload_media(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Query(params): Query<UploadParams>,
    user: RequireUser,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    let file_name = params
        .file_name
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or("upload")
        .to_string();

    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
        .map_or_else(
            || {
                mime_guess::from_path(&file_name)
                    .first_or_octet_stream()
                    .to_string()
            },
            str::to_string,
        );

    let media = NewMedia {
        post_id,
        file_name,
        mime_type,
        alt_text: params.alt_text.trim().to_string(),
        data: body.to_vec(),
    };
    let id = service::attach_media(state.db.pool(), &user.viewer(), &media).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "id": id, "url": format!("/api/media/{id}") })),
    ))
}

/// GET /api/media/:id
pub async fn serve_media(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Response> {
    let blob = queries::get_media_blob(state.db.pool(), id)
        .await?
        .ok_or(AppError::NotFound("Media"))?;

    Ok((
        [
            (header::CONTENT_TYPE, blob.mime_type),
            (header::CACHE_CONTROL, MEDIA_CACHE_CONTROL.to_string()),
        ],
        blob.data,
    )
        .into_response())
}

/// GET /api/me/posts
pub async fn my_posts(
    State(state): State<AppState>,
    user: RequireUser,
) -> AppResult<Json<Vec<PostSummary>>> {
    Ok(Json(service::my_posts(state.db.pool(), &user.viewer()).await?))
}

/// GET /api/me/notifications
pub async fn my_notifications(
    State(state): State<AppState>,
    user: RequireUser,
) -> AppResult<Json<Vec<Notification>>> {
    Ok(Json(service::notifications(state.db.pool(), &user.viewer()).await?))
}

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    #[serde(alias = "postId")]
    post_id: Option<i64>,
}

/// POST /api/like
pub async fn toggle_like(
    State(state): State<AppState>,
    user: RequireUser,
    Json(body): Json<LikeRequest>,
) -> AppResult<Json<Value>> {
    let post_id = body
        .post_id
        .ok_or_else(|| AppError::validation("Post ID required"))?;
    let (liked, likes) = service::toggle_post_like(state.db.pool(), &user.viewer(), post_id).await?;
    Ok(Json(json!({ "ok": true, "likes": likes, "liked": liked })))
}
