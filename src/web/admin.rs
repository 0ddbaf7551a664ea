use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::RequireUser;
use crate::db::{Post, PostStatus, PostSummary, StatusCounts};
use crate::error::AppResult;
use crate::moderation::{service, QueueFilter};
use crate::site;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct QueueParams {
    #[serde(default)]
    status: QueueFilter,
}

/// GET /api/admin/posts?status=ALL|PENDING|NEEDS_CHANGES
pub async fn moderation_queue(
    State(state): State<AppState>,
    Query(params): Query<QueueParams>,
    user: RequireUser,
) -> AppResult<Json<Vec<PostSummary>>> {
    let posts = service::moderation_queue(state.db.pool(), &user.viewer(), params.status).await?;
    Ok(Json(posts))
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    #[serde(flatten)]
    counts: StatusCounts,
    submissions: i64,
}

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<AppState>,
    user: RequireUser,
) -> AppResult<Json<DashboardStats>> {
    let counts = service::dashboard_counts(state.db.pool(), &user.viewer()).await?;
    Ok(Json(DashboardStats {
        submissions: counts.submissions(),
        counts,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    status: PostStatus,
    note: Option<String>,
}

/// POST /api/admin/posts/:id/moderate
pub async fn moderate(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    user: RequireUser,
    Json(body): Json<ModerateRequest>,
) -> AppResult<Json<Post>> {
    let post = service::moderate_post(
        state.db.pool(),
        &user.viewer(),
        post_id,
        body.status,
        body.note.as_deref(),
    )
    .await?;
    Ok(Json(post))
}

#[derive(Debug, Deserialize)]
pub struct SectionsRequest {
    #[serde(default)]
    sections: Vec<Value>,
}

/// POST /api/admin/sections
pub async fn save_sections(
    State(state): State<AppState>,
    user: RequireUser,
    Json(body): Json<SectionsRequest>,
) -> AppResult<Json<Value>> {
    let saved = site::save_sections(state.db.pool(), &user.viewer(), &body.sections).await?;
    Ok(Json(json!({ "ok": true, "saved": saved })))
}
