use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post, put};
use axum::Router;

use super::{admin, auth, comments, posts, site, AppState};

/// Largest accepted media upload.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health))
        // Accounts
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/profile", patch(auth::update_profile))
        // Reading surface
        .route("/api/essays", get(posts::list_essays))
        .route("/api/essays/:slug", get(posts::essay_detail))
        .route("/api/like", post(posts::toggle_like))
        .route("/api/media/:id", get(posts::serve_media))
        .route("/api/sections", get(site::sections))
        // Authoring
        .route("/api/posts", post(posts::create_post))
        .route("/api/posts/:id", put(posts::edit_post))
        .route("/api/posts/:id/revisions", get(posts::revisions))
        .route(
            "/api/posts/:id/revisions/:rev/diff/:to",
            get(posts::revision_diff),
        )
        .route(
            "/api/posts/:id/revisions/:rev/restore",
            post(posts::restore_revision),
        )
        .route("/api/posts/:id/checklist", get(posts::checklist))
        .route(
            "/api/posts/:id/media",
            post(posts::upload_media).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/me/posts", get(posts::my_posts))
        .route("/api/me/notifications", get(posts::my_notifications))
        // Admin
        .route("/api/admin/posts", get(admin::moderation_queue))
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/posts/:id/moderate", post(admin::moderate))
        .route("/api/admin/sections", post(admin::save_sections))
        // Comments
        .route(
            "/api/essays/:slug/comments",
            get(comments::list).post(comments::add),
        )
        .route(
            "/api/essays/:slug/comments/:id",
            patch(comments::update).delete(comments::delete_thread),
        )
        .route(
            "/api/essays/:slug/comments/:id/like",
            post(comments::toggle_like),
        )
        // Audience
        .route("/api/subscribe", post(site::subscribe))
        .route("/api/partner", post(site::partner))
}

async fn health() -> &'static str {
    "OK"
}
