//! Post lifecycle operations: create, edit, moderate, restore.
//!
//! Each operation on an existing post is one read-modify-write transaction.
//! The live post fields always equal either the latest revision or, after a
//! restore, the restored one.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use super::diff::{diff_revisions, RevisionDiff};
use super::transitions::{admin_transition, edit_target, initial_status, SubmitAction};
use crate::auth::{authorize, Action, Viewer};
use crate::content::{
    checklist, preview_text, read_time_minutes, slug_with_clock_suffix, slug_with_random_suffix,
    slugify, split_names, ChecklistInput, ChecklistItem, EXCERPT_LENGTH,
};
use crate::db::{
    self as queries, Media, NewMedia, NewPost, Notification, Post, PostRevision, PostStatus, PostSummary,
    RevisionSnapshot, StatusCounts, Taxonomy,
};
use crate::error::{AppError, AppResult};

/// Slug candidates tried before giving up with a conflict.
const MAX_SLUG_ATTEMPTS: usize = 5;

/// Author input for creating or editing a post.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub excerpt: Option<String>,
    pub meta_title: Option<String>,
    pub meta_desc: Option<String>,
    /// Comma-separated. `None` leaves existing tags untouched on edit.
    pub tags: Option<String>,
    pub categories: Option<String>,
    #[serde(default)]
    pub action: SubmitAction,
    /// Initial status chosen by an admin; ignored on edit.
    pub status: Option<PostStatus>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl PostDraft {
    fn snapshot(&self) -> AppResult<RevisionSnapshot> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(AppError::validation("Title and content are required"));
        }

        Ok(RevisionSnapshot {
            title: title.to_string(),
            excerpt: non_blank(self.excerpt.as_deref())
                .unwrap_or_else(|| preview_text(content, EXCERPT_LENGTH)),
            content: content.to_string(),
            meta_title: non_blank(self.meta_title.as_deref()),
            meta_desc: non_blank(self.meta_desc.as_deref()),
        })
    }
}

/// Filter for the admin moderation queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueFilter {
    /// Everything awaiting an admin or an author round-trip.
    #[default]
    All,
    Pending,
    NeedsChanges,
}

impl QueueFilter {
    #[must_use]
    pub fn statuses(self) -> &'static [PostStatus] {
        match self {
            Self::All => &[PostStatus::Pending, PostStatus::NeedsChanges],
            Self::Pending => &[PostStatus::Pending],
            Self::NeedsChanges => &[PostStatus::NeedsChanges],
        }
    }
}

/// A post with everything a reader or editor needs alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author_name: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub media: Vec<Media>,
    pub likes: i64,
}

fn post_status(post: &Post) -> AppResult<PostStatus> {
    post.status()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown status {:?}", post.status)))
}

async fn require_post(pool: &SqlitePool, post_id: i64) -> AppResult<Post> {
    queries::get_post(pool, post_id)
        .await?
        .ok_or(AppError::NotFound("Post"))
}

/// Load a post the viewer may manage (author or admin).
pub async fn managed_post(pool: &SqlitePool, viewer: &Viewer, post_id: i64) -> AppResult<Post> {
    let post = require_post(pool, post_id).await?;
    authorize(
        Some(viewer),
        Action::ManagePost {
            author_id: post.author_id,
        },
    )?;
    Ok(post)
}

/// Create a post with revision 1.
pub async fn create_post(pool: &SqlitePool, viewer: &Viewer, draft: &PostDraft) -> AppResult<Post> {
    authorize(Some(viewer), Action::CreatePost)?;
    if draft.status.is_some() {
        authorize(Some(viewer), Action::OverridePostStatus)?;
    }

    let snapshot = draft.snapshot()?;
    let status = initial_status(draft.action, draft.status);
    let read_time_min = read_time_minutes(&snapshot.content);
    let base = slugify(&snapshot.title);

    let mut tx = queries::begin_write(pool).await?;

    let mut slug = None;
    for attempt in 0..MAX_SLUG_ATTEMPTS {
        let candidate = if attempt == 0 {
            slug_with_clock_suffix(&base, chrono::Utc::now().timestamp_millis())
        } else {
            slug_with_random_suffix(&base)
        };
        if !queries::slug_exists(&mut *tx, &candidate).await? {
            slug = Some(candidate);
            break;
        }
    }
    let slug = slug.ok_or_else(|| AppError::Conflict("Could not allocate a unique slug".into()))?;

    let post_id = queries::insert_post(
        &mut *tx,
        &NewPost {
            slug: &slug,
            snapshot: &snapshot,
            status,
            author_id: viewer.user_id,
            read_time_min,
        },
    )
    .await?;
    queries::insert_revision(&mut *tx, post_id, 1, &snapshot).await?;

    if let Some(tags) = &draft.tags {
        queries::set_post_terms(&mut tx, Taxonomy::Tags, post_id, &split_names(tags)).await?;
    }
    if let Some(categories) = &draft.categories {
        queries::set_post_terms(&mut tx, Taxonomy::Categories, post_id, &split_names(categories))
            .await?;
    }

    tx.commit().await?;
    info!(post_id, slug = %slug, status = %status, author_id = viewer.user_id, "Created post");

    require_post(pool, post_id).await
}

/// Edit a post: append a revision, copy it into the live fields, and
/// re-queue the post when the author submits.
pub async fn edit_post(
    pool: &SqlitePool,
    viewer: &Viewer,
    post_id: i64,
    draft: &PostDraft,
) -> AppResult<Post> {
    let snapshot = draft.snapshot()?;

    let mut tx = queries::begin_write(pool).await?;
    let post = queries::get_post(&mut *tx, post_id)
        .await?
        .ok_or(AppError::NotFound("Post"))?;
    authorize(
        Some(viewer),
        Action::ManagePost {
            author_id: post.author_id,
        },
    )?;

    let current = post_status(&post)?;
    let target = edit_target(current, draft.action, viewer.is_admin)?;

    let revision = queries::next_revision_number(&mut *tx, post_id).await?;
    queries::insert_revision(&mut *tx, post_id, revision, &snapshot).await?;
    queries::update_post_content(&mut *tx, post_id, &snapshot, read_time_minutes(&snapshot.content))
        .await?;
    if target != current {
        queries::set_post_status(&mut *tx, post_id, target).await?;
    }

    if let Some(tags) = &draft.tags {
        queries::set_post_terms(&mut tx, Taxonomy::Tags, post_id, &split_names(tags)).await?;
    }
    if let Some(categories) = &draft.categories {
        queries::set_post_terms(&mut tx, Taxonomy::Categories, post_id, &split_names(categories))
            .await?;
    }

    tx.commit().await?;
    info!(post_id, revision, from = %current, to = %target, "Appended post revision");

    require_post(pool, post_id).await
}

/// Admin status change with optional feedback note.
pub async fn moderate_post(
    pool: &SqlitePool,
    admin: &Viewer,
    post_id: i64,
    to: PostStatus,
    note: Option<&str>,
) -> AppResult<Post> {
    authorize(Some(admin), Action::ModeratePost)?;

    let mut tx = queries::begin_write(pool).await?;
    let post = queries::get_post(&mut *tx, post_id)
        .await?
        .ok_or(AppError::NotFound("Post"))?;
    let from = post_status(&post)?;
    let note = admin_transition(from, to, note)?;

    queries::set_post_status(&mut *tx, post_id, to).await?;
    queries::insert_moderation_action(&mut *tx, post_id, admin.user_id, from, to, note.as_deref())
        .await?;

    tx.commit().await?;
    info!(
        post_id,
        admin_id = admin.user_id,
        from = %from,
        to = %to,
        has_note = note.is_some(),
        "Moderated post"
    );

    require_post(pool, post_id).await
}

/// Overwrite the live fields with revision `revision`. No revision is added.
pub async fn restore_revision(
    pool: &SqlitePool,
    viewer: &Viewer,
    post_id: i64,
    revision: i64,
) -> AppResult<Post> {
    let mut tx = queries::begin_write(pool).await?;
    let post = queries::get_post(&mut *tx, post_id)
        .await?
        .ok_or(AppError::NotFound("Post"))?;
    authorize(
        Some(viewer),
        Action::ManagePost {
            author_id: post.author_id,
        },
    )?;
    // Same lock as editing: restoring must not bypass review.
    edit_target(post_status(&post)?, SubmitAction::Save, viewer.is_admin)?;

    let snapshot = queries::get_revision(&mut *tx, post_id, revision)
        .await?
        .ok_or(AppError::NotFound("Revision"))?
        .snapshot();
    queries::update_post_content(&mut *tx, post_id, &snapshot, read_time_minutes(&snapshot.content))
        .await?;

    tx.commit().await?;
    info!(post_id, revision, user_id = viewer.user_id, "Restored post revision");

    require_post(pool, post_id).await
}

/// All revisions of a post, oldest first.
pub async fn revision_history(
    pool: &SqlitePool,
    viewer: &Viewer,
    post_id: i64,
) -> AppResult<Vec<PostRevision>> {
    managed_post(pool, viewer, post_id).await?;
    Ok(queries::list_revisions(pool, post_id).await?)
}

/// Diff revision `from` against revision `to`.
pub async fn revision_diff(
    pool: &SqlitePool,
    viewer: &Viewer,
    post_id: i64,
    from: i64,
    to: i64,
) -> AppResult<RevisionDiff> {
    managed_post(pool, viewer, post_id).await?;
    let older = queries::get_revision(pool, post_id, from)
        .await?
        .ok_or(AppError::NotFound("Revision"))?;
    let newer = queries::get_revision(pool, post_id, to)
        .await?
        .ok_or(AppError::NotFound("Revision"))?;
    Ok(diff_revisions(&older, &newer))
}

/// Advisory pre-submit checklist for a post.
pub async fn checklist_for(
    pool: &SqlitePool,
    viewer: &Viewer,
    post_id: i64,
) -> AppResult<Vec<ChecklistItem>> {
    let post = managed_post(pool, viewer, post_id).await?;
    let tags = queries::get_post_terms(pool, Taxonomy::Tags, post_id).await?;
    let categories = queries::get_post_terms(pool, Taxonomy::Categories, post_id).await?;

    Ok(checklist(ChecklistInput {
        title: &post.title,
        meta_title: post.meta_title.as_deref(),
        meta_desc: post.meta_desc.as_deref(),
        tag_count: tags.len(),
        category_count: categories.len(),
        content: &post.content,
    }))
}

/// A post by slug. Unpublished posts are only visible to their author and
/// admins; everyone else gets "not found".
pub async fn visible_post_by_slug(
    pool: &SqlitePool,
    viewer: Option<&Viewer>,
    slug: &str,
) -> AppResult<Post> {
    let post = queries::get_post_by_slug(pool, slug)
        .await?
        .ok_or(AppError::NotFound("Post"))?;

    if !post.is_public()
        && authorize(
            viewer,
            Action::ManagePost {
                author_id: post.author_id,
            },
        )
        .is_err()
    {
        return Err(AppError::NotFound("Post"));
    }
    Ok(post)
}

/// A visible post with its author, taxonomy, media and like count.
pub async fn visible_post(
    pool: &SqlitePool,
    viewer: Option<&Viewer>,
    slug: &str,
) -> AppResult<PostDetail> {
    let post = visible_post_by_slug(pool, viewer, slug).await?;

    let author_name = queries::get_user_by_id(pool, post.author_id)
        .await?
        .map(|u| u.name)
        .unwrap_or_default();
    let tags = queries::get_post_terms(pool, Taxonomy::Tags, post.id).await?;
    let categories = queries::get_post_terms(pool, Taxonomy::Categories, post.id).await?;
    let media = queries::list_media_for_post(pool, post.id).await?;
    let likes = queries::count_post_likes(pool, post.id).await?;

    Ok(PostDetail {
        post,
        author_name,
        tags,
        categories,
        media,
        likes,
    })
}

/// Toggle the viewer's like on a published post. Returns (liked, total).
pub async fn toggle_post_like(
    pool: &SqlitePool,
    viewer: &Viewer,
    post_id: i64,
) -> AppResult<(bool, i64)> {
    authorize(Some(viewer), Action::LikePost)?;
    let post = require_post(pool, post_id).await?;
    if !post.is_public() {
        return Err(AppError::NotFound("Post"));
    }
    Ok(queries::toggle_post_like(pool, post_id, viewer.user_id).await?)
}

/// Attach an upload to a post the viewer manages. Returns the media id.
pub async fn attach_media(pool: &SqlitePool, viewer: &Viewer, media: &NewMedia) -> AppResult<i64> {
    managed_post(pool, viewer, media.post_id).await?;
    if media.data.is_empty() {
        return Err(AppError::validation("Upload is empty"));
    }
    if media.alt_text.trim().is_empty() {
        return Err(AppError::validation("Alt text is required"));
    }
    let id = queries::insert_media(pool, media).await?;
    info!(post_id = media.post_id, media_id = id, bytes = media.data.len(), "Stored media");
    Ok(id)
}

/// Public listing, newest first.
pub async fn public_posts(pool: &SqlitePool, limit: i64, offset: i64) -> AppResult<Vec<PostSummary>> {
    Ok(queries::list_public_posts(pool, limit, offset).await?)
}

/// The viewer's own posts, any status.
pub async fn my_posts(pool: &SqlitePool, viewer: &Viewer) -> AppResult<Vec<PostSummary>> {
    Ok(queries::list_posts_by_author(pool, viewer.user_id).await?)
}

/// Latest admin feedback on each of the viewer's posts.
pub async fn notifications(pool: &SqlitePool, viewer: &Viewer) -> AppResult<Vec<Notification>> {
    Ok(queries::get_author_notifications(pool, viewer.user_id).await?)
}

/// Posts awaiting review.
pub async fn moderation_queue(
    pool: &SqlitePool,
    admin: &Viewer,
    filter: QueueFilter,
) -> AppResult<Vec<PostSummary>> {
    authorize(Some(admin), Action::ViewDashboard)?;
    Ok(queries::list_posts_by_statuses(pool, filter.statuses()).await?)
}

/// Post counts per status.
pub async fn dashboard_counts(pool: &SqlitePool, admin: &Viewer) -> AppResult<StatusCounts> {
    authorize(Some(admin), Action::ViewDashboard)?;
    Ok(queries::count_posts_by_status(pool).await?)
}
