use anyhow::{Context, Result};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};

use super::models::{
    Media, MediaBlob, MediaKind, ModerationAction, NewMedia, Notification, PageSection, Post,
    PostRevision, PostStatus, PostSummary, RevisionSnapshot, Session, StatusCounts, User, UserRole,
};

// ========== Users ==========

/// Get a user by ID.
pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user by id")
}

/// Get a user by (normalized) email.
pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user by email")
}

/// Check if an email is already registered.
pub async fn email_exists(pool: &SqlitePool, email: &str) -> Result<bool> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await
        .context("Failed to check email existence")?;
    Ok(row.0 > 0)
}

/// Create a new user.
pub async fn create_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: UserRole,
) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO users (name, email, password_hash, role)
        VALUES (?, ?, ?, ?)
        ",
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(result.last_insert_rowid())
}

/// Count total users.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;
    Ok(row.0)
}

/// Reset name, password and role of an existing account.
pub async fn update_user_credentials(
    pool: &SqlitePool,
    user_id: i64,
    name: &str,
    password_hash: &str,
    role: UserRole,
) -> Result<()> {
    sqlx::query("UPDATE users SET name = ?, password_hash = ?, role = ? WHERE id = ?")
        .bind(name)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update user credentials")?;
    Ok(())
}

/// Update profile fields. `image: Some(None)` clears the image.
pub async fn update_user_profile(
    pool: &SqlitePool,
    user_id: i64,
    name: Option<&str>,
    image: Option<Option<&str>>,
) -> Result<Option<User>> {
    if let Some(name) = name {
        sqlx::query("UPDATE users SET name = ? WHERE id = ?")
            .bind(name)
            .bind(user_id)
            .execute(pool)
            .await
            .context("Failed to update user name")?;
    }
    if let Some(image) = image {
        sqlx::query("UPDATE users SET image = ? WHERE id = ?")
            .bind(image)
            .bind(user_id)
            .execute(pool)
            .await
            .context("Failed to update user image")?;
    }
    get_user_by_id(pool, user_id).await
}

// ========== Sessions ==========

/// Create a new session.
pub async fn create_session(
    pool: &SqlitePool,
    user_id: i64,
    token: &str,
    expires_at: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO sessions (user_id, token, expires_at)
        VALUES (?, ?, ?)
        ",
    )
    .bind(user_id)
    .bind(token)
    .bind(expires_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(result.last_insert_rowid())
}

/// Get a session by token.
pub async fn get_session_by_token(pool: &SqlitePool, token: &str) -> Result<Option<Session>> {
    sqlx::query_as("SELECT * FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch session by token")
}

/// Update session last_used_at.
pub async fn update_session_last_used(pool: &SqlitePool, session_id: i64) -> Result<()> {
    sqlx::query("UPDATE sessions SET last_used_at = datetime('now') WHERE id = ?")
        .bind(session_id)
        .execute(pool)
        .await
        .context("Failed to update session last_used")?;
    Ok(())
}

/// Delete a session.
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await
        .context("Failed to delete session")?;
    Ok(())
}

/// Delete sessions whose expiry is before `now` (RFC 3339).
pub async fn delete_expired_sessions(pool: &SqlitePool, now: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;
    Ok(result.rows_affected())
}

// ========== Posts ==========

/// Fields for a freshly created post.
#[derive(Debug, Clone)]
pub struct NewPost<'a> {
    pub slug: &'a str,
    pub snapshot: &'a RevisionSnapshot,
    pub status: PostStatus,
    pub author_id: i64,
    pub read_time_min: i64,
}

const SUMMARY_SELECT: &str = r"
    SELECT
        p.id, p.slug, p.title, p.excerpt, p.status, p.read_time_min, p.created_at,
        p.author_id, u.name AS author_name,
        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
";

/// Check whether a slug is taken.
pub async fn slug_exists<'e, E>(executor: E, slug: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE slug = ?")
        .bind(slug)
        .fetch_one(executor)
        .await
        .context("Failed to check slug existence")?;
    Ok(row.0 > 0)
}

/// Insert a post row. The caller appends revision 1 in the same transaction.
pub async fn insert_post<'e, E>(executor: E, post: &NewPost<'_>) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r"
        INSERT INTO posts (slug, title, excerpt, content, meta_title, meta_desc, status, author_id, read_time_min)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(post.slug)
    .bind(&post.snapshot.title)
    .bind(&post.snapshot.excerpt)
    .bind(&post.snapshot.content)
    .bind(&post.snapshot.meta_title)
    .bind(&post.snapshot.meta_desc)
    .bind(post.status.as_str())
    .bind(post.author_id)
    .bind(post.read_time_min)
    .execute(executor)
    .await
    .context("Failed to insert post")?;

    Ok(result.last_insert_rowid())
}

/// Get a post by ID.
pub async fn get_post<'e, E>(executor: E, id: i64) -> Result<Option<Post>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as("SELECT * FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("Failed to fetch post")
}

/// Get a post by slug.
pub async fn get_post_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Post>> {
    sqlx::query_as("SELECT * FROM posts WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post by slug")
}

/// Overwrite the live content fields of a post.
pub async fn update_post_content<'e, E>(
    executor: E,
    id: i64,
    snapshot: &RevisionSnapshot,
    read_time_min: i64,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r"
        UPDATE posts
        SET title = ?, excerpt = ?, content = ?, meta_title = ?, meta_desc = ?,
            read_time_min = ?, updated_at = datetime('now')
        WHERE id = ?
        ",
    )
    .bind(&snapshot.title)
    .bind(&snapshot.excerpt)
    .bind(&snapshot.content)
    .bind(&snapshot.meta_title)
    .bind(&snapshot.meta_desc)
    .bind(read_time_min)
    .bind(id)
    .execute(executor)
    .await
    .context("Failed to update post content")?;
    Ok(())
}

/// Set a post's status.
pub async fn set_post_status<'e, E>(executor: E, id: i64, status: PostStatus) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE posts SET status = ?, updated_at = datetime('now') WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(executor)
        .await
        .context("Failed to update post status")?;
    Ok(())
}

/// Public listing: approved posts only, newest first.
pub async fn list_public_posts(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostSummary>> {
    let sql = format!(
        "{SUMMARY_SELECT} WHERE p.status = 'APPROVED' ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?"
    );
    sqlx::query_as(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list public posts")
}

/// All posts written by one author, any status.
pub async fn list_posts_by_author(pool: &SqlitePool, author_id: i64) -> Result<Vec<PostSummary>> {
    let sql = format!("{SUMMARY_SELECT} WHERE p.author_id = ? ORDER BY p.created_at DESC, p.id DESC");
    sqlx::query_as(&sql)
        .bind(author_id)
        .fetch_all(pool)
        .await
        .context("Failed to list posts by author")
}

/// Posts in any of the given statuses, newest first.
pub async fn list_posts_by_statuses(
    pool: &SqlitePool,
    statuses: &[PostStatus],
) -> Result<Vec<PostSummary>> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; statuses.len()].join(", ");
    let sql = format!(
        "{SUMMARY_SELECT} WHERE p.status IN ({placeholders}) ORDER BY p.created_at DESC, p.id DESC"
    );
    let mut query = sqlx::query_as::<_, PostSummary>(&sql);
    for status in statuses {
        query = query.bind(status.as_str());
    }
    query
        .fetch_all(pool)
        .await
        .context("Failed to list posts by status")
}

/// Post counts per status.
pub async fn count_posts_by_status(pool: &SqlitePool) -> Result<StatusCounts> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM posts GROUP BY status")
            .fetch_all(pool)
            .await
            .context("Failed to count posts by status")?;

    let mut counts = StatusCounts::default();
    for (status, count) in rows {
        match PostStatus::from_str(&status) {
            Some(PostStatus::Draft) => counts.draft = count,
            Some(PostStatus::Pending) => counts.pending = count,
            Some(PostStatus::Approved) => counts.approved = count,
            Some(PostStatus::Rejected) => counts.rejected = count,
            Some(PostStatus::NeedsChanges) => counts.needs_changes = count,
            None => {}
        }
    }
    Ok(counts)
}

// ========== Revisions ==========

/// Next revision number for a post (1 for a post with no revisions).
pub async fn next_revision_number<'e, E>(executor: E, post_id: i64) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: (i64,) =
        sqlx::query_as("SELECT COALESCE(MAX(revision), 0) + 1 FROM post_revisions WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(executor)
            .await
            .context("Failed to compute next revision")?;
    Ok(row.0)
}

/// Append a revision snapshot.
pub async fn insert_revision<'e, E>(
    executor: E,
    post_id: i64,
    revision: i64,
    snapshot: &RevisionSnapshot,
) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r"
        INSERT INTO post_revisions (post_id, revision, title, excerpt, content, meta_title, meta_desc)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(post_id)
    .bind(revision)
    .bind(&snapshot.title)
    .bind(&snapshot.excerpt)
    .bind(&snapshot.content)
    .bind(&snapshot.meta_title)
    .bind(&snapshot.meta_desc)
    .execute(executor)
    .await
    .context("Failed to insert post revision")?;

    Ok(result.last_insert_rowid())
}

/// All revisions of a post, oldest first.
pub async fn list_revisions(pool: &SqlitePool, post_id: i64) -> Result<Vec<PostRevision>> {
    sqlx::query_as("SELECT * FROM post_revisions WHERE post_id = ? ORDER BY revision ASC")
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("Failed to list post revisions")
}

/// A single revision of a post.
pub async fn get_revision<'e, E>(
    executor: E,
    post_id: i64,
    revision: i64,
) -> Result<Option<PostRevision>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as("SELECT * FROM post_revisions WHERE post_id = ? AND revision = ?")
        .bind(post_id)
        .bind(revision)
        .fetch_optional(executor)
        .await
        .context("Failed to fetch post revision")
}

// ========== Moderation ==========

/// Record an admin status change.
pub async fn insert_moderation_action<'e, E>(
    executor: E,
    post_id: i64,
    admin_id: i64,
    from_status: PostStatus,
    to_status: PostStatus,
    note: Option<&str>,
) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r"
        INSERT INTO moderation_actions (post_id, admin_id, from_status, to_status, note)
        VALUES (?, ?, ?, ?, ?)
        ",
    )
    .bind(post_id)
    .bind(admin_id)
    .bind(from_status.as_str())
    .bind(to_status.as_str())
    .bind(note)
    .execute(executor)
    .await
    .context("Failed to record moderation action")?;

    Ok(result.last_insert_rowid())
}

/// Moderation history of a post, oldest first.
pub async fn list_moderation_actions(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<ModerationAction>> {
    sqlx::query_as("SELECT * FROM moderation_actions WHERE post_id = ? ORDER BY id ASC")
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("Failed to list moderation actions")
}

/// Latest admin note per post for an author, only where that note is still
/// the most recent admin action on the post.
pub async fn get_author_notifications(
    pool: &SqlitePool,
    author_id: i64,
) -> Result<Vec<Notification>> {
    sqlx::query_as(
        r"
        SELECT m.id, m.post_id, p.title AS post_title, p.status, m.note, m.created_at
        FROM moderation_actions m
        JOIN posts p ON p.id = m.post_id
        WHERE p.author_id = ?
          AND m.id = (SELECT MAX(m2.id) FROM moderation_actions m2 WHERE m2.post_id = m.post_id)
          AND m.note IS NOT NULL
          AND TRIM(m.note) != ''
        ORDER BY m.id DESC
        ",
    )
    .bind(author_id)
    .fetch_all(pool)
    .await
    .context("Failed to get author notifications")
}

// ========== Likes ==========

/// Toggle the viewer's like on a post. Returns (liked, total likes).
pub async fn toggle_post_like(pool: &SqlitePool, post_id: i64, user_id: i64) -> Result<(bool, i64)> {
    let mut tx = super::begin_write(pool).await?;

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to check existing like")?;

    let liked = if let Some((like_id,)) = existing {
        sqlx::query("DELETE FROM likes WHERE id = ?")
            .bind(like_id)
            .execute(&mut *tx)
            .await
            .context("Failed to remove like")?;
        false
    } else {
        sqlx::query("INSERT INTO likes (post_id, user_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to add like")?;
        true
    };

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count likes")?;

    tx.commit().await?;
    Ok((liked, count.0))
}

/// Get the like count of a post.
pub async fn count_post_likes(pool: &SqlitePool, post_id: i64) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(pool)
        .await
        .context("Failed to count likes")?;
    Ok(row.0)
}

// ========== Tags & Categories ==========

/// Link tables for the two taxonomies. Table names are fixed strings.
#[derive(Debug, Clone, Copy)]
pub enum Taxonomy {
    Tags,
    Categories,
}

impl Taxonomy {
    const fn tables(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Tags => ("tags", "post_tags", "tag_id"),
            Self::Categories => ("categories", "post_categories", "category_id"),
        }
    }
}

/// Replace a post's terms with `names`, creating missing terms.
pub async fn set_post_terms(
    conn: &mut SqliteConnection,
    taxonomy: Taxonomy,
    post_id: i64,
    names: &[String],
) -> Result<()> {
    let (terms, links, column) = taxonomy.tables();

    sqlx::query(&format!("DELETE FROM {links} WHERE post_id = ?"))
        .bind(post_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to clear {links}"))?;

    for name in names {
        sqlx::query(&format!("INSERT OR IGNORE INTO {terms} (name) VALUES (?)"))
            .bind(name)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to upsert {terms}"))?;
        let (term_id,): (i64,) = sqlx::query_as(&format!("SELECT id FROM {terms} WHERE name = ?"))
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .with_context(|| format!("Failed to look up {terms}"))?;
        sqlx::query(&format!(
            "INSERT OR IGNORE INTO {links} (post_id, {column}) VALUES (?, ?)"
        ))
        .bind(post_id)
        .bind(term_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to link {terms}"))?;
    }
    Ok(())
}

/// Term names attached to a post, alphabetical.
pub async fn get_post_terms(
    pool: &SqlitePool,
    taxonomy: Taxonomy,
    post_id: i64,
) -> Result<Vec<String>> {
    let (terms, links, column) = taxonomy.tables();
    let rows: Vec<(String,)> = sqlx::query_as(&format!(
        "SELECT t.name FROM {terms} t JOIN {links} l ON l.{column} = t.id WHERE l.post_id = ? ORDER BY t.name"
    ))
    .bind(post_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to get post {terms}"))?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// All term names of a taxonomy, alphabetical.
pub async fn list_terms(pool: &SqlitePool, taxonomy: Taxonomy) -> Result<Vec<String>> {
    let (terms, _, _) = taxonomy.tables();
    let rows: Vec<(String,)> = sqlx::query_as(&format!("SELECT name FROM {terms} ORDER BY name"))
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to list {terms}"))?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Create a term if it does not exist.
pub async fn ensure_term(pool: &SqlitePool, taxonomy: Taxonomy, name: &str) -> Result<()> {
    let (terms, _, _) = taxonomy.tables();
    sqlx::query(&format!("INSERT OR IGNORE INTO {terms} (name) VALUES (?)"))
        .bind(name)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create {terms}"))?;
    Ok(())
}

// ========== Media ==========

/// Store an upload at the end of the post's media order.
pub async fn insert_media(pool: &SqlitePool, media: &NewMedia) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO media (post_id, kind, file_name, mime_type, alt_text, sort_order, data)
        VALUES (?, ?, ?, ?, ?,
            (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM media WHERE post_id = ?),
            ?)
        ",
    )
    .bind(media.post_id)
    .bind(MediaKind::from_mime(&media.mime_type).as_str())
    .bind(&media.file_name)
    .bind(&media.mime_type)
    .bind(&media.alt_text)
    .bind(media.post_id)
    .bind(&media.data)
    .execute(pool)
    .await
    .context("Failed to insert media")?;

    Ok(result.last_insert_rowid())
}

/// Media metadata for a post, in display order.
pub async fn list_media_for_post(pool: &SqlitePool, post_id: i64) -> Result<Vec<Media>> {
    sqlx::query_as(
        r"
        SELECT id, post_id, kind, file_name, mime_type, alt_text, sort_order, created_at
        FROM media WHERE post_id = ? ORDER BY sort_order ASC, id ASC
        ",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
    .context("Failed to list media")
}

/// Media bytes and MIME type.
pub async fn get_media_blob(pool: &SqlitePool, id: i64) -> Result<Option<MediaBlob>> {
    sqlx::query_as("SELECT mime_type, data FROM media WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch media")
}

// ========== Page Sections ==========

/// Insert or update a section. The page of an existing section is kept.
pub async fn upsert_page_section<'e, E>(executor: E, section: &PageSection) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r"
        INSERT INTO page_sections (id, page, type, title, body, sort_order, visible)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            type = excluded.type,
            title = excluded.title,
            body = excluded.body,
            sort_order = excluded.sort_order,
            visible = excluded.visible
        ",
    )
    .bind(&section.id)
    .bind(&section.page)
    .bind(&section.kind)
    .bind(&section.title)
    .bind(&section.body)
    .bind(section.sort_order)
    .bind(section.visible)
    .execute(executor)
    .await
    .context("Failed to upsert page section")?;
    Ok(())
}

/// Sections of a page in display order.
pub async fn list_page_sections(
    pool: &SqlitePool,
    page: &str,
    include_hidden: bool,
) -> Result<Vec<PageSection>> {
    sqlx::query_as(
        r"
        SELECT id, page, type, title, body, sort_order, visible
        FROM page_sections
        WHERE page = ? AND (? OR visible = 1)
        ORDER BY sort_order ASC, id ASC
        ",
    )
    .bind(page)
    .bind(include_hidden)
    .fetch_all(pool)
    .await
    .context("Failed to list page sections")
}

// ========== Audience ==========

/// Subscribe an email, updating the posting-interest flag on repeat.
pub async fn upsert_subscription(pool: &SqlitePool, email: &str, wants_to_post: bool) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO subscriptions (email, wants_to_post) VALUES (?, ?)
        ON CONFLICT(email) DO UPDATE SET wants_to_post = excluded.wants_to_post
        ",
    )
    .bind(email)
    .bind(wants_to_post)
    .execute(pool)
    .await
    .context("Failed to upsert subscription")?;
    Ok(())
}

/// Record a partnership enquiry.
pub async fn create_partner_interest(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    company: Option<&str>,
    message: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO partner_interests (name, email, company, message) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(email)
    .bind(company)
    .bind(message)
    .execute(pool)
    .await
    .context("Failed to create partner interest")?;
    Ok(result.last_insert_rowid())
}
