use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Run all pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<()> {
    create_migration_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version < 1 {
        debug!("Running migration v1");
        run_migration_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    if current_version < 2 {
        debug!("Running migration v2");
        run_migration_v2(pool).await?;
        set_schema_version(pool, 2).await?;
    }

    Ok(())
}

async fn create_migration_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS _schema_version (
            version INTEGER PRIMARY KEY
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create schema version table")?;

    Ok(())
}

async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT version FROM _schema_version LIMIT 1")
        .fetch_optional(pool)
        .await
        .context("Failed to get schema version")?;

    Ok(row.map_or(0, |(v,)| v))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("DELETE FROM _schema_version")
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO _schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

async fn execute_all(pool: &SqlitePool, statements: &[(&str, &str)]) -> Result<()> {
    for (name, sql) in statements {
        sqlx::query(sql)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create {name}"))?;
    }
    Ok(())
}

/// Accounts, essays, revisions and moderation history.
async fn run_migration_v1(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v1: creating core schema");

    execute_all(
        pool,
        &[
            (
                "users table",
                r"
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL,
                    password_hash TEXT NOT NULL,
                    role TEXT NOT NULL DEFAULT 'USER' CHECK (role IN ('USER', 'ADMIN')),
                    image TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                ",
            ),
            (
                "sessions table",
                r"
                CREATE TABLE IF NOT EXISTS sessions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    token TEXT UNIQUE NOT NULL,
                    expires_at TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    last_used_at TEXT
                )
                ",
            ),
            (
                "posts table",
                r"
                CREATE TABLE IF NOT EXISTS posts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    slug TEXT UNIQUE NOT NULL,
                    title TEXT NOT NULL,
                    excerpt TEXT NOT NULL DEFAULT '',
                    content TEXT NOT NULL,
                    meta_title TEXT,
                    meta_desc TEXT,
                    status TEXT NOT NULL DEFAULT 'DRAFT'
                        CHECK (status IN ('DRAFT', 'PENDING', 'APPROVED', 'REJECTED', 'NEEDS_CHANGES')),
                    author_id INTEGER NOT NULL REFERENCES users(id),
                    read_time_min INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                ",
            ),
            (
                "slug immutability trigger",
                r"
                CREATE TRIGGER IF NOT EXISTS posts_slug_immutable
                BEFORE UPDATE OF slug ON posts
                WHEN NEW.slug IS NOT OLD.slug
                BEGIN
                    SELECT RAISE(ABORT, 'post slug is immutable');
                END
                ",
            ),
            (
                "post_revisions table",
                r"
                CREATE TABLE IF NOT EXISTS post_revisions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    post_id INTEGER NOT NULL REFERENCES posts(id),
                    revision INTEGER NOT NULL CHECK (revision >= 1),
                    title TEXT NOT NULL,
                    excerpt TEXT NOT NULL,
                    content TEXT NOT NULL,
                    meta_title TEXT,
                    meta_desc TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    UNIQUE (post_id, revision)
                )
                ",
            ),
            (
                "revision update guard",
                r"
                CREATE TRIGGER IF NOT EXISTS post_revisions_no_update
                BEFORE UPDATE ON post_revisions
                BEGIN
                    SELECT RAISE(ABORT, 'post revisions are append-only');
                END
                ",
            ),
            (
                "revision delete guard",
                r"
                CREATE TRIGGER IF NOT EXISTS post_revisions_no_delete
                BEFORE DELETE ON post_revisions
                BEGIN
                    SELECT RAISE(ABORT, 'post revisions are append-only');
                END
                ",
            ),
            (
                "moderation_actions table",
                r"
                CREATE TABLE IF NOT EXISTS moderation_actions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    post_id INTEGER NOT NULL REFERENCES posts(id),
                    admin_id INTEGER NOT NULL REFERENCES users(id),
                    from_status TEXT NOT NULL,
                    to_status TEXT NOT NULL,
                    note TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                ",
            ),
            (
                "likes table",
                r"
                CREATE TABLE IF NOT EXISTS likes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    post_id INTEGER NOT NULL REFERENCES posts(id),
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    UNIQUE (post_id, user_id)
                )
                ",
            ),
        ],
    )
    .await?;

    execute_all(
        pool,
        &[
            (
                "posts status index",
                "CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status, created_at)",
            ),
            (
                "posts author index",
                "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id)",
            ),
            (
                "moderation post index",
                "CREATE INDEX IF NOT EXISTS idx_moderation_post ON moderation_actions(post_id, id)",
            ),
        ],
    )
    .await?;

    Ok(())
}

/// Taxonomy, media, home sections and audience capture.
async fn run_migration_v2(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v2: taxonomy, media and site content");

    execute_all(
        pool,
        &[
            (
                "tags table",
                r"
                CREATE TABLE IF NOT EXISTS tags (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT UNIQUE NOT NULL
                )
                ",
            ),
            (
                "post_tags table",
                r"
                CREATE TABLE IF NOT EXISTS post_tags (
                    post_id INTEGER NOT NULL REFERENCES posts(id),
                    tag_id INTEGER NOT NULL REFERENCES tags(id),
                    PRIMARY KEY (post_id, tag_id)
                )
                ",
            ),
            (
                "categories table",
                r"
                CREATE TABLE IF NOT EXISTS categories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT UNIQUE NOT NULL
                )
                ",
            ),
            (
                "post_categories table",
                r"
                CREATE TABLE IF NOT EXISTS post_categories (
                    post_id INTEGER NOT NULL REFERENCES posts(id),
                    category_id INTEGER NOT NULL REFERENCES categories(id),
                    PRIMARY KEY (post_id, category_id)
                )
                ",
            ),
            (
                "media table",
                r"
                CREATE TABLE IF NOT EXISTS media (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    post_id INTEGER NOT NULL REFERENCES posts(id),
                    kind TEXT NOT NULL CHECK (kind IN ('PHOTO', 'VIDEO')),
                    file_name TEXT NOT NULL,
                    mime_type TEXT NOT NULL,
                    alt_text TEXT NOT NULL,
                    sort_order INTEGER NOT NULL DEFAULT 0,
                    data BLOB NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                ",
            ),
            (
                "page_sections table",
                r"
                CREATE TABLE IF NOT EXISTS page_sections (
                    id TEXT PRIMARY KEY,
                    page TEXT NOT NULL DEFAULT 'home',
                    type TEXT NOT NULL DEFAULT 'custom',
                    title TEXT,
                    body TEXT,
                    sort_order INTEGER NOT NULL DEFAULT 0,
                    visible INTEGER NOT NULL DEFAULT 1
                )
                ",
            ),
            (
                "subscriptions table",
                r"
                CREATE TABLE IF NOT EXISTS subscriptions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT UNIQUE NOT NULL,
                    wants_to_post INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                ",
            ),
            (
                "partner_interests table",
                r"
                CREATE TABLE IF NOT EXISTS partner_interests (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    company TEXT,
                    message TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                ",
            ),
            (
                "media post index",
                "CREATE INDEX IF NOT EXISTS idx_media_post ON media(post_id, sort_order)",
            ),
        ],
    )
    .await
}
