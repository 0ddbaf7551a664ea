use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub image: Option<String>,
    pub created_at: String,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin.as_str()
    }
}

/// A login session backed by the `session` cookie.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: String,
    pub created_at: String,
    pub last_used_at: Option<String>,
}

/// Post lifecycle status. Only `Approved` posts are publicly visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    NeedsChanges,
}

impl PostStatus {
    pub const ALL: [Self; 5] = [
        Self::Draft,
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::NeedsChanges,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::NeedsChanges => "NEEDS_CHANGES",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(Self::Draft),
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "NEEDS_CHANGES" => Some(Self::NeedsChanges),
            _ => None,
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An essay row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub meta_title: Option<String>,
    pub meta_desc: Option<String>,
    pub status: String,
    pub author_id: i64,
    pub read_time_min: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Post {
    /// Parsed status. The column is constrained by a CHECK, so this only
    /// fails on a hand-edited database.
    #[must_use]
    pub fn status(&self) -> Option<PostStatus> {
        PostStatus::from_str(&self.status)
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.status() == Some(PostStatus::Approved)
    }

    #[must_use]
    pub fn snapshot(&self) -> RevisionSnapshot {
        RevisionSnapshot {
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            content: self.content.clone(),
            meta_title: self.meta_title.clone(),
            meta_desc: self.meta_desc.clone(),
        }
    }
}

/// Listing row for the public reading surface and dashboards.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostSummary {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub status: String,
    pub read_time_min: i64,
    pub created_at: String,
    pub author_id: i64,
    pub author_name: String,
    pub like_count: i64,
}

/// Content fields captured by every revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionSnapshot {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub meta_title: Option<String>,
    pub meta_desc: Option<String>,
}

/// Immutable snapshot of a post's content.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostRevision {
    pub id: i64,
    pub post_id: i64,
    pub revision: i64,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub meta_title: Option<String>,
    pub meta_desc: Option<String>,
    pub created_at: String,
}

impl PostRevision {
    #[must_use]
    pub fn snapshot(&self) -> RevisionSnapshot {
        RevisionSnapshot {
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            content: self.content.clone(),
            meta_title: self.meta_title.clone(),
            meta_desc: self.meta_desc.clone(),
        }
    }
}

/// One admin status change, with the optional feedback note.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ModerationAction {
    pub id: i64,
    pub post_id: i64,
    pub admin_id: i64,
    pub from_status: String,
    pub to_status: String,
    pub note: Option<String>,
    pub created_at: String,
}

/// Actionable feedback shown to an author.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub post_id: i64,
    pub post_title: String,
    pub status: String,
    pub note: String,
    pub created_at: String,
}

/// Media type derived from the upload's MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "PHOTO",
            Self::Video => "VIDEO",
        }
    }

    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("video") {
            Self::Video
        } else {
            Self::Photo
        }
    }
}

/// Media metadata (blob excluded).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Media {
    pub id: i64,
    pub post_id: i64,
    pub kind: String,
    pub file_name: String,
    pub mime_type: String,
    pub alt_text: String,
    pub sort_order: i64,
    pub created_at: String,
}

/// Media bytes for serving.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MediaBlob {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// New media upload.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub post_id: i64,
    pub file_name: String,
    pub mime_type: String,
    pub alt_text: String,
    pub data: Vec<u8>,
}

/// Admin-managed block on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PageSection {
    pub id: String,
    pub page: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: i64,
    pub visible: bool,
}

/// Post counts per status for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub draft: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub needs_changes: i64,
}

impl StatusCounts {
    /// Posts waiting on an admin or an author round-trip.
    #[must_use]
    pub fn submissions(&self) -> i64 {
        self.pending + self.needs_changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_names() {
        for status in PostStatus::ALL {
            assert_eq!(PostStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(PostStatus::from_str("approved"), None);
    }

    #[test]
    fn test_status_serde_matches_column_values() {
        let json = serde_json::to_string(&PostStatus::NeedsChanges).unwrap();
        assert_eq!(json, "\"NEEDS_CHANGES\"");
    }

    #[test]
    fn test_media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Photo);
    }
}
