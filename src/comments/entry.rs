use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display name for comments without a usable author.
pub const GUEST_AUTHOR: &str = "Guest";

/// One stored comment. Serialized in camelCase, the persisted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEntry {
    pub id: String,
    /// `None` for top-level comments.
    pub parent_id: Option<String>,
    /// Stringified user id; `None` for anonymous or legacy comments.
    pub author_id: Option<String>,
    pub author: String,
    pub author_image: Option<String>,
    pub message: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub likes: u64,
    /// User ids that currently like the comment.
    #[serde(default)]
    pub liked_by: Vec<String>,
    /// Whether the viewer reading the entry likes it. Always false in storage.
    pub liked_by_me: bool,
}

impl CommentEntry {
    /// Fill in `liked_by_me` for `user_id`.
    #[must_use]
    pub fn for_viewer(mut self, user_id: Option<i64>) -> Self {
        self.liked_by_me = user_id.is_some_and(|id| self.is_liked_by(&id.to_string()));
        self
    }

    #[must_use]
    pub fn is_liked_by(&self, liker: &str) -> bool {
        self.liked_by.iter().any(|l| l == liker)
    }
}

/// Current time as an RFC 3339 string with millisecond precision.
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// New comment id: `c-{unix millis}-{random hex}`.
#[must_use]
pub fn create_comment_id() -> String {
    let suffix: u64 = rand::thread_rng().gen();
    format!("c-{}-{suffix:x}", Utc::now().timestamp_millis())
}

fn string_field(item: &Value, field: &str) -> Option<String> {
    item.get(field).and_then(Value::as_str).map(str::to_string)
}

fn likers(value: Option<&Value>) -> Vec<String> {
    let mut likers: Vec<String> = Vec::new();
    for liker in value.and_then(Value::as_array).into_iter().flatten() {
        let liker = match liker {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };
        if !likers.contains(&liker) {
            likers.push(liker);
        }
    }
    likers
}

fn like_count(value: Option<&Value>) -> u64 {
    match value.and_then(Value::as_f64) {
        Some(n) if n.is_finite() && n > 0.0 => n as u64,
        _ => 0,
    }
}

fn coerce_entry(item: &Value, now: &str) -> Option<CommentEntry> {
    let id = string_field(item, "id")?;
    let message = string_field(item, "message")?;

    let author = string_field(item, "author")
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| GUEST_AUTHOR.to_string());

    let liked_by = likers(item.get("likedBy"));
    // Lists written before likers were tracked only carry a count.
    let likes = like_count(item.get("likes")).max(liked_by.len() as u64);

    Some(CommentEntry {
        id,
        parent_id: string_field(item, "parentId"),
        author_id: string_field(item, "authorId"),
        author,
        author_image: string_field(item, "authorImage"),
        message,
        created_at: string_field(item, "createdAt").unwrap_or_else(|| now.to_string()),
        updated_at: string_field(item, "updatedAt"),
        likes,
        liked_by,
        liked_by_me: false,
    })
}

/// Parse a stored comment list, repairing what can be repaired.
///
/// Anything that is not a JSON array reads as empty. Entries without a string
/// `id` and `message` are dropped; other missing or mistyped fields fall back
/// to defaults.
#[must_use]
pub fn coerce_entries(raw: &str) -> Vec<CommentEntry> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) else {
        return Vec::new();
    };
    let now = timestamp_now();
    items
        .iter()
        .filter_map(|item| coerce_entry(item, &now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_fills_defaults() {
        let raw = r#"[{"id":"c1","message":"Lovely","author":"  ","likes":"3","likedByMe":1}]"#;
        let entries = coerce_entries(raw);
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.author, GUEST_AUTHOR);
        assert_eq!(entry.likes, 0);
        assert!(entry.liked_by.is_empty());
        assert!(!entry.liked_by_me);
        assert_eq!(entry.parent_id, None);
        assert!(!entry.created_at.is_empty());
    }

    #[test]
    fn test_coerce_likers() {
        let raw = r#"[
            {"id":"a","message":"m","likes":5},
            {"id":"b","message":"m","likes":1,"likedBy":["1",2,"1",null,""]},
            {"id":"c","message":"m","likedBy":"1"}
        ]"#;
        let entries = coerce_entries(raw);

        assert_eq!((entries[0].likes, entries[0].liked_by.len()), (5, 0));
        assert_eq!(entries[1].liked_by, vec!["1", "2"]);
        assert_eq!(entries[1].likes, 2);
        assert!(entries[2].liked_by.is_empty());
    }

    #[test]
    fn test_liked_by_me_follows_viewer() {
        let raw = r#"[{"id":"a","message":"m","likedBy":["7"]}]"#;
        let entry = coerce_entries(raw).remove(0);

        assert!(entry.clone().for_viewer(Some(7)).liked_by_me);
        assert!(!entry.clone().for_viewer(Some(8)).liked_by_me);
        assert!(!entry.for_viewer(None).liked_by_me);
    }

    #[test]
    fn test_coerce_drops_entries_without_id_or_message() {
        let raw = r#"[{"id":1,"message":"x"},{"id":"a"},null,{"id":"b","message":"kept"}]"#;
        let entries = coerce_entries(raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "b");
    }

    #[test]
    fn test_coerce_non_array_is_empty() {
        assert!(coerce_entries("{\"id\":\"a\"}").is_empty());
        assert!(coerce_entries("not json").is_empty());
        assert!(coerce_entries("").is_empty());
    }

    #[test]
    fn test_serialized_entries_read_back_unchanged() {
        let entry = CommentEntry {
            id: "c-1".to_string(),
            parent_id: Some("c-0".to_string()),
            author_id: Some("7".to_string()),
            author: "Ana".to_string(),
            author_image: None,
            message: "Hi".to_string(),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: None,
            likes: 2,
            liked_by: vec!["7".to_string(), "9".to_string()],
            liked_by_me: false,
        };
        let raw = serde_json::to_string(&vec![entry.clone()]).unwrap();
        assert!(raw.contains("\"parentId\":\"c-0\""));
        assert!(raw.contains("\"likedBy\":[\"7\",\"9\"]"));
        assert_eq!(coerce_entries(&raw), vec![entry]);
    }

    #[test]
    fn test_comment_id_shape() {
        let id = create_comment_id();
        let mut parts = id.splitn(3, '-');
        assert_eq!(parts.next(), Some("c"));
        assert!(parts.next().unwrap().chars().all(|c| c.is_ascii_digit()));
        assert!(parts.next().unwrap().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(create_comment_id(), id);
    }
}
