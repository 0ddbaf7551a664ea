//! Per-essay comment store.
//!
//! Every mutation is a read-modify-write of the whole list under one key.
//! Writes within this process are serialized; across processes the last
//! write wins.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::entry::{coerce_entries, create_comment_id, timestamp_now, CommentEntry, GUEST_AUTHOR};
use super::storage::CommentStorage;
use super::tree::{render_thread, thread_closure, ThreadNode};
use crate::auth::{authorize, Action, Viewer};
use crate::error::{AppError, AppResult};

const STORAGE_PREFIX: &str = "field-notes-comments";
const EVENT_CAPACITY: usize = 64;

/// Storage key for an essay's comment list.
#[must_use]
pub fn storage_key(slug: &str) -> String {
    format!("{STORAGE_PREFIX}:{slug}")
}

/// Emitted after every successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEvent {
    pub slug: String,
    /// The touched comment; `None` after a thread delete.
    pub comment_id: Option<String>,
}

/// Input for a new comment or reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    #[serde(default, alias = "parent_id")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub message: String,
}

fn required_message(message: &str) -> AppResult<String> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::validation("Comment message is required"));
    }
    Ok(message.to_string())
}

#[derive(Clone)]
pub struct CommentStore {
    storage: Arc<dyn CommentStorage>,
    events: broadcast::Sender<CommentEvent>,
    write_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for CommentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentStore")
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl CommentStore {
    #[must_use]
    pub fn new(storage: Arc<dyn CommentStorage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            storage,
            events,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Receive a [`CommentEvent`] after every mutation.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CommentEvent> {
        self.events.subscribe()
    }

    /// Stored comments for an essay. Unreadable storage reads as empty.
    #[must_use]
    pub fn read(&self, slug: &str) -> Vec<CommentEntry> {
        match self.storage.get(&storage_key(slug)) {
            Ok(Some(raw)) => coerce_entries(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(slug, "Failed to read comments: {e}");
                Vec::new()
            }
        }
    }

    /// Replace the stored list for an essay.
    pub fn write(&self, slug: &str, comments: &[CommentEntry]) -> AppResult<()> {
        let raw = serde_json::to_string(comments).map_err(anyhow::Error::from)?;
        self.storage
            .set(&storage_key(slug), &raw)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to write comments: {e}")))
    }

    /// Nested threads for display, with `liked_by_me` set for `viewer`.
    #[must_use]
    pub fn thread(&self, slug: &str, viewer: Option<&Viewer>) -> Vec<ThreadNode> {
        let user_id = viewer.map(|v| v.user_id);
        let comments: Vec<_> = self
            .read(slug)
            .into_iter()
            .map(|c| c.for_viewer(user_id))
            .collect();
        render_thread(&comments)
    }

    fn notify(&self, slug: &str, comment_id: Option<&str>) {
        // No subscribers is not an error.
        let _ = self.events.send(CommentEvent {
            slug: slug.to_string(),
            comment_id: comment_id.map(str::to_string),
        });
    }

    /// Run `f` against the stored list under the write lock and persist the
    /// result. A failed read aborts before anything is written.
    fn mutate<T>(
        &self,
        slug: &str,
        f: impl FnOnce(&mut Vec<CommentEntry>) -> AppResult<T>,
    ) -> AppResult<T> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut comments = match self.storage.get(&storage_key(slug)) {
            Ok(Some(raw)) => coerce_entries(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "Failed to read comments: {e}"
                )))
            }
        };
        let result = f(&mut comments)?;
        self.write(slug, &comments)?;
        Ok(result)
    }

    /// Append a comment or reply. Anonymous viewers post as "Guest".
    pub fn add(
        &self,
        slug: &str,
        viewer: Option<&Viewer>,
        author_image: Option<&str>,
        input: &NewComment,
    ) -> AppResult<CommentEntry> {
        authorize(viewer, Action::AddComment)?;
        let message = required_message(&input.message)?;
        let parent_id = input
            .parent_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let entry = CommentEntry {
            id: create_comment_id(),
            parent_id,
            author_id: viewer.map(|v| v.user_id.to_string()),
            author: viewer.map_or_else(|| GUEST_AUTHOR.to_string(), |v| v.name.clone()),
            author_image: author_image.map(str::to_string),
            message,
            created_at: timestamp_now(),
            updated_at: None,
            likes: 0,
            liked_by: Vec::new(),
            liked_by_me: false,
        };

        let added = self.mutate(slug, |comments| {
            if let Some(parent) = &entry.parent_id {
                if !comments.iter().any(|c| &c.id == parent) {
                    return Err(AppError::NotFound("Comment"));
                }
            }
            comments.push(entry.clone());
            Ok(entry)
        })?;

        self.notify(slug, Some(&added.id));
        Ok(added)
    }

    /// Replace a comment's message.
    pub fn update(
        &self,
        slug: &str,
        viewer: Option<&Viewer>,
        comment_id: &str,
        message: &str,
    ) -> AppResult<CommentEntry> {
        let message = required_message(message)?;

        let user_id = viewer.map(|v| v.user_id);
        let updated = self.mutate(slug, |comments| {
            let comment = comments
                .iter_mut()
                .find(|c| c.id == comment_id)
                .ok_or(AppError::NotFound("Comment"))?;
            authorize(
                viewer,
                Action::ManageComment {
                    author_id: comment.author_id.as_deref(),
                    author_name: &comment.author,
                },
            )?;
            comment.message = message;
            comment.updated_at = Some(timestamp_now());
            Ok(comment.clone().for_viewer(user_id))
        })?;

        self.notify(slug, Some(comment_id));
        Ok(updated)
    }

    /// Like or unlike a comment for the viewer. `likes` moves by one and never
    /// drops below zero.
    pub fn toggle_like(
        &self,
        slug: &str,
        viewer: Option<&Viewer>,
        comment_id: &str,
    ) -> AppResult<CommentEntry> {
        authorize(viewer, Action::LikeComment)?;
        let Some(viewer) = viewer else {
            return Err(AppError::Unauthorized);
        };
        let liker = viewer.user_id.to_string();

        let toggled = self.mutate(slug, |comments| {
            let comment = comments
                .iter_mut()
                .find(|c| c.id == comment_id)
                .ok_or(AppError::NotFound("Comment"))?;
            if comment.is_liked_by(&liker) {
                comment.liked_by.retain(|l| l != &liker);
                comment.likes = comment.likes.saturating_sub(1);
            } else {
                comment.liked_by.push(liker.clone());
                comment.likes = comment.likes.saturating_add(1);
            }
            Ok(comment.clone().for_viewer(Some(viewer.user_id)))
        })?;

        self.notify(slug, Some(comment_id));
        Ok(toggled)
    }

    /// Remove a comment and every transitive reply. Returns how many entries
    /// were removed.
    pub fn delete_thread(
        &self,
        slug: &str,
        viewer: Option<&Viewer>,
        comment_id: &str,
    ) -> AppResult<usize> {
        let removed = self.mutate(slug, |comments| {
            let root = comments
                .iter()
                .find(|c| c.id == comment_id)
                .ok_or(AppError::NotFound("Comment"))?;
            authorize(
                viewer,
                Action::ManageComment {
                    author_id: root.author_id.as_deref(),
                    author_name: &root.author,
                },
            )?;

            let doomed = thread_closure(comments, comment_id);
            let before = comments.len();
            comments.retain(|c| !doomed.contains(&c.id));
            Ok(before - comments.len())
        })?;

        info!(slug, comment_id, removed, "Deleted comment thread");
        self.notify(slug, None);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::{MemoryStorage, StorageError};

    fn store() -> CommentStore {
        CommentStore::new(Arc::new(MemoryStorage::new()))
    }

    fn viewer(id: i64, name: &str) -> Viewer {
        Viewer {
            user_id: id,
            name: name.to_string(),
            is_admin: false,
        }
    }

    fn comment(id: &str, parent: Option<&str>) -> CommentEntry {
        CommentEntry {
            id: id.to_string(),
            parent_id: parent.map(str::to_string),
            author_id: Some("1".to_string()),
            author: "Ana".to_string(),
            author_image: None,
            message: id.to_string(),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: None,
            likes: 0,
            liked_by: Vec::new(),
            liked_by_me: false,
        }
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("coastal-light"), "field-notes-comments:coastal-light");
    }

    #[test]
    fn test_add_requires_message() {
        let store = store();
        let input = NewComment {
            parent_id: None,
            message: "   ".to_string(),
        };
        assert!(matches!(
            store.add("s", None, None, &input),
            Err(AppError::Validation(_))
        ));
        assert!(store.read("s").is_empty());
    }

    #[test]
    fn test_anonymous_comment_is_guest() {
        let store = store();
        let input = NewComment {
            parent_id: None,
            message: " Hello ".to_string(),
        };
        let added = store.add("s", None, None, &input).unwrap();
        assert_eq!(added.author, "Guest");
        assert_eq!(added.author_id, None);
        assert_eq!(added.message, "Hello");
        assert_eq!(store.read("s"), vec![added]);
    }

    #[test]
    fn test_reply_to_missing_parent_is_not_found() {
        let store = store();
        let input = NewComment {
            parent_id: Some("nope".to_string()),
            message: "Hi".to_string(),
        };
        assert!(matches!(
            store.add("s", None, None, &input),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_toggle_like_twice_restores_state() {
        let store = store();
        store.write("s", &[comment("1", None)]).unwrap();
        let ana = viewer(1, "Ana");

        let once = store.toggle_like("s", Some(&ana), "1").unwrap();
        assert_eq!((once.likes, once.liked_by_me), (1, true));
        let twice = store.toggle_like("s", Some(&ana), "1").unwrap();
        assert_eq!((twice.likes, twice.liked_by_me), (0, false));
    }

    #[test]
    fn test_unlike_never_goes_negative() {
        let store = store();
        let mut entry = comment("1", None);
        entry.liked_by = vec!["1".to_string()];
        store.write("s", &[entry]).unwrap();

        let toggled = store.toggle_like("s", Some(&viewer(1, "Ana")), "1").unwrap();
        assert_eq!((toggled.likes, toggled.liked_by_me), (0, false));
        assert!(toggled.liked_by.is_empty());
    }

    #[test]
    fn test_likes_are_tracked_per_viewer() {
        let store = store();
        let ana = viewer(1, "Ana");
        let added = store
            .add(
                "s",
                Some(&ana),
                None,
                &NewComment {
                    parent_id: None,
                    message: "Hi".to_string(),
                },
            )
            .unwrap();
        let bo = viewer(2, "Bo");
        let cy = viewer(3, "Cy");

        let after_bo = store.toggle_like("s", Some(&bo), &added.id).unwrap();
        assert_eq!((after_bo.likes, after_bo.liked_by_me), (1, true));
        let after_cy = store.toggle_like("s", Some(&cy), &added.id).unwrap();
        assert_eq!((after_cy.likes, after_cy.liked_by_me), (2, true));

        assert!(store.thread("s", Some(&bo))[0].comment.liked_by_me);
        assert!(!store.thread("s", Some(&ana))[0].comment.liked_by_me);
        assert!(!store.thread("s", None)[0].comment.liked_by_me);

        let bo_unlikes = store.toggle_like("s", Some(&bo), &added.id).unwrap();
        assert_eq!((bo_unlikes.likes, bo_unlikes.liked_by_me), (1, false));
        assert!(store.thread("s", Some(&cy))[0].comment.liked_by_me);
        let cy_unlikes = store.toggle_like("s", Some(&cy), &added.id).unwrap();
        assert_eq!((cy_unlikes.likes, cy_unlikes.liked_by_me), (0, false));
        assert!(store.read("s")[0].liked_by.is_empty());
    }

    #[test]
    fn test_legacy_count_keeps_floor_semantics() {
        let store = store();
        let mut entry = comment("1", None);
        entry.likes = 4;
        store.write("s", &[entry]).unwrap();
        let ana = viewer(1, "Ana");

        assert_eq!(store.toggle_like("s", Some(&ana), "1").unwrap().likes, 5);
        assert_eq!(store.toggle_like("s", Some(&ana), "1").unwrap().likes, 4);
    }

    #[derive(Debug)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_reads: std::sync::atomic::AtomicBool,
    }

    impl CommentStorage for FlakyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.fail_reads.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StorageError::Io(std::io::Error::other("disk unavailable")));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }
    }

    #[test]
    fn test_failed_read_aborts_mutation() {
        let storage = Arc::new(FlakyStorage {
            inner: MemoryStorage::new(),
            fail_reads: std::sync::atomic::AtomicBool::new(false),
        });
        let store = CommentStore::new(storage.clone());
        store.write("s", &[comment("1", None), comment("2", None)]).unwrap();

        storage.fail_reads.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(store.read("s").is_empty());
        let input = NewComment {
            parent_id: None,
            message: "Hi".to_string(),
        };
        assert!(matches!(
            store.add("s", None, None, &input),
            Err(AppError::Internal(_))
        ));

        storage.fail_reads.store(false, std::sync::atomic::Ordering::SeqCst);
        assert_eq!(store.read("s").len(), 2);
    }

    #[test]
    fn test_update_sets_updated_at() {
        let store = store();
        store.write("s", &[comment("1", None)]).unwrap();

        let updated = store
            .update("s", Some(&viewer(1, "Ana")), "1", "Edited")
            .unwrap();
        assert_eq!(updated.message, "Edited");
        assert!(updated.updated_at.is_some());
        assert!(matches!(
            store.update("s", Some(&viewer(1, "Ana")), "1", "  "),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_thread_cascades() {
        let store = store();
        store
            .write(
                "s",
                &[
                    comment("A", None),
                    comment("B", Some("A")),
                    comment("C", Some("B")),
                    comment("D", None),
                ],
            )
            .unwrap();

        let removed = store.delete_thread("s", Some(&viewer(1, "Ana")), "A").unwrap();
        assert_eq!(removed, 3);
        let left: Vec<_> = store.read("s").into_iter().map(|c| c.id).collect();
        assert_eq!(left, vec!["D"]);
    }

    #[test]
    fn test_other_users_cannot_manage() {
        let store = store();
        store.write("s", &[comment("1", None)]).unwrap();
        let other = viewer(2, "Ana");

        assert!(matches!(
            store.delete_thread("s", Some(&other), "1"),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            store.update("s", None, "1", "x"),
            Err(AppError::Unauthorized)
        ));
        assert_eq!(store.read("s").len(), 1);
    }

    #[tokio::test]
    async fn test_mutations_emit_events() {
        let store = store();
        let mut events = store.subscribe();

        let input = NewComment {
            parent_id: None,
            message: "Hi".to_string(),
        };
        let added = store.add("walk", None, None, &input).unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(event.slug, "walk");
        assert_eq!(event.comment_id.as_deref(), Some(added.id.as_str()));

        store
            .delete_thread(
                "walk",
                Some(&Viewer {
                    user_id: 9,
                    name: "Editor".to_string(),
                    is_admin: true,
                }),
                &added.id,
            )
            .unwrap();
        assert_eq!(events.recv().await.unwrap().comment_id, None);
    }
}
