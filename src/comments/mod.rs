//! Threaded comments, stored per essay through a pluggable key-value store.

mod entry;
mod storage;
mod store;
mod tree;

pub use entry::{coerce_entries, create_comment_id, CommentEntry, GUEST_AUTHOR};
pub use storage::{CommentStorage, FileStorage, MemoryStorage, StorageError};
pub use store::{storage_key, CommentEvent, CommentStore, NewComment};
pub use tree::{group_by_parent, render_thread, thread_closure, ThreadNode, MAX_DEPTH};
