pub mod diff;
pub mod service;
pub mod transitions;

pub use diff::{ChangeType, DiffLine, RevisionDiff};
pub use service::{PostDetail, PostDraft, QueueFilter};
pub use transitions::{SubmitAction, TransitionError};
