//! Post status state machine.
//!
//! Authors move posts between DRAFT, PENDING and NEEDS_CHANGES by saving and
//! submitting. Admins move submitted posts between the review states. DRAFT is
//! never an admin source or target: nothing has been submitted yet.

use thiserror::Error;

use crate::db::PostStatus;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot move a post from {from} to {to}")]
    Invalid { from: PostStatus, to: PostStatus },
    #[error("A note is required when marking a post {0}")]
    NoteRequired(PostStatus),
    #[error("{0} posts are locked for editing")]
    Locked(PostStatus),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Locked(_) => {
                Self::Forbidden("Approved and rejected posts are locked for editing")
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

/// How an author finishes an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitAction {
    /// Keep the current status.
    #[default]
    Save,
    /// Send the post to the review queue.
    Submit,
}

/// Statuses an admin may move a post to from `from`.
#[must_use]
pub const fn admin_targets(from: PostStatus) -> &'static [PostStatus] {
    use PostStatus::{Approved, NeedsChanges, Pending, Rejected};
    match from {
        PostStatus::Draft => &[],
        // Keeping a post in PENDING records a re-review and changes nothing.
        Pending => &[Pending, Approved, Rejected, NeedsChanges],
        NeedsChanges => &[Approved, Rejected, NeedsChanges],
        Approved => &[Pending, NeedsChanges, Rejected],
        Rejected => &[Pending, NeedsChanges],
    }
}

/// Whether moving to `to` needs an explanatory note for the author.
#[must_use]
pub const fn requires_note(to: PostStatus) -> bool {
    matches!(to, PostStatus::NeedsChanges | PostStatus::Rejected)
}

/// Validate an admin status change. Returns the trimmed note, `None` when blank.
pub fn admin_transition(
    from: PostStatus,
    to: PostStatus,
    note: Option<&str>,
) -> Result<Option<String>, TransitionError> {
    if !admin_targets(from).contains(&to) {
        return Err(TransitionError::Invalid { from, to });
    }

    let note = note.map(str::trim).filter(|n| !n.is_empty());
    if requires_note(to) && note.is_none() {
        return Err(TransitionError::NoteRequired(to));
    }

    Ok(note.map(str::to_string))
}

/// Statuses in which the author may still change the content.
#[must_use]
pub const fn author_can_edit(status: PostStatus) -> bool {
    matches!(
        status,
        PostStatus::Draft | PostStatus::Pending | PostStatus::NeedsChanges
    )
}

/// Initial status of a new post. An admin override wins over the action.
#[must_use]
pub fn initial_status(action: SubmitAction, admin_override: Option<PostStatus>) -> PostStatus {
    admin_override.unwrap_or(match action {
        SubmitAction::Save => PostStatus::Draft,
        SubmitAction::Submit => PostStatus::Pending,
    })
}

/// Status after an edit.
///
/// Authors are locked out of APPROVED and REJECTED posts. Admins may edit any
/// post; submitting only re-queues posts that are still in the author loop,
/// so an admin touch-up never unpublishes an approved post.
pub fn edit_target(
    current: PostStatus,
    action: SubmitAction,
    is_admin: bool,
) -> Result<PostStatus, TransitionError> {
    if !is_admin && !author_can_edit(current) {
        return Err(TransitionError::Locked(current));
    }

    Ok(match action {
        SubmitAction::Submit if author_can_edit(current) => PostStatus::Pending,
        _ => current,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use PostStatus::{Approved, Draft, NeedsChanges, Pending, Rejected};

    #[test]
    fn test_admin_transition_table() {
        let allowed = [
            (Pending, Pending),
            (Pending, Approved),
            (Pending, Rejected),
            (Pending, NeedsChanges),
            (NeedsChanges, Approved),
            (NeedsChanges, Rejected),
            (NeedsChanges, NeedsChanges),
            (Approved, Pending),
            (Approved, NeedsChanges),
            (Approved, Rejected),
            (Rejected, Pending),
            (Rejected, NeedsChanges),
        ];

        for from in PostStatus::ALL {
            for to in PostStatus::ALL {
                let result = admin_transition(from, to, Some("looks good"));
                assert_eq!(
                    result.is_ok(),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_draft_is_never_an_admin_source_or_target() {
        assert!(admin_targets(Draft).is_empty());
        for from in PostStatus::ALL {
            assert!(!admin_targets(from).contains(&Draft));
        }
    }

    #[test]
    fn test_note_required_for_feedback_states() {
        assert_eq!(
            admin_transition(Pending, NeedsChanges, None),
            Err(TransitionError::NoteRequired(NeedsChanges))
        );
        assert_eq!(
            admin_transition(Pending, Rejected, Some("   ")),
            Err(TransitionError::NoteRequired(Rejected))
        );
        assert_eq!(
            admin_transition(Pending, NeedsChanges, Some("  Add a map ")),
            Ok(Some("Add a map".to_string()))
        );
        assert_eq!(admin_transition(Pending, Approved, None), Ok(None));
    }

    #[test]
    fn test_initial_status() {
        assert_eq!(initial_status(SubmitAction::Save, None), Draft);
        assert_eq!(initial_status(SubmitAction::Submit, None), Pending);
        assert_eq!(initial_status(SubmitAction::Save, Some(Approved)), Approved);
    }

    #[test]
    fn test_author_edit_targets() {
        assert_eq!(edit_target(Draft, SubmitAction::Save, false), Ok(Draft));
        assert_eq!(edit_target(Draft, SubmitAction::Submit, false), Ok(Pending));
        assert_eq!(edit_target(NeedsChanges, SubmitAction::Submit, false), Ok(Pending));
        assert_eq!(edit_target(NeedsChanges, SubmitAction::Save, false), Ok(NeedsChanges));
        assert_eq!(
            edit_target(Approved, SubmitAction::Save, false),
            Err(TransitionError::Locked(Approved))
        );
        assert_eq!(
            edit_target(Rejected, SubmitAction::Submit, false),
            Err(TransitionError::Locked(Rejected))
        );
    }

    #[test]
    fn test_admin_edit_keeps_published_status() {
        assert_eq!(edit_target(Approved, SubmitAction::Submit, true), Ok(Approved));
        assert_eq!(edit_target(Rejected, SubmitAction::Save, true), Ok(Rejected));
    }
}
