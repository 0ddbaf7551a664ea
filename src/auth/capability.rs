//! The single decision point for every mutating or privileged action.
//!
//! Services call [`authorize`] before touching storage; handlers never inspect
//! roles themselves.

use crate::db::User;
use crate::error::{AppError, AppResult};

/// Identity of the person making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: i64,
    pub name: String,
    pub is_admin: bool,
}

impl From<&User> for Viewer {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            is_admin: user.is_admin(),
        }
    }
}

/// Something a viewer wants to do.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    /// Change a post's status as an editor.
    ModeratePost,
    /// Read the moderation queue and dashboard counts.
    ViewDashboard,
    /// Edit home-page sections.
    ManageSections,
    /// Pick the initial status of a new post.
    OverridePostStatus,
    /// Create a post.
    CreatePost,
    /// Edit, restore, inspect history of, or upload media to a post.
    ManagePost { author_id: i64 },
    LikePost,
    AddComment,
    LikeComment,
    /// Edit or delete a comment. `author_id` is absent on legacy anonymous
    /// comments, which are matched by display name instead.
    ManageComment {
        author_id: Option<&'a str>,
        author_name: &'a str,
    },
}

/// Decide whether `viewer` may perform `action`.
///
/// Anonymous viewers get `Unauthorized` for anything that needs an account;
/// signed-in viewers without the capability get `Forbidden`.
pub fn authorize(viewer: Option<&Viewer>, action: Action<'_>) -> AppResult<()> {
    if matches!(action, Action::AddComment) {
        return Ok(());
    }

    let viewer = viewer.ok_or(AppError::Unauthorized)?;

    let allowed = match action {
        Action::ModeratePost
        | Action::ViewDashboard
        | Action::ManageSections
        | Action::OverridePostStatus => viewer.is_admin,
        Action::CreatePost | Action::LikePost | Action::LikeComment | Action::AddComment => true,
        Action::ManagePost { author_id } => viewer.is_admin || viewer.user_id == author_id,
        Action::ManageComment {
            author_id,
            author_name,
        } => {
            viewer.is_admin
                || match author_id {
                    Some(id) => id == viewer.user_id.to_string(),
                    None => author_name == viewer.name,
                }
        }
    };

    if allowed {
        return Ok(());
    }

    Err(AppError::Forbidden(match action {
        Action::ManagePost { .. } => "Only the author or an admin can change this post",
        Action::ManageComment { .. } => "Only the author or an admin can change this comment",
        _ => "Admin access required",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> Viewer {
        Viewer {
            user_id: 7,
            name: "Ana".to_string(),
            is_admin: false,
        }
    }

    fn admin() -> Viewer {
        Viewer {
            user_id: 1,
            name: "Editor".to_string(),
            is_admin: true,
        }
    }

    #[test]
    fn test_admin_only_actions() {
        for action in [
            Action::ModeratePost,
            Action::ViewDashboard,
            Action::ManageSections,
            Action::OverridePostStatus,
        ] {
            assert!(authorize(Some(&admin()), action).is_ok());
            assert!(matches!(
                authorize(Some(&writer()), action),
                Err(AppError::Forbidden(_))
            ));
            assert!(matches!(authorize(None, action), Err(AppError::Unauthorized)));
        }
    }

    #[test]
    fn test_manage_post_author_or_admin() {
        assert!(authorize(Some(&writer()), Action::ManagePost { author_id: 7 }).is_ok());
        assert!(authorize(Some(&admin()), Action::ManagePost { author_id: 7 }).is_ok());
        assert!(authorize(Some(&writer()), Action::ManagePost { author_id: 8 }).is_err());
    }

    #[test]
    fn test_anonymous_may_comment_but_not_like() {
        assert!(authorize(None, Action::AddComment).is_ok());
        assert!(matches!(
            authorize(None, Action::LikeComment),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_comment_identity_is_authoritative() {
        let by_id = Action::ManageComment {
            author_id: Some("7"),
            author_name: "Someone Else",
        };
        assert!(authorize(Some(&writer()), by_id).is_ok());

        // Same display name, different stored id.
        let impersonated = Action::ManageComment {
            author_id: Some("99"),
            author_name: "Ana",
        };
        assert!(authorize(Some(&writer()), impersonated).is_err());
        assert!(authorize(Some(&admin()), impersonated).is_ok());
    }

    #[test]
    fn test_legacy_comment_falls_back_to_name() {
        let legacy = Action::ManageComment {
            author_id: None,
            author_name: "Ana",
        };
        assert!(authorize(Some(&writer()), legacy).is_ok());
        assert!(matches!(authorize(None, legacy), Err(AppError::Unauthorized)));

        let other = Action::ManageComment {
            author_id: None,
            author_name: "Guest",
        };
        assert!(authorize(Some(&writer()), other).is_err());
    }
}
