//! Content moderation rules: the post lifecycle state machine, the report
//! workflow, and the visibility checks the handlers and DB layer rely on.
//!
//! Everything here is pure logic over the closed enums in `models` — the
//! database never accepts a state write that did not pass through these
//! functions first.

use crate::error::ErrorMessage;
use crate::models::{CommentAction, Post, PostState, ReportStatus};

/// Validate a post state transition.
///
/// The machine:
/// - `pending -> approved`
/// - `pending -> rejected`
/// - `rejected -> approved` (a rejected post can be re-approved)
///
/// Nothing transitions back to `pending`, and an approved post cannot be
/// rejected — unpublishing goes through soft delete instead.
pub fn validate_post_transition(from: PostState, to: PostState) -> Result<(), ErrorMessage> {
    let allowed = matches!(
        (from, to),
        (PostState::Pending, PostState::Approved)
            | (PostState::Pending, PostState::Rejected)
            | (PostState::Rejected, PostState::Approved)
    );

    if allowed {
        Ok(())
    } else {
        Err(ErrorMessage::InvalidStateTransition(from, to))
    }
}

/// Validate a report status transition.
///
/// Re-asserting the current status is always allowed (a moderator may
/// resolve the same report twice, e.g. to attach a different comment
/// action); downgrades are not:
/// - `pending -> pending | reviewed | action_taken`
/// - `reviewed -> reviewed | action_taken`
/// - `action_taken -> action_taken`
pub fn validate_report_transition(
    from: ReportStatus,
    to: ReportStatus,
) -> Result<(), ErrorMessage> {
    let allowed = match from {
        ReportStatus::Pending => true,
        ReportStatus::Reviewed => to != ReportStatus::Pending,
        ReportStatus::ActionTaken => to == ReportStatus::ActionTaken,
    };

    if allowed {
        Ok(())
    } else {
        Err(ErrorMessage::InvalidReportTransition(from, to))
    }
}

/// The comment `active` flag after a moderator applies `action` to it.
pub fn comment_active_after(action: CommentAction, current: bool) -> bool {
    match action {
        CommentAction::None => current,
        CommentAction::Deactivate => false,
        CommentAction::Reactivate => true,
    }
}

/// Whether a post is visible in the public feed: approved and not
/// soft-deleted.
pub fn is_published(post: &Post) -> bool {
    post.active && post.state == PostState::Approved
}

/// Whether a post accepts comments and likes/dislikes. Interactions are
/// only allowed on published posts.
pub fn accepts_interactions(post: &Post) -> bool {
    is_published(post)
}

/// Whether the author may still edit the post body. Edits are allowed while
/// the post sits in review (`pending`) or after rejection (`rejected`) —
/// published content is immutable.
pub fn author_can_edit(state: PostState) -> bool {
    matches!(state, PostState::Pending | PostState::Rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_post(state: PostState, active: bool) -> Post {
        let now = Utc::now();
        Post {
            id: 1,
            user_id: Uuid::new_v4(),
            title: "Final 2022".to_string(),
            content: "What a match".to_string(),
            category_id: None,
            world_cup_id: None,
            state,
            approved_at: None,
            approved_by: None,
            active,
            likes_count: 0,
            dislikes_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn post_machine_allows_the_three_legal_edges() {
        assert!(validate_post_transition(PostState::Pending, PostState::Approved).is_ok());
        assert!(validate_post_transition(PostState::Pending, PostState::Rejected).is_ok());
        assert!(validate_post_transition(PostState::Rejected, PostState::Approved).is_ok());
    }

    #[test]
    fn post_machine_rejects_everything_else() {
        let states = [PostState::Pending, PostState::Approved, PostState::Rejected];
        let legal = [
            (PostState::Pending, PostState::Approved),
            (PostState::Pending, PostState::Rejected),
            (PostState::Rejected, PostState::Approved),
        ];

        for from in states {
            for to in states {
                if legal.contains(&(from, to)) {
                    continue;
                }
                assert_eq!(
                    validate_post_transition(from, to),
                    Err(ErrorMessage::InvalidStateTransition(from, to)),
                    "{:?} -> {:?} should be rejected",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn approved_posts_cannot_be_directly_rejected() {
        assert!(validate_post_transition(PostState::Approved, PostState::Rejected).is_err());
    }

    #[test]
    fn nothing_returns_to_pending() {
        assert!(validate_post_transition(PostState::Approved, PostState::Pending).is_err());
        assert!(validate_post_transition(PostState::Rejected, PostState::Pending).is_err());
    }

    #[test]
    fn report_machine_never_downgrades() {
        assert!(validate_report_transition(ReportStatus::Pending, ReportStatus::Reviewed).is_ok());
        assert!(
            validate_report_transition(ReportStatus::Pending, ReportStatus::ActionTaken).is_ok()
        );
        assert!(
            validate_report_transition(ReportStatus::Reviewed, ReportStatus::ActionTaken).is_ok()
        );

        assert!(
            validate_report_transition(ReportStatus::Reviewed, ReportStatus::Pending).is_err()
        );
        assert!(
            validate_report_transition(ReportStatus::ActionTaken, ReportStatus::Pending).is_err()
        );
        assert!(
            validate_report_transition(ReportStatus::ActionTaken, ReportStatus::Reviewed)
                .is_err()
        );
    }

    #[test]
    fn report_machine_is_idempotent_on_same_status() {
        for status in [
            ReportStatus::Pending,
            ReportStatus::Reviewed,
            ReportStatus::ActionTaken,
        ] {
            assert!(validate_report_transition(status, status).is_ok());
        }
    }

    #[test]
    fn comment_action_application() {
        assert!(!comment_active_after(CommentAction::Deactivate, true));
        assert!(comment_active_after(CommentAction::Reactivate, false));
        assert!(comment_active_after(CommentAction::None, true));
        assert!(!comment_active_after(CommentAction::None, false));
    }

    #[test]
    fn only_approved_active_posts_are_published() {
        assert!(is_published(&sample_post(PostState::Approved, true)));
        assert!(!is_published(&sample_post(PostState::Approved, false)));
        assert!(!is_published(&sample_post(PostState::Pending, true)));
        assert!(!is_published(&sample_post(PostState::Rejected, true)));
    }

    #[test]
    fn interactions_require_publication() {
        assert!(accepts_interactions(&sample_post(PostState::Approved, true)));
        assert!(!accepts_interactions(&sample_post(PostState::Pending, true)));
        assert!(!accepts_interactions(&sample_post(PostState::Approved, false)));
    }

    #[test]
    fn authors_edit_only_unpublished_posts() {
        assert!(author_can_edit(PostState::Pending));
        assert!(author_can_edit(PostState::Rejected));
        assert!(!author_can_edit(PostState::Approved));
    }
}
