use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User role enumeration for role-based access control.
///
/// Stored in the database as the PostgreSQL ENUM type "user_role".
/// Moderation operations (post approval, report resolution, reference data
/// management) require `Admin`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

/// Post lifecycle state.
///
/// Every post starts in `Pending`. The valid transitions are enforced by
/// `moderation::validate_post_transition` — nothing here or in the database
/// accepts an arbitrary state write.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "post_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostState {
    Pending,
    Approved,
    Rejected,
}

impl PostState {
    pub fn to_str(&self) -> &str {
        match self {
            PostState::Pending => "pending",
            PostState::Approved => "approved",
            PostState::Rejected => "rejected",
        }
    }
}

/// A like or dislike placed by a user on a post. Mutually exclusive per
/// (user, post) — setting the opposite kind replaces the existing row.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "interaction_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Like,
    Dislike,
}

impl InteractionKind {
    pub fn to_str(&self) -> &str {
        match self {
            InteractionKind::Like => "like",
            InteractionKind::Dislike => "dislike",
        }
    }
}

/// Reason attached to a comment report.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "report_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Spam,
    OffensiveLanguage,
    Harassment,
    InappropriateContent,
    Other,
}

/// Report lifecycle state. Reports are created `Pending`; moderators move
/// them to `Reviewed` or `ActionTaken`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "report_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    ActionTaken,
}

impl ReportStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::ActionTaken => "action_taken",
        }
    }
}

/// Side effect a moderator applies to the reported comment when resolving a
/// report. Recorded on the report row for audit.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "comment_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    None,
    Deactivate,
    Reactivate,
}

/// World Cup edition status.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "world_cup_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorldCupStatus {
    Upcoming,
    Ongoing,
    Finished,
}

/// User model for the users table.
///
/// `password` always holds the argon2 hash, never plain text. Accounts are
/// never hard-deleted: `active = false` is the deactivated state.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post model for the post table.
///
/// `likes_count` / `dislikes_count` are denormalized aggregates kept in the
/// same transaction as every interaction write; the nightly reconciliation
/// job recomputes them from interaction rows.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Post {
    pub id: i32,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub category_id: Option<i32>,
    pub world_cup_id: Option<i32>,
    pub state: PostState,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub active: bool, // soft delete; inactive posts are retained for audit
    pub likes_count: i32,
    pub dislikes_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Interaction model. At most one row per (user, post).
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Interaction {
    pub id: i32,
    pub user_id: Uuid,
    pub post_id: i32,
    pub kind: InteractionKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment model. `active = false` is the soft-deleted state and is
/// reversible by moderator action; `edited`/`edited_at` are set on content
/// modification.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Comment {
    pub id: i32,
    pub user_id: Uuid,
    pub post_id: i32,
    pub content: String,
    pub active: bool,
    pub edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Report model. One row per (comment, reporter); `comment_action` records
/// what the moderator did to the comment when resolving.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Report {
    pub id: i32,
    pub comment_id: i32,
    pub reporter_id: Uuid,
    pub reason: ReportReason,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub moderator_id: Option<Uuid>,
    pub comment_action: Option<CommentAction>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category reference data, managed by admins and referenced by posts.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// World Cup edition reference data.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct WorldCup {
    pub id: i32,
    pub year: i32,
    pub host_country: String,
    pub team_count: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: WorldCupStatus,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
