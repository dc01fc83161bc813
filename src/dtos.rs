use crate::models::{
    Category, CommentAction, InteractionKind, PostState, ReportReason, ReportStatus, User,
    UserRole, WorldCup, WorldCupStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// DTOs (Data Transfer Objects) define the structure of data exchanged with
// clients. They are separate from database models to control exactly what
// data is exposed.

// ============================================================================
// Authentication DTOs
// ============================================================================

/// Registration request from client.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub username: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(
        length(min = 1, message = "Confirm Password is required"),
        must_match(other = "password", message = "passwords do not match")
    )]
    #[serde(rename = "confirmPassword")]
    pub password_confirm: String,
}

/// Login request - accepts email or username.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email or username is required"))]
    pub identifier: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Password verification for sensitive operations (account deactivation).
#[derive(Validate, Serialize, Deserialize)]
pub struct DoubleCheckDto {
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login success response with JWT token.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub access_token: String,
    pub username: String,
}

/// Token refresh response.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponseDto {
    pub status: String,
    pub access_token: String,
}

/// Generic success response.
#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

// ============================================================================
// Pagination & Query DTOs
// ============================================================================

/// Generic pagination query parameters.
#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct RequestQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<usize>,

    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

/// Pagination metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationDto {
    pub page: i32,
    pub limit: i32,
    pub total: i32,
    #[serde(rename = "totalPages")]
    pub total_pages: i32,
}

// ============================================================================
// User Response DTOs (filtered data for client)
// ============================================================================

/// Filtered user data sent to clients (excludes the password hash).
#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            name: user.username.to_owned(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            active: user.active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(user: &[User]) -> Vec<FilterUserDto> {
        user.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

/// User profile with contribution statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserMeData {
    pub user: FilterUserDto,
    pub post_count: i64,
    pub comment_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserMeResponseDto {
    pub status: String,
    pub data: UserMeData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponseDto {
    pub status: String,
    pub users: Vec<FilterUserDto>,
    pub results: i64,
}

// ============================================================================
// User Update DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct NameUpdateDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoleUpdateDto {
    pub role: UserRole,
}

/// Password change request (requires old password verification).
#[derive(Debug, Validate, Default, Clone, Serialize, Deserialize)]
pub struct UserPasswordUpdateDto {
    #[validate(length(min = 6, message = "new password must be at least 6 characters"))]
    pub new_password: String,

    #[validate(
        length(
            min = 6,
            message = "new password confirm must be at least 6 characters"
        ),
        must_match(other = "new_password", message = "new passwords do not match")
    )]
    pub new_password_confirm: String,

    #[validate(length(min = 6, message = "Old password must be at least 6 characters"))]
    pub old_password: String,
}

// ============================================================================
// Post DTOs
// ============================================================================

/// Post submission/update request (used for both POST and PUT).
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InputPostDto {
    #[validate(length(min = 1, max = 200, message = "Title is required."))]
    pub title: String,

    #[validate(length(min = 1, message = "Content is required."))]
    pub content: String,

    #[serde(rename = "categoryId")]
    pub category_id: Option<i32>,

    #[serde(rename = "worldCupId")]
    pub world_cup_id: Option<i32>,
}

/// Full post data response, joined with the author's username.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostDto {
    pub id: i32,
    #[serde(rename = "userUsername")]
    pub user_username: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "categoryId")]
    pub category_id: Option<i32>,
    #[serde(rename = "worldCupId")]
    pub world_cup_id: Option<i32>,
    pub state: PostState,
    #[serde(rename = "likesCount")]
    pub likes_count: i32,
    #[serde(rename = "dislikesCount")]
    pub dislikes_count: i32,
    #[serde(rename = "approvedAt")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Paginated posts response.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostsPaginationResponseDto {
    pub status: String,
    pub data: Vec<PostDto>,
    pub pagination: PaginationDto,
}

/// Single post response.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponseDto {
    pub status: String,
    pub data: PostDto,
}

/// Query parameters for the public feed.
#[derive(Debug, Deserialize, Validate)]
pub struct FeedQueryParams {
    #[validate(range(min = 1))]
    pub page: Option<i32>,

    #[validate(range(min = 1, max = 25))]
    pub limit: Option<i32>,

    #[serde(rename = "categoryId")]
    pub category_id: Option<i32>,

    #[serde(rename = "worldCupId")]
    pub world_cup_id: Option<i32>,
}

/// Query parameters for the admin moderation queue.
#[derive(Debug, Deserialize, Validate)]
pub struct ModerationQueryParams {
    pub state: PostState,

    #[validate(range(min = 1))]
    pub page: Option<i32>,

    #[validate(range(min = 1, max = 50))]
    pub limit: Option<i32>,
}

// ============================================================================
// Comment DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct InputCommentRequest {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Content must be between 1 and 1000 characters"
    ))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GetCommentsQuery {
    #[validate(range(min = 1, message = "Page must be greater than 0"))]
    pub page: Option<i32>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i32>,

    #[validate(custom(function = "validate_sort"))]
    pub sort: Option<String>, // created_at_desc or created_at_asc
}

/// Custom validator for sort parameter.
fn validate_sort(sort: &String) -> Result<(), validator::ValidationError> {
    if sort == "created_at_desc" || sort == "created_at_asc" {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_sort"))
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentDto {
    pub id: i32,
    #[serde(rename = "userUsername")]
    pub user_username: String,
    pub post_id: i32,
    pub content: String,
    pub edited: bool,
    #[serde(rename = "editedAt")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub status: String,
    pub data: Vec<CommentDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize)]
pub struct SingleCommentResponse {
    pub status: String,
    pub data: CommentDto,
}

// ============================================================================
// Interaction DTOs
// ============================================================================

/// Body for setting the caller's reaction on a post.
#[derive(Debug, Deserialize, Serialize)]
pub struct ReactionRequest {
    pub kind: InteractionKind,
}

/// Aggregate like/dislike counts for a post.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct InteractionCountsDto {
    pub likes: i32,
    pub dislikes: i32,
}

#[derive(Debug, Serialize)]
pub struct ReactionResponse {
    pub status: String,
    pub data: InteractionCountsDto,
}

// ============================================================================
// Report DTOs
// ============================================================================

/// Body for reporting a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct ReportCommentDto {
    pub reason: ReportReason,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

/// Moderator resolution of a report. `comment_action` defaults to none.
#[derive(Debug, Deserialize, Validate)]
pub struct ResolveReportDto {
    pub status: ReportStatus,

    #[serde(rename = "commentAction")]
    pub comment_action: Option<CommentAction>,
}

/// Query parameters for the report queue. Absent `status` means all.
#[derive(Debug, Deserialize, Validate)]
pub struct GetReportsQuery {
    pub status: Option<ReportStatus>,

    #[validate(range(min = 1))]
    pub page: Option<i32>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i32>,
}

/// Report joined with its comment and reporter, for the moderation queue.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReportDto {
    pub id: i32,
    #[serde(rename = "commentId")]
    pub comment_id: i32,
    #[serde(rename = "commentContent")]
    pub comment_content: String,
    #[serde(rename = "commentActive")]
    pub comment_active: bool,
    #[serde(rename = "reporterUsername")]
    pub reporter_username: String,
    pub reason: ReportReason,
    pub description: Option<String>,
    pub status: ReportStatus,
    #[serde(rename = "commentAction")]
    pub comment_action: Option<CommentAction>,
    #[serde(rename = "resolvedAt")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReportListResponse {
    pub status: String,
    pub data: Vec<ReportDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize)]
pub struct SingleReportResponse {
    pub status: String,
    pub data: ReportDto,
}

/// Aggregate moderation dashboard numbers, computed in a single statement so
/// the combination is always consistent.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ModerationStatsDto {
    #[serde(rename = "totalComments")]
    pub total_comments: i64,
    #[serde(rename = "totalReported")]
    pub total_reported: i64,
    #[serde(rename = "pendingReports")]
    pub pending_reports: i64,
    #[serde(rename = "totalDeactivated")]
    pub total_deactivated: i64,
}

#[derive(Debug, Serialize)]
pub struct ModerationStatsResponse {
    pub status: String,
    pub data: ModerationStatsDto,
}

// ============================================================================
// Reference data DTOs (Category / WorldCup)
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryInputDto {
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct WorldCupInputDto {
    #[validate(range(min = 1930, message = "Year must be 1930 or later"))]
    pub year: i32,

    #[validate(length(min = 1, max = 100, message = "Host country is required."))]
    #[serde(rename = "hostCountry")]
    pub host_country: String,

    #[validate(range(min = 1, max = 128, message = "Team count must be between 1 and 128"))]
    #[serde(rename = "teamCount")]
    pub team_count: i32,

    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,

    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,

    pub status: WorldCupStatus,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub status: String,
    pub data: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct SingleCategoryResponse {
    pub status: String,
    pub data: Category,
}

#[derive(Debug, Serialize)]
pub struct WorldCupListResponse {
    pub status: String,
    pub data: Vec<WorldCup>,
}

#[derive(Debug, Serialize)]
pub struct SingleWorldCupResponse {
    pub status: String,
    pub data: WorldCup,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_mismatched_passwords() {
        let dto = RegisterUserDto {
            username: "leo".to_string(),
            email: "leo@example.com".to_string(),
            password: "secret1".to_string(),
            password_confirm: "secret2".to_string(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn report_reason_uses_snake_case_wire_format() {
        let dto: ReportCommentDto =
            serde_json::from_str(r#"{"reason":"offensive_language"}"#).unwrap();
        assert_eq!(dto.reason, ReportReason::OffensiveLanguage);
        assert!(serde_json::from_str::<ReportCommentDto>(r#"{"reason":"rude"}"#).is_err());
    }

    #[test]
    fn sort_validator_accepts_only_known_orders() {
        let ok = GetCommentsQuery {
            page: Some(1),
            limit: Some(10),
            sort: Some("created_at_asc".to_string()),
        };
        assert!(ok.validate().is_ok());

        let bad = GetCommentsQuery {
            page: Some(1),
            limit: Some(10),
            sort: Some("likes_desc".to_string()),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn resolve_report_parses_camel_case_action() {
        let dto: ResolveReportDto =
            serde_json::from_str(r#"{"status":"action_taken","commentAction":"deactivate"}"#)
                .unwrap();
        assert_eq!(dto.status, ReportStatus::ActionTaken);
        assert_eq!(dto.comment_action, Some(CommentAction::Deactivate));
    }
}
