use crate::AppState;
use crate::db::{CommentExt, PostExt, ReportExt};
use crate::dtos::{
    CommentListResponse, GetCommentsQuery, InputCommentRequest, PaginationDto, ReportCommentDto,
    Response, SingleCommentResponse,
};
use crate::error::{ErrorMessage, HttpError};
use crate::middleware::JWTAuthMiddleware;
use crate::middleware::auth;
use crate::models::UserRole;
use crate::moderation;
use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tracing::instrument;
use validator::Validate;

/// Router for comment endpoints nested under /posts/{post_id}/comments
pub fn post_comments_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        // GET / - Get comments for a post (public)
        // Query params: ?page=1&limit=10&sort=created_at_desc
        .route("/", get(get_comments))
        // POST / - Create comment (requires auth; post must be published)
        .route(
            "/",
            post(create_comment)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Router for operations on a single comment, mounted at /comments
pub fn comment_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        // PUT /{comment_id} - Edit comment (author only)
        // DELETE /{comment_id} - Soft-delete comment (author or admin)
        .route(
            "/{comment_id}",
            put(edit_comment)
                .delete(delete_comment)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        // POST /{comment_id}/report - Report a comment for moderation
        .route(
            "/{comment_id}/report",
            post(report_comment)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Get paginated active comments for a post
///
/// Publicly accessible (no authentication required).
/// Supports sorting by created_at (desc or asc).
#[instrument(skip(app_state))]
pub async fn get_comments(
    Query(params): Query<GetCommentsQuery>,
    Path(post_id): Path<i32>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    // Validate query parameters (page/limit/sort)
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_comments input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10);
    let sort = params.sort.unwrap_or("created_at_desc".to_string());

    let comments = app_state
        .db_client
        .get_comments(post_id, page, limit, &sort)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comments: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    // Total active comment count for pagination metadata
    let total = app_state
        .db_client
        .get_post_comment_count(post_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting post comment count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total_pages = (total as f64 / limit as f64).ceil() as i32;

    let response = Json(CommentListResponse {
        status: "success".to_string(),
        data: comments,
        pagination: PaginationDto {
            page,
            limit,
            total: total as i32,
            total_pages,
        },
    });
    tracing::info!("get_comments successful");
    Ok(response)
}

/// Create comment on a published post
///
/// Request body: { content }
/// Returns 201 Created with the new comment.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn create_comment(
    Path(post_id): Path<i32>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<InputCommentRequest>,
) -> Result<impl IntoResponse, HttpError> {
    // Validate comment content (1-1000 characters)
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_comment input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    // Comments are only allowed on approved, visible posts
    let post = app_state
        .db_client
        .get_post(post_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting post: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PostNotFound.to_string()))?;

    if !moderation::accepts_interactions(&post) {
        return Err(HttpError::bad_request(
            ErrorMessage::PostNotPublished.to_string(),
        ));
    }

    let user_id = jwt.user.id;

    let comment = app_state
        .db_client
        .create_comment(user_id, post_id, &body.content)
        .await
        .map_err(|e| {
            tracing::error!("DB error, creating comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(SingleCommentResponse {
        status: "success".to_string(),
        data: comment,
    });
    tracing::info!("create_comment successful");
    Ok((StatusCode::CREATED, response))
}

/// Edit existing comment
///
/// Only the original author may edit; the comment is marked as edited and
/// the edit time is stamped.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn edit_comment(
    Path(comment_id): Path<i32>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<InputCommentRequest>,
) -> Result<impl IntoResponse, HttpError> {
    // Validate new content
    body.validate().map_err(|e| {
        tracing::error!("Invalid edit_comment input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let comment = app_state
        .db_client
        .get_comment(comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .filter(|c| c.active)
        .ok_or_else(|| HttpError::not_found(ErrorMessage::CommentNotFound.to_string()))?;

    if comment.user_id != jwt.user.id {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let comment = app_state
        .db_client
        .edit_comment(jwt.user.id, comment_id, &body.content)
        .await
        .map_err(|e| {
            tracing::error!("DB error, editing comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::CommentNotFound.to_string()))?;

    let response = Json(SingleCommentResponse {
        status: "success".to_string(),
        data: comment,
    });
    tracing::info!("edit_comment successful");
    Ok(response)
}

/// Soft-delete comment
///
/// Allowed for the author or any admin. The row stays; a moderator can
/// reactivate it later through report resolution.
#[instrument(skip(app_state, jwt))]
async fn delete_comment(
    Path(comment_id): Path<i32>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let comment = app_state
        .db_client
        .get_comment(comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .filter(|c| c.active)
        .ok_or_else(|| HttpError::not_found(ErrorMessage::CommentNotFound.to_string()))?;

    if comment.user_id != jwt.user.id && jwt.user.role != UserRole::Admin {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    app_state
        .db_client
        .soft_delete_comment(comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, deleting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;
    tracing::info!("delete_comment successful");
    Ok(StatusCode::NO_CONTENT)
}

/// Report a comment for moderation
///
/// Self-reports are refused, and each user can have one open report per
/// comment (enforced by the unique constraint).
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn report_comment(
    Path(comment_id): Path<i32>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<ReportCommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid report_comment input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let comment = app_state
        .db_client
        .get_comment(comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .filter(|c| c.active)
        .ok_or_else(|| HttpError::not_found(ErrorMessage::CommentNotFound.to_string()))?;

    if comment.user_id == jwt.user.id {
        return Err(HttpError::forbidden(ErrorMessage::SelfReport.to_string()));
    }

    let result = app_state
        .db_client
        .create_report(
            comment_id,
            jwt.user.id,
            body.reason,
            body.description.as_deref(),
        )
        .await;

    match result {
        Ok(_report) => {
            tracing::info!(comment_id, "report_comment successful");
            Ok((
                StatusCode::CREATED,
                Json(Response {
                    status: "success",
                    message: "Report submitted for review".to_string(),
                }),
            ))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::error!("Duplicate report for comment {}", comment_id);
            Err(HttpError::unique_constraint_violation(
                ErrorMessage::DuplicateReport.to_string(),
            ))
        }
        Err(e) => {
            tracing::error!("DB error, creating report: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}
