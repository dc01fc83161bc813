use crate::AppState;
use crate::db::ReportExt;
use crate::dtos::{
    GetReportsQuery, ModerationStatsResponse, PaginationDto, ReportListResponse,
    ResolveReportDto, SingleReportResponse,
};
use crate::error::{ErrorMessage, HttpError};
use crate::middleware::JWTAuthMiddleware;
use crate::middleware::{auth, role_check};
use crate::models::{CommentAction, UserRole};
use crate::moderation;
use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, put};
use axum::{Router, middleware};
use tracing::instrument;
use validator::Validate;

/// Router for the moderation report queue. Every route is admin-only.
pub fn report_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        // GET / - report queue, ?status=pending|reviewed|action_taken (absent = all)
        .route("/", get(get_reports))
        // GET /stats - moderation dashboard aggregates
        .route("/stats", get(get_moderation_stats))
        // PUT /{report_id} - resolve a report, optionally acting on the comment
        .route("/{report_id}", put(resolve_report))
        .route_layer(middleware::from_fn(|req, next| {
            role_check(req, next, vec![UserRole::Admin])
        }))
        .route_layer(middleware::from_fn_with_state(app_state, auth))
}

/// Paginated report queue, newest first
#[instrument(skip(app_state))]
pub async fn get_reports(
    Query(params): Query<GetReportsQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_reports input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10);

    let reports = app_state
        .db_client
        .list_reports(params.status, page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, listing reports: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .count_reports(params.status)
        .await
        .map_err(|e| {
            tracing::error!("DB error, counting reports: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total_pages = (total as f64 / limit as f64).ceil() as i32;

    let response = Json(ReportListResponse {
        status: "success".to_string(),
        data: reports,
        pagination: PaginationDto {
            page,
            limit,
            total: total as i32,
            total_pages,
        },
    });
    tracing::info!("get_reports successful");
    Ok(response)
}

/// Moderation dashboard aggregates, computed from one snapshot
#[instrument(skip(app_state))]
pub async fn get_moderation_stats(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.db_client.moderation_stats().await.map_err(|e| {
        tracing::error!("DB error, computing moderation stats: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    tracing::info!("get_moderation_stats successful");
    Ok(Json(ModerationStatsResponse {
        status: "success".to_string(),
        data: stats,
    }))
}

/// Resolve a report.
///
/// Request body: { status, commentAction? }. The status transition is
/// validated against the report's current status, then the report update
/// and the comment action are applied in one transaction.
#[instrument(skip(app_state, jwt, body), fields(moderator = %jwt.user.username))]
pub async fn resolve_report(
    Path(report_id): Path<i32>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<ResolveReportDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid resolve_report input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let report = app_state
        .db_client
        .get_report(report_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting report: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ReportNotFound.to_string()))?;

    moderation::validate_report_transition(report.status, body.status)
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let action = body.comment_action.unwrap_or(CommentAction::None);

    let resolved = app_state
        .db_client
        .resolve_report(
            report_id,
            report.comment_id,
            jwt.user.id,
            report.status,
            body.status,
            action,
        )
        .await
        .map_err(|e| {
            tracing::error!("DB error, resolving report: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    if !resolved {
        // Another moderator resolved it between our read and the update.
        return Err(HttpError::unique_constraint_violation(
            "Report was resolved concurrently".to_string(),
        ));
    }

    let dto = app_state
        .db_client
        .get_report_dto(report_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting report dto: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ReportNotFound.to_string()))?;

    tracing::info!(report_id, status = body.status.to_str(), "resolve_report successful");
    Ok(Json(SingleReportResponse {
        status: "success".to_string(),
        data: dto,
    }))
}
