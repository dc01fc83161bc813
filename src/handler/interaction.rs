use crate::AppState;
use crate::db::{InteractionExt, PostExt};
use crate::dtos::{ReactionRequest, ReactionResponse};
use crate::error::{ErrorMessage, HttpError};
use crate::middleware::JWTAuthMiddleware;
use crate::middleware::auth;
use crate::moderation;
use axum::Extension;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, put};
use axum::{Router, middleware};
use tracing::instrument;

/// Router for like/dislike endpoints nested under /posts/{post_id}/reaction
pub fn interaction_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        // GET / - current like/dislike counts (public)
        .route("/", get(get_counts))
        // PUT / - set the caller's reaction (upsert)
        // DELETE / - withdraw the caller's reaction
        .route(
            "/",
            put(set_reaction)
                .delete(clear_reaction)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Aggregate like/dislike counts for a published post
#[instrument(skip(app_state))]
pub async fn get_counts(
    Path(post_id): Path<i32>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let post = app_state
        .db_client
        .get_post(post_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting post: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PostNotFound.to_string()))?;

    if !moderation::is_published(&post) {
        return Err(HttpError::not_found(ErrorMessage::PostNotFound.to_string()));
    }

    let counts = app_state
        .db_client
        .counts_for(post_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting counts: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PostNotFound.to_string()))?;

    Ok(Json(ReactionResponse {
        status: "success".to_string(),
        data: counts,
    }))
}

/// Set the caller's reaction on a published post.
///
/// Upsert semantics: liking after disliking replaces the dislike; sending
/// the same kind twice is a no-op. Counters move in the same transaction
/// as the row.
#[instrument(skip(app_state, jwt, body), fields(username = %jwt.user.username))]
pub async fn set_reaction(
    Path(post_id): Path<i32>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<ReactionRequest>,
) -> Result<impl IntoResponse, HttpError> {
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

    let result = app_state
        .db_client
        .set_interaction(jwt.user.id, post_id, body.kind)
        .await;

    match result {
        Ok(counts) => {
            tracing::info!(post_id, kind = body.kind.to_str(), "set_reaction successful");
            Ok(Json(ReactionResponse {
                status: "success".to_string(),
                data: counts,
            }))
        }
        // Two requests from the same user raced past the row lock; one of
        // them lost the insert.
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::error!("Concurrent duplicate reaction for post {}", post_id);
            Err(HttpError::unique_constraint_violation(
                "Reaction already recorded, retry".to_string(),
            ))
        }
        Err(e) => {
            tracing::error!("DB error, setting reaction: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}

/// Withdraw the caller's reaction. Removing a reaction that does not exist
/// is a no-op, not an error.
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn clear_reaction(
    Path(post_id): Path<i32>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    // The post must exist, but clearing is allowed even after it leaves
    // the feed — withdrawing a reaction from an unpublished post is
    // harmless.
    app_state
        .db_client
        .get_post(post_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting post: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PostNotFound.to_string()))?;

    let counts = app_state
        .db_client
        .clear_interaction(jwt.user.id, post_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, clearing reaction: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!(post_id, "clear_reaction successful");
    Ok(Json(ReactionResponse {
        status: "success".to_string(),
        data: counts,
    }))
}
