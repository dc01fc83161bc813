use crate::AppState;
use crate::db::{CatalogExt, PostExt};
use crate::dtos::{
    FeedQueryParams, InputPostDto, ModerationQueryParams, PaginationDto, PostDto,
    PostResponseDto, PostsPaginationResponseDto, RequestQueryDto,
};
use crate::error::{ErrorMessage, HttpError};
use crate::middleware::JWTAuthMiddleware;
use crate::middleware::{auth, role_check};
use crate::models::{PostState, UserRole};
use crate::moderation;
use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tracing::instrument;
use validator::Validate;

use crate::handler::comment::post_comments_handler;
use crate::handler::interaction::interaction_handler;

pub fn post_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        // GET / - public feed of approved posts
        .route("/", get(get_feed))
        // POST / - submit a post for moderation (any authenticated user)
        .route(
            "/",
            post(submit_post)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        // GET /mine - the caller's own posts, any state
        .route(
            "/mine",
            get(get_my_posts)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        // GET /moderation?state=pending - the moderation queue (admin)
        .route(
            "/moderation",
            get(get_moderation_queue)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{post_id}", get(get_post))
        .route(
            "/{post_id}",
            put(edit_post)
                .delete(delete_post)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        // PUT /{post_id}/approve, /{post_id}/reject - state transitions (admin)
        .route(
            "/{post_id}/approve",
            put(approve_post)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/{post_id}/reject",
            put(reject_post)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .nest(
            "/{post_id}/comments",
            post_comments_handler(app_state.clone()),
        )
        .nest("/{post_id}/reaction", interaction_handler(app_state))
}

/// Public feed: approved posts, newest first, optionally filtered by
/// category and World Cup edition.
#[instrument(skip(app_state))]
pub async fn get_feed(
    Query(params): Query<FeedQueryParams>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_feed input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10);

    let posts = app_state
        .db_client
        .get_feed(page, limit, params.category_id, params.world_cup_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting feed: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_feed_count(params.category_id, params.world_cup_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting feed count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total_pages = (total as f64 / limit as f64).ceil() as i32;

    let response = Json(PostsPaginationResponseDto {
        status: "success".to_string(),
        data: posts,
        pagination: PaginationDto {
            page,
            limit,
            total: total as i32,
            total_pages,
        },
    });
    tracing::info!("get_feed successful");
    Ok(response)
}

/// Single post view. Only published posts are visible here; authors see
/// their pending/rejected posts through GET /mine.
#[instrument(skip(app_state))]
pub async fn get_post(
    Path(post_id): Path<i32>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let post = app_state.db_client.get_post(post_id).await.map_err(|e| {
        tracing::error!("DB error, getting post: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let post = post.ok_or_else(|| HttpError::not_found(ErrorMessage::PostNotFound.to_string()))?;

    if !moderation::is_published(&post) {
        return Err(HttpError::not_found(ErrorMessage::PostNotFound.to_string()));
    }

    let dto = app_state
        .db_client
        .get_post_dto(post_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting post dto: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PostNotFound.to_string()))?;

    let response = Json(PostResponseDto {
        status: "success".to_string(),
        data: dto,
    });

    Ok(response)
}

/// Submit a new post. It enters the moderation queue in the `pending`
/// state and is invisible to the feed until approved.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn submit_post(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<InputPostDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid submit_post input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    // User-supplied HTML is sanitized before it is stored
    let content = ammonia::clean(&body.content);

    check_references(&app_state, body.category_id, body.world_cup_id).await?;

    let post = app_state
        .db_client
        .create_post(
            jwt.user.id,
            &body.title,
            &content,
            body.category_id,
            body.world_cup_id,
        )
        .await
        .map_err(|e| {
            tracing::error!("DB error, creating post: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(PostResponseDto {
        status: "success".to_string(),
        data: PostDto {
            id: post.id,
            user_username: jwt.user.username.clone(),
            title: post.title,
            content: post.content,
            category_id: post.category_id,
            world_cup_id: post.world_cup_id,
            state: post.state,
            likes_count: post.likes_count,
            dislikes_count: post.dislikes_count,
            approved_at: post.approved_at,
            created_at: post.created_at,
            updated_at: post.updated_at,
        },
    });
    tracing::info!("submit_post successful");
    Ok((StatusCode::CREATED, response))
}

/// The caller's own posts in any state, so authors can track what is still
/// pending or was rejected.
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn get_my_posts(
    Query(params): Query<RequestQueryDto>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_my_posts input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = params.page.unwrap_or(1) as i32;
    let limit = params.limit.unwrap_or(10) as i32;

    let posts = app_state
        .db_client
        .list_user_posts(jwt.user.id, page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, listing user posts: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_user_post_count(jwt.user.id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user post count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total_pages = (total as f64 / limit as f64).ceil() as i32;

    let response = Json(PostsPaginationResponseDto {
        status: "success".to_string(),
        data: posts,
        pagination: PaginationDto {
            page,
            limit,
            total: total as i32,
            total_pages,
        },
    });
    tracing::info!("get_my_posts successful");
    Ok(response)
}

/// Moderation queue (admin): active posts in the requested state.
#[instrument(skip(app_state))]
pub async fn get_moderation_queue(
    Query(params): Query<ModerationQueryParams>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_moderation_queue input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10);

    let posts = app_state
        .db_client
        .list_by_state(params.state, page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, listing posts by state: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .count_by_state(params.state)
        .await
        .map_err(|e| {
            tracing::error!("DB error, counting posts by state: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total_pages = (total as f64 / limit as f64).ceil() as i32;

    let response = Json(PostsPaginationResponseDto {
        status: "success".to_string(),
        data: posts,
        pagination: PaginationDto {
            page,
            limit,
            total: total as i32,
            total_pages,
        },
    });
    tracing::info!("get_moderation_queue successful");
    Ok(response)
}

/// Author edit. Only the owner may edit, and only while the post is
/// pending or rejected — published content is immutable.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn edit_post(
    Path(post_id): Path<i32>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<InputPostDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid edit_post input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let post = app_state
        .db_client
        .get_post(post_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting post: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .filter(|p| p.active)
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PostNotFound.to_string()))?;

    if post.user_id != jwt.user.id {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    if !moderation::author_can_edit(post.state) {
        return Err(HttpError::bad_request(
            "Approved posts can no longer be edited".to_string(),
        ));
    }

    let content = ammonia::clean(&body.content);

    check_references(&app_state, body.category_id, body.world_cup_id).await?;

    // Compare-and-set on the state the author saw; a concurrent approval
    // wins and the edit is refused.
    let updated = app_state
        .db_client
        .edit_post(
            post_id,
            jwt.user.id,
            &body.title,
            &content,
            body.category_id,
            body.world_cup_id,
            post.state,
        )
        .await
        .map_err(|e| {
            tracing::error!("DB error, editing post: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    if updated == 0 {
        return Err(HttpError::unique_constraint_violation(
            "Post state changed while editing".to_string(),
        ));
    }

    let dto = app_state
        .db_client
        .get_post_dto(post_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting post dto: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PostNotFound.to_string()))?;

    let response = Json(PostResponseDto {
        status: "success".to_string(),
        data: dto,
    });
    tracing::info!("edit_post successful");
    Ok(response)
}

/// Soft delete: the owner or an admin hides the post from every listing;
/// the row is retained for audit.
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn delete_post(
    Path(post_id): Path<i32>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let post = app_state
        .db_client
        .get_post(post_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting post: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .filter(|p| p.active)
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PostNotFound.to_string()))?;

    if post.user_id != jwt.user.id && jwt.user.role != UserRole::Admin {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    app_state
        .db_client
        .soft_delete_post(post_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, deleting post: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!("delete_post successful");
    Ok(StatusCode::NO_CONTENT)
}

/// Approve a post (admin): valid from `pending` or `rejected`.
#[instrument(skip(app_state, jwt), fields(moderator = %jwt.user.username))]
pub async fn approve_post(
    Path(post_id): Path<i32>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    transition_post(app_state, post_id, jwt.user.id, PostState::Approved).await
}

/// Reject a post (admin): valid from `pending` only. Approved posts are
/// unpublished through soft delete, never rejected.
#[instrument(skip(app_state, jwt), fields(moderator = %jwt.user.username))]
pub async fn reject_post(
    Path(post_id): Path<i32>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    transition_post(app_state, post_id, jwt.user.id, PostState::Rejected).await
}

/// Shared transition flow: fetch, validate the edge, compare-and-set.
async fn transition_post(
    app_state: AppState,
    post_id: i32,
    moderator_id: uuid::Uuid,
    to: PostState,
) -> Result<impl IntoResponse + use<>, HttpError> {
    let post = app_state
        .db_client
        .get_post(post_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting post: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .filter(|p| p.active)
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PostNotFound.to_string()))?;

    moderation::validate_post_transition(post.state, to)
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let updated = match to {
        PostState::Approved => {
            app_state
                .db_client
                .approve_post(post_id, moderator_id, post.state)
                .await
        }
        PostState::Rejected => app_state.db_client.reject_post(post_id).await,
        PostState::Pending => unreachable!("no transition leads back to pending"),
    }
    .map_err(|e| {
        tracing::error!("DB error, updating post state: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    if updated == 0 {
        // Another moderator got there first.
        return Err(HttpError::unique_constraint_violation(
            "Post state changed concurrently".to_string(),
        ));
    }

    let dto = app_state
        .db_client
        .get_post_dto(post_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting post dto: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PostNotFound.to_string()))?;

    tracing::info!(post_id, state = to.to_str(), "post state transition successful");
    Ok(Json(PostResponseDto {
        status: "success".to_string(),
        data: dto,
    }))
}

/// Submitted category/world-cup references must point at existing, active
/// rows.
async fn check_references(
    app_state: &AppState,
    category_id: Option<i32>,
    world_cup_id: Option<i32>,
) -> Result<(), HttpError> {
    if let Some(category_id) = category_id {
        let category = app_state
            .db_client
            .get_category(category_id)
            .await
            .map_err(|e| {
                tracing::error!("DB error, getting category: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?;

        if !category.map(|c| c.active).unwrap_or(false) {
            return Err(HttpError::bad_request("Unknown category".to_string()));
        }
    }

    if let Some(world_cup_id) = world_cup_id {
        let world_cup = app_state
            .db_client
            .get_world_cup(world_cup_id)
            .await
            .map_err(|e| {
                tracing::error!("DB error, getting world cup: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?;

        if !world_cup.map(|w| w.active).unwrap_or(false) {
            return Err(HttpError::bad_request(
                "Unknown World Cup edition".to_string(),
            ));
        }
    }

    Ok(())
}
