use crate::AppState;
use crate::db::CatalogExt;
use crate::dtos::{
    CategoryInputDto, CategoryListResponse, SingleCategoryResponse, SingleWorldCupResponse,
    WorldCupInputDto, WorldCupListResponse,
};
use crate::error::{ErrorMessage, HttpError};
use crate::middleware::{auth, role_check};
use crate::models::UserRole;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tracing::instrument;
use validator::Validate;

/// Router for category reference data. Reads are public, writes are
/// admin-only.
pub fn category_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_categories))
        .route(
            "/",
            post(create_category)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/{category_id}",
            put(update_category)
                .delete(deactivate_category)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Router for World Cup edition reference data. Reads are public, writes
/// are admin-only.
pub fn world_cup_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_world_cups))
        .route(
            "/",
            post(create_world_cup)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/{world_cup_id}",
            put(update_world_cup)
                .delete(deactivate_world_cup)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Active categories, for the post submission form and feed filters
#[instrument(skip(app_state))]
pub async fn get_categories(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let categories = app_state
        .db_client
        .list_categories(true)
        .await
        .map_err(|e| {
            tracing::error!("DB error, listing categories: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(CategoryListResponse {
        status: "success".to_string(),
        data: categories,
    }))
}

#[instrument(skip(app_state, body))]
pub async fn create_category(
    State(app_state): State<AppState>,
    Json(body): Json<CategoryInputDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_category input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let result = app_state
        .db_client
        .create_category(&body.name, body.description.as_deref().unwrap_or(""))
        .await;

    match result {
        Ok(category) => {
            tracing::info!(name = %category.name, "create_category successful");
            Ok((
                StatusCode::CREATED,
                Json(SingleCategoryResponse {
                    status: "success".to_string(),
                    data: category,
                }),
            ))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::error!("Duplicate category name: {}", db_err);
            Err(HttpError::unique_constraint_violation(
                "Category name already exists".to_string(),
            ))
        }
        Err(e) => {
            tracing::error!("DB error, creating category: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}

#[instrument(skip(app_state, body))]
pub async fn update_category(
    Path(category_id): Path<i32>,
    State(app_state): State<AppState>,
    Json(body): Json<CategoryInputDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_category input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let result = app_state
        .db_client
        .update_category(
            category_id,
            &body.name,
            body.description.as_deref().unwrap_or(""),
        )
        .await;

    match result {
        Ok(Some(category)) => {
            tracing::info!(category_id, "update_category successful");
            Ok(Json(SingleCategoryResponse {
                status: "success".to_string(),
                data: category,
            }))
        }
        Ok(None) => Err(HttpError::not_found("Category not found".to_string())),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::error!("Duplicate category name: {}", db_err);
            Err(HttpError::unique_constraint_violation(
                "Category name already exists".to_string(),
            ))
        }
        Err(e) => {
            tracing::error!("DB error, updating category: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}

#[instrument(skip(app_state))]
pub async fn deactivate_category(
    Path(category_id): Path<i32>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let affected = app_state
        .db_client
        .deactivate_category(category_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, deactivating category: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    if affected == 0 {
        return Err(HttpError::not_found("Category not found".to_string()));
    }

    tracing::info!(category_id, "deactivate_category successful");
    Ok(StatusCode::NO_CONTENT)
}

/// Active World Cup editions, newest first
#[instrument(skip(app_state))]
pub async fn get_world_cups(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let world_cups = app_state
        .db_client
        .list_world_cups(true)
        .await
        .map_err(|e| {
            tracing::error!("DB error, listing world cups: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(WorldCupListResponse {
        status: "success".to_string(),
        data: world_cups,
    }))
}

#[instrument(skip(app_state, body))]
pub async fn create_world_cup(
    State(app_state): State<AppState>,
    Json(body): Json<WorldCupInputDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_world_cup input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    if body.end_date < body.start_date {
        return Err(HttpError::bad_request(
            "End date must not precede start date".to_string(),
        ));
    }

    let result = app_state
        .db_client
        .create_world_cup(
            body.year,
            &body.host_country,
            body.team_count,
            body.start_date,
            body.end_date,
            body.status,
        )
        .await;

    match result {
        Ok(world_cup) => {
            tracing::info!(year = world_cup.year, "create_world_cup successful");
            Ok((
                StatusCode::CREATED,
                Json(SingleWorldCupResponse {
                    status: "success".to_string(),
                    data: world_cup,
                }),
            ))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::error!("Duplicate world cup year: {}", db_err);
            Err(HttpError::unique_constraint_violation(
                "A World Cup for that year already exists".to_string(),
            ))
        }
        Err(e) => {
            tracing::error!("DB error, creating world cup: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}

#[instrument(skip(app_state, body))]
pub async fn update_world_cup(
    Path(world_cup_id): Path<i32>,
    State(app_state): State<AppState>,
    Json(body): Json<WorldCupInputDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_world_cup input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    if body.end_date < body.start_date {
        return Err(HttpError::bad_request(
            "End date must not precede start date".to_string(),
        ));
    }

    let result = app_state
        .db_client
        .update_world_cup(
            world_cup_id,
            body.year,
            &body.host_country,
            body.team_count,
            body.start_date,
            body.end_date,
            body.status,
        )
        .await;

    match result {
        Ok(Some(world_cup)) => {
            tracing::info!(world_cup_id, "update_world_cup successful");
            Ok(Json(SingleWorldCupResponse {
                status: "success".to_string(),
                data: world_cup,
            }))
        }
        Ok(None) => Err(HttpError::not_found("World Cup not found".to_string())),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::error!("Duplicate world cup year: {}", db_err);
            Err(HttpError::unique_constraint_violation(
                "A World Cup for that year already exists".to_string(),
            ))
        }
        Err(e) => {
            tracing::error!("DB error, updating world cup: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}

#[instrument(skip(app_state))]
pub async fn deactivate_world_cup(
    Path(world_cup_id): Path<i32>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let affected = app_state
        .db_client
        .deactivate_world_cup(world_cup_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, deactivating world cup: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    if affected == 0 {
        return Err(HttpError::not_found("World Cup not found".to_string()));
    }

    tracing::info!(world_cup_id, "deactivate_world_cup successful");
    Ok(StatusCode::NO_CONTENT)
}
