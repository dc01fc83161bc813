use crate::db::CommentExt;
use crate::{
    AppState,
    db::PostExt,
    db::UserExt,
    dtos::{
        DoubleCheckDto, FilterUserDto, NameUpdateDto, RequestQueryDto, Response, RoleUpdateDto,
        UserData, UserListResponseDto, UserMeData, UserMeResponseDto, UserPasswordUpdateDto,
        UserResponseDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::{JWTAuthMiddleware, role_check},
    models::UserRole,
    utils::password,
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use axum_extra::extract::cookie::Cookie;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

/// Router for user management endpoints
///
/// All routes are protected by the auth middleware (applied in routes.rs).
/// Some routes have additional role-based restrictions.
pub fn users_handler() -> Router<AppState> {
    Router::new()
        // GET /me - Get current user's profile with statistics
        .route(
            "/me",
            get(get_me).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Admin, UserRole::User])
            })),
        )
        // GET /users - List all users (admin only)
        .route(
            "/users",
            get(get_users).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Admin])
            })),
        )
        // PUT /role/{user_id} - Change another user's role (admin only)
        .route(
            "/role/{user_id}",
            put(update_user_role).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Admin])
            })),
        )
        // PUT /username - Update user's display name
        .route("/username", put(update_user_name))
        // PUT /password - Change password (requires old password)
        .route("/password", put(update_user_password))
        // POST /logout - Logout user (clears tokens)
        .route("/logout", post(logout))
        // DELETE /deactivate-me - Deactivate account (requires password confirmation)
        .route("/deactivate-me", delete(deactivate_me))
}

/// Get current user's profile with post and comment counts
#[instrument(skip(user, app_state), fields(username = %user.user.username))]
pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    // Filter user data (remove the password hash)
    let filtered_user = FilterUserDto::filter_user(&user.user);

    let post_count = app_state
        .db_client
        .get_user_post_count(user.user.id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user post count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let comment_count = app_state
        .db_client
        .get_user_comment_count(&user.user.id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user comment count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response_data = UserMeResponseDto {
        status: "success".to_string(),
        data: UserMeData {
            user: filtered_user,
            post_count,
            comment_count,
        },
    };
    tracing::info!("get_me successful");
    Ok(Json(response_data))
}

/// Get paginated list of all users (admin only)
///
/// Query params: ?page=1&limit=10
#[instrument(skip(app_state))]
pub async fn get_users(
    Query(query_params): Query<RequestQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    query_params.validate().map_err(|e| {
        tracing::error!("Invalid get_users input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);

    let users = app_state
        .db_client
        .get_users(page as u32, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting users: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let user_count = app_state.db_client.get_user_count().await.map_err(|e| {
        tracing::error!("DB error, getting user count: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let response = UserListResponseDto {
        status: "success".to_string(),
        users: FilterUserDto::filter_users(&users),
        results: user_count,
    };
    tracing::info!("get_users successful");
    Ok(Json(response))
}

/// Update user's display name
#[instrument(skip(app_state, user, body), fields(username = %user.user.username))]
pub async fn update_user_name(
    State(app_state): State<AppState>,
    Extension(user): Extension<JWTAuthMiddleware>,
    Json(body): Json<NameUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_user_name input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let user_id = user.user.id;

    let result = app_state
        .db_client
        .update_user_name(user_id, &body.name)
        .await
        .map_err(|e| {
            tracing::error!("DB error, updating user name: {}", e);
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return HttpError::unique_constraint_violation(
                        "Username already exists".to_string(),
                    );
                }
            }
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let filtered_user = FilterUserDto::filter_user(&result);

    let response = UserResponseDto {
        data: UserData {
            user: filtered_user,
        },
        status: "success".to_string(),
    };
    tracing::info!("update_user_name successful");
    Ok(Json(response))
}

/// Change another user's role (admin only)
#[instrument(skip(app_state, user, body), fields(moderator = %user.user.username))]
pub async fn update_user_role(
    Path(target_user_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Extension(user): Extension<JWTAuthMiddleware>,
    Json(body): Json<RoleUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_user_role input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    // Make sure the target exists before updating
    let target = app_state
        .db_client
        .get_user(Some(target_user_id), None, None)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    if target.is_none() {
        return Err(HttpError::not_found("User not found".to_string()));
    }

    let result = app_state
        .db_client
        .update_user_role(target_user_id, body.role)
        .await
        .map_err(|e| {
            tracing::error!("DB error, updating user role: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let filtered_user = FilterUserDto::filter_user(&result);

    let response = UserResponseDto {
        data: UserData {
            user: filtered_user,
        },
        status: "success".to_string(),
    };
    tracing::info!("update_user_role successful");
    Ok(Json(response))
}

/// Update user's password
///
/// Requires old password verification before allowing change.
/// Request body: { old_password, new_password, new_password_confirm }
#[instrument(skip(app_state, user, body), fields(username = %user.user.username))]
pub async fn update_user_password(
    State(app_state): State<AppState>,
    Extension(user): Extension<JWTAuthMiddleware>,
    Json(body): Json<UserPasswordUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_user_password input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let user = &user.user;
    let user_id = user.id;

    // Verify old password matches
    let password_match = password::compare(&body.old_password, &user.password).map_err(|e| {
        tracing::error!("Password comparison error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    if !password_match {
        tracing::error!("Old password is incorrect");
        return Err(HttpError::bad_request(
            "Old password is incorrect".to_string(),
        ));
    }

    // Hash new password
    let hash_password = password::hash(&body.new_password).map_err(|e| {
        tracing::error!("Password hashing error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    app_state
        .db_client
        .update_user_password(user_id, hash_password)
        .await
        .map_err(|e| {
            tracing::error!("DB error, updating user password: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    // Force logout everywhere
    app_state
        .redis_client
        .delete_refresh_token(&user_id.to_string())
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, deleting refresh token: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Response {
        message: "Password updated Successfully".to_string(),
        status: "success",
    };
    tracing::info!("update_user_password successful");
    Ok(Json(response))
}

/// Logout user by clearing tokens
///
/// Deletes refresh token from Redis and sets cookies to expire immediately.
#[instrument(skip(user, app_state), fields(username = %user.user.username))]
pub async fn logout(
    Extension(user): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let user = user.user;

    // Delete refresh token from Redis
    app_state
        .redis_client
        .delete_refresh_token(&user.id.to_string())
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, deleting refresh token: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    // Create expired cookies to clear client-side tokens
    let access_cookie = Cookie::build(("access_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO) // Expire immediately
        .http_only(true)
        .build();

    let refresh_cookie = Cookie::build(("refresh_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        access_cookie.to_string().parse().unwrap(),
    );
    headers.append(
        header::SET_COOKIE,
        refresh_cookie.to_string().parse().unwrap(),
    );

    let json_response = axum::response::Json(Response {
        status: "success",
        message: "Logout successful".to_string(),
    });

    let mut response = json_response.into_response();
    response.headers_mut().extend(headers);
    tracing::info!("logout successful");
    Ok(response)
}

/// Deactivate user account
///
/// Requires password confirmation. The row is kept (soft deactivation) so
/// authored posts and comments stay attributable; the account can no
/// longer log in.
#[instrument(skip(app_state, jwt, body), fields(username = %jwt.user.username))]
pub async fn deactivate_me(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<DoubleCheckDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid deactivate_me input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let user = jwt.user;

    // Verify password before allowing deactivation
    let passwords_match = password::compare(&body.password, &user.password).map_err(|e| {
        tracing::error!("Password comparison error: {}", e);
        HttpError::server_error("Error while comparing passwords".to_string())
    })?;

    if passwords_match {
        app_state
            .db_client
            .deactivate_user(user.id)
            .await
            .map_err(|e| {
                if let sqlx::Error::RowNotFound = e {
                    tracing::error!("User not found for deactivation");
                    HttpError::new("User not found".to_string(), StatusCode::NOT_FOUND)
                } else {
                    tracing::error!("DB error, deactivating user: {}", e);
                    HttpError::server_error(ErrorMessage::ServerError.to_string())
                }
            })?;

        // Revoke the refresh token as well
        app_state
            .redis_client
            .delete_refresh_token(&user.id.to_string())
            .await
            .map_err(|e| {
                tracing::error!("RedisDB error, deleting refresh token: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?;

        tracing::info!("deactivate_me successful");
        Ok(StatusCode::NO_CONTENT)
    } else {
        tracing::error!("Invalid password for deactivate_me");
        Err(HttpError::unauthorized("Invalid password".to_string()))
    }
}
