use crate::{
    AppState,
    db::UserExt,
    dtos::{LoginUserDto, RefreshResponseDto, RegisterUserDto, Response, UserLoginResponseDto},
    error::{ErrorMessage, HttpError},
    utils::{password, token},
};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use axum_client_ip::ClientIp;

use tracing::instrument;
use validator::Validate;

/// Router for authentication endpoints
pub fn auth_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route(
            "/login",
            post(login).layer(app_state.ip_extraction.into_extension()),
        )
        .route("/refresh", post(refresh))
}

/// Register new user account
///
/// Creates the user with a hashed password; the account is active
/// immediately and starts with the `user` role.
#[instrument(skip(app_state, body), fields(username = %body.username, email = %body.email))]
pub async fn register(
    State(app_state): State<AppState>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    // Validate input
    body.validate().map_err(|e| {
        tracing::error!("Invalid register input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    // Hash password before storing
    let hash_password = password::hash(&body.password).map_err(|e| {
        tracing::error!("Password hashing error: {}", e);
        HttpError::server_error(e.to_string())
    })?;

    let result = app_state
        .db_client
        .save_user(&body.username, &body.email, &hash_password)
        .await;

    match result {
        Ok(_user) => {
            tracing::info!(username = %body.username, email = %body.email, "Register Successful");
            Ok((
                StatusCode::CREATED,
                Json(Response {
                    status: "success",
                    message: "Registration successful!".to_string(),
                }),
            ))
        }
        Err(sqlx::Error::Database(db_err)) => {
            // Email or username already exists
            if db_err.is_unique_violation() {
                tracing::error!("DB error, saving user, unique_violation: {}", db_err);
                Err(HttpError::unique_constraint_violation(db_err.to_string()))
            } else {
                tracing::error!("DB error, saving user: {}", db_err);
                Err(HttpError::server_error(
                    ErrorMessage::ServerError.to_string(),
                ))
            }
        }
        Err(e) => {
            tracing::error!("DB error, saving user: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}

/// Login with rate limiting (100 attempts per IP per day, 10 per identifier per hour)
#[instrument(skip(app_state, body), fields(identifier = %body.identifier))]
pub async fn login(
    ClientIp(ip): ClientIp,
    State(app_state): State<AppState>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    // Check IP attempt limit (max 100 per 24 hours)
    let ip_attempts = app_state
        .redis_client
        .get_ip_attempts(ip)
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, getting ip attempts: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .unwrap_or(0);
    if ip_attempts >= 100 {
        tracing::error!("Login attempt exceeded the limit");
        return Err(HttpError::server_error("Login failed"));
    }

    // Check identifier+IP attempt limit (max 10 per hour)
    let identifier_ip_attempts = app_state
        .redis_client
        .get_identifier_ip_attempts(ip, &body.identifier)
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, getting identifier+ip attempts: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .unwrap_or(0);

    if identifier_ip_attempts >= 10 {
        tracing::error!("Login attempt exceeded the limit");
        return Err(HttpError::server_error("Login failed"));
    }

    // Attempt authentication
    match authenticate_process(State(app_state.clone()), &body).await {
        Ok(response) => {
            // Clear rate limit on success
            if let Err(e) = app_state
                .redis_client
                .delete_identifier_ip_attempts(ip, &body.identifier)
                .await
            {
                tracing::warn!("Failed to clear rate limit: {:?}", e);
            }
            tracing::info!(identifier = %body.identifier, ip = %ip, "Login Successful");
            Ok(response)
        }
        Err(_) => {
            // Increment rate limit on failure
            if let Err(e) = app_state
                .redis_client
                .increment_attempts(ip, &body.identifier)
                .await
            {
                tracing::warn!("Failed to increment the rate {:?}", e);
            }
            Err(HttpError::server_error("Login failed"))
        }
    }
}

/// Authenticate user credentials
async fn authenticate_process(
    State(app_state): State<AppState>,
    body: &LoginUserDto,
) -> Result<impl IntoResponse + use<>, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid login input: {}", e);
        HttpError::server_error("Login failed")
    })?;

    // Find user by email or username (identifier contains '@' for email)
    let result = if body.identifier.contains('@') {
        app_state
            .db_client
            .get_user(None, None, Some(&body.identifier))
            .await
            .map_err(|e| {
                tracing::error!("DB error, getting user: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?
    } else {
        app_state
            .db_client
            .get_user(None, Some(&body.identifier), None)
            .await
            .map_err(|e| {
                tracing::error!("DB error, getting user: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?
    };

    let user = result.ok_or_else(|| {
        tracing::error!("User not found");
        HttpError::server_error("Login failed")
    })?;

    // Deactivated accounts cannot authenticate
    if !user.active {
        tracing::error!(user_id = %user.id, "Deactivated account attempted login");
        return Err(HttpError::forbidden(
            ErrorMessage::AccountDeactivated.to_string(),
        ));
    }

    // Verify password hash
    let password_matched = password::compare(&body.password, &user.password).map_err(|e| {
        tracing::error!("Password error: {}", e);
        HttpError::server_error("Login failed")
    })?;

    if password_matched {
        // Short-lived access token
        let access_token = token::create_token(
            &user.id.to_string(),
            user.role,
            app_state.env.jwt_secret.as_bytes(),
            app_state.env.jwt_maxage,
        )
        .map_err(|e| {
            tracing::error!("Access token creation error: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

        let access_cookie = Cookie::build(("access_token", access_token.clone()))
            .path("/")
            .http_only(true)
            .secure(true)
            .build();

        let response = axum::response::Json(UserLoginResponseDto {
            status: "success".to_string(),
            access_token,
            username: user.username,
        });

        // Long-lived refresh token
        let refresh_token = token::create_token(
            &user.id.to_string(),
            user.role,
            app_state.env.jwt_secret.as_bytes(),
            app_state.env.refresh_token_maxage,
        )
        .map_err(|e| {
            tracing::error!("Refresh token creation error: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

        let refresh_cookie = Cookie::build(("refresh_token", &refresh_token))
            .path("/")
            .http_only(true)
            .secure(true)
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

        // Store refresh token in Redis for revocation support
        app_state
            .redis_client
            .save_refresh_token(
                &user.id.to_string(),
                &refresh_token,
                app_state.env.refresh_token_maxage,
            )
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, "RedisDB error, saving refresh token: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?;

        let mut response = response.into_response();
        response.headers_mut().extend(headers);
        tracing::info!("authenticate_process succesful");
        Ok(response)
    } else {
        tracing::error!("password mismatch");
        Err(HttpError::server_error("Login failed"))
    }
}

/// Refresh access token using refresh token from cookie
#[instrument(skip(app_state, cookie_jar))]
pub async fn refresh(
    cookie_jar: CookieJar,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    // Extract refresh token from cookie
    let cookies = cookie_jar
        .get("refresh_token")
        .map(|cookie| cookie.value().to_string());

    let token = cookies.ok_or_else(|| {
        tracing::error!("Refresh token not provided");
        HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string())
    })?;

    // Decode and verify refresh token
    let claims = match token::decode_token(&token, app_state.env.jwt_secret.as_bytes()) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::error!("Invalid refresh token: {}", e);
            return Err(HttpError::unauthorized(
                ErrorMessage::InvalidToken.to_string(),
            ));
        }
    };

    // Verify refresh token exists in Redis (hasn't been revoked)
    let stored_refresh_token = app_state
        .redis_client
        .get_refresh_token(&claims.sub)
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, getting refresh token: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    // Ensure token matches stored value
    if stored_refresh_token.is_none() || stored_refresh_token.unwrap() != token {
        tracing::error!("Refresh token mismatch or not found in Redis");
        return Err(HttpError::server_error(
            "Refresh token mismatch".to_string(),
        ));
    }

    // Create new access token
    let access_token = token::create_token(
        &claims.sub,
        claims.role,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| {
        tracing::error!("Access token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let access_cookie = Cookie::build(("access_token", access_token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .build();

    let response = axum::response::Json(RefreshResponseDto {
        status: "access_token recreated".to_string(),
        access_token,
    });

    let mut headers = HeaderMap::new();

    headers.append(
        header::SET_COOKIE,
        access_cookie.to_string().parse().unwrap(),
    );

    let mut response = response.into_response();
    response.headers_mut().extend(headers);
    tracing::info!("Access token refreshed successfully");
    Ok(response)
}
