use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{PostState, ReportStatus};

/// Error response structure sent to clients.
///
/// Every failing endpoint returns this JSON shape:
/// ```
/// {
///   "status": "fail",
///   "message": "You are not allowed to perform this action"
/// }
/// ```
/// `ErrorResponse` is the external format; `HttpError` is the internal error
/// type handlers work with.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Enumeration of the application's error conditions.
///
/// Each variant carries a fixed client-facing message; handlers pick the
/// HTTP status when converting to `HttpError`. `PartialEq` allows comparing
/// variants in tests.
#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    // Password validation errors
    EmptyPassword,
    ExceededMaxPasswordLength(usize),
    InvalidHashFormat,
    HashingError,

    // Authentication errors
    InvalidToken,
    TokenNotProvided,
    UserNotAuthenticated,
    AccountDeactivated,

    // Authorization errors
    PermissionDenied,

    // Moderation errors
    InvalidStateTransition(PostState, PostState),
    InvalidReportTransition(ReportStatus, ReportStatus),
    PostNotPublished,
    SelfReport,
    DuplicateReport,

    // Missing entities
    UserNoLongerExist,
    PostNotFound,
    CommentNotFound,
    ReportNotFound,

    // Else
    ServerError,
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorMessage::EmptyPassword => "Password cannot be empty".to_string(),
            ErrorMessage::ExceededMaxPasswordLength(max_length) => {
                format!("Password must not be more than {} characters", max_length)
            }
            ErrorMessage::InvalidHashFormat => "Invalid password hash format".to_string(),
            ErrorMessage::HashingError => "Error while hashing password".to_string(),
            ErrorMessage::InvalidToken => "Token is invalid or expired".to_string(),
            ErrorMessage::TokenNotProvided => {
                "You are not logged in, please provide a token".to_string()
            }
            ErrorMessage::UserNotAuthenticated => {
                "Authentication required. Please log in.".to_string()
            }
            ErrorMessage::AccountDeactivated => "This account has been deactivated".to_string(),
            ErrorMessage::PermissionDenied => {
                "You are not allowed to perform this action".to_string()
            }
            ErrorMessage::InvalidStateTransition(from, to) => {
                format!(
                    "A {} post cannot be moved to {}",
                    from.to_str(),
                    to.to_str()
                )
            }
            ErrorMessage::InvalidReportTransition(from, to) => {
                format!(
                    "A {} report cannot be moved to {}",
                    from.to_str(),
                    to.to_str()
                )
            }
            ErrorMessage::PostNotPublished => {
                "This post has not been published".to_string()
            }
            ErrorMessage::SelfReport => "You cannot report your own comment".to_string(),
            ErrorMessage::DuplicateReport => {
                "You have already reported this comment".to_string()
            }
            ErrorMessage::UserNoLongerExist => {
                "User belonging to this token no longer exists".to_string()
            }
            ErrorMessage::PostNotFound => "Post not found".to_string(),
            ErrorMessage::CommentNotFound => "Comment not found".to_string(),
            ErrorMessage::ReportNotFound => "Report not found".to_string(),
            ErrorMessage::ServerError => "Server Error. Please try again later".to_string(),
        };
        write!(f, "{}", message)
    }
}

/// Internal HTTP error type used throughout the application.
///
/// Handlers return `Result<T, HttpError>`; axum converts the error into a
/// JSON response through the `IntoResponse` impl below, so the status code
/// and the message always travel together.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
        }
    }

    /// 500 Internal Server Error: database failures, unexpected conditions.
    pub fn server_error(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 400 Bad Request: malformed input, invalid enum values, invalid state
    /// transition attempts.
    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// 409 Conflict: unique constraint violations (duplicate username,
    /// duplicate report) and lost compare-and-set races.
    pub fn unique_constraint_violation(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::CONFLICT,
        }
    }

    /// 401 Unauthorized: missing or invalid credentials/token.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::UNAUTHORIZED,
        }
    }

    /// 403 Forbidden: authenticated caller lacks the required role or
    /// ownership.
    pub fn forbidden(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::FORBIDDEN,
        }
    }

    /// 404 Not Found: referenced entity does not exist.
    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn into_http_response(self) -> Response {
        let json_response = Json(ErrorResponse {
            status: "fail".to_string(),
            message: self.message.clone(),
        });

        (self.status, json_response).into_response()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_message_names_both_states() {
        let msg =
            ErrorMessage::InvalidStateTransition(PostState::Approved, PostState::Rejected)
                .to_string();
        assert!(msg.contains("approved"));
        assert!(msg.contains("rejected"));
    }

    #[test]
    fn http_error_constructors_set_status() {
        assert_eq!(
            HttpError::forbidden("nope").status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            HttpError::not_found("missing").status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HttpError::unique_constraint_violation("dup").status,
            StatusCode::CONFLICT
        );
    }
}
