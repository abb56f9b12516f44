//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::http_client::HttpClientError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Email is taken (local signup or first-time federation)
    #[error("Email is already registered")]
    AlreadyRegisteredEmail,

    #[error("Email is already verified")]
    EmailAlreadyVerified,

    /// Wrong email/password pair, or no password on the account
    #[error("Email or password does not match")]
    InvalidCredentials,

    #[error("Email verification is not complete")]
    EmailNotVerified,

    #[error("Authorization token is missing")]
    MissingToken,

    #[error("Authorization scheme must be Bearer")]
    InvalidScheme,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Token is invalid")]
    MalformedToken,

    /// Token verified but its user no longer exists
    #[error("User of this token no longer exists")]
    UserGone,

    #[error("{0}")]
    Unauthorized(String),

    #[error("User not found")]
    UserNotFound,

    /// User declined consent, or the provider returned no access token
    #[error("Provider sign-in was not completed")]
    ProviderDenied,

    /// Provider token does not belong to the authenticated user
    #[error("Provider account does not belong to this user")]
    ProviderMismatch,

    #[error("Provider request failed: {0}")]
    Provider(String),

    #[error("Provider did not respond in time")]
    ProviderTimeout,

    #[error("Credential store did not respond in time")]
    StoreTimeout,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::AlreadyRegisteredEmail | AuthError::EmailAlreadyVerified => {
                ErrorKind::Conflict
            }
            AuthError::InvalidCredentials
            | AuthError::EmailNotVerified
            | AuthError::MissingToken
            | AuthError::InvalidScheme
            | AuthError::ExpiredToken
            | AuthError::MalformedToken
            | AuthError::UserGone
            | AuthError::Unauthorized(_) => ErrorKind::Unauthorized,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::ProviderDenied | AuthError::ProviderMismatch | AuthError::Provider(_) => {
                ErrorKind::BadGateway
            }
            AuthError::ProviderTimeout => ErrorKind::GatewayTimeout,
            AuthError::StoreTimeout => ErrorKind::ServiceUnavailable,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Stable machine-readable code rendered as `kind` in the response body
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::AlreadyRegisteredEmail => "ALREADY_REGISTERED_EMAIL",
            AuthError::EmailAlreadyVerified => "EMAIL_ALREADY_VERIFIED",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            AuthError::MissingToken
            | AuthError::InvalidScheme
            | AuthError::UserGone
            | AuthError::Unauthorized(_) => "UNAUTHORIZED",
            AuthError::ExpiredToken => "EXPIRED_TOKEN",
            AuthError::MalformedToken => "MALFORMED_TOKEN",
            AuthError::UserNotFound => "NOT_FOUND",
            AuthError::ProviderDenied
            | AuthError::ProviderMismatch
            | AuthError::Provider(_) => "PROVIDER_ERROR",
            AuthError::ProviderTimeout => "PROVIDER_TIMEOUT",
            AuthError::StoreTimeout => "STORE_TIMEOUT",
            AuthError::Database(_) | AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to AppError
    ///
    /// Server-side failures get a generic message so internals never leak.
    pub fn to_app_error(&self) -> AppError {
        let message = match self {
            AuthError::Database(_) | AuthError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };
        AppError::new(self.kind(), message).with_code(self.code())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::StoreTimeout => {
                tracing::error!("Credential store call timed out");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::ProviderMismatch => {
                tracing::warn!("Provider token presented for a different account");
            }
            AuthError::Provider(msg) => {
                tracing::warn!(message = %msg, "Provider call failed");
            }
            AuthError::ProviderTimeout => {
                tracing::warn!("Provider call timed out");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    /// Value objects report input problems as `AppError`
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AuthError::Validation(err.message().to_string()),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AuthError {
    fn from(rejection: QueryRejection) -> Self {
        AuthError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<HttpClientError> for AuthError {
    fn from(err: HttpClientError) -> Self {
        match err {
            HttpClientError::Timeout => AuthError::ProviderTimeout,
            other => AuthError::Provider(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        HttpClientError::from(err).into()
    }
}
