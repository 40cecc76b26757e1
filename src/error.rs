//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! It centralizes error management, providing a consistent way to handle and represent
//! various error conditions that can occur, from database issues to rejected credentials.
//!
//! `AppError` implements `actix_web::error::ResponseError` to seamlessly convert
//! application errors into appropriate HTTP responses with JSON bodies.
//! It also provides `From` trait implementations for `sqlx::Error`,
//! `validator::ValidationErrors`, `bcrypt::BcryptError` and the session/token
//! errors, allowing for easy conversion using the `?` operator.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::gate::RejectReason;
use crate::auth::token::TokenError;
use crate::session::StoreError;

/// Represents all possible errors that can occur within the application.
///
/// Each variant corresponds to a specific type of error, often carrying a message
/// detailing the issue. These errors are then converted into appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// The authentication gate refused the request (HTTP 401, or 500 on storage failure).
    /// The response always tells the client to discard its stored token.
    #[error("Rejected: {}", .0.message())]
    Rejected(RejectReason),
    /// Wrong credentials at login (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Represents a client-side error due to a malformed or invalid request (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// Represents a situation where a requested resource was not found (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// The resource already exists, e.g. an email registered twice (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Represents an unexpected server-side error (HTTP 500).
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
    /// Represents an error originating from database operations (HTTP 500).
    #[error("Database Error: {0}")]
    DatabaseError(String),
    /// Represents an error due to failed input validation (HTTP 422 Unprocessable Entity).
    #[error("Validation Error: {0}")]
    ValidationError(String),
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// Rejections carry the machine-readable `reason` and the `isExpired` flag so
/// clients know to drop the token they hold.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Rejected(RejectReason::StorageError) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Rejected(_) | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Rejected(reason) => json!({
                "error": reason.message(),
                "reason": reason,
                "isExpired": reason.is_expired(),
            }),
            // Database errors are presented as generic internal server errors to the client.
            AppError::DatabaseError(_) => json!({ "error": "Internal Server Error" }),
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InternalServerError(msg)
            | AppError::ValidationError(msg) => json!({ "error": msg }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<RejectReason> for AppError {
    fn from(reason: RejectReason) -> AppError {
        AppError::Rejected(reason)
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `sqlx::Error::RowNotFound` maps to `AppError::NotFound` and a unique
/// constraint violation to `AppError::Conflict`, while other database errors
/// become `AppError::DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match &error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Resource already exists".into())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        AppError::DatabaseError(error.to_string())
    }
}

/// Issuing a token only fails on broken key material, which is a server fault.
impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
///
/// The detailed validation messages are preserved.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
