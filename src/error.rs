//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::currency::CurrencyCode;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request body, query string or path did not pass validation.
    ///
    /// The string describes what was wrong and is shown to the client.
    #[error("{0}")]
    Validation(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The email and password did not match a registered user.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The bearer token was missing, malformed, expired or had a bad signature.
    #[error("Invalid or missing authentication token")]
    InvalidToken,

    /// The email used to register is already in use.
    #[error("Email already exists")]
    DuplicateEmail,

    /// The username used to register is already in use.
    #[error("Username already exists")]
    DuplicateUsername,

    /// The user referred to by the request does not exist.
    #[error("User not found")]
    UserNotFound,

    /// The category referred to by the request does not exist.
    #[error("Category not found")]
    CategoryNotFound,

    /// The transaction does not exist, or belongs to another user.
    ///
    /// Both cases are reported the same way so that clients cannot learn
    /// whether another user's transaction exists.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The exchange rate provider did not return a usable rate for the pair.
    #[error("Exchange rate not available for {from} -> {to}")]
    RateUnavailable {
        /// The source currency.
        from: CurrencyCode,
        /// The target currency.
        to: CurrencyCode,
    },

    /// The request body was larger than the server accepts.
    #[error("Request body is too large")]
    PayloadTooLarge,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The JSON Web Token could not be created.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The server was configured with a timezone name that is not in the
    /// timezone database.
    #[error("could not get local timezone from the canonical timezone name \"{0}\"")]
    InvalidTimezoneError(String),
}

impl Error {
    /// The HTTP status code the error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::TooWeak(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::DuplicateEmail | Error::DuplicateUsername => StatusCode::CONFLICT,
            Error::UserNotFound
            | Error::CategoryNotFound
            | Error::TransactionNotFound
            | Error::NotFound => StatusCode::NOT_FOUND,
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::RateUnavailable { .. }
            | Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Error::Validation(_) | Error::TooWeak(_) => "Validation Failed",
            Error::RateUnavailable { .. } => "Rate Unavailable",
            error => error
                .status_code()
                .canonical_reason()
                .unwrap_or("Internal Server Error"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_) => "An unexpected error occurred".to_owned(),
            error => error.to_string(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

/// The JSON body sent to the client for every failed request.
#[derive(Debug, Serialize)]
struct ErrorBody {
    timestamp: String,
    status: u16,
    error: &'static str,
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        let body = ErrorBody {
            timestamp: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            status: status.as_u16(),
            error: self.reason(),
            message: self.client_message(),
        };

        (status, Json(body)).into_response()
    }
}
