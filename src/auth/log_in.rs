//! Handles log-in requests.

use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::{
    Error,
    auth::{register::CredentialsState, token::AuthResponse},
    user::get_user_by_email,
};

/// The request body for logging in.
#[derive(Debug, Clone, Deserialize)]
pub struct LogInRequest {
    /// The email address the user registered with.
    pub email: String,
    /// The plain text password.
    pub password: String,
}

/// A route handler for logging in a user with their email and password.
///
/// An unknown email and a wrong password are both reported as
/// [Error::InvalidCredentials].
pub async fn log_in_endpoint(
    State(state): State<CredentialsState>,
    WithRejection(Json(request), _): WithRejection<Json<LogInRequest>, Error>,
) -> Result<Json<AuthResponse>, Error> {
    let email = request.email.trim();

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_email(email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                tracing::warn!("Log in attempt for unknown email");
                return Err(Error::InvalidCredentials);
            }
            Err(error) => return Err(error),
        }
    };

    if !user.password_hash.verify(&request.password)? {
        tracing::warn!("Log in attempt with wrong password for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    tracing::info!("User {} logged in", user.id);

    AuthResponse::issue(&user, &state.jwt_keys, state.token_duration).map(Json)
}
