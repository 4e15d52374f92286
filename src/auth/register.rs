//! Handles requests to register a new user.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error, JwtKeys, PasswordHash, ValidatedPassword,
    auth::token::AuthResponse,
    user::{NewUser, Role, create_user, email_exists, username_exists, validate_username},
};

/// The state needed to register or log in a user.
#[derive(Clone)]
pub struct CredentialsState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing tokens.
    pub jwt_keys: JwtKeys,
    /// How long issued tokens are valid for.
    pub token_duration: Duration,
    /// The bcrypt cost for hashing new passwords.
    pub password_hash_cost: u32,
}

impl FromRef<AppState> for CredentialsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            password_hash_cost: state.password_hash_cost,
        }
    }
}

/// The request body for registering a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// The desired username.
    pub username: String,
    /// The email address the user will log in with.
    pub email: String,
    /// The plain text password.
    pub password: String,
}

/// A route handler for registering a new user.
///
/// Responds with 201 Created and a token for the new user.
pub async fn register_endpoint(
    State(state): State<CredentialsState>,
    WithRejection(Json(request), _): WithRejection<Json<RegisterRequest>, Error>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    let username = validate_username(&request.username)?;
    let email = EmailAddress::from_str(request.email.trim())
        .map_err(|error| Error::Validation(format!("Invalid email address: {error}")))?;
    let password = ValidatedPassword::new(&request.password, &[&username, email.as_str()])?;

    {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        if email_exists(email.as_str(), &connection)? {
            return Err(Error::DuplicateEmail);
        }

        if username_exists(&username, &connection)? {
            return Err(Error::DuplicateUsername);
        }
    }

    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        create_user(
            NewUser {
                username,
                email,
                password_hash,
                role: Role::User,
            },
            &connection,
        )?
    };

    tracing::info!("Registered user {} with ID {}", user.username, user.id);

    let response = AuthResponse::issue(&user, &state.jwt_keys, state.token_duration)?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{TEST_PASSWORD, assert_error_message, get_test_server, register_test_user},
    };

    #[tokio::test]
    async fn register_returns_token_and_user() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert!(body["token"].as_str().is_some_and(|token| !token.is_empty()));
        assert!(body["userId"].as_i64().is_some_and(|id| id > 0));
        assert_eq!(body["username"], "alice");
        assert_eq!(body["email"], "alice@example.com");
        assert_eq!(body["role"], "USER");
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn register_fails_on_duplicate_email() {
        let server = get_test_server();
        register_test_user(&server, "alice", "alice@example.com").await;

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": "bob",
                "email": "alice@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        assert_error_message(&response, StatusCode::CONFLICT, "Email already exists");
    }

    #[tokio::test]
    async fn register_fails_on_duplicate_username() {
        let server = get_test_server();
        register_test_user(&server, "alice", "alice@example.com").await;

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": "alice",
                "email": "bob@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        assert_error_message(&response, StatusCode::CONFLICT, "Username already exists");
    }

    #[tokio::test]
    async fn register_checks_email_before_username() {
        let server = get_test_server();
        register_test_user(&server, "alice", "alice@example.com").await;

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        assert_error_message(&response, StatusCode::CONFLICT, "Email already exists");
    }

    #[tokio::test]
    async fn register_fails_on_invalid_email() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": "alice",
                "email": "not an email",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn register_fails_on_short_username() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": "al",
                "email": "alice@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn register_fails_on_weak_password() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "password",
            }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"], "Validation Failed");
    }
}
