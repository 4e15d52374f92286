//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;
use time::Duration;

use crate::{Error, PasswordHash, currency::ExchangeRateClient, db::initialize};

/// The default duration for which issued tokens are valid.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::hours(24);

/// The keys for signing and verifying JSON Web Tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Create the HMAC keys from a shared `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// The key for signing tokens.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// The key for verifying tokens.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The keys for signing and verifying authentication tokens.
    pub jwt_keys: JwtKeys,

    /// How long issued tokens are valid for.
    pub token_duration: Duration,

    /// The bcrypt cost used when hashing new passwords.
    pub password_hash_cost: u32,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The source of exchange rates for currency conversion.
    pub rate_client: Arc<dyn ExchangeRateClient>,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Tokens default to [DEFAULT_TOKEN_DURATION] and passwords to
    /// [PasswordHash::DEFAULT_COST]; use [AppState::with_token_duration] and
    /// [AppState::with_password_hash_cost] to change them.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        local_timezone: &str,
        rate_client: Arc<dyn ExchangeRateClient>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            jwt_keys: JwtKeys::new(jwt_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            password_hash_cost: PasswordHash::DEFAULT_COST,
            local_timezone: local_timezone.to_owned(),
            rate_client,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Set how long issued tokens are valid for.
    pub fn with_token_duration(mut self, token_duration: Duration) -> Self {
        self.token_duration = token_duration;
        self
    }

    /// Set the bcrypt cost for hashing new passwords.
    pub fn with_password_hash_cost(mut self, cost: u32) -> Self {
        self.password_hash_cost = cost;
        self
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_keys.clone()
    }
}
