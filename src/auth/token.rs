//! Issues and verifies the JSON Web Tokens used for authentication.

use jsonwebtoken::{Algorithm, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    Error, JwtKeys,
    user::{Role, User, UserID},
};

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The username of the user the token was issued to.
    pub sub: String,
    /// The ID of the user the token was issued to.
    pub user_id: UserID,
    /// The email address of the user.
    pub email: String,
    /// The role of the user when the token was issued.
    pub role: Role,
    /// When the token was issued, in seconds since the Unix epoch.
    pub iat: i64,
    /// When the token expires, in seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// Create the claims for a token issued to `user` at `issued_at` that is
    /// valid for `duration`.
    pub fn new(user: &User, issued_at: OffsetDateTime, duration: Duration) -> Self {
        Self {
            sub: user.username.clone(),
            user_id: user.id,
            email: user.email.to_string(),
            role: user.role,
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + duration).unix_timestamp(),
        }
    }
}

/// The response body sent after a user registers or logs in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// The bearer token to send with authenticated requests.
    pub token: String,
    /// The ID of the authenticated user.
    pub user_id: UserID,
    /// The username of the authenticated user.
    pub username: String,
    /// The email address of the authenticated user.
    pub email: String,
    /// The role of the authenticated user.
    pub role: Role,
}

impl AuthResponse {
    /// Issue a token for `user` that is valid for `duration` and wrap it with
    /// the user's details.
    ///
    /// # Errors
    ///
    /// Returns [Error::TokenCreation] if the token could not be signed.
    pub fn issue(user: &User, keys: &JwtKeys, duration: Duration) -> Result<Self, Error> {
        Ok(Self {
            token: encode_token(user, keys, duration)?,
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.to_string(),
            role: user.role,
        })
    }
}

/// Create a signed token for `user` that is valid for `duration` from now.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(user: &User, keys: &JwtKeys, duration: Duration) -> Result<String, Error> {
    let claims = Claims::new(user, OffsetDateTime::now_utc(), duration);

    encode_claims(&claims, keys)
}

pub(crate) fn encode_claims(claims: &Claims, keys: &JwtKeys) -> Result<String, Error> {
    encode(&Header::new(Algorithm::HS256), claims, keys.encoding_key())
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token is malformed, was signed with a
/// different key, or has expired.
pub fn decode_token(token: &str, keys: &JwtKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, keys.decoding_key(), &Validation::new(Algorithm::HS256))
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected token: {error}");
            Error::InvalidToken
        })
}
