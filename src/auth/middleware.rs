//! Authentication middleware that verifies bearer tokens.

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{AppState, Error, JwtKeys, auth::token::decode_token};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The keys for verifying tokens.
    pub jwt_keys: JwtKeys,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token in the
/// `Authorization` header.
///
/// The user ID and claims are placed into the request extensions and the
/// request executed normally if the token is valid, otherwise a
/// 401 Unauthorized response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(error) => {
            tracing::warn!("Rejected request to {} with no bearer token: {error}", parts.uri);
            return Error::InvalidToken.into_response();
        }
    };

    let claims = match decode_token(bearer.token(), &state.jwt_keys) {
        Ok(claims) => claims,
        Err(error) => {
            tracing::warn!("Rejected request to {} with bad token", parts.uri);
            return error.into_response();
        }
    };

    parts.extensions.insert(claims.user_id);
    parts.extensions.insert(claims);

    next.run(Request::from_parts(parts, body)).await
}
