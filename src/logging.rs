//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{
        HeaderMap, HeaderValue,
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE},
        request, response,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// The number of characters of a body logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest request body, in bytes, the middleware will buffer.
///
/// Matches axum's default body limit for extractors.
pub const MAX_REQUEST_BODY_SIZE: usize = 2 * 1024 * 1024;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
/// Credentials are never logged: the `Authorization` and cookie headers and
/// the password and token fields of JSON bodies are replaced with asterisks.
///
/// Request bodies larger than [MAX_REQUEST_BODY_SIZE] are rejected with 413
/// Payload Too Large.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_REQUEST_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("could not read request body: {error}");
            return Error::PayloadTooLarge.into_response();
        }
    };

    log_request(&parts, &body_text(&body_bytes, is_json(&parts.headers)));

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_response(&parts, &body_text(&body_bytes, is_json(&parts.headers)));

    Response::from_parts(parts, Body::from(body_bytes))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

fn body_text(body_bytes: &Bytes, is_json: bool) -> String {
    let text = String::from_utf8_lossy(body_bytes);

    if is_json {
        redact_secrets(&text)
    } else {
        text.into_owned()
    }
}

/// A copy of `headers` with the values of credential headers replaced.
fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut redacted = headers.clone();

    for name in [AUTHORIZATION, COOKIE, SET_COOKIE] {
        if redacted.contains_key(&name) {
            redacted.insert(name, HeaderValue::from_static(REDACTED));
        }
    }

    redacted
}

fn is_secret_field(key: &str) -> bool {
    let key = key.to_lowercase();

    key.contains("password") || key == "token"
}

/// Replace the value of every password or token field in the JSON text `body`.
///
/// Text that is not valid JSON is returned unchanged.
fn redact_secrets(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(mut value) => {
            redact_value(&mut value);
            value.to_string()
        }
        Err(_) => body.to_owned(),
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if is_secret_field(key) {
                    *field = Value::String(REDACTED.to_owned());
                } else {
                    redact_value(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {}
    }
}

/// The first [LOG_BODY_LENGTH_LIMIT] characters of `body`, or `None` if the
/// body fits within the limit.
fn truncate(body: &str) -> Option<&str> {
    body.char_indices()
        .nth(LOG_BODY_LENGTH_LIMIT)
        .map(|(end, _)| &body[..end])
}

fn describe_request(parts: &request::Parts) -> String {
    format!(
        "{} {} {:?}\nheaders: {:#?}",
        parts.method,
        parts.uri,
        parts.version,
        redact_headers(&parts.headers)
    )
}

fn describe_response(parts: &response::Parts) -> String {
    format!(
        "{} {:?}\nheaders: {:#?}",
        parts.status,
        parts.version,
        redact_headers(&parts.headers)
    )
}

fn log_request(parts: &request::Parts, body: &str) {
    let request = describe_request(parts);

    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Received request: {request}\nbody: {truncated}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {request}\nbody: {body:?}"),
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    let response = describe_response(parts);

    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Sending response: {response}\nbody: {truncated}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {response}\nbody: {body:?}"),
    }
}
