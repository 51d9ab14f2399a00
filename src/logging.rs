//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::header::CONTENT_TYPE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// The number of bytes of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest request body read into memory, the same as axum's default body limit.
pub const REQUEST_BODY_SIZE_LIMIT: usize = 2 * 1024 * 1024;

/// JSON fields whose values never appear in the logs.
const REDACTED_FIELDS: [&str; 1] = ["cpf"];

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level.
/// CPF numbers in JSON bodies are redacted.
/// Request bodies larger than [REQUEST_BODY_SIZE_LIMIT] are rejected with a 413.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, REQUEST_BODY_SIZE_LIMIT).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("Rejected request {} {}: {error}", parts.method, parts.uri);
            return Error::PayloadTooLarge(REQUEST_BODY_SIZE_LIMIT).into_response();
        }
    };

    let is_json = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    let body_text = display_text(&body_bytes, is_json);
    tracing::info!("Received {} {}", parts.method, parts.uri);
    log_body("request", &parts.headers, &body_text);

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return Error::InvalidJson(error.to_string()).into_response();
        }
    };

    tracing::info!("Sending response {}", parts.status);
    log_body("response", &parts.headers, &display_text(&body_bytes, true));

    Response::from_parts(parts, Body::from(body_bytes))
}

fn display_text(body: &[u8], is_json: bool) -> String {
    if is_json {
        if let Ok(mut value) = serde_json::from_slice::<Value>(body) {
            redact(&mut value);
            return value.to_string();
        }
    }

    String::from_utf8_lossy(body).to_string()
}

fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *field = Value::String(REDACTED.to_owned());
                } else {
                    redact(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

fn truncate(text: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_body(direction: &str, headers: &axum::http::HeaderMap, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("{direction} headers: {headers:?}\nbody: {}...", truncate(body));
        tracing::debug!("Full {direction} body: {body:?}");
    } else {
        tracing::info!("{direction} headers: {headers:?}\nbody: {body:?}");
    }
}
