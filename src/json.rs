//! A JSON body extractor that reports malformed bodies with the app's error format.

use axum::extract::{FromRequest, rejection::JsonRejection};

use crate::Error;

/// Like [axum::Json], but rejections are turned into [Error::InvalidJson] so
/// that clients always receive the same structured error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidJson(rejection.body_text())
    }
}

/// Return the trimmed value of a required text field, or [Error::MissingField] if
/// it is absent or blank.
pub fn require_text(value: Option<String>, field: &'static str) -> Result<String, Error> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_owned()),
        _ => Err(Error::MissingField(field)),
    }
}
