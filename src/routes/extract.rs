//! Extractors whose rejections render as the standard error envelope.

use axum::extract::{FromRequest, FromRequestParts};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, AppResult, ErrorCode};

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Parse a JSON body whose fields are all optional. An empty body is `T::default()`.
pub fn optional_json<T: DeserializeOwned + Default>(body: &[u8]) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    let value: Value = serde_json::from_slice(body).map_err(|e| AppError::Validation {
        code: ErrorCode::InvalidRequest,
        message: "Invalid JSON request body".to_string(),
        details: Some(serde_json::json!({ "reason": e.to_string() })),
    })?;
    from_value(value)
}

pub fn from_value<T: DeserializeOwned>(value: Value) -> AppResult<T> {
    serde_json::from_value(value).map_err(|e| AppError::Validation {
        code: ErrorCode::InvalidRequest,
        message: "Invalid JSON request body".to_string(),
        details: Some(serde_json::json!({ "reason": e.to_string() })),
    })
}
