use serde_json::{json, Value};

use crate::error::{AppError, ErrorCode};

/// Upper bound on the serialized size of a scene document.
pub const MAX_SCENE_DOCUMENT_BYTES: usize = 1024 * 1024;

/// Parse and shape-check scene document text.
///
/// The document itself is opaque here: it must be valid JSON, a top-level
/// object, and at most [`MAX_SCENE_DOCUMENT_BYTES`] long.
pub fn parse_scene_document(text: &str) -> Result<Value, AppError> {
    if text.len() > MAX_SCENE_DOCUMENT_BYTES {
        return Err(AppError::Validation {
            code: ErrorCode::InvalidDocument,
            message: "Scene document exceeds the size limit".to_string(),
            details: Some(json!({
                "size": text.len(),
                "maxSize": MAX_SCENE_DOCUMENT_BYTES,
            })),
        });
    }

    let value: Value = serde_json::from_str(text).map_err(|e| AppError::Validation {
        code: ErrorCode::InvalidDocument,
        message: "Scene document is not valid JSON".to_string(),
        details: Some(json!({
            "reason": e.to_string(),
            "line": e.line(),
            "column": e.column(),
        })),
    })?;

    if !value.is_object() {
        return Err(AppError::validation(
            ErrorCode::InvalidDocument,
            "Scene document must be a JSON object",
        ));
    }

    Ok(value)
}
