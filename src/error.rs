use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

/// Machine-readable code carried in the `code` field of every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidCountRange,
    InvalidStrengthRange,
    NoCurrentVersion,
    InvalidDocument,
    InvalidImage,
    MissingField,
    InvalidRequest,
    InvalidSourceVersion,
    InvalidCandidate,
    JobNotCompleted,
    JobNotQueued,
    ProjectNotFound,
    VersionNotFound,
    JobNotFound,
    CandidateNotFound,
    AssetNotFound,
    ProviderError,
    StorageError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidCountRange => "INVALID_COUNT_RANGE",
            ErrorCode::InvalidStrengthRange => "INVALID_STRENGTH_RANGE",
            ErrorCode::NoCurrentVersion => "NO_CURRENT_VERSION",
            ErrorCode::InvalidDocument => "INVALID_DOCUMENT",
            ErrorCode::InvalidImage => "INVALID_IMAGE",
            ErrorCode::MissingField => "MISSING_FIELD",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::InvalidSourceVersion => "INVALID_SOURCE_VERSION",
            ErrorCode::InvalidCandidate => "INVALID_CANDIDATE",
            ErrorCode::JobNotCompleted => "JOB_NOT_COMPLETED",
            ErrorCode::JobNotQueued => "JOB_NOT_QUEUED",
            ErrorCode::ProjectNotFound => "PROJECT_NOT_FOUND",
            ErrorCode::VersionNotFound => "VERSION_NOT_FOUND",
            ErrorCode::JobNotFound => "JOB_NOT_FOUND",
            ErrorCode::CandidateNotFound => "CANDIDATE_NOT_FOUND",
            ErrorCode::AssetNotFound => "ASSET_NOT_FOUND",
            ErrorCode::ProviderError => "PROVIDER_ERROR",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Shape or range violation, rejected before anything is written.
    #[error("{message}")]
    Validation {
        code: ErrorCode,
        message: String,
        details: Option<Value>,
    },

    #[error("{message}")]
    NotFound { code: ErrorCode, message: String },

    /// The operation is not valid for the entity's current status.
    #[error("{message}")]
    StateConflict { code: ErrorCode, message: String },

    #[error("generation provider failed: {0}")]
    Provider(#[from] crate::services::provider::ProviderError),

    #[error("blob storage failed: {0}")]
    Storage(#[from] crate::services::blob::BlobError),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError::Validation {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError::StateConflict {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::StateConflict { code, .. } => *code,
            AppError::Provider(_) => ErrorCode::ProviderError,
            AppError::Storage(_) => ErrorCode::StorageError,
            AppError::Database(_) | AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::StateConflict { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation {
            code: ErrorCode::InvalidRequest,
            message: "Invalid JSON request body".to_string(),
            details: Some(json!({ "reason": rejection.body_text() })),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation {
            code: ErrorCode::InvalidRequest,
            message: "Invalid path parameter".to_string(),
            details: Some(json!({ "reason": rejection.body_text() })),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details) = match self {
            AppError::Validation {
                message, details, ..
            } => (message, details),
            AppError::NotFound { message, .. } | AppError::StateConflict { message, .. } => {
                (message, None)
            }
            AppError::Provider(e) => {
                tracing::warn!(error = %e, "Generation provider error");
                (e.to_string(), None)
            }
            other => {
                tracing::error!(error = %other, "Internal server error");
                ("Internal server error".to_string(), None)
            }
        };

        let mut body = json!({
            "error": message,
            "code": code.as_str(),
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}
