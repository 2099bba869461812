use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::api::{
    CreateVersionRequest, CreateVersionType, ErrorResponse, VersionEnvelope, VersionListResponse,
    VersionResponse,
};
use crate::state::AppState;

use super::extract::{AppJson, AppPath};

#[utoipa::path(
    get,
    path = "/projects/{id}/versions",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "All versions, newest first", body = VersionListResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Versions"
)]
pub async fn list_versions(
    State(state): State<AppState>,
    AppPath(project_id): AppPath<Uuid>,
) -> AppResult<Json<VersionListResponse>> {
    let versions = state
        .versions
        .get_versions_with_urls(project_id)
        .await?
        .into_iter()
        .map(|v| VersionResponse::new(v.version, v.image_url))
        .collect();

    Ok(Json(VersionListResponse { versions }))
}

/// JSON text as sent, or an inline value re-serialized so the size check sees it.
fn scene_document_text(content: Option<Value>) -> AppResult<String> {
    match content {
        Some(Value::String(text)) => Ok(text),
        Some(Value::Null) | None => Err(AppError::validation(
            ErrorCode::MissingField,
            "jsonContent is required for json_edit versions",
        )),
        Some(other) => serde_json::to_string(&other)
            .map_err(|e| AppError::validation(ErrorCode::InvalidDocument, e.to_string())),
    }
}

#[utoipa::path(
    post,
    path = "/projects/{id}/versions",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body = CreateVersionRequest,
    responses(
        (status = 201, description = "Version created and made current", body = VersionEnvelope),
        (status = 400, description = "Malformed body, missing field or invalid document", body = ErrorResponse),
        (status = 404, description = "Project or source version not found", body = ErrorResponse)
    ),
    tag = "Versions"
)]
pub async fn create_version(
    State(state): State<AppState>,
    AppPath(project_id): AppPath<Uuid>,
    AppJson(payload): AppJson<CreateVersionRequest>,
) -> AppResult<(StatusCode, Json<VersionEnvelope>)> {
    let version = match payload.version_type {
        CreateVersionType::JsonEdit => {
            let text = scene_document_text(payload.json_content)?;
            state.versions.create_json_edit_version(project_id, &text).await?
        }
        CreateVersionType::Checkout => {
            let source_version_id = payload.source_version_id.ok_or_else(|| {
                AppError::validation(
                    ErrorCode::MissingField,
                    "sourceVersionId is required for checkout versions",
                )
            })?;
            state
                .versions
                .create_checkout_version(project_id, source_version_id)
                .await?
        }
    };

    let image_url = state.versions.image_url(&version).await?;
    Ok((
        StatusCode::CREATED,
        Json(VersionEnvelope {
            version: VersionResponse::new(version, image_url),
        }),
    ))
}
