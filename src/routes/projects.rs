use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::api::{
    CreateProjectRequest, ErrorResponse, ProjectEnvelope, ProjectResponse, VersionEnvelope,
    VersionResponse,
};
use crate::state::AppState;

use super::extract::{AppJson, AppPath};

#[utoipa::path(
    post,
    path = "/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectEnvelope),
        (status = 400, description = "Missing name or malformed body", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<ProjectEnvelope>)> {
    let project = state
        .versions
        .create_project(&payload.name, payload.output_language.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProjectEnvelope {
            project: ProjectResponse::from(project),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project details", body = ProjectEnvelope),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn get_project(
    State(state): State<AppState>,
    AppPath(project_id): AppPath<Uuid>,
) -> AppResult<Json<ProjectEnvelope>> {
    let project = state.versions.get_project(project_id).await?;
    Ok(Json(ProjectEnvelope {
        project: ProjectResponse::from(project),
    }))
}

#[utoipa::path(
    post,
    path = "/projects/{id}/import",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image imported as a new version", body = VersionEnvelope),
        (status = 400, description = "Not multipart, missing file, not an image, or invalid scene document", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Versions"
)]
pub async fn import_image(
    State(state): State<AppState>,
    AppPath(project_id): AppPath<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<VersionEnvelope>)> {
    let mut multipart = multipart.map_err(|e| AppError::Validation {
        code: ErrorCode::InvalidRequest,
        message: "Expected a multipart/form-data body".to_string(),
        details: Some(serde_json::json!({ "reason": e.body_text() })),
    })?;
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut scene_document: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::validation(ErrorCode::MissingField, format!("Invalid multipart data: {e}"))
    })? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::validation(ErrorCode::InvalidImage, format!("Failed to read file: {e}"))
                })?;
                upload = Some((filename, data.to_vec()));
            }
            Some("sceneDocument") => {
                let text = field.text().await.map_err(|e| {
                    AppError::validation(ErrorCode::InvalidDocument, e.to_string())
                })?;
                scene_document = Some(text);
            }
            _ => {}
        }
    }

    let (filename, data) = upload
        .ok_or_else(|| AppError::validation(ErrorCode::MissingField, "No file field found"))?;

    let version = state
        .versions
        .import_image(project_id, &filename, data, scene_document.as_deref())
        .await?;
    let image_url = state.versions.image_url(&version).await?;

    tracing::info!(project_id = %project_id, version_id = %version.id, file = %filename, "Image imported");
    Ok((
        StatusCode::CREATED,
        Json(VersionEnvelope {
            version: VersionResponse::new(version, image_url),
        }),
    ))
}
