use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::api::{
    CandidateResponse, ErrorResponse, GenerateRequest, JobEnvelope, JobResponse,
    JobStatusResponse, SelectCandidateRequest, VersionEnvelope, VersionResponse,
};
use crate::state::AppState;

use super::extract::{from_value, optional_json, AppJson, AppPath};

/// Every field is optional and so is the body itself. Type errors on `count`
/// and `strength` report the same codes as out-of-range values.
fn parse_generate_request(body: &[u8]) -> AppResult<GenerateRequest> {
    let value: Value = optional_json(body)?;
    if value.is_null() {
        return Ok(GenerateRequest::default());
    }
    if !value.is_object() {
        return Err(AppError::validation(
            ErrorCode::InvalidRequest,
            "Request body must be a JSON object",
        ));
    }

    let present = |field: &str| value.get(field).filter(|v| !v.is_null());
    if present("count").is_some_and(|v| !v.is_i64()) {
        return Err(AppError::validation(
            ErrorCode::InvalidCountRange,
            "count must be an integer between 1 and 8",
        ));
    }
    if present("strength").is_some_and(|v| !v.is_number()) {
        return Err(AppError::validation(
            ErrorCode::InvalidStrengthRange,
            "strength must be a number between 0 and 1",
        ));
    }

    from_value(value)
}

#[utoipa::path(
    post,
    path = "/projects/{id}/generate",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body = GenerateRequest,
    responses(
        (status = 201, description = "Job queued; execution continues in the background", body = JobEnvelope),
        (status = 400, description = "INVALID_COUNT_RANGE, INVALID_STRENGTH_RANGE, NO_CURRENT_VERSION or INVALID_REQUEST", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Generation"
)]
pub async fn generate(
    State(state): State<AppState>,
    AppPath(project_id): AppPath<Uuid>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<JobEnvelope>)> {
    let payload = parse_generate_request(&body)?;
    let job = state
        .generations
        .create_job_from_current(project_id, &payload)
        .await?;

    state.scheduler.schedule(job.id);

    Ok((
        StatusCode::CREATED,
        Json(JobEnvelope {
            job: JobResponse::from(job),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/generations/{id}",
    params(
        ("id" = Uuid, Path, description = "Generation job ID")
    ),
    responses(
        (status = 200, description = "Job status; candidates only when succeeded", body = JobStatusResponse),
        (status = 404, description = "Job not found", body = ErrorResponse)
    ),
    tag = "Generation"
)]
pub async fn get_generation(
    State(state): State<AppState>,
    AppPath(job_id): AppPath<Uuid>,
) -> AppResult<Json<JobStatusResponse>> {
    let found = state.generations.get_job(job_id).await?;

    Ok(Json(JobStatusResponse {
        job: JobResponse::from(found.job),
        candidates: found.candidates.map(|list| {
            list.into_iter()
                .map(|c| CandidateResponse::new(c.candidate, c.image_url))
                .collect()
        }),
    }))
}

#[utoipa::path(
    post,
    path = "/projects/{id}/select",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body = SelectCandidateRequest,
    responses(
        (status = 201, description = "Candidate promoted to the current version", body = VersionEnvelope),
        (status = 400, description = "JOB_NOT_COMPLETED, INVALID_CANDIDATE or INVALID_REQUEST", body = ErrorResponse),
        (status = 404, description = "JOB_NOT_FOUND, CANDIDATE_NOT_FOUND or VERSION_NOT_FOUND", body = ErrorResponse)
    ),
    tag = "Generation"
)]
pub async fn select_candidate(
    State(state): State<AppState>,
    AppPath(project_id): AppPath<Uuid>,
    AppJson(payload): AppJson<SelectCandidateRequest>,
) -> AppResult<(StatusCode, Json<VersionEnvelope>)> {
    let job = state.generations.find_job(payload.job_id).await?;
    if job.project_id != project_id {
        return Err(AppError::not_found(
            ErrorCode::JobNotFound,
            "Generation job not found in this project",
        ));
    }

    let version = state
        .generations
        .select_candidate(payload.job_id, payload.candidate_id)
        .await?;
    let image_url = state.versions.image_url(&version).await?;

    Ok((
        StatusCode::CREATED,
        Json(VersionEnvelope {
            version: VersionResponse::new(version, image_url),
        }),
    ))
}
