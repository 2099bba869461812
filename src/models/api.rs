//! Request and response bodies of the HTTP surface.
//!
//! The same types are deserialized by [`crate::client`], so both sides of the
//! wire agree on field names (camelCase) and enum spellings (snake_case).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::generation_job::{self, JobStatus};
use crate::entities::version::{self, VersionType};
use crate::entities::{candidate_image, project};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    pub output_language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub count: Option<i64>,
    pub seed: Option<i64>,
    pub strength: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectCandidateRequest {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CreateVersionType {
    JsonEdit,
    Checkout,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionRequest {
    pub version_type: CreateVersionType,
    /// Scene document, either as JSON text or as an inline JSON value.
    #[schema(value_type = Option<Object>)]
    pub json_content: Option<Value>,
    pub source_version_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub output_language: String,
    pub current_version_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<project::Model> for ProjectResponse {
    fn from(model: project::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            output_language: model.output_language,
            current_version_id: model.current_version_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub version_type: VersionType,
    pub image_asset_id: Option<Uuid>,
    #[schema(value_type = Option<Object>)]
    pub scene_document: Option<Value>,
    pub parent_version_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub created_at: NaiveDateTime,
}

impl VersionResponse {
    pub fn new(model: version::Model, image_url: Option<String>) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            version_type: model.version_type,
            image_asset_id: model.image_asset_id,
            scene_document: model.scene_document,
            parent_version_id: model.parent_version_id,
            image_url,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub source_version_id: Uuid,
    pub status: JobStatus,
    pub count: i32,
    pub strength: Option<f64>,
    pub seed: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<generation_job::Model> for JobResponse {
    fn from(model: generation_job::Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            source_version_id: model.source_version_id,
            status: model.status,
            count: model.count,
            strength: model.strength,
            seed: model.seed,
            error_message: model.error_message,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResponse {
    pub id: Uuid,
    pub index_num: i32,
    pub image_asset_id: Uuid,
    pub image_url: String,
    pub created_at: NaiveDateTime,
}

impl CandidateResponse {
    pub fn new(model: candidate_image::Model, image_url: String) -> Self {
        Self {
            id: model.id,
            index_num: model.index_num,
            image_asset_id: model.image_asset_id,
            image_url,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProjectEnvelope {
    pub project: ProjectResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobEnvelope {
    pub job: JobResponse,
}

/// Status snapshot. `candidates` is present only once the job has succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobStatusResponse {
    pub job: JobResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<CandidateResponse>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VersionEnvelope {
    pub version: VersionResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VersionListResponse {
    pub versions: Vec<VersionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}
