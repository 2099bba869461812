use std::sync::Arc;
use std::time::Instant;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::generation_job::{self, JobStatus};
use crate::entities::version::VersionType;
use crate::entities::{candidate_image, image_asset, version};
use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::api::GenerateRequest;
use crate::models::generation::GenerationOptions;
use crate::services::blob::{self, BlobStore};
use crate::services::provider::{GenerationProvider, GenerationRequest, ProviderError};
use crate::services::versions::{append_version, find_project, find_version, NewVersion};
use crate::utils::image_probe::{probe_image, ImageInfo};

pub const INTERRUPTED_MESSAGE: &str = "Generation interrupted by server restart";

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateWithUrl {
    pub candidate: candidate_image::Model,
    pub image_url: String,
}

/// A job row plus, only when it has succeeded, its complete candidate set.
#[derive(Debug, Clone, PartialEq)]
pub struct JobWithCandidates {
    pub job: generation_job::Model,
    pub candidates: Option<Vec<CandidateWithUrl>>,
}

struct PreparedCandidate {
    index: usize,
    path: String,
    info: ImageInfo,
    file_size: i64,
}

/// Owns the generation job lifecycle, from creation to candidate promotion.
#[derive(Clone)]
pub struct GenerationJobManager {
    db: DatabaseConnection,
    blobs: Arc<dyn BlobStore>,
    provider: Arc<dyn GenerationProvider>,
}

impl GenerationJobManager {
    pub fn new(
        db: DatabaseConnection,
        blobs: Arc<dyn BlobStore>,
        provider: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self { db, blobs, provider }
    }

    /// Persist a queued job. Does not execute it.
    pub async fn create_job(
        &self,
        project_id: Uuid,
        source_version_id: Uuid,
        request: &GenerateRequest,
    ) -> AppResult<generation_job::Model> {
        let options = GenerationOptions::new(request.count, request.seed, request.strength)?;
        find_project(&self.db, project_id).await?;
        self.insert_job(project_id, source_version_id, options).await
    }

    /// Queue a job against the project's current version.
    pub async fn create_job_from_current(
        &self,
        project_id: Uuid,
        request: &GenerateRequest,
    ) -> AppResult<generation_job::Model> {
        let options = GenerationOptions::new(request.count, request.seed, request.strength)?;
        let project = find_project(&self.db, project_id).await?;
        let source_version_id = project.current_version_id.ok_or_else(|| {
            AppError::validation(ErrorCode::NoCurrentVersion, "Project has no current version")
        })?;
        self.insert_job(project_id, source_version_id, options).await
    }

    async fn insert_job(
        &self,
        project_id: Uuid,
        source_version_id: Uuid,
        options: GenerationOptions,
    ) -> AppResult<generation_job::Model> {
        let source = find_version(&self.db, source_version_id).await?;
        if source.project_id != project_id {
            return Err(AppError::validation(
                ErrorCode::InvalidSourceVersion,
                "Source version does not belong to this project",
            ));
        }

        let now = chrono::Utc::now().naive_utc();
        let job = generation_job::ActiveModel {
            id: Set(Uuid::now_v7()),
            project_id: Set(project_id),
            source_version_id: Set(source_version_id),
            status: Set(JobStatus::Queued),
            count: Set(options.count as i32),
            strength: Set(options.strength),
            seed: Set(options.seed),
            error_message: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            job_id = %job.id,
            project_id = %project_id,
            source_version_id = %source_version_id,
            count = job.count,
            "Generation job queued"
        );
        Ok(job)
    }

    pub async fn find_job(&self, job_id: Uuid) -> AppResult<generation_job::Model> {
        generation_job::Entity::find_by_id(job_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found(ErrorCode::JobNotFound, "Generation job not found"))
    }

    /// Run a queued job to completion.
    ///
    /// The queued -> running claim is a single conditional update, so of two
    /// concurrent calls at most one proceeds. Every failure after the claim is
    /// recorded on the job rather than returned.
    pub async fn execute_job(&self, job_id: Uuid) -> AppResult<generation_job::Model> {
        let claimed = generation_job::Entity::update_many()
            .col_expr(generation_job::Column::Status, Expr::value(JobStatus::Running))
            .col_expr(
                generation_job::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().naive_utc()),
            )
            .filter(generation_job::Column::Id.eq(job_id))
            .filter(generation_job::Column::Status.eq(JobStatus::Queued))
            .exec(&self.db)
            .await?;

        if claimed.rows_affected != 1 {
            let job = self.find_job(job_id).await?;
            return Err(AppError::conflict(
                ErrorCode::JobNotQueued,
                format!("Job is {:?}, only queued jobs can be executed", job.status),
            ));
        }

        tracing::info!(job_id = %job_id, "Generation job running");

        let started = Instant::now();
        match self.run_claimed(job_id).await {
            Ok(count) => {
                tracing::info!(
                    job_id = %job_id,
                    candidates = count,
                    elapsed = ?started.elapsed(),
                    "Generation job succeeded"
                );
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Generation job failed");
                self.mark_failed(job_id, &e.to_string()).await?;
            }
        }

        self.find_job(job_id).await
    }

    /// Everything after the claim. Any error here leaves the job running
    /// until the caller records it as failed.
    async fn run_claimed(&self, job_id: Uuid) -> AppResult<i32> {
        let job = self.find_job(job_id).await?;
        self.run(&job).await?;
        Ok(job.count)
    }

    async fn run(&self, job: &generation_job::Model) -> AppResult<()> {
        let source = version::Entity::find_by_id(job.source_version_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found(ErrorCode::VersionNotFound, "Source version not found"))?;

        let asset_id = source.image_asset_id.ok_or_else(|| {
            AppError::validation(ErrorCode::InvalidSourceVersion, "Source version has no image")
        })?;
        let scene_document = source.scene_document.as_ref().ok_or_else(|| {
            AppError::validation(
                ErrorCode::InvalidSourceVersion,
                "Source version has no scene document",
            )
        })?;
        let asset = image_asset::Entity::find_by_id(asset_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found(ErrorCode::AssetNotFound, "Source image asset not found"))?;
        let base_image = self.blobs.read(&asset.storage_path).await?;

        let options = GenerationOptions {
            count: job.count as u32,
            seed: job.seed,
            strength: job.strength,
        };
        let images = self
            .provider
            .generate(GenerationRequest {
                base_image: &base_image,
                base_mime_type: &asset.mime_type,
                scene_document,
                options,
            })
            .await?;

        if images.len() != job.count as usize {
            return Err(ProviderError::InvalidOutput(format!(
                "expected {} images, got {}",
                job.count,
                images.len()
            ))
            .into());
        }

        let mut probed = Vec::with_capacity(images.len());
        for (index, image) in images.into_iter().enumerate() {
            let info = probe_image(&image.data).map_err(|e| {
                ProviderError::InvalidOutput(format!("image {index}: {e}"))
            })?;
            if let Some(declared) = image.mime_type.as_deref() {
                if !declared.eq_ignore_ascii_case(info.mime_type) {
                    tracing::warn!(
                        job_id = %job.id,
                        index,
                        declared,
                        detected = info.mime_type,
                        "Provider mime type disagrees with image content, using detected type"
                    );
                }
            }
            probed.push((index, info, image.data));
        }

        let mut saved: Vec<PreparedCandidate> = Vec::with_capacity(probed.len());
        for (index, info, data) in probed {
            let path = blob::candidate_path(job.project_id, job.id, index, info.extension);
            let file_size = data.len() as i64;
            if let Err(e) = self.blobs.save(&path, data, info.mime_type).await {
                self.discard(&saved).await;
                return Err(e.into());
            }
            saved.push(PreparedCandidate {
                index,
                path,
                info,
                file_size,
            });
        }

        if let Err(e) = self.record_candidates(job.id, &saved).await {
            self.discard(&saved).await;
            return Err(e);
        }

        Ok(())
    }

    /// Insert every asset and candidate row and flip the job to succeeded in
    /// one transaction, so a partial candidate set is never visible.
    async fn record_candidates(&self, job_id: Uuid, saved: &[PreparedCandidate]) -> AppResult<()> {
        let txn = self.db.begin().await?;
        let now = chrono::Utc::now().naive_utc();

        for prepared in saved {
            let asset_id = Uuid::now_v7();
            image_asset::ActiveModel {
                id: Set(asset_id),
                storage_path: Set(prepared.path.clone()),
                original_name: Set(format!("candidate-{}.{}", prepared.index, prepared.info.extension)),
                mime_type: Set(prepared.info.mime_type.to_string()),
                file_size: Set(prepared.file_size),
                width: Set(prepared.info.width as i32),
                height: Set(prepared.info.height as i32),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;

            candidate_image::ActiveModel {
                id: Set(Uuid::now_v7()),
                job_id: Set(job_id),
                image_asset_id: Set(asset_id),
                index_num: Set(prepared.index as i32),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        let finished = generation_job::Entity::update_many()
            .col_expr(generation_job::Column::Status, Expr::value(JobStatus::Succeeded))
            .col_expr(generation_job::Column::UpdatedAt, Expr::value(now))
            .filter(generation_job::Column::Id.eq(job_id))
            .filter(generation_job::Column::Status.eq(JobStatus::Running))
            .exec(&txn)
            .await?;

        if finished.rows_affected != 1 {
            return Err(AppError::conflict(
                ErrorCode::JobNotQueued,
                "Job left the running state during execution",
            ));
        }

        txn.commit().await?;
        Ok(())
    }

    async fn discard(&self, saved: &[PreparedCandidate]) {
        for prepared in saved {
            if let Err(e) = self.blobs.delete(&prepared.path).await {
                tracing::warn!(path = %prepared.path, error = %e, "Failed to remove candidate blob");
            }
        }
    }

    /// Record a failure on a running job. Terminal jobs are left untouched.
    pub async fn mark_failed(&self, job_id: Uuid, message: &str) -> AppResult<bool> {
        let result = generation_job::Entity::update_many()
            .col_expr(generation_job::Column::Status, Expr::value(JobStatus::Failed))
            .col_expr(generation_job::Column::ErrorMessage, Expr::value(message.to_string()))
            .col_expr(
                generation_job::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().naive_utc()),
            )
            .filter(generation_job::Column::Id.eq(job_id))
            .filter(generation_job::Column::Status.eq(JobStatus::Running))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Fail every job a previous process left running. Returns how many were failed.
    pub async fn fail_interrupted_jobs(&self) -> AppResult<u64> {
        let result = generation_job::Entity::update_many()
            .col_expr(generation_job::Column::Status, Expr::value(JobStatus::Failed))
            .col_expr(
                generation_job::Column::ErrorMessage,
                Expr::value(INTERRUPTED_MESSAGE.to_string()),
            )
            .col_expr(
                generation_job::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().naive_utc()),
            )
            .filter(generation_job::Column::Status.eq(JobStatus::Running))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Ids of jobs that were queued but never claimed, oldest first.
    pub async fn queued_job_ids(&self) -> AppResult<Vec<Uuid>> {
        let jobs = generation_job::Entity::find()
            .filter(generation_job::Column::Status.eq(JobStatus::Queued))
            .order_by_asc(generation_job::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(jobs.into_iter().map(|j| j.id).collect())
    }

    pub async fn get_job(&self, job_id: Uuid) -> AppResult<JobWithCandidates> {
        let job = self.find_job(job_id).await?;
        if job.status != JobStatus::Succeeded {
            return Ok(JobWithCandidates {
                job,
                candidates: None,
            });
        }

        let rows = candidate_image::Entity::find()
            .filter(candidate_image::Column::JobId.eq(job_id))
            .order_by_asc(candidate_image::Column::IndexNum)
            .find_also_related(image_asset::Entity)
            .all(&self.db)
            .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for (candidate, asset) in rows {
            let asset = asset.ok_or_else(|| {
                AppError::Internal(format!("candidate {} references a missing asset", candidate.id))
            })?;
            candidates.push(CandidateWithUrl {
                image_url: self.blobs.url(&asset.storage_path),
                candidate,
            });
        }

        Ok(JobWithCandidates {
            job,
            candidates: Some(candidates),
        })
    }

    /// Promote a candidate of a succeeded job into a new current version.
    pub async fn select_candidate(&self, job_id: Uuid, candidate_id: Uuid) -> AppResult<version::Model> {
        let txn = self.db.begin().await?;

        let job = generation_job::Entity::find_by_id(job_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found(ErrorCode::JobNotFound, "Generation job not found"))?;
        if job.status != JobStatus::Succeeded {
            return Err(AppError::conflict(
                ErrorCode::JobNotCompleted,
                "Generation job has not succeeded",
            ));
        }

        let candidate = candidate_image::Entity::find_by_id(candidate_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found(ErrorCode::CandidateNotFound, "Candidate not found"))?;
        if candidate.job_id != job_id {
            return Err(AppError::validation(
                ErrorCode::InvalidCandidate,
                "Candidate does not belong to this job",
            ));
        }

        let source = find_version(&txn, job.source_version_id).await?;

        let created = append_version(
            &txn,
            NewVersion {
                project_id: job.project_id,
                version_type: VersionType::SelectedCandidate,
                image_asset_id: Some(candidate.image_asset_id),
                scene_document: source.scene_document,
                parent_version_id: Some(job.source_version_id),
            },
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            job_id = %job_id,
            candidate_id = %candidate_id,
            version_id = %created.id,
            "Candidate selected"
        );
        Ok(created)
    }
}
