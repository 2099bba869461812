use std::collections::HashSet;
use std::sync::Arc;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use crate::entities::version::VersionType;
use crate::entities::{image_asset, project, version};
use crate::error::{AppError, AppResult, ErrorCode};
use crate::services::blob::{self, BlobStore};
use crate::utils::image_probe::probe_image;
use crate::utils::scene_document::parse_scene_document;

pub const DEFAULT_OUTPUT_LANGUAGE: &str = "en";

/// A version row paired with the public URL of its image, if it has one.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionWithUrl {
    pub version: version::Model,
    pub image_url: Option<String>,
}

pub(crate) struct NewVersion {
    pub project_id: Uuid,
    pub version_type: VersionType,
    pub image_asset_id: Option<Uuid>,
    pub scene_document: Option<Value>,
    pub parent_version_id: Option<Uuid>,
}

/// Insert a version and point its project at it.
///
/// Must run inside the caller's transaction so both writes commit or roll
/// back together. Concurrent writers on one project race; the last commit
/// wins the pointer.
pub(crate) async fn append_version<C: ConnectionTrait>(
    conn: &C,
    new: NewVersion,
) -> AppResult<version::Model> {
    let now = chrono::Utc::now().naive_utc();

    let inserted = version::ActiveModel {
        id: Set(Uuid::now_v7()),
        project_id: Set(new.project_id),
        version_type: Set(new.version_type),
        image_asset_id: Set(new.image_asset_id),
        scene_document: Set(new.scene_document),
        parent_version_id: Set(new.parent_version_id),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;

    let repointed = project::Entity::update_many()
        .col_expr(project::Column::CurrentVersionId, Expr::value(inserted.id))
        .col_expr(project::Column::UpdatedAt, Expr::value(now))
        .filter(project::Column::Id.eq(new.project_id))
        .exec(conn)
        .await?;

    if repointed.rows_affected != 1 {
        return Err(AppError::not_found(ErrorCode::ProjectNotFound, "Project not found"));
    }

    tracing::info!(
        project_id = %new.project_id,
        version_id = %inserted.id,
        version_type = ?inserted.version_type,
        parent_version_id = ?inserted.parent_version_id,
        "Version appended"
    );

    Ok(inserted)
}

pub(crate) async fn find_project<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<project::Model> {
    project::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::ProjectNotFound, "Project not found"))
}

pub(crate) async fn find_version<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<version::Model> {
    version::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::VersionNotFound, "Version not found"))
}

/// Immutable, parent-linked version history of projects.
#[derive(Clone)]
pub struct VersionStore {
    db: DatabaseConnection,
    blobs: Arc<dyn BlobStore>,
}

impl VersionStore {
    pub fn new(db: DatabaseConnection, blobs: Arc<dyn BlobStore>) -> Self {
        Self { db, blobs }
    }

    pub async fn create_project(
        &self,
        name: &str,
        output_language: Option<&str>,
    ) -> AppResult<project::Model> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation(ErrorCode::MissingField, "name is required"));
        }

        let now = chrono::Utc::now().naive_utc();
        let created = project::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            output_language: Set(output_language.unwrap_or(DEFAULT_OUTPUT_LANGUAGE).to_string()),
            current_version_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(project_id = %created.id, name = %created.name, "Project created");
        Ok(created)
    }

    pub async fn get_project(&self, project_id: Uuid) -> AppResult<project::Model> {
        find_project(&self.db, project_id).await
    }

    /// New version carrying an edited scene document and the current image.
    pub async fn create_json_edit_version(
        &self,
        project_id: Uuid,
        scene_document_text: &str,
    ) -> AppResult<version::Model> {
        let document = parse_scene_document(scene_document_text)?;

        let txn = self.db.begin().await?;
        let project = find_project(&txn, project_id).await?;

        let image_asset_id = match project.current_version_id {
            Some(current_id) => version::Entity::find_by_id(current_id)
                .one(&txn)
                .await?
                .and_then(|v| v.image_asset_id),
            None => None,
        };

        let created = append_version(
            &txn,
            NewVersion {
                project_id,
                version_type: VersionType::JsonEdit,
                image_asset_id,
                scene_document: Some(document),
                parent_version_id: project.current_version_id,
            },
        )
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    /// New version duplicating an existing version of the same project.
    pub async fn create_checkout_version(
        &self,
        project_id: Uuid,
        source_version_id: Uuid,
    ) -> AppResult<version::Model> {
        find_project(&self.db, project_id).await?;
        let source = find_version(&self.db, source_version_id).await?;
        if source.project_id != project_id {
            return Err(AppError::validation(
                ErrorCode::InvalidSourceVersion,
                "Source version does not belong to this project",
            ));
        }

        let txn = self.db.begin().await?;
        let created = append_version(
            &txn,
            NewVersion {
                project_id,
                version_type: VersionType::Checkout,
                image_asset_id: source.image_asset_id,
                scene_document: source.scene_document,
                parent_version_id: Some(source.id),
            },
        )
        .await?;
        txn.commit().await?;

        Ok(created)
    }

    /// Store an uploaded image and record it as an `Imported` version.
    pub async fn import_image(
        &self,
        project_id: Uuid,
        original_name: &str,
        data: Vec<u8>,
        scene_document_text: Option<&str>,
    ) -> AppResult<version::Model> {
        let info = probe_image(&data)
            .map_err(|e| AppError::validation(ErrorCode::InvalidImage, e.to_string()))?;
        let document = scene_document_text.map(parse_scene_document).transpose()?;
        find_project(&self.db, project_id).await?;

        let asset_id = Uuid::now_v7();
        let path = blob::import_path(project_id, asset_id, info.extension);
        let file_size = data.len() as i64;
        self.blobs.save(&path, data, info.mime_type).await?;

        let persisted = async {
            let txn = self.db.begin().await?;
            let project = find_project(&txn, project_id).await?;

            image_asset::ActiveModel {
                id: Set(asset_id),
                storage_path: Set(path.clone()),
                original_name: Set(original_name.to_string()),
                mime_type: Set(info.mime_type.to_string()),
                file_size: Set(file_size),
                width: Set(info.width as i32),
                height: Set(info.height as i32),
                created_at: Set(chrono::Utc::now().naive_utc()),
            }
            .insert(&txn)
            .await?;

            let created = append_version(
                &txn,
                NewVersion {
                    project_id,
                    version_type: VersionType::Imported,
                    image_asset_id: Some(asset_id),
                    scene_document: document,
                    parent_version_id: project.current_version_id,
                },
            )
            .await?;

            txn.commit().await?;
            Ok::<_, AppError>(created)
        }
        .await;

        if persisted.is_err() {
            if let Err(e) = self.blobs.delete(&path).await {
                tracing::warn!(error = %e, path = %path, "Failed to remove orphaned import blob");
            }
        }

        persisted
    }

    pub async fn get_version(&self, project_id: Uuid, version_id: Uuid) -> AppResult<version::Model> {
        let found = find_version(&self.db, version_id).await?;
        if found.project_id != project_id {
            return Err(AppError::not_found(ErrorCode::VersionNotFound, "Version not found"));
        }
        Ok(found)
    }

    /// All versions of a project, newest first, with resolved image URLs.
    pub async fn get_versions_with_urls(&self, project_id: Uuid) -> AppResult<Vec<VersionWithUrl>> {
        find_project(&self.db, project_id).await?;

        let rows = version::Entity::find()
            .filter(version::Column::ProjectId.eq(project_id))
            .order_by_desc(version::Column::CreatedAt)
            .order_by_desc(version::Column::Id)
            .find_also_related(image_asset::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(version, asset)| VersionWithUrl {
                version,
                image_url: asset.map(|a| self.blobs.url(&a.storage_path)),
            })
            .collect())
    }

    /// Public URL of a version's image, if it has one.
    pub async fn image_url(&self, version: &version::Model) -> AppResult<Option<String>> {
        let Some(asset_id) = version.image_asset_id else {
            return Ok(None);
        };
        let asset = image_asset::Entity::find_by_id(asset_id).one(&self.db).await?;
        Ok(asset.map(|a| self.blobs.url(&a.storage_path)))
    }

    /// The chain from `version_id` back to its root, starting with the version itself.
    pub async fn lineage(&self, version_id: Uuid) -> AppResult<Vec<version::Model>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(version_id);

        while let Some(id) = next {
            if !seen.insert(id) {
                return Err(AppError::Internal(format!("version lineage cycle at {id}")));
            }
            let current = find_version(&self.db, id).await?;
            next = current.parent_version_id;
            chain.push(current);
        }

        Ok(chain)
    }
}
