use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Versions are append-only: rows are inserted, never updated.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "versions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub version_type: VersionType,
    pub image_asset_id: Option<Uuid>,
    pub scene_document: Option<Json>,
    pub parent_version_id: Option<Uuid>,
    pub created_at: DateTime,
}

#[derive(
    EnumIter, DeriveActiveEnum, Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    #[sea_orm(string_value = "imported")]
    Imported,
    #[sea_orm(string_value = "json_edit")]
    JsonEdit,
    #[sea_orm(string_value = "selected_candidate")]
    SelectedCandidate,
    #[sea_orm(string_value = "checkout")]
    Checkout,
    #[sea_orm(string_value = "generated")]
    Generated,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::image_asset::Entity",
        from = "Column::ImageAssetId",
        to = "super::image_asset::Column::Id"
    )]
    ImageAsset,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::image_asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ImageAsset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
