use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "candidate_images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_id: Uuid,
    pub image_asset_id: Uuid,
    /// 0-based, unique per job.
    pub index_num: i32,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::generation_job::Entity",
        from = "Column::JobId",
        to = "super::generation_job::Column::Id",
        on_delete = "Cascade"
    )]
    GenerationJob,
    #[sea_orm(
        belongs_to = "super::image_asset::Entity",
        from = "Column::ImageAssetId",
        to = "super::image_asset::Column::Id"
    )]
    ImageAsset,
}

impl Related<super::generation_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GenerationJob.def()
    }
}

impl Related<super::image_asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ImageAsset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
