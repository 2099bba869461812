use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Versions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Versions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Versions::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Versions::VersionType).string().not_null())
                    .col(ColumnDef::new(Versions::ImageAssetId).uuid())
                    .col(ColumnDef::new(Versions::SceneDocument).json())
                    .col(ColumnDef::new(Versions::ParentVersionId).uuid())
                    .col(ColumnDef::new(Versions::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_versions_project_id")
                            .from(Versions::Table, Versions::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_versions_image_asset_id")
                            .from(Versions::Table, Versions::ImageAssetId)
                            .to(ImageAssets::Table, ImageAssets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_versions_parent_version_id")
                            .from(Versions::Table, Versions::ParentVersionId)
                            .to(Versions::Table, Versions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_versions_project_created")
                    .table(Versions::Table)
                    .col(Versions::ProjectId)
                    .col(Versions::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Versions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Versions {
    Table,
    Id,
    ProjectId,
    VersionType,
    ImageAssetId,
    SceneDocument,
    ParentVersionId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ImageAssets {
    Table,
    Id,
}
