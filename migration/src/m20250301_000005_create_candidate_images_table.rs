use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CandidateImages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CandidateImages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CandidateImages::JobId).uuid().not_null())
                    .col(ColumnDef::new(CandidateImages::ImageAssetId).uuid().not_null())
                    .col(ColumnDef::new(CandidateImages::IndexNum).integer().not_null())
                    .col(ColumnDef::new(CandidateImages::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_candidate_images_job_id")
                            .from(CandidateImages::Table, CandidateImages::JobId)
                            .to(GenerationJobs::Table, GenerationJobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_candidate_images_image_asset_id")
                            .from(CandidateImages::Table, CandidateImages::ImageAssetId)
                            .to(ImageAssets::Table, ImageAssets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_candidate_images_job_index")
                    .table(CandidateImages::Table)
                    .col(CandidateImages::JobId)
                    .col(CandidateImages::IndexNum)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CandidateImages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CandidateImages {
    Table,
    Id,
    JobId,
    ImageAssetId,
    IndexNum,
    CreatedAt,
}

#[derive(DeriveIden)]
enum GenerationJobs {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ImageAssets {
    Table,
    Id,
}
