use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GenerationJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GenerationJobs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GenerationJobs::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(GenerationJobs::SourceVersionId).uuid().not_null())
                    .col(ColumnDef::new(GenerationJobs::Status).string().not_null())
                    .col(ColumnDef::new(GenerationJobs::Count).integer().not_null())
                    .col(ColumnDef::new(GenerationJobs::Strength).double())
                    .col(ColumnDef::new(GenerationJobs::Seed).big_integer())
                    .col(ColumnDef::new(GenerationJobs::ErrorMessage).text())
                    .col(ColumnDef::new(GenerationJobs::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(GenerationJobs::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_generation_jobs_project_id")
                            .from(GenerationJobs::Table, GenerationJobs::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_generation_jobs_source_version_id")
                            .from(GenerationJobs::Table, GenerationJobs::SourceVersionId)
                            .to(Versions::Table, Versions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_generation_jobs_status")
                    .table(GenerationJobs::Table)
                    .col(GenerationJobs::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GenerationJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GenerationJobs {
    Table,
    Id,
    ProjectId,
    SourceVersionId,
    Status,
    Count,
    Strength,
    Seed,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Versions {
    Table,
    Id,
}
