use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ImageAssets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ImageAssets::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ImageAssets::StoragePath)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ImageAssets::OriginalName).string().not_null())
                    .col(ColumnDef::new(ImageAssets::MimeType).string().not_null())
                    .col(ColumnDef::new(ImageAssets::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(ImageAssets::Width).integer().not_null())
                    .col(ColumnDef::new(ImageAssets::Height).integer().not_null())
                    .col(ColumnDef::new(ImageAssets::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ImageAssets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ImageAssets {
    Table,
    Id,
    StoragePath,
    OriginalName,
    MimeType,
    FileSize,
    Width,
    Height,
    CreatedAt,
}
