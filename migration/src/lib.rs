pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_projects_table;
mod m20250301_000002_create_image_assets_table;
mod m20250301_000003_create_versions_table;
mod m20250301_000004_create_generation_jobs_table;
mod m20250301_000005_create_candidate_images_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_projects_table::Migration),
            Box::new(m20250301_000002_create_image_assets_table::Migration),
            Box::new(m20250301_000003_create_versions_table::Migration),
            Box::new(m20250301_000004_create_generation_jobs_table::Migration),
            Box::new(m20250301_000005_create_candidate_images_table::Migration),
        ]
    }
}
