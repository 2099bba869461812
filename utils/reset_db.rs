use sea_orm::{ConnectionTrait, Database, DbBackend, DbErr, Statement};

const TABLES: [&str; 6] = [
    "candidate_images",
    "generation_jobs",
    "versions",
    "image_assets",
    "projects",
    "seaql_migrations",
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        tracing::error!("DATABASE_URL must be set");
        std::process::exit(1);
    };

    if let Err(e) = reset(&database_url).await {
        tracing::error!(error = %e, "Database reset failed");
        std::process::exit(1);
    }
    tracing::info!("Database reset successfully");
}

async fn reset(database_url: &str) -> Result<(), DbErr> {
    let db = Database::connect(database_url).await?;
    let backend = db.get_database_backend();

    for table in TABLES {
        let sql = match backend {
            DbBackend::Postgres => format!("DROP TABLE IF EXISTS \"{table}\" CASCADE;"),
            _ => format!("DROP TABLE IF EXISTS \"{table}\";"),
        };
        db.execute(Statement::from_string(backend, sql)).await?;
        tracing::info!(table, "Dropped table");
    }

    Ok(())
}
