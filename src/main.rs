use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DbErr};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scenegen::config::{BlobBackend, Config, ConfigError};
use scenegen::routes::create_routes;
use scenegen::services::blob::{BlobError, BlobStore, LocalBlobStore};
use scenegen::services::generation::GenerationJobManager;
use scenegen::services::provider::{HttpGenerationProvider, ProviderError};
use scenegen::services::s3::S3BlobStore;
use scenegen::services::versions::VersionStore;
use scenegen::services::worker::TokioScheduler;
use scenegen::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "scenegen", version, about = "Scene versioning and image generation service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run migrations, then serve the HTTP API (default)
    Serve {
        /// Overrides PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending migrations and exit
    Migrate,
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database: {0}")]
    Database(#[from] DbErr),
    #[error("blob store: {0}")]
    Blob(#[from] BlobError),
    #[error("generation provider: {0}")]
    Provider(#[from] ProviderError),
    #[error("invalid listen address {0}")]
    Address(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scenegen=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Startup failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let config = Config::from_env()?;

    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connected");

    Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied");

    let port = match cli.command {
        Some(Command::Migrate) => return Ok(()),
        Some(Command::Serve { port }) => port.unwrap_or(config.port),
        None => config.port,
    };

    let (blobs, assets_dir): (Arc<dyn BlobStore>, Option<PathBuf>) = match config.blob_backend {
        BlobBackend::Local => {
            let store = LocalBlobStore::new(&config.blob_local_root, &config.public_base_url)?;
            tokio::fs::create_dir_all(store.root()).await?;
            let root = store.root().to_path_buf();
            (Arc::new(store), Some(root))
        }
        BlobBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or(ConfigError::Missing("S3_BUCKET_NAME"))?;
            let store = S3BlobStore::new(s3);
            store.ensure_bucket_exists().await?;
            (Arc::new(store), None)
        }
    };

    let provider = HttpGenerationProvider::new(
        config.provider_url.clone(),
        config.provider_api_key.clone(),
        config.provider_timeout,
    )?;

    let versions = VersionStore::new(db.clone(), Arc::clone(&blobs));
    let generations = GenerationJobManager::new(db, Arc::clone(&blobs), Arc::new(provider));
    let scheduler = TokioScheduler::new(generations.clone(), config.max_concurrent_jobs);

    if config.recover_interrupted_jobs {
        if let Err(e) = scheduler.recover().await {
            tracing::error!(error = %e, "Job recovery failed");
        }
    }

    let state = AppState {
        versions,
        generations,
        scheduler: Arc::new(scheduler),
    };
    let app = create_routes(state, assets_dir);

    let host = config
        .host
        .parse()
        .map_err(|_| StartupError::Address(config.host.clone()))?;
    let addr = SocketAddr::new(host, port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
