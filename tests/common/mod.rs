#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageBuffer, ImageFormat, Rgb};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use serde_json::{json, Value};
use uuid::Uuid;

use scenegen::entities::{project, version};
use scenegen::routes::create_routes;
use scenegen::services::blob::{BlobError, BlobStore};
use scenegen::services::generation::GenerationJobManager;
use scenegen::services::provider::{
    GeneratedImage, GenerationProvider, GenerationRequest, ProviderError,
};
use scenegen::services::versions::VersionStore;
use scenegen::services::worker::JobScheduler;
use scenegen::state::AppState;

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// Fresh in-memory SQLite with all migrations applied. A single connection
/// keeps every query on the same in-memory database.
pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn exec_sql(db: &DatabaseConnection, sql: &str) {
    db.execute(Statement::from_string(db.get_database_backend(), sql.to_owned()))
        .await
        .unwrap();
}

/// Make every change of a project's current version fail at the database.
pub async fn block_current_version_updates(db: &DatabaseConnection) {
    exec_sql(
        db,
        "CREATE TRIGGER block_current_version BEFORE UPDATE OF current_version_id ON projects \
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .await;
}

/// Make the running -> succeeded transition fail at the database.
pub async fn block_job_success(db: &DatabaseConnection) {
    exec_sql(
        db,
        "CREATE TRIGGER block_job_success BEFORE UPDATE OF status ON generation_jobs \
         WHEN NEW.status = 'succeeded' BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .await;
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

pub fn png_bytes(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(width, height, Rgb([shade, 128, 255 - shade]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn scene_document() -> Value {
    json!({
        "objects": [
            { "id": "sofa", "label": "Sofa", "position": [1.0, 0.0, 2.5] },
            { "id": "lamp", "label": "Floor lamp", "position": [2.0, 0.0, 0.5] }
        ]
    })
}

// ---------------------------------------------------------------------------
// Blob store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl InMemoryBlobStore {
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(path)
    }

    pub fn remove(&self, path: &str) {
        self.blobs.lock().unwrap().remove(path);
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn save(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        self.blobs
            .lock()
            .unwrap()
            .get(path)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| BlobError::NotFound(path.to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("http://blobs.test/{path}")
    }

    async fn delete(&self, path: &str) -> Result<(), BlobError> {
        self.blobs.lock().unwrap().remove(path);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum ProviderScript {
    /// Exactly as many images as requested.
    Matching,
    /// A fixed number of images regardless of the request.
    Fixed(usize),
    /// Bytes that are not an image.
    Garbage,
    /// PNG bytes declared as JPEG.
    Mislabeled,
    Fail(String),
}

pub struct ScriptedProvider {
    script: Mutex<ProviderScript>,
    calls: Mutex<Vec<(u32, Value)>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self {
            script: Mutex::new(ProviderScript::Matching),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedProvider {
    pub fn set(&self, script: ProviderScript) {
        *self.script.lock().unwrap() = script;
    }

    /// `(count, scene document)` of every call so far.
    pub fn calls(&self) -> Vec<(u32, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    async fn generate(
        &self,
        request: GenerationRequest<'_>,
    ) -> Result<Vec<GeneratedImage>, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.options.count, request.scene_document.clone()));

        let script = self.script.lock().unwrap().clone();
        let images = |n: usize| -> Vec<GeneratedImage> {
            (0..n)
                .map(|i| GeneratedImage {
                    data: png_bytes(8, 6, (i * 20) as u8),
                    mime_type: Some("image/png".to_string()),
                })
                .collect()
        };

        match script {
            ProviderScript::Matching => Ok(images(request.options.count as usize)),
            ProviderScript::Fixed(n) => Ok(images(n)),
            ProviderScript::Garbage => Ok((0..request.options.count)
                .map(|_| GeneratedImage {
                    data: b"definitely not an image".to_vec(),
                    mime_type: None,
                })
                .collect()),
            ProviderScript::Mislabeled => Ok(images(request.options.count as usize)
                .into_iter()
                .map(|image| GeneratedImage {
                    mime_type: Some("image/jpeg".to_string()),
                    ..image
                })
                .collect()),
            ProviderScript::Fail(message) => Err(ProviderError::Status {
                status: 503,
                body: message,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Records scheduled jobs; tests decide when they run.
#[derive(Default)]
pub struct ManualScheduler {
    scheduled: Mutex<Vec<Uuid>>,
}

impl ManualScheduler {
    pub fn take(&self) -> Vec<Uuid> {
        std::mem::take(&mut *self.scheduled.lock().unwrap())
    }
}

impl JobScheduler for ManualScheduler {
    fn schedule(&self, job_id: Uuid) {
        self.scheduled.lock().unwrap().push(job_id);
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

pub struct TestContext {
    pub db: DatabaseConnection,
    pub blobs: Arc<InMemoryBlobStore>,
    pub provider: Arc<ScriptedProvider>,
    pub scheduler: Arc<ManualScheduler>,
    pub versions: VersionStore,
    pub generations: GenerationJobManager,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = test_db().await;
        let blobs = Arc::new(InMemoryBlobStore::default());
        let provider = Arc::new(ScriptedProvider::default());
        let scheduler = Arc::new(ManualScheduler::default());

        let versions = VersionStore::new(db.clone(), blobs.clone());
        let generations = GenerationJobManager::new(db.clone(), blobs.clone(), provider.clone());

        Self {
            db,
            blobs,
            provider,
            scheduler,
            versions,
            generations,
        }
    }

    pub fn app(&self) -> Router {
        let state = AppState {
            versions: self.versions.clone(),
            generations: self.generations.clone(),
            scheduler: self.scheduler.clone(),
        };
        create_routes(state, None)
    }

    /// Run every job scheduled so far, in order.
    pub async fn run_scheduled(&self) {
        for job_id in self.scheduler.take() {
            self.generations.execute_job(job_id).await.unwrap();
        }
    }

    /// A project whose current version is an imported image with a scene document.
    pub async fn seed_project(&self) -> (project::Model, version::Model) {
        let created = self.versions.create_project("Living room", None).await.unwrap();
        let document = scene_document().to_string();
        let imported = self
            .versions
            .import_image(created.id, "room.png", png_bytes(16, 12, 40), Some(&document))
            .await
            .unwrap();
        let refreshed = self.versions.get_project(created.id).await.unwrap();
        (refreshed, imported)
    }

    pub async fn current_version_id(&self, project_id: Uuid) -> Option<Uuid> {
        self.versions
            .get_project(project_id)
            .await
            .unwrap()
            .current_version_id
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// POST with a raw body and no content type.
pub fn post_raw(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::from(body))
        .unwrap()
}

/// Multipart body with a `file` part and an optional `sceneDocument` part.
pub fn post_multipart(uri: &str, file: &[u8], scene_document: Option<&str>) -> Request<Body> {
    let boundary = "scenegen-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"room.png\"\r\n\
             Content-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(b"\r\n");
    if let Some(document) = scene_document {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"sceneDocument\"\r\n\r\n{document}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
