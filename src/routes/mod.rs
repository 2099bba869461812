mod extract;
mod generations;
mod home;
mod projects;
mod versions;

use std::path::PathBuf;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

/// Upper bound on uploaded image size.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        home::root,
        projects::create_project,
        projects::get_project,
        projects::import_image,
        versions::list_versions,
        versions::create_version,
        generations::generate,
        generations::get_generation,
        generations::select_candidate,
    ),
    components(
        schemas(
            crate::models::api::CreateProjectRequest,
            crate::models::api::GenerateRequest,
            crate::models::api::SelectCandidateRequest,
            crate::models::api::CreateVersionType,
            crate::models::api::CreateVersionRequest,
            crate::models::api::ProjectResponse,
            crate::models::api::ProjectEnvelope,
            crate::models::api::VersionResponse,
            crate::models::api::VersionEnvelope,
            crate::models::api::VersionListResponse,
            crate::models::api::JobResponse,
            crate::models::api::JobEnvelope,
            crate::models::api::CandidateResponse,
            crate::models::api::JobStatusResponse,
            crate::models::api::ErrorResponse,
            home::RootResponse,
            crate::entities::version::VersionType,
            crate::entities::generation_job::JobStatus,
        )
    ),
    tags(
        (name = "General", description = "General API information"),
        (name = "Projects", description = "Project creation and lookup"),
        (name = "Versions", description = "Immutable version lineage: json edits, checkouts, imports"),
        (name = "Generation", description = "Background image generation jobs and candidate selection")
    ),
    info(
        title = "SceneGen API",
        version = "0.1.0",
        description = "Project version lineage and asynchronous image generation jobs",
    )
)]
struct ApiDoc;

/// Build the application router. `assets_dir` serves a local blob root under `/assets`.
pub fn create_routes(state: AppState, assets_dir: Option<PathBuf>) -> Router {
    let swagger_router: Router = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into();

    let app_routes = Router::new()
        .route("/", get(home::root))
        .route("/projects", post(projects::create_project))
        .route("/projects/{id}", get(projects::get_project))
        .route(
            "/projects/{id}/import",
            post(projects::import_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/projects/{id}/versions",
            get(versions::list_versions).post(versions::create_version),
        )
        .route("/projects/{id}/generate", post(generations::generate))
        .route("/projects/{id}/select", post(generations::select_candidate))
        .route("/generations/{id}", get(generations::get_generation))
        .with_state(state);

    let mut router = Router::new().merge(swagger_router).merge(app_routes);
    if let Some(dir) = assets_dir {
        router = router.nest_service("/assets", ServeDir::new(dir));
    }

    router.layer(TraceLayer::new_for_http())
}
