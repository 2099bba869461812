use axum::response::Json;
use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub docs: String,
    pub endpoints: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service name, version and route index", body = RootResponse)
    ),
    tag = "General"
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        docs: "/swagger-ui/".to_string(),
        endpoints: [
            "POST /projects",
            "GET /projects/{id}",
            "POST /projects/{id}/import",
            "GET /projects/{id}/versions",
            "POST /projects/{id}/versions",
            "POST /projects/{id}/generate",
            "POST /projects/{id}/select",
            "GET /generations/{id}",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
    })
}
