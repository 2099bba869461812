use async_trait::async_trait;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::models::api::{
    ErrorResponse, GenerateRequest, JobEnvelope, JobResponse, JobStatusResponse,
    SelectCandidateRequest, VersionEnvelope, VersionListResponse, VersionResponse,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
}

/// The server operations the client-side generation flow depends on.
#[async_trait]
pub trait GenerationApi: Send + Sync {
    async fn create_job(
        &self,
        project_id: Uuid,
        request: &GenerateRequest,
    ) -> Result<JobResponse, ClientError>;

    async fn get_job(&self, job_id: Uuid) -> Result<JobStatusResponse, ClientError>;

    async fn select_candidate(
        &self,
        project_id: Uuid,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<VersionResponse, ClientError>;

    async fn list_versions(&self, project_id: Uuid) -> Result<Vec<VersionResponse>, ClientError>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(body) => (body.code, body.error),
        Err(_) => (None, text),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

#[async_trait]
impl GenerationApi for ApiClient {
    async fn create_job(
        &self,
        project_id: Uuid,
        request: &GenerateRequest,
    ) -> Result<JobResponse, ClientError> {
        let response = self
            .http
            .post(self.url(&format!("/projects/{project_id}/generate")))
            .json(request)
            .send()
            .await?;
        Ok(decode::<JobEnvelope>(response).await?.job)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<JobStatusResponse, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/generations/{job_id}")))
            .send()
            .await?;
        decode(response).await
    }

    async fn select_candidate(
        &self,
        project_id: Uuid,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<VersionResponse, ClientError> {
        let response = self
            .http
            .post(self.url(&format!("/projects/{project_id}/select")))
            .json(&SelectCandidateRequest {
                job_id,
                candidate_id,
            })
            .send()
            .await?;
        Ok(decode::<VersionEnvelope>(response).await?.version)
    }

    async fn list_versions(&self, project_id: Uuid) -> Result<Vec<VersionResponse>, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/projects/{project_id}/versions")))
            .send()
            .await?;
        Ok(decode::<VersionListResponse>(response).await?.versions)
    }
}
