use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::generation::GenerationOptions;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider returned unusable output: {0}")]
    InvalidOutput(String),
}

pub struct GenerationRequest<'a> {
    pub base_image: &'a [u8],
    pub base_mime_type: &'a str,
    pub scene_document: &'a Value,
    pub options: GenerationOptions,
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub data: Vec<u8>,
    /// Provider-declared type; the stored type is always re-probed from the bytes.
    pub mime_type: Option<String>,
}

/// Produces `options.count` image variants of a base image guided by a scene document.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(
        &self,
        request: GenerationRequest<'_>,
    ) -> Result<Vec<GeneratedImage>, ProviderError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    image: String,
    mime_type: &'a str,
    scene_document: &'a Value,
    count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strength: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireImage {
    data: String,
    mime_type: Option<String>,
}

#[derive(Deserialize)]
struct WireResponse {
    images: Vec<WireImage>,
}

/// JSON-over-HTTP provider: base64 image in, base64 images out.
#[derive(Clone)]
pub struct HttpGenerationProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpGenerationProvider {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl GenerationProvider for HttpGenerationProvider {
    async fn generate(
        &self,
        request: GenerationRequest<'_>,
    ) -> Result<Vec<GeneratedImage>, ProviderError> {
        let body = WireRequest {
            image: general_purpose::STANDARD.encode(request.base_image),
            mime_type: request.base_mime_type,
            scene_document: request.scene_document,
            count: request.options.count,
            seed: request.options.seed,
            strength: request.options.strength,
        };

        let mut call = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let started = std::time::Instant::now();
        let response = call
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidOutput(e.to_string()))?;

        tracing::debug!(
            images = parsed.images.len(),
            elapsed = ?started.elapsed(),
            "Generation provider responded"
        );

        parsed
            .images
            .into_iter()
            .enumerate()
            .map(|(i, img)| {
                let data = general_purpose::STANDARD
                    .decode(img.data.as_bytes())
                    .map_err(|e| ProviderError::InvalidOutput(format!("image {i}: {e}")))?;
                Ok(GeneratedImage {
                    data,
                    mime_type: img.mime_type,
                })
            })
            .collect()
    }
}
