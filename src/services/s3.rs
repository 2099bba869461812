use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::config::S3Config;
use crate::services::blob::{BlobError, BlobStore};

#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    pub bucket_name: String,
    public_base: String,
}

impl S3BlobStore {
    pub fn new(config: &S3Config) -> Self {
        let credentials = aws_sdk_s3::config::Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "manual_config",
        );

        let region = aws_sdk_s3::config::Region::new(config.region.clone());

        let mut s3_config_builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        let client = Client::from_conf(s3_config_builder.build());

        let public_base = match &config.endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket_name),
            None => format!(
                "https://{}.s3.{}.amazonaws.com",
                config.bucket_name, config.region
            ),
        };

        Self {
            client,
            bucket_name: config.bucket_name.clone(),
            public_base,
        }
    }

    pub async fn ensure_bucket_exists(&self) -> Result<(), BlobError> {
        let resp = self.client.head_bucket().bucket(&self.bucket_name).send().await;

        if resp.is_err() {
            tracing::info!(bucket = %self.bucket_name, "Bucket does not exist, attempting to create");
            self.client
                .create_bucket()
                .bucket(&self.bucket_name)
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(error = ?e, "Failed to create bucket");
                    BlobError::Backend(format!("Failed to create S3 bucket: {}", e))
                })?;
        }

        self.set_public_policy().await
    }

    async fn set_public_policy(&self) -> Result<(), BlobError> {
        let policy = format!(
            r#"{{
                "Version": "2012-10-17",
                "Statement": [
                    {{
                        "Sid": "PublicReadGetObject",
                        "Effect": "Allow",
                        "Principal": "*",
                        "Action": "s3:GetObject",
                        "Resource": "arn:aws:s3:::{}/*"
                    }}
                ]
            }}"#,
            self.bucket_name
        );

        self.client
            .put_bucket_policy()
            .bucket(&self.bucket_name)
            .policy(policy)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = ?e, "Failed to set bucket policy");
                BlobError::Backend(format!("Failed to set bucket policy: {}", e))
            })?;

        Ok(())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn save(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(path)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, key = path, "S3 upload error");
                BlobError::Backend(format!("Failed to upload object to S3: {}", e))
            })?;

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let no_such_key = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if no_such_key {
                    BlobError::NotFound(path.to_string())
                } else {
                    tracing::error!(error = ?e, key = path, "S3 download error");
                    BlobError::Backend(format!("Failed to download object from S3: {}", e))
                }
            })?;

        let data = resp.body.collect().await.map_err(|e| {
            tracing::error!(error = ?e, key = path, "S3 body error");
            BlobError::Backend("Failed to read S3 body".to_string())
        })?;

        Ok(data.into_bytes().to_vec())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base, path)
    }

    async fn delete(&self, path: &str) -> Result<(), BlobError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key = path, "S3 delete error");
                BlobError::Backend("Failed to delete object from S3".to_string())
            })?;

        Ok(())
    }
}
